//! Flat-file adapter for the delimited-text format.
//!
//! One record per line, fields in the codec's fixed order. Reads parse the
//! whole file; writes rewrite it from the full collection.

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::Descriptor;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_codec::{read_delimited, write_delimited};
use rosterdb_model::{DataOperation, EntityMap, VerifiedEntity};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// The delimited-text file adapter.
#[derive(Debug, Default)]
pub struct TextFileBackend {
    path: Option<PathBuf>,
}

impl TextFileBackend {
    /// Creates an unprepared adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn path(&self) -> BackendResult<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| BackendError::connection("text file backend is not prepared"))
    }
}

impl<E: VerifiedEntity> Backend<E> for TextFileBackend {
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()> {
        let path = PathBuf::from(&descriptor.url);
        if !path.exists() {
            return Err(BackendError::connection(format!(
                "file not found: {}",
                path.display()
            )));
        }
        self.path = Some(path);
        Ok(())
    }

    fn release(&mut self) {
        self.path = None;
    }

    fn read(
        &mut self,
        codec: &dyn EntityCodec<E>,
        query: ReadQuery,
        into: &mut EntityMap<E>,
    ) -> BackendResult<()> {
        if matches!(query, ReadQuery::ByKey(_)) {
            return Err(BackendError::unsupported(
                "key search is not available on flat files",
            ));
        }
        let path = self.path()?;
        let file = File::open(path)
            .map_err(|e| BackendError::read(format!("open {}: {e}", path.display())))?;
        let records = read_delimited(BufReader::new(file))
            .map_err(|e| BackendError::corrupted(e.to_string()))?;
        if records.is_empty() {
            info!(path = %path.display(), "text file holds no data");
            return Ok(());
        }
        for fields in &records {
            let entity = codec.from_fields(fields)?;
            into.insert(entity.key(), entity);
        }
        Ok(())
    }

    fn update(
        &mut self,
        codec: &dyn EntityCodec<E>,
        operation: DataOperation,
        payload: WritePayload<'_, E>,
    ) -> BackendResult<()> {
        require_write_operation(operation)?;
        let map = payload.expect_all()?;
        let path = self.path()?;
        let file = File::create(path)
            .map_err(|e| BackendError::write(format!("create {}: {e}", path.display())))?;
        let records: Vec<Vec<String>> = map.values().map(|entity| codec.to_fields(entity)).collect();
        write_delimited(BufWriter::new(file), &records)
            .map_err(|e| BackendError::write(e.to_string()))?;
        Ok(())
    }
}
