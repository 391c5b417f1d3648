//! Flat-file adapter for the binary record-frame format.
//!
//! The whole collection is one frame stream terminated by a sentinel end
//! marker. Reads drain the stream; writes rewrite the file from the full
//! collection. Key searches are not meaningful for flat files and are
//! rejected.

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::Descriptor;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_codec::{CodecError, FrameReader, FrameWriter};
use rosterdb_model::{DataOperation, EntityMap, VerifiedEntity};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

fn read_failure(error: CodecError) -> BackendError {
    match error {
        CodecError::Io(e) => BackendError::read(format!("record stream: {e}")),
        other => BackendError::corrupted(other.to_string()),
    }
}

/// The binary record-frame file adapter.
#[derive(Debug, Default)]
pub struct BinaryFileBackend {
    path: Option<PathBuf>,
}

impl BinaryFileBackend {
    /// Creates an unprepared adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn path(&self) -> BackendResult<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| BackendError::connection("binary file backend is not prepared"))
    }
}

impl<E: VerifiedEntity> Backend<E> for BinaryFileBackend {
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
        let length = file
            .metadata()
            .map_err(|e| BackendError::read(format!("stat {}: {e}", path.display())))?
            .len();
        if length == 0 {
            info!(path = %path.display(), "binary file holds no data");
            return Ok(());
        }
        let mut reader = FrameReader::new(BufReader::new(file));
        while let Some(payload) = reader.next_payload().map_err(read_failure)? {
            let entity = codec.from_frame(&payload)?;
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
        let mut writer = FrameWriter::new(BufWriter::new(file));
        for entity in map.values() {
            let frame = codec.to_frame(entity)?;
            writer
                .write_payload(&frame)
                .map_err(|e| BackendError::write(e.to_string()))?;
        }
        writer
            .finish()
            .map_err(|e| BackendError::write(e.to_string()))?;
        Ok(())
    }
}
