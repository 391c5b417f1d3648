//! Flat-file adapter for the XML document format.
//!
//! One document per file: a root element (named after the descriptor's
//! table) wrapping one child element per record. Reads parse the whole
//! document; writes rebuild and rewrite it from the full collection.

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::Descriptor;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_codec::XmlElement;
use rosterdb_model::{DataOperation, EntityMap, VerifiedEntity};
use std::path::{Path, PathBuf};
use tracing::info;

/// The XML document file adapter.
#[derive(Debug, Default)]
pub struct XmlFileBackend {
    path: Option<PathBuf>,
    root_name: Option<String>,
}

impl XmlFileBackend {
    /// Creates an unprepared adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn path(&self) -> BackendResult<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| BackendError::connection("xml file backend is not prepared"))
    }

    fn root_name(&self) -> BackendResult<&str> {
        self.root_name
            .as_deref()
            .ok_or_else(|| BackendError::connection("xml file backend is not prepared"))
    }
}

impl<E: VerifiedEntity> Backend<E> for XmlFileBackend {
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()> {
        let path = PathBuf::from(&descriptor.url);
        if !path.exists() {
            return Err(BackendError::connection(format!(
                "file not found: {}",
                path.display()
            )));
        }
        self.path = Some(path);
        self.root_name = Some(descriptor.table.clone());
        Ok(())
    }

    fn release(&mut self) {
        self.path = None;
        self.root_name = None;
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
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BackendError::read(format!("open {}: {e}", path.display())))?;
        if raw.trim().is_empty() {
            info!(path = %path.display(), "xml file holds no data");
            return Ok(());
        }
        let root = XmlElement::parse(&raw)
            .map_err(|e| BackendError::corrupted(e.to_string()))?;
        for element in root.children() {
            let entity = codec.from_xml(element)?;
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
        let mut root = XmlElement::new(self.root_name()?);
        for entity in map.values() {
            root.push_child(codec.to_xml(entity));
        }
        let document = root
            .to_document_string()
            .map_err(|e| BackendError::write(e.to_string()))?;
        let path = self.path()?;
        std::fs::write(path, document)
            .map_err(|e| BackendError::write(format!("write {}: {e}", path.display())))?;
        Ok(())
    }
}
