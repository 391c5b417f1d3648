//! XML-native store adapter: a persistent XML document with node-level
//! updates.
//!
//! The store is one XML document whose root element wraps a child element
//! per record, keyed by the `id` attribute. `prepare` parses the document
//! into a live tree; writes insert, replace, or delete single nodes and
//! rewrite the stored document, so unlike the flat-file XML adapter this
//! one supports key searches and single-record writes.

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::Descriptor;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_codec::XmlElement;
use rosterdb_model::{DataOperation, EntityKey, EntityMap, VerifiedEntity};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Attribute carrying the record key on every record element.
const KEY_ATTR: &str = "id";

/// The XML-native store adapter.
#[derive(Debug, Default)]
pub struct XmlStoreBackend {
    path: Option<PathBuf>,
    root: Option<XmlElement>,
    root_name: Option<String>,
    in_batch: bool,
}

impl XmlStoreBackend {
    /// Creates an unprepared adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn path(&self) -> BackendResult<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| BackendError::connection("xml store is not prepared"))
    }

    fn root(&self) -> BackendResult<&XmlElement> {
        self.root
            .as_ref()
            .ok_or_else(|| BackendError::connection("xml store is not prepared"))
    }

    fn root_mut(&mut self) -> BackendResult<&mut XmlElement> {
        self.root
            .as_mut()
            .ok_or_else(|| BackendError::connection("xml store is not prepared"))
    }

    fn load_document(path: &Path, root_name: &str) -> BackendResult<XmlElement> {
        match std::fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Ok(XmlElement::new(root_name)),
            Ok(raw) => XmlElement::parse(&raw)
                .map_err(|e| BackendError::corrupted(format!("xml store document: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(XmlElement::new(root_name))
            }
            Err(e) => Err(BackendError::connection(format!(
                "xml store open {}: {e}",
                path.display()
            ))),
        }
    }

    fn persist(&self) -> BackendResult<()> {
        let document = self
            .root()?
            .to_document_string()
            .map_err(|e| BackendError::write(format!("serialize xml store: {e}")))?;
        std::fs::write(self.path()?, document)
            .map_err(|e| BackendError::write(format!("write xml store: {e}")))
    }

    fn node_matches(element: &XmlElement, key: EntityKey) -> bool {
        element.attr(KEY_ATTR) == Some(key.to_string().as_str())
    }
}

impl<E: VerifiedEntity> Backend<E> for XmlStoreBackend {
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()> {
        let path = PathBuf::from(&descriptor.url);
        let root = Self::load_document(&path, &descriptor.table)?;
        self.path = Some(path);
        self.root = Some(root);
        self.root_name = Some(descriptor.table.clone());
        self.in_batch = false;
        debug!(url = %descriptor.url, "xml store prepared");
        Ok(())
    }

    fn release(&mut self) {
        self.path = None;
        self.root = None;
        self.root_name = None;
        self.in_batch = false;
    }

    fn read(
        &mut self,
        codec: &dyn EntityCodec<E>,
        query: ReadQuery,
        into: &mut EntityMap<E>,
    ) -> BackendResult<()> {
        let root = self.root()?;
        match query {
            ReadQuery::All => {
                for element in root.children() {
                    let entity = codec.from_xml(element)?;
                    into.insert(entity.key(), entity);
                }
            }
            ReadQuery::ByKey(key) => {
                if let Some(element) = root
                    .children()
                    .iter()
                    .find(|element| Self::node_matches(element, key))
                {
                    let entity = codec.from_xml(element)?;
                    into.insert(entity.key(), entity);
                }
            }
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
        let entity = payload.expect_one()?;
        let key = entity.key();
        let node = codec.to_xml(entity);
        let root = self.root_mut()?;
        match operation {
            DataOperation::Add => {
                root.push_child(node);
            }
            DataOperation::Modify => {
                let slot = root
                    .children_mut()
                    .iter_mut()
                    .find(|element| Self::node_matches(element, key))
                    .ok_or_else(|| {
                        BackendError::write(format!("no node with key {key} to replace"))
                    })?;
                *slot = node;
            }
            DataOperation::Delete => {
                root.children_mut()
                    .retain(|element| !Self::node_matches(element, key));
            }
            DataOperation::Read | DataOperation::Search => unreachable!(),
        }
        if !self.in_batch {
            self.persist()?;
        }
        Ok(())
    }

    fn begin(&mut self) -> BackendResult<()> {
        if self.in_batch {
            return Err(BackendError::write("a batch is already open"));
        }
        self.root()?;
        self.in_batch = true;
        Ok(())
    }

    fn commit(&mut self) -> BackendResult<()> {
        if !self.in_batch {
            return Err(BackendError::write("no batch is open"));
        }
        self.persist()?;
        self.in_batch = false;
        Ok(())
    }

    fn rollback(&mut self) -> BackendResult<()> {
        if self.in_batch {
            // Discard the in-memory tree and reload the last persisted state.
            let path = self.path()?.to_path_buf();
            let root_name = self
                .root_name
                .clone()
                .ok_or_else(|| BackendError::connection("xml store is not prepared"))?;
            self.root = Some(Self::load_document(&path, &root_name)?);
            self.in_batch = false;
        }
        Ok(())
    }
}
