//! A minimal record type and codec shared by the adapter tests.
//!
//! The adapters are generic over any [`VerifiedEntity`] with a codec; the
//! tests exercise them with this two-field record rather than the shipped
//! domain type to keep the fixtures small.

use crate::descriptor::StatementSet;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_codec::XmlElement;
use rosterdb_model::{DataOperation, EntityKey, EntityMap, RegionLookup, VerifiedEntity};
use serde::{Deserialize, Serialize};

/// A minimal persistable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rec {
    /// Identity.
    pub key: EntityKey,
    /// The single payload field.
    pub label: String,
}

/// Shorthand constructor.
pub fn rec(key: i64, label: &str) -> Rec {
    Rec {
        key: EntityKey::new(key),
        label: label.to_string(),
    }
}

/// A small sample collection.
pub fn sample_map() -> EntityMap<Rec> {
    let mut map = EntityMap::new();
    for entity in [rec(1, "one"), rec(2, "two"), rec(3, "three")] {
        map.insert(entity.key, entity);
    }
    map
}

impl VerifiedEntity for Rec {
    fn key(&self) -> EntityKey {
        self.key
    }

    fn verify(&self, _lookup: &RegionLookup) -> Result<(), rosterdb_model::InvariantViolation> {
        Ok(())
    }
}

/// Codec for [`Rec`] covering every native form.
pub struct RecCodec;

impl EntityCodec<Rec> for RecCodec {
    fn columns(&self) -> &'static [&'static str] {
        &["id", "label"]
    }

    fn from_row(&self, row: &rusqlite::Row<'_>) -> BackendResult<Rec> {
        let key: i64 = row
            .get("id")
            .map_err(|e| BackendError::corrupted(format!("id column: {e}")))?;
        let label: String = row
            .get("label")
            .map_err(|e| BackendError::corrupted(format!("label column: {e}")))?;
        Ok(Rec {
            key: EntityKey::new(key),
            label,
        })
    }

    fn column_values(&self, entity: &Rec) -> Vec<rusqlite::types::Value> {
        vec![
            rusqlite::types::Value::Integer(entity.key.get()),
            rusqlite::types::Value::Text(entity.label.clone()),
        ]
    }

    fn bind_update(
        &self,
        statement: &mut rusqlite::Statement<'_>,
        operation: DataOperation,
        entity: &Rec,
    ) -> BackendResult<()> {
        let bind = |statement: &mut rusqlite::Statement<'_>,
                    index: usize,
                    value: &dyn rusqlite::ToSql|
         -> BackendResult<()> {
            statement
                .raw_bind_parameter(index, value)
                .map_err(|e| BackendError::write(format!("bind parameter {index}: {e}")))
        };
        match operation {
            DataOperation::Add => {
                bind(statement, 1, &entity.key.get())?;
                bind(statement, 2, &entity.label)?;
            }
            DataOperation::Modify => {
                bind(statement, 1, &entity.label)?;
                bind(statement, 2, &entity.key.get())?;
            }
            DataOperation::Delete => {
                bind(statement, 1, &entity.key.get())?;
            }
            DataOperation::Read | DataOperation::Search => {
                return Err(BackendError::configuration(format!(
                    "{operation} is not a write operation"
                )));
            }
        }
        Ok(())
    }

    fn from_document(
        &self,
        document: &serde_json::Map<String, serde_json::Value>,
    ) -> BackendResult<Rec> {
        let key = document
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| BackendError::corrupted("document has no integer id"))?;
        let label = document
            .get("label")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| BackendError::corrupted("document has no label"))?;
        Ok(rec(key, label))
    }

    fn to_document(&self, entity: &Rec) -> serde_json::Map<String, serde_json::Value> {
        let mut document = serde_json::Map::new();
        document.insert("id".to_string(), entity.key.get().into());
        document.insert("label".to_string(), entity.label.clone().into());
        document
    }

    fn from_xml(&self, element: &XmlElement) -> BackendResult<Rec> {
        let key: i64 = element
            .attr("id")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| BackendError::corrupted("element has no integer id attribute"))?;
        let label = element
            .child_text("label")
            .ok_or_else(|| BackendError::corrupted("element has no label child"))?;
        Ok(rec(key, label))
    }

    fn to_xml(&self, entity: &Rec) -> XmlElement {
        XmlElement::new("rec")
            .with_attr("id", entity.key.to_string())
            .with_child(XmlElement::new("label").with_text(entity.label.clone()))
    }

    fn from_fields(&self, fields: &[String]) -> BackendResult<Rec> {
        if fields.len() != 2 {
            return Err(BackendError::corrupted(format!(
                "expected 2 fields, got {}",
                fields.len()
            )));
        }
        let key: i64 = fields[0]
            .parse()
            .map_err(|e| BackendError::corrupted(format!("key field: {e}")))?;
        Ok(rec(key, &fields[1]))
    }

    fn to_fields(&self, entity: &Rec) -> Vec<String> {
        vec![entity.key.to_string(), entity.label.clone()]
    }

    fn from_frame(&self, payload: &[u8]) -> BackendResult<Rec> {
        rosterdb_codec::decode_record(payload)
            .map_err(|e| BackendError::corrupted(e.to_string()))
    }

    fn to_frame(&self, entity: &Rec) -> BackendResult<Vec<u8>> {
        rosterdb_codec::encode_record(entity).map_err(|e| BackendError::write(e.to_string()))
    }
}

/// Statement templates matching the `rec` test table.
pub fn rec_statements() -> StatementSet {
    StatementSet {
        read_all: "SELECT id, label FROM rec ORDER BY id".to_string(),
        search: "SELECT id, label FROM rec WHERE id = ?1".to_string(),
        add: "INSERT INTO rec (id, label) VALUES (?1, ?2)".to_string(),
        modify: "UPDATE rec SET label = ?1 WHERE id = ?2".to_string(),
        delete: "DELETE FROM rec WHERE id = ?1".to_string(),
    }
}
