//! The entity codec for the shipped record type.
//!
//! One parser, one method pair per native form. Wire conventions:
//!
//! - relational columns `id, region, server, name` (key first)
//! - ADD binds key, region, server, name; MODIFY binds region, server,
//!   name, key; DELETE binds the key alone
//! - XML record elements are `<player id="..">` with `region`, `server`,
//!   and `name` children
//! - delimited-text fields follow the column order
//! - binary frames are the CBOR encoding of the record

use rosterdb_backend::{BackendError, BackendResult, EntityCodec};
use rosterdb_codec::XmlElement;
use rosterdb_model::{DataOperation, Player, Region, Server};

/// Codec for [`Player`] records.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerParser;

impl PlayerParser {
    const COLUMNS: &'static [&'static str] = &["id", "region", "server", "name"];
}

impl EntityCodec<Player> for PlayerParser {
    fn columns(&self) -> &'static [&'static str] {
        Self::COLUMNS
    }

    fn from_row(&self, row: &rusqlite::Row<'_>) -> BackendResult<Player> {
        let key: i64 = row
            .get("id")
            .map_err(|e| BackendError::corrupted(format!("id column: {e}")))?;
        let region: String = row
            .get("region")
            .map_err(|e| BackendError::corrupted(format!("region column: {e}")))?;
        let server: String = row
            .get("server")
            .map_err(|e| BackendError::corrupted(format!("server column: {e}")))?;
        let name: String = row
            .get("name")
            .map_err(|e| BackendError::corrupted(format!("name column: {e}")))?;
        Ok(Player::new(key, name, Region::new(region), Server::new(server)))
    }

    fn column_values(&self, entity: &Player) -> Vec<rusqlite::types::Value> {
        vec![
            rusqlite::types::Value::Integer(entity.key.get()),
            rusqlite::types::Value::Text(entity.region.name().to_string()),
            rusqlite::types::Value::Text(entity.server.name().to_string()),
            rusqlite::types::Value::Text(entity.name.clone()),
        ]
    }

    fn bind_update(
        &self,
        statement: &mut rusqlite::Statement<'_>,
        operation: DataOperation,
        entity: &Player,
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
                bind(statement, 2, &entity.region.name())?;
                bind(statement, 3, &entity.server.name())?;
                bind(statement, 4, &entity.name)?;
            }
            DataOperation::Modify => {
                bind(statement, 1, &entity.region.name())?;
                bind(statement, 2, &entity.server.name())?;
                bind(statement, 3, &entity.name)?;
                bind(statement, 4, &entity.key.get())?;
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
    ) -> BackendResult<Player> {
        let key = document
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| BackendError::corrupted("document has no integer id"))?;
        let field = |name: &str| -> BackendResult<&str> {
            document
                .get(name)
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| BackendError::corrupted(format!("document has no {name}")))
        };
        Ok(Player::new(
            key,
            field("name")?,
            Region::new(field("region")?),
            Server::new(field("server")?),
        ))
    }

    fn to_document(&self, entity: &Player) -> serde_json::Map<String, serde_json::Value> {
        let mut document = serde_json::Map::new();
        document.insert("id".to_string(), entity.key.get().into());
        document.insert("name".to_string(), entity.name.clone().into());
        document.insert("region".to_string(), entity.region.name().into());
        document.insert("server".to_string(), entity.server.name().into());
        document
    }

    fn from_xml(&self, element: &XmlElement) -> BackendResult<Player> {
        let key: i64 = element
            .attr("id")
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| BackendError::corrupted("player element has no integer id"))?;
        let child = |name: &str| -> BackendResult<&str> {
            element
                .child_text(name)
                .ok_or_else(|| BackendError::corrupted(format!("player element has no {name}")))
        };
        Ok(Player::new(
            key,
            child("name")?,
            Region::new(child("region")?),
            Server::new(child("server")?),
        ))
    }

    fn to_xml(&self, entity: &Player) -> XmlElement {
        XmlElement::new("player")
            .with_attr("id", entity.key.to_string())
            .with_child(XmlElement::new("region").with_text(entity.region.name()))
            .with_child(XmlElement::new("server").with_text(entity.server.name()))
            .with_child(XmlElement::new("name").with_text(entity.name.clone()))
    }

    fn from_fields(&self, fields: &[String]) -> BackendResult<Player> {
        if fields.len() != Self::COLUMNS.len() {
            return Err(BackendError::corrupted(format!(
                "expected {} fields, got {}",
                Self::COLUMNS.len(),
                fields.len()
            )));
        }
        let key: i64 = fields[0]
            .parse()
            .map_err(|e| BackendError::corrupted(format!("key field: {e}")))?;
        Ok(Player::new(
            key,
            fields[3].clone(),
            Region::new(fields[1].clone()),
            Server::new(fields[2].clone()),
        ))
    }

    fn to_fields(&self, entity: &Player) -> Vec<String> {
        vec![
            entity.key.to_string(),
            entity.region.name().to_string(),
            entity.server.name().to_string(),
            entity.name.clone(),
        ]
    }

    fn from_frame(&self, payload: &[u8]) -> BackendResult<Player> {
        rosterdb_codec::decode_record(payload)
            .map_err(|e| BackendError::corrupted(e.to_string()))
    }

    fn to_frame(&self, entity: &Player) -> BackendResult<Vec<u8>> {
        rosterdb_codec::encode_record(entity).map_err(|e| BackendError::write(e.to_string()))
    }
}
