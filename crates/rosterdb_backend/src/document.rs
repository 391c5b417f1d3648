//! Document-store adapter: one JSON document per record.
//!
//! Documents carry the same field names as the relational columns with
//! string-typed region/server values; nothing at the storage layer enforces
//! referential integrity (the orchestrator's validation pass does).
//! Documents live in an embedded store keyed by the record key, so
//! update-by-key and delete-by-key are native operations.

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::Descriptor;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_model::{DataOperation, EntityMap, VerifiedEntity};
use rusqlite::Connection;
use tracing::debug;

/// The JSON document-store adapter.
#[derive(Debug, Default)]
pub struct DocumentBackend {
    connection: Option<Connection>,
    collection: Option<String>,
    in_batch: bool,
}

impl DocumentBackend {
    /// Creates an unprepared adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&self) -> BackendResult<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| BackendError::connection("document backend is not prepared"))
    }

    fn collection(&self) -> BackendResult<&str> {
        self.collection
            .as_deref()
            .ok_or_else(|| BackendError::connection("document backend is not prepared"))
    }
}

impl<E: VerifiedEntity> Backend<E> for DocumentBackend {
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()> {
        let connection = Connection::open(&descriptor.url).map_err(|e| {
            BackendError::connection(format!("document store open {}: {e}", descriptor.url))
        })?;
        connection
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY, doc TEXT NOT NULL)",
                descriptor.table
            ))
            .map_err(|e| BackendError::connection(format!("create collection: {e}")))?;
        self.connection = Some(connection);
        self.collection = Some(descriptor.table.clone());
        self.in_batch = false;
        debug!(url = %descriptor.url, collection = %descriptor.table, "document backend prepared");
        Ok(())
    }

    fn release(&mut self) {
        self.connection = None;
        self.collection = None;
        self.in_batch = false;
    }

    fn read(
        &mut self,
        codec: &dyn EntityCodec<E>,
        query: ReadQuery,
        into: &mut EntityMap<E>,
    ) -> BackendResult<()> {
        let connection = self.connection()?;
        let collection = self.collection()?;
        let sql = match query {
            ReadQuery::All => format!("SELECT doc FROM {collection} ORDER BY id"),
            ReadQuery::ByKey(_) => format!("SELECT doc FROM {collection} WHERE id = ?1"),
        };
        let mut statement = connection
            .prepare(&sql)
            .map_err(|e| BackendError::read(format!("prepare document scan: {e}")))?;
        if let ReadQuery::ByKey(key) = query {
            statement
                .raw_bind_parameter(1, key.get())
                .map_err(|e| BackendError::read(format!("bind search key: {e}")))?;
        }
        let mut rows = statement.raw_query();
        while let Some(row) = rows
            .next()
            .map_err(|e| BackendError::read(format!("fetch document: {e}")))?
        {
            let raw: String = row
                .get(0)
                .map_err(|e| BackendError::read(format!("document column: {e}")))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| BackendError::corrupted(format!("document is not json: {e}")))?;
            let document = value
                .as_object()
                .ok_or_else(|| BackendError::corrupted("document is not a json object"))?;
            let entity = codec.from_document(document)?;
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
        let entity = payload.expect_one()?;
        let key = entity.key().get();
        let owns_transaction = !self.in_batch;
        let connection = self.connection()?;
        let collection = self.collection()?.to_string();

        if owns_transaction {
            connection
                .execute_batch("BEGIN")
                .map_err(|e| BackendError::write(format!("begin: {e}")))?;
        }
        let result = (|| {
            match operation {
                DataOperation::Add | DataOperation::Modify => {
                    let document = serde_json::Value::Object(codec.to_document(entity));
                    let raw = document.to_string();
                    let sql = if operation == DataOperation::Add {
                        format!("INSERT INTO {collection} (id, doc) VALUES (?1, ?2)")
                    } else {
                        format!("UPDATE {collection} SET doc = ?2 WHERE id = ?1")
                    };
                    connection
                        .execute(&sql, rusqlite::params![key, raw])
                        .map_err(|e| BackendError::write(format!("{operation} document: {e}")))?;
                }
                DataOperation::Delete => {
                    connection
                        .execute(
                            &format!("DELETE FROM {collection} WHERE id = ?1"),
                            [key],
                        )
                        .map_err(|e| BackendError::write(format!("delete document: {e}")))?;
                }
                DataOperation::Read | DataOperation::Search => unreachable!(),
            }
            Ok(())
        })();
        match result {
            Ok(()) => {
                if owns_transaction {
                    connection
                        .execute_batch("COMMIT")
                        .map_err(|e| BackendError::write(format!("commit: {e}")))?;
                }
                Ok(())
            }
            Err(e) => {
                if owns_transaction {
                    let _ = connection.execute_batch("ROLLBACK");
                }
                Err(e)
            }
        }
    }

    fn begin(&mut self) -> BackendResult<()> {
        if self.in_batch {
            return Err(BackendError::write("a batch is already open"));
        }
        self.connection()?
            .execute_batch("BEGIN")
            .map_err(|e| BackendError::write(format!("begin batch: {e}")))?;
        self.in_batch = true;
        Ok(())
    }

    fn commit(&mut self) -> BackendResult<()> {
        if !self.in_batch {
            return Err(BackendError::write("no batch is open"));
        }
        self.connection()?
            .execute_batch("COMMIT")
            .map_err(|e| BackendError::write(format!("commit batch: {e}")))?;
        self.in_batch = false;
        Ok(())
    }

    fn rollback(&mut self) -> BackendResult<()> {
        if self.in_batch {
            self.connection()?
                .execute_batch("ROLLBACK")
                .map_err(|e| BackendError::write(format!("rollback batch: {e}")))?;
            self.in_batch = false;
        }
        Ok(())
    }
}
