//! Mapping-driven relational adapter over rusqlite.
//!
//! Where [`crate::SqlBackend`] executes templates supplied by the
//! descriptor, this adapter derives its schema and statements from the
//! codec's column mapping, the way a session-based mapper would: the table
//! is created from the mapping on first use, Add persists, Modify merges
//! (insert-or-replace), Delete removes by key.

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::{Descriptor, SqlDialect};
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_model::{DataOperation, EntityMap, VerifiedEntity};
use rusqlite::Connection;
use tracing::debug;

/// The mapping-driven relational adapter.
#[derive(Debug, Default)]
pub struct MappedSqlBackend {
    connection: Option<Connection>,
    table: Option<String>,
    schema_ready: bool,
    in_batch: bool,
}

impl MappedSqlBackend {
    /// Creates an unprepared adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&self) -> BackendResult<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| BackendError::connection("mapped sql backend is not prepared"))
    }

    fn table(&self) -> BackendResult<&str> {
        self.table
            .as_deref()
            .ok_or_else(|| BackendError::connection("mapped sql backend is not prepared"))
    }

    /// Creates the mapped table if it does not exist yet.
    fn ensure_schema<E>(&mut self, codec: &dyn EntityCodec<E>) -> BackendResult<()> {
        if self.schema_ready {
            return Ok(());
        }
        let columns = codec.columns();
        let table = self.table()?.to_string();
        let mut definitions = vec![format!("{} INTEGER PRIMARY KEY", columns[0])];
        definitions.extend(
            columns[1..]
                .iter()
                .map(|column| format!("{column} TEXT NOT NULL")),
        );
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} ({})",
            definitions.join(", ")
        );
        self.connection()?
            .execute_batch(&ddl)
            .map_err(|e| BackendError::write(format!("create mapped table: {e}")))?;
        self.schema_ready = true;
        Ok(())
    }

    fn select_sql<E>(&self, codec: &dyn EntityCodec<E>, by_key: bool) -> BackendResult<String> {
        let columns = codec.columns();
        let table = self.table()?;
        let key = columns[0];
        let projection = columns.join(", ");
        Ok(if by_key {
            format!("SELECT {projection} FROM {table} WHERE {key} = ?1")
        } else {
            format!("SELECT {projection} FROM {table} ORDER BY {key}")
        })
    }

    fn upsert_sql<E>(
        &self,
        codec: &dyn EntityCodec<E>,
        merge: bool,
    ) -> BackendResult<String> {
        let columns = codec.columns();
        let table = self.table()?;
        let projection = columns.join(", ");
        let placeholders: Vec<String> =
            (1..=columns.len()).map(|index| format!("?{index}")).collect();
        let verb = if merge { "INSERT OR REPLACE INTO" } else { "INSERT INTO" };
        Ok(format!(
            "{verb} {table} ({projection}) VALUES ({})",
            placeholders.join(", ")
        ))
    }
}

impl<E: VerifiedEntity> Backend<E> for MappedSqlBackend {
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()> {
        if descriptor.dialect == Some(SqlDialect::Mysql) {
            return Err(BackendError::configuration(
                "mysql dialect is not available: no server driver is linked",
            ));
        }
        let connection = Connection::open(&descriptor.url).map_err(|e| {
            BackendError::connection(format!("sqlite open {}: {e}", descriptor.url))
        })?;
        self.connection = Some(connection);
        self.table = Some(descriptor.table.clone());
        self.schema_ready = false;
        self.in_batch = false;
        debug!(url = %descriptor.url, table = %descriptor.table, "mapped sql backend prepared");
        Ok(())
    }

    fn release(&mut self) {
        self.connection = None;
        self.table = None;
        self.schema_ready = false;
        self.in_batch = false;
    }

    fn read(
        &mut self,
        codec: &dyn EntityCodec<E>,
        query: ReadQuery,
        into: &mut EntityMap<E>,
    ) -> BackendResult<()> {
        self.ensure_schema(codec)?;
        let connection = self.connection()?;
        let sql = self.select_sql(codec, matches!(query, ReadQuery::ByKey(_)))?;
        let mut statement = connection
            .prepare(&sql)
            .map_err(|e| BackendError::read(format!("prepare select: {e}")))?;
        if let ReadQuery::ByKey(key) = query {
            statement
                .raw_bind_parameter(1, key.get())
                .map_err(|e| BackendError::read(format!("bind search key: {e}")))?;
        }
        let mut rows = statement.raw_query();
        while let Some(row) = rows
            .next()
            .map_err(|e| BackendError::read(format!("fetch row: {e}")))?
        {
            let entity = codec.from_row(row)?;
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
        self.ensure_schema(codec)?;

        let sql = match operation {
            DataOperation::Add => self.upsert_sql(codec, false)?,
            DataOperation::Modify => self.upsert_sql(codec, true)?,
            DataOperation::Delete => {
                let table = self.table()?;
                format!("DELETE FROM {table} WHERE {} = ?1", codec.columns()[0])
            }
            DataOperation::Read | DataOperation::Search => unreachable!(),
        };

        let owns_transaction = !self.in_batch;
        let connection = self.connection()?;
        if owns_transaction {
            connection
                .execute_batch("BEGIN")
                .map_err(|e| BackendError::write(format!("begin: {e}")))?;
        }
        let result = (|| {
            match operation {
                DataOperation::Delete => {
                    connection
                        .execute(&sql, [entity.key().get()])
                        .map_err(|e| BackendError::write(format!("execute delete: {e}")))?;
                }
                _ => {
                    let values = codec.column_values(entity);
                    connection
                        .execute(&sql, rusqlite::params_from_iter(values.iter()))
                        .map_err(|e| BackendError::write(format!("execute {operation}: {e}")))?;
                }
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
