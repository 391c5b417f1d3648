//! Template-driven relational adapter over rusqlite.
//!
//! The descriptor carries the five statement templates (read-all, search,
//! add, modify, delete); the codec binds their parameters. Every write runs
//! in its own transaction unless a batch is open, and a failed write is
//! rolled back before the error propagates.

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::{Descriptor, SqlDialect, StatementSet};
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_model::{DataOperation, EntityMap, Region, RegionLookup, Server, VerifiedEntity};
use rusqlite::Connection;
use tracing::debug;

/// Join query over the reference tables; servers carry a foreign key to
/// their region.
const REGION_LOOKUP_QUERY: &str = "SELECT r.name_region, s.name_server \
     FROM region r JOIN server s ON s.region = r.name_region \
     ORDER BY r.name_region, s.name_server";

/// The template-driven relational adapter.
#[derive(Debug, Default)]
pub struct SqlBackend {
    connection: Option<Connection>,
    statements: Option<StatementSet>,
    in_batch: bool,
}

impl SqlBackend {
    /// Creates an unprepared adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&self) -> BackendResult<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| BackendError::connection("sql backend is not prepared"))
    }

    fn statements(&self) -> BackendResult<&StatementSet> {
        self.statements
            .as_ref()
            .ok_or_else(|| BackendError::connection("sql backend is not prepared"))
    }
}

impl<E: VerifiedEntity> Backend<E> for SqlBackend {
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()> {
        let dialect = descriptor.require_dialect()?;
        let statements = descriptor.require_statements()?.clone();
        let connection = match dialect {
            SqlDialect::Sqlite => Connection::open(&descriptor.url).map_err(|e| {
                BackendError::connection(format!("sqlite open {}: {e}", descriptor.url))
            })?,
            SqlDialect::Mysql => {
                return Err(BackendError::configuration(
                    "mysql dialect is not available: no server driver is linked",
                ));
            }
        };
        self.connection = Some(connection);
        self.statements = Some(statements);
        self.in_batch = false;
        debug!(url = %descriptor.url, "sql backend prepared");
        Ok(())
    }

    fn release(&mut self) {
        self.connection = None;
        self.statements = None;
        self.in_batch = false;
    }

    fn read(
        &mut self,
        codec: &dyn EntityCodec<E>,
        query: ReadQuery,
        into: &mut EntityMap<E>,
    ) -> BackendResult<()> {
        let connection = self.connection()?;
        let statements = self.statements()?;
        let mut statement = match query {
            ReadQuery::All => connection
                .prepare(&statements.read_all)
                .map_err(|e| BackendError::read(format!("prepare read-all: {e}")))?,
            ReadQuery::ByKey(key) => {
                let mut statement = connection
                    .prepare(&statements.search)
                    .map_err(|e| BackendError::read(format!("prepare search: {e}")))?;
                statement
                    .raw_bind_parameter(1, key.get())
                    .map_err(|e| BackendError::read(format!("bind search key: {e}")))?;
                statement
            }
        };
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
        let owns_transaction = !self.in_batch;
        let connection = self.connection()?;
        let sql = self.statements()?.write_statement(operation)?.to_string();

        if owns_transaction {
            connection
                .execute_batch("BEGIN")
                .map_err(|e| BackendError::write(format!("begin: {e}")))?;
        }
        let result = (|| {
            let mut statement = connection
                .prepare(&sql)
                .map_err(|e| BackendError::write(format!("prepare {operation}: {e}")))?;
            codec.bind_update(&mut statement, operation, entity)?;
            statement
                .raw_execute()
                .map_err(|e| BackendError::write(format!("execute {operation}: {e}")))?;
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

/// Loads the region-to-servers universe from the relational reference tables.
///
/// The lookup source is the embedded reference database named by the
/// descriptor's url; it is opened, drained, and closed in one call.
///
/// # Errors
///
/// Returns a connection error if the database cannot be opened and a read
/// error if the reference tables cannot be queried.
pub fn read_region_lookup(descriptor: &Descriptor) -> BackendResult<RegionLookup> {
    let connection = Connection::open(&descriptor.url)
        .map_err(|e| BackendError::connection(format!("sqlite open {}: {e}", descriptor.url)))?;
    let mut statement = connection
        .prepare(REGION_LOOKUP_QUERY)
        .map_err(|e| BackendError::read(format!("prepare region lookup: {e}")))?;
    let mut rows = statement
        .query([])
        .map_err(|e| BackendError::read(format!("query region lookup: {e}")))?;
    let mut lookup = RegionLookup::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| BackendError::read(format!("fetch region row: {e}")))?
    {
        let region: String = row
            .get(0)
            .map_err(|e| BackendError::corrupted(format!("region name: {e}")))?;
        let server: String = row
            .get(1)
            .map_err(|e| BackendError::corrupted(format!("server name: {e}")))?;
        lookup.insert(Region::new(region), Server::new(server));
    }
    Ok(lookup)
}
