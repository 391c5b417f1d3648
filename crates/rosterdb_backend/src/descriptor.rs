//! Connection descriptors: everything an adapter needs to open its backend.

use crate::error::{BackendError, BackendResult};
use rosterdb_model::DataOperation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The closed set of supported backend identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// CBOR record-frame file.
    FileBinary,
    /// XML document file.
    FileXml,
    /// Delimited-text file.
    FileText,
    /// Relational database via raw statement templates.
    RelationalSql,
    /// Relational database via a compile-time column mapping.
    RelationalOrm,
    /// JSON documents in an embedded store.
    DocumentStore,
    /// Persistent XML document store with node-level updates.
    XmlNative,
    /// Remote JSON service over HTTP.
    HttpJson,
}

impl BackendKind {
    /// Every kind, in a fixed order.
    pub const ALL: [BackendKind; 8] = [
        BackendKind::FileBinary,
        BackendKind::FileXml,
        BackendKind::FileText,
        BackendKind::RelationalSql,
        BackendKind::RelationalOrm,
        BackendKind::DocumentStore,
        BackendKind::XmlNative,
        BackendKind::HttpJson,
    ];

    /// Returns the configuration identifier for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileBinary => "file-binary",
            Self::FileXml => "file-xml",
            Self::FileText => "file-text",
            Self::RelationalSql => "relational-sql",
            Self::RelationalOrm => "relational-orm",
            Self::DocumentStore => "document-store",
            Self::XmlNative => "xml-native",
            Self::HttpJson => "http-json",
        }
    }

    /// Returns true for the flat-file kinds, which flush the whole
    /// collection on write instead of writing single records.
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::FileBinary | Self::FileXml | Self::FileText)
    }

    /// Returns the file extension for file kinds.
    #[must_use]
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::FileBinary => Some("bin"),
            Self::FileXml => Some("xml"),
            Self::FileText => Some("txt"),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                BackendError::configuration(format!("unknown backend identifier {s:?}"))
            })
    }
}

/// SQL dialect for the relational kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Embedded SQLite database; the descriptor url is the database path.
    Sqlite,
    /// MySQL server. Kept for descriptor compatibility; no driver is
    /// linked, so preparing a MySQL connection fails with a configuration
    /// error.
    Mysql,
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::Mysql => f.write_str("mysql"),
        }
    }
}

/// Precompiled statement templates for the template-driven SQL adapter.
///
/// Parameter order is fixed per operation and shared with the entity
/// codec's binding logic: ADD binds key, region, server, name; MODIFY
/// binds region, server, name, key; DELETE and SEARCH bind the key alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSet {
    /// Fetches every record.
    pub read_all: String,
    /// Fetches one record by key.
    pub search: String,
    /// Inserts one record.
    pub add: String,
    /// Overwrites one record by key.
    pub modify: String,
    /// Removes one record by key.
    pub delete: String,
}

impl StatementSet {
    /// Returns the write template for an operation tag.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for the read-direction tags.
    pub fn write_statement(&self, operation: DataOperation) -> BackendResult<&str> {
        match operation {
            DataOperation::Add => Ok(&self.add),
            DataOperation::Modify => Ok(&self.modify),
            DataOperation::Delete => Ok(&self.delete),
            DataOperation::Read | DataOperation::Search => Err(BackendError::configuration(
                format!("{operation} has no write statement"),
            )),
        }
    }
}

/// Endpoint paths of the remote JSON service, appended to the base url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpEndpoints {
    /// Path of the read endpoint.
    pub read: String,
    /// Path of the write endpoint.
    pub write: String,
}

/// Describes how to reach one backend instance.
///
/// Built once per source selection, immutable afterwards, and discarded
/// when the backend is released. For file kinds the url is the file path;
/// for the embedded stores it is the database path; for the remote service
/// it is the base url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Which adapter this descriptor is for.
    pub kind: BackendKind,
    /// SQL dialect, for the relational kinds.
    #[serde(default)]
    pub dialect: Option<SqlDialect>,
    /// Url, path, or base address of the backend.
    pub url: String,
    /// Server port, where applicable.
    #[serde(default)]
    pub port: Option<u16>,
    /// Database name, where applicable.
    #[serde(default)]
    pub database: Option<String>,
    /// User name for authenticated backends.
    #[serde(default)]
    pub user: Option<String>,
    /// Password for authenticated backends.
    #[serde(default)]
    pub password: Option<String>,
    /// Target table, collection, or root element name.
    #[serde(default = "Descriptor::default_table")]
    pub table: String,
    /// Statement templates for the template-driven SQL adapter.
    #[serde(default)]
    pub statements: Option<StatementSet>,
    /// Endpoint paths for the remote JSON service.
    #[serde(default)]
    pub endpoints: Option<HttpEndpoints>,
}

impl Descriptor {
    fn default_table() -> String {
        "player".to_string()
    }

    /// Creates a descriptor with the given kind and url.
    pub fn new(kind: BackendKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            dialect: None,
            url: url.into(),
            port: None,
            database: None,
            user: None,
            password: None,
            table: Self::default_table(),
            statements: None,
            endpoints: None,
        }
    }

    /// Creates a file descriptor, building `directory/name.ext` from the
    /// kind's extension.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for non-file kinds.
    pub fn file(kind: BackendKind, directory: &Path, name: &str) -> BackendResult<Self> {
        let extension = kind.extension().ok_or_else(|| {
            BackendError::configuration(format!("{kind} is not a file backend"))
        })?;
        let path = directory.join(format!("{name}.{extension}"));
        Ok(Self::new(kind, path.to_string_lossy().into_owned()))
    }

    /// Sets the SQL dialect.
    #[must_use]
    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the table, collection, or root element name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the statement templates.
    #[must_use]
    pub fn statements(mut self, statements: StatementSet) -> Self {
        self.statements = Some(statements);
        self
    }

    /// Sets the remote endpoint paths.
    #[must_use]
    pub fn endpoints(mut self, endpoints: HttpEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Returns the dialect or a configuration error.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no dialect is set.
    pub fn require_dialect(&self) -> BackendResult<SqlDialect> {
        self.dialect.ok_or_else(|| {
            BackendError::configuration(format!("{} descriptor has no SQL dialect", self.kind))
        })
    }

    /// Returns the statement templates or a configuration error.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no templates are set.
    pub fn require_statements(&self) -> BackendResult<&StatementSet> {
        self.statements.as_ref().ok_or_else(|| {
            BackendError::configuration(format!(
                "{} descriptor has no statement templates",
                self.kind
            ))
        })
    }

    /// Returns the endpoint paths or a configuration error.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no endpoints are set.
    pub fn require_endpoints(&self) -> BackendResult<&HttpEndpoints> {
        self.endpoints.as_ref().ok_or_else(|| {
            BackendError::configuration(format!("{} descriptor has no endpoints", self.kind))
        })
    }
}
