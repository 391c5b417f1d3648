//! # rosterdb Backend
//!
//! Storage backend adapters for rosterdb.
//!
//! Every storage technology is driven through the same four-operation
//! contract - [`Backend::prepare`], [`Backend::read`], [`Backend::update`],
//! [`Backend::release`] - and a per-format entity codec ([`EntityCodec`])
//! that translates between domain records and each backend's native
//! representation. One adapter implementation therefore serves any record
//! type that supplies a matching codec.
//!
//! # Adapters
//!
//! | Kind              | Implementor          | Native form                |
//! |-------------------|----------------------|----------------------------|
//! | `relational-sql`  | [`SqlBackend`]       | rows via statement templates |
//! | `relational-orm`  | [`MappedSqlBackend`] | rows via a column mapping  |
//! | `document-store`  | [`DocumentBackend`]  | JSON documents             |
//! | `xml-native`      | [`XmlStoreBackend`]  | XML nodes, updated in place |
//! | `file-binary`     | [`BinaryFileBackend`]| CBOR record frames         |
//! | `file-xml`        | [`XmlFileBackend`]   | one XML document           |
//! | `file-text`       | [`TextFileBackend`]  | delimited lines            |
//! | `http-json`       | [`HttpJsonBackend`]  | remote JSON endpoints      |
//!
//! File-based adapters (de)serialize the entire collection as one unit and
//! reject key searches; live adapters stream one native unit per record and
//! support single-record writes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod binary_file;
mod descriptor;
mod document;
mod error;
mod factory;
mod http;
mod orm;
mod parser;
mod sql;
mod text_file;
mod xml_file;
mod xml_store;

pub use backend::{Backend, ReadQuery, WritePayload};
pub use binary_file::BinaryFileBackend;
pub use descriptor::{BackendKind, Descriptor, HttpEndpoints, SqlDialect, StatementSet};
pub use document::DocumentBackend;
pub use error::{BackendError, BackendResult};
pub use factory::new_backend;
pub use http::{HttpClient, HttpJsonBackend, ReqwestClient};
pub use orm::MappedSqlBackend;
pub use parser::EntityCodec;
pub use sql::{read_region_lookup, SqlBackend};
pub use text_file::TextFileBackend;
pub use xml_file::XmlFileBackend;
pub use xml_store::XmlStoreBackend;

#[cfg(test)]
pub(crate) mod testsupport;
