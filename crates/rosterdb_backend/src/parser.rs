//! The entity codec contract: record to native-format translation, both directions.

use crate::error::BackendResult;
use rosterdb_model::DataOperation;
use rosterdb_codec::XmlElement;

/// Translates between a domain record and every backend-native form.
///
/// The codec is the only place that knows the record's fields; adapters
/// call the pair of methods matching their native representation and stay
/// generic over the record type. Inbound methods build a record from one
/// native unit; outbound methods serialize one record into it.
///
/// Wire conventions shared between codecs and adapters:
///
/// - `columns()` lists the relational columns, key column first; the
///   mapped-relational adapter derives its schema and statements from it.
/// - `bind_update` binds statement-template parameters in the fixed order
///   documented on [`crate::StatementSet`].
/// - XML record elements carry the key in an `id` attribute.
/// - Delimited-text fields use the same order as `columns()`.
pub trait EntityCodec<E>: Send + Sync {
    // Relational rows.

    /// Relational column names, key column first.
    fn columns(&self) -> &'static [&'static str];

    /// Builds a record from a result row (columns addressed by name).
    ///
    /// # Errors
    ///
    /// Returns a corrupted-data error for missing or mistyped columns.
    fn from_row(&self, row: &rusqlite::Row<'_>) -> BackendResult<E>;

    /// Returns the record's column values aligned with [`Self::columns`].
    fn column_values(&self, entity: &E) -> Vec<rusqlite::types::Value>;

    /// Binds a write statement's parameters for the given operation.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter cannot be bound or the operation is
    /// not a write.
    fn bind_update(
        &self,
        statement: &mut rusqlite::Statement<'_>,
        operation: DataOperation,
        entity: &E,
    ) -> BackendResult<()>;

    // JSON documents.

    /// Builds a record from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a corrupted-data error for missing or mistyped fields.
    fn from_document(
        &self,
        document: &serde_json::Map<String, serde_json::Value>,
    ) -> BackendResult<E>;

    /// Serializes a record into a JSON document.
    fn to_document(&self, entity: &E) -> serde_json::Map<String, serde_json::Value>;

    // XML nodes.

    /// Builds a record from an XML record element.
    ///
    /// # Errors
    ///
    /// Returns a corrupted-data error for missing attributes or children.
    fn from_xml(&self, element: &XmlElement) -> BackendResult<E>;

    /// Serializes a record into an XML record element.
    fn to_xml(&self, entity: &E) -> XmlElement;

    // Delimited text.

    /// Builds a record from one line's fields.
    ///
    /// # Errors
    ///
    /// Returns a corrupted-data error for a wrong field count or value.
    fn from_fields(&self, fields: &[String]) -> BackendResult<E>;

    /// Serializes a record into its delimited fields.
    fn to_fields(&self, entity: &E) -> Vec<String>;

    // Binary frames.

    /// Builds a record from a binary frame payload.
    ///
    /// # Errors
    ///
    /// Returns a corrupted-data error for an undecodable payload.
    fn from_frame(&self, payload: &[u8]) -> BackendResult<E>;

    /// Serializes a record into a binary frame payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded.
    fn to_frame(&self, entity: &E) -> BackendResult<Vec<u8>>;
}
