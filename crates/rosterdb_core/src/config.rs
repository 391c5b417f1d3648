//! Default connection descriptors from a JSON configuration document.
//!
//! The document holds one descriptor per backend the deployment knows
//! about; source selection looks the chosen kind up and hands a copy to
//! the orchestrator. Example:
//!
//! ```json
//! {
//!   "sources": [
//!     {"kind": "file-text", "url": "/data/roster.txt"},
//!     {"kind": "relational-sql", "dialect": "sqlite", "url": "/data/roster.db",
//!      "table": "player",
//!      "statements": {"read_all": "SELECT id, region, server, name FROM player",
//!                     "search": "SELECT id, region, server, name FROM player WHERE id = ?1",
//!                     "add": "INSERT INTO player (id, region, server, name) VALUES (?1, ?2, ?3, ?4)",
//!                     "modify": "UPDATE player SET region = ?1, server = ?2, name = ?3 WHERE id = ?4",
//!                     "delete": "DELETE FROM player WHERE id = ?1"}}
//!   ]
//! }
//! ```

use crate::error::{CoreError, CoreResult};
use rosterdb_backend::{BackendKind, Descriptor};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// The configured default descriptors, one per backend kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    sources: Vec<Descriptor>,
}

impl SourceConfig {
    /// Loads the configuration document from disk.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::configuration(format!("read {}: {e}", path.display()))
        })?;
        let config = Self::parse(&raw)?;
        debug!(path = %path.display(), sources = config.sources.len(), "configuration loaded");
        Ok(config)
    }

    /// Parses the configuration document from a string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed JSON or unknown
    /// backend identifiers.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::configuration(format!("parse source config: {e}")))
    }

    /// Returns the default descriptor for a backend kind.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the document configures no
    /// source of that kind.
    pub fn descriptor(&self, kind: BackendKind) -> CoreResult<Descriptor> {
        self.sources
            .iter()
            .find(|descriptor| descriptor.kind == kind)
            .cloned()
            .ok_or_else(|| {
                CoreError::configuration(format!("no configured source for {kind}"))
            })
    }

    /// The kinds this configuration can describe.
    pub fn kinds(&self) -> impl Iterator<Item = BackendKind> + '_ {
        self.sources.iter().map(|descriptor| descriptor.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "sources": [
            {"kind": "file-text", "url": "/data/roster.txt"},
            {"kind": "document-store", "url": "/data/docs.db", "table": "player"},
            {"kind": "http-json", "url": "https://roster.example",
             "endpoints": {"read": "/read", "write": "/write"}}
        ]
    }"#;

    #[test]
    fn parse_and_look_up() {
        let config = SourceConfig::parse(SAMPLE).unwrap();
        let descriptor = config.descriptor(BackendKind::DocumentStore).unwrap();
        assert_eq!(descriptor.url, "/data/docs.db");
        assert_eq!(config.kinds().count(), 3);
    }

    #[test]
    fn missing_kind_is_a_configuration_error() {
        let config = SourceConfig::parse(SAMPLE).unwrap();
        let err = config.descriptor(BackendKind::XmlNative).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn unknown_identifier_fails_to_parse() {
        let err = SourceConfig::parse(r#"{"sources": [{"kind": "graph-store", "url": "x"}]}"#)
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn malformed_json_fails_to_parse() {
        assert!(matches!(
            SourceConfig::parse("not json"),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = SourceConfig::load(&path).unwrap();
        assert!(config.descriptor(BackendKind::HttpJson).is_ok());

        let err = SourceConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
