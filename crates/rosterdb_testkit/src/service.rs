//! An in-process implementation of the remote JSON roster protocol.

use rosterdb_backend::HttpClient;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Serves the read/write endpoints of the remote JSON protocol from
/// memory, so the HTTP adapter can be driven end-to-end without a network.
///
/// Writes enforce unique keys: adding an existing key or modifying a
/// missing one yields an error envelope, which makes ordering mistakes in
/// callers visible. Wrap the service in an [`Arc`] and hand a clone to the
/// adapter to keep a handle for assertions.
#[derive(Debug, Default)]
pub struct JsonRosterService {
    records: Mutex<BTreeMap<i64, Map<String, Value>>>,
}

impl JsonRosterService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored records with the given documents.
    ///
    /// Each document must carry an integer `id` field.
    pub fn seed(&self, documents: Vec<Map<String, Value>>) {
        let mut records = self.records.lock().expect("service lock");
        records.clear();
        for document in documents {
            let key = document
                .get("id")
                .and_then(Value::as_i64)
                .expect("seed document has an integer id");
            records.insert(key, document);
        }
    }

    /// Returns the stored documents ordered by key.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Map<String, Value>> {
        self.records
            .lock()
            .expect("service lock")
            .values()
            .cloned()
            .collect()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().expect("service lock").len()
    }

    /// Returns true when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_envelope(&self) -> Value {
        let players: Vec<Value> = self
            .records
            .lock()
            .expect("service lock")
            .values()
            .cloned()
            .map(Value::Object)
            .collect();
        json!({"status": "ok", "players": players})
    }

    fn error(message: &str) -> Value {
        json!({"status": "error", "message": message})
    }

    fn apply(&self, body: &Value) -> Value {
        let Some(batch) = body.as_array() else {
            return Self::error("write body is not an array");
        };
        let mut records = self.records.lock().expect("service lock");
        for entry in batch {
            let Some(entry) = entry.as_object() else {
                return Self::error("write entry is not an object");
            };
            let Some(key) = entry.get("id").and_then(Value::as_i64) else {
                return Self::error("write entry has no integer id");
            };
            let Some(operation) = entry.get("operation").and_then(Value::as_str) else {
                return Self::error("write entry has no operation");
            };
            let mut document = entry.clone();
            document.remove("operation");
            match operation {
                "ADD" => {
                    if records.contains_key(&key) {
                        return Self::error("duplicate id on ADD");
                    }
                    records.insert(key, document);
                }
                "MODIFY" => {
                    if !records.contains_key(&key) {
                        return Self::error("unknown id on MODIFY");
                    }
                    records.insert(key, document);
                }
                "DELETE" => {
                    records.remove(&key);
                }
                other => return Self::error(&format!("unknown operation {other}")),
            }
        }
        json!({"status": "ok"})
    }
}

impl HttpClient for JsonRosterService {
    fn get_json(&self, _url: &str) -> Result<Value, String> {
        Ok(self.read_envelope())
    }

    fn post_json(&self, _url: &str, body: &Value) -> Result<Value, String> {
        Ok(self.apply(body))
    }
}

/// A cloneable handle to a shared [`JsonRosterService`].
///
/// The adapter takes ownership of its client; handing it a handle keeps
/// the service itself available to the test for assertions.
#[derive(Debug, Clone)]
pub struct ServiceHandle(Arc<JsonRosterService>);

impl ServiceHandle {
    /// Wraps a shared service.
    #[must_use]
    pub fn new(service: Arc<JsonRosterService>) -> Self {
        Self(service)
    }
}

impl HttpClient for ServiceHandle {
    fn get_json(&self, url: &str) -> Result<Value, String> {
        self.0.get_json(url)
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value, String> {
        self.0.post_json(url, body)
    }
}
