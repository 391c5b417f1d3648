//! Remote JSON service adapter over blocking HTTP.
//!
//! The HTTP client is abstracted behind a trait so tests (and in-process
//! services) can stand in for the network; the live implementation rides
//! `reqwest::blocking`. Protocol:
//!
//! - read: GET returns `{"status": "ok", "players": [{..}, ..]}` or
//!   `{"status": "error", "message": ".."}`
//! - write: POST takes `[{.., "operation": "ADD"|"MODIFY"|"DELETE"}, ..]`
//!   and returns `{"status": "ok"}` or an error envelope

use crate::backend::{require_write_operation, Backend, ReadQuery, WritePayload};
use crate::descriptor::Descriptor;
use crate::error::{BackendError, BackendResult};
use crate::parser::EntityCodec;
use rosterdb_model::{DataOperation, EntityMap, VerifiedEntity};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// HTTP client abstraction.
///
/// Implement this to provide the transport; errors are plain strings that
/// the adapter wraps into backend error kinds.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the decoded JSON body.
    fn get_json(&self, url: &str) -> Result<Value, String>;

    /// Sends a POST request with a JSON body and returns the decoded
    /// JSON response.
    fn post_json(&self, url: &str, body: &Value) -> Result<Value, String>;
}

/// Blocking reqwest implementation of [`HttpClient`].
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Builds a client with a 30 second request timeout.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the client cannot be constructed.
    pub fn new() -> BackendResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::connection(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get_json(&self, url: &str) -> Result<Value, String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| format!("GET {url}: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("HTTP {} from {url}", response.status()));
        }
        response.json().map_err(|e| format!("decode body: {e}"))
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value, String> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(|e| format!("POST {url}: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("HTTP {} from {url}", response.status()));
        }
        response.json().map_err(|e| format!("decode body: {e}"))
    }
}

/// Who owns the current client: injected clients survive `release` so a
/// test double can serve several prepare/release cycles, while self-built
/// clients are freed with the connection.
enum ClientSlot {
    Empty,
    Injected(Box<dyn HttpClient>),
    Built(Box<dyn HttpClient>),
}

/// The remote JSON service adapter.
pub struct HttpJsonBackend {
    client: ClientSlot,
    read_url: Option<String>,
    write_url: Option<String>,
}

impl Default for HttpJsonBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpJsonBackend {
    /// Creates an adapter that builds its own HTTP client on prepare.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: ClientSlot::Empty,
            read_url: None,
            write_url: None,
        }
    }

    /// Creates an adapter over a supplied client (a test double or an
    /// in-process service).
    #[must_use]
    pub fn with_client(client: Box<dyn HttpClient>) -> Self {
        Self {
            client: ClientSlot::Injected(client),
            read_url: None,
            write_url: None,
        }
    }

    fn client(&self) -> BackendResult<&dyn HttpClient> {
        match &self.client {
            ClientSlot::Injected(client) | ClientSlot::Built(client) => Ok(client.as_ref()),
            ClientSlot::Empty => Err(BackendError::connection("http backend is not prepared")),
        }
    }

    fn read_url(&self) -> BackendResult<&str> {
        self.read_url
            .as_deref()
            .ok_or_else(|| BackendError::connection("http backend is not prepared"))
    }

    fn write_url(&self) -> BackendResult<&str> {
        self.write_url
            .as_deref()
            .ok_or_else(|| BackendError::connection("http backend is not prepared"))
    }
}

/// Extracts the status field, defaulting to an error for envelopes
/// without one.
fn status_of(envelope: &Value) -> &str {
    envelope
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("error")
}

fn message_of(envelope: &Value) -> String {
    envelope
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("service reported an error without a message")
        .to_string()
}

impl<E: VerifiedEntity> Backend<E> for HttpJsonBackend {
    fn prepare(&mut self, descriptor: &Descriptor) -> BackendResult<()> {
        let endpoints = descriptor.require_endpoints()?;
        self.read_url = Some(format!("{}{}", descriptor.url, endpoints.read));
        self.write_url = Some(format!("{}{}", descriptor.url, endpoints.write));
        if matches!(self.client, ClientSlot::Empty) {
            self.client = ClientSlot::Built(Box::new(ReqwestClient::new()?));
        }
        debug!(url = %descriptor.url, "http backend prepared");
        Ok(())
    }

    fn release(&mut self) {
        self.read_url = None;
        self.write_url = None;
        if matches!(self.client, ClientSlot::Built(_)) {
            self.client = ClientSlot::Empty;
        }
    }

    fn read(
        &mut self,
        codec: &dyn EntityCodec<E>,
        query: ReadQuery,
        into: &mut EntityMap<E>,
    ) -> BackendResult<()> {
        let url = self.read_url()?;
        let envelope = self
            .client()?
            .get_json(url)
            .map_err(BackendError::read)?;
        if status_of(&envelope) == "error" {
            return Err(BackendError::read(message_of(&envelope)));
        }
        let players = envelope
            .get("players")
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::corrupted("response has no players array"))?;
        if players.is_empty() {
            info!(url, "service returned no records");
            return Ok(());
        }
        for player in players {
            let document = player
                .as_object()
                .ok_or_else(|| BackendError::corrupted("player entry is not an object"))?;
            let entity = codec.from_document(document)?;
            match query {
                ReadQuery::All => {
                    into.insert(entity.key(), entity);
                }
                ReadQuery::ByKey(key) => {
                    if entity.key() == key {
                        into.insert(entity.key(), entity);
                    }
                }
            }
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
        let mut document = codec.to_document(entity);
        document.insert("operation".to_string(), operation.to_string().into());
        let body = Value::Array(vec![Value::Object(document)]);

        let url = self.write_url()?;
        let envelope = self
            .client()?
            .post_json(url, &body)
            .map_err(BackendError::write)?;
        if status_of(&envelope) == "error" {
            return Err(BackendError::write(message_of(&envelope)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::HttpEndpoints;
    use crate::testsupport::{rec, Rec, RecCodec};
    use rosterdb_model::EntityKey;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Canned-response client in the spirit of a mock transport. Posted
    /// bodies are captured through a handle the test keeps.
    struct MockClient {
        read_response: Value,
        write_response: Value,
        posted: Arc<Mutex<Vec<Value>>>,
    }

    impl MockClient {
        fn new(read_response: Value, write_response: Value) -> Self {
            Self {
                read_response,
                write_response,
                posted: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn posted_handle(&self) -> Arc<Mutex<Vec<Value>>> {
            Arc::clone(&self.posted)
        }
    }

    impl HttpClient for MockClient {
        fn get_json(&self, _url: &str) -> Result<Value, String> {
            Ok(self.read_response.clone())
        }

        fn post_json(&self, _url: &str, body: &Value) -> Result<Value, String> {
            self.posted.lock().unwrap().push(body.clone());
            Ok(self.write_response.clone())
        }
    }

    fn http_descriptor() -> Descriptor {
        Descriptor::new(crate::BackendKind::HttpJson, "https://roster.example").endpoints(
            HttpEndpoints {
                read: "/read".to_string(),
                write: "/write".to_string(),
            },
        )
    }

    fn ok_players() -> Value {
        json!({
            "status": "ok",
            "players": [
                {"id": 1, "label": "one"},
                {"id": 2, "label": "two"},
            ]
        })
    }

    #[test]
    fn read_parses_the_players_array() {
        let mut backend = HttpJsonBackend::with_client(Box::new(MockClient::new(
            ok_players(),
            json!({"status": "ok"}),
        )));
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        adapter.prepare(&http_descriptor()).unwrap();

        let mut map = EntityMap::new();
        adapter.read(&RecCodec, ReadQuery::All, &mut map).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&EntityKey::new(1)].label, "one");
        adapter.release();
    }

    #[test]
    fn search_filters_to_the_requested_key() {
        let mut backend = HttpJsonBackend::with_client(Box::new(MockClient::new(
            ok_players(),
            json!({"status": "ok"}),
        )));
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        adapter.prepare(&http_descriptor()).unwrap();

        let mut map = EntityMap::new();
        adapter
            .read(&RecCodec, ReadQuery::ByKey(EntityKey::new(2)), &mut map)
            .unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&EntityKey::new(2)));
        adapter.release();
    }

    #[test]
    fn error_envelope_surfaces_the_message() {
        let mut backend = HttpJsonBackend::with_client(Box::new(MockClient::new(
            json!({"status": "error", "message": "database offline"}),
            json!({"status": "ok"}),
        )));
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        adapter.prepare(&http_descriptor()).unwrap();

        let mut map = EntityMap::new();
        let err = adapter
            .read(&RecCodec, ReadQuery::All, &mut map)
            .unwrap_err();
        match err {
            BackendError::Read(message) => assert!(message.contains("database offline")),
            other => panic!("unexpected error: {other}"),
        }
        adapter.release();
    }

    #[test]
    fn empty_players_array_is_empty_data() {
        let mut backend = HttpJsonBackend::with_client(Box::new(MockClient::new(
            json!({"status": "ok", "players": []}),
            json!({"status": "ok"}),
        )));
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        adapter.prepare(&http_descriptor()).unwrap();

        let mut map = EntityMap::new();
        adapter.read(&RecCodec, ReadQuery::All, &mut map).unwrap();
        assert!(map.is_empty());
        adapter.release();
    }

    #[test]
    fn write_posts_the_operation_tag() {
        let client = MockClient::new(ok_players(), json!({"status": "ok"}));
        let posted = client.posted_handle();

        let mut backend = HttpJsonBackend::with_client(Box::new(client));
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        adapter.prepare(&http_descriptor()).unwrap();
        adapter
            .update(
                &RecCodec,
                DataOperation::Delete,
                WritePayload::One(&rec(7, "seven")),
            )
            .unwrap();
        adapter.release();

        let bodies = posted.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        let entry = &bodies[0][0];
        assert_eq!(entry["id"], 7);
        assert_eq!(entry["operation"], "DELETE");
    }

    #[test]
    fn injected_client_survives_release() {
        let mut backend = HttpJsonBackend::with_client(Box::new(MockClient::new(
            ok_players(),
            json!({"status": "ok"}),
        )));
        {
            let adapter: &mut dyn Backend<Rec> = &mut backend;
            adapter.prepare(&http_descriptor()).unwrap();
            adapter.release();
        }
        // A second cycle must reuse the injected client instead of trying
        // to build a live one.
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        adapter.prepare(&http_descriptor()).unwrap();
        let mut map = EntityMap::new();
        adapter.read(&RecCodec, ReadQuery::All, &mut map).unwrap();
        assert_eq!(map.len(), 2);
        adapter.release();
    }

    #[test]
    fn write_error_envelope_fails() {
        let mut backend = HttpJsonBackend::with_client(Box::new(MockClient::new(
            ok_players(),
            json!({"status": "error", "message": "readonly"}),
        )));
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        adapter.prepare(&http_descriptor()).unwrap();
        let err = adapter
            .update(
                &RecCodec,
                DataOperation::Add,
                WritePayload::One(&rec(1, "one")),
            )
            .unwrap_err();
        assert!(matches!(err, BackendError::Write(_)));
        adapter.release();
    }

    #[test]
    fn missing_endpoints_is_a_configuration_error() {
        let mut backend = HttpJsonBackend::new();
        let adapter: &mut dyn Backend<Rec> = &mut backend;
        let descriptor = Descriptor::new(crate::BackendKind::HttpJson, "https://roster.example");
        let err = adapter.prepare(&descriptor).unwrap_err();
        assert!(matches!(err, BackendError::Configuration(_)));
    }
}
