//! Shared fixtures for the integration tests: in-memory request/response
//! capability implementations, a recording websocket transport, and engine
//! factories.

#![allow(dead_code)]

use routedecl::render::RenderError;
use routedecl::websocket::{SocketHandler, SocketSession, SocketTransport};
use routedecl::{EngineFactory, JinjaEngine, TemplateEngine};
use std::collections::HashMap;
use std::sync::{Arc, Once};

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Minimal request capability for driving the router directly.
pub struct TestRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    body: Option<String>,
}

impl TestRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            headers: HashMap::new(),
            query: HashMap::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: &str) -> Self {
        Self::new("POST", path)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }
}

impl routedecl::http::Request for TestRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Minimal response capability; starts at 200 with an empty body.
pub struct TestResponse {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

impl Default for TestResponse {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            headers: Vec::new(),
        }
    }
}

impl TestResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl routedecl::http::Response for TestResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn body(&self) -> &str {
        &self.body
    }

    fn set_body(&mut self, body: String) {
        self.body = body;
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value));
    }
}

/// Transport that records the bindings it is handed.
#[derive(Default)]
pub struct RecordingTransport {
    pub bindings: Vec<(String, Arc<dyn SocketHandler>)>,
}

impl SocketTransport for RecordingTransport {
    fn bind(&mut self, path: &str, handler: Arc<dyn SocketHandler>) {
        self.bindings.push((path.to_string(), handler));
    }
}

/// Session stub that collects everything sent to it.
#[derive(Default)]
pub struct TestSession {
    pub sent: parking_lot::Mutex<Vec<String>>,
}

impl SocketSession for TestSession {
    fn send(&self, message: &str) {
        self.sent.lock().push(message.to_string());
    }
}

/// Factory whose engines know the templates the fixtures render with.
pub fn template_factory() -> EngineFactory {
    Arc::new(|| {
        let engine = JinjaEngine::from_templates([
            ("pet.html", "pet {{ name }}"),
            ("list.html", "pets: {{ count }}"),
            ("main.html", "[{{ code }}] {{ errorMsg }}"),
        ])?;
        Ok(Box::new(engine) as Box<dyn TemplateEngine>)
    })
}

/// Factory that can never construct an engine.
pub fn failing_factory() -> EngineFactory {
    Arc::new(|| Err(RenderError::Construct("engine unavailable".to_string())))
}
