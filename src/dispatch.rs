//! Error and fallback dispatch: turning failures into rendered responses.
//!
//! Installed on the route table at setup time as the not-found page, the
//! internal-error page, and the sink for structured handler failures. Every
//! path through here produces a well-formed response: a fresh template
//! engine is built per render (or the fallback serializer when the engine
//! cannot be constructed), so errors stay renderable even in a degraded
//! server state.

use crate::errors::RouteError;
use crate::render::{
    engine_or_fallback, EngineFactory, FallbackRenderer, Model, TemplateEngine, ViewModel,
};
use crate::router::{ErrorPage, ErrorSink};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// The error payload rendered into the main template (or serialized raw by
/// the fallback renderer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    error: bool,
    error_msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_stack: Option<String>,
    code: String,
}

impl ErrorPayload {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            error: true,
            error_msg: message.into(),
            error_stack: None,
            code: status.to_string(),
        }
    }

    fn model(&self) -> Model {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            // Serialization of this struct cannot fail in practice; keep the
            // response well-formed anyway.
            _ => Model::new(),
        }
    }
}

/// Maps failures and not-found conditions to rendered error payloads.
#[derive(Clone)]
pub struct ErrorDispatcher {
    factory: EngineFactory,
    main_template: String,
}

impl ErrorDispatcher {
    pub fn new(factory: EngineFactory, main_template: impl Into<String>) -> Self {
        Self {
            factory,
            main_template: main_template.into(),
        }
    }

    fn render(&self, payload: &ErrorPayload) -> String {
        let engine = engine_or_fallback(&self.factory);
        let view = ViewModel::new(payload.model(), self.main_template.clone());
        match engine.render(&view) {
            Ok(body) => body,
            Err(err) => {
                error!(
                    template = %self.main_template,
                    error = %err,
                    "error page rendering failed, serializing payload instead"
                );
                FallbackRenderer
                    .render(&view)
                    .unwrap_or_else(|_| format!("{{\"error\":true,\"code\":\"{}\"}}", payload.code))
            }
        }
    }

    fn write(&self, status: u16, payload: &ErrorPayload, resp: &mut dyn crate::http::Response) {
        let body = self.render(payload);
        resp.set_status(status);
        resp.set_body(body);
    }

    /// Render a structured handler failure with its carried status code.
    pub fn route_error(&self, err: &RouteError, resp: &mut dyn crate::http::Response) {
        let mut payload = ErrorPayload::new(err.status, err.message.clone());
        payload.error_stack = err.source_chain();
        self.write(err.status, &payload, resp);
    }

    /// Sink to install via [`RouteTable::on_error`](crate::router::RouteTable::on_error).
    #[must_use]
    pub fn error_sink(&self) -> ErrorSink {
        let this = self.clone();
        Arc::new(move |err, _req, resp| this.route_error(err, resp))
    }

    /// Page rendered when no route matches.
    #[must_use]
    pub fn not_found_page(&self) -> ErrorPage {
        let this = self.clone();
        Arc::new(move |_req, resp| {
            let payload = ErrorPayload::new(404, "the page you were looking for was not found");
            this.write(404, &payload, resp);
        })
    }

    /// Page rendered for server failures that carry no structured error.
    #[must_use]
    pub fn internal_error_page(&self) -> ErrorPage {
        let this = self.clone();
        Arc::new(move |_req, resp| {
            let payload = ErrorPayload::new(500, "there was an error on the server");
            this.write(500, &payload, resp);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let mut payload = ErrorPayload::new(403, "forbidden");
        payload.error_stack = Some("cause".to_string());
        let model = payload.model();
        assert_eq!(model.get("error"), Some(&serde_json::json!(true)));
        assert_eq!(model.get("errorMsg"), Some(&serde_json::json!("forbidden")));
        assert_eq!(model.get("errorStack"), Some(&serde_json::json!("cause")));
        assert_eq!(model.get("code"), Some(&serde_json::json!("403")));
    }

    #[test]
    fn test_stack_omitted_without_cause() {
        let model = ErrorPayload::new(500, "boom").model();
        assert!(!model.contains_key("errorStack"));
    }
}
