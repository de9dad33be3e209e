//! Structured domain failures for route handlers.

use thiserror::Error;

/// An application-level HTTP error raised by a route handler, distinct from
/// infrastructure failures. Carries the status code the response should use.
///
/// Propagated by return value through the handler boundary; the dispatcher
/// pattern-matches on the `Result` instead of catching anything.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RouteError {
    /// HTTP status code to render with (404, 403, 500, ...).
    pub status: u16,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RouteError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause. The cause chain is what the error page
    /// surfaces as `errorStack`.
    pub fn with_source(
        status: u16,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Generic 500 for failures the handler did not classify.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// Render the cause chain as one line per cause, outermost first.
    /// `None` when there is no underlying cause.
    #[must_use]
    pub fn source_chain(&self) -> Option<String> {
        let mut cause: Option<&(dyn std::error::Error + 'static)> =
            self.source.as_deref().map(|e| e as _);
        let mut lines = Vec::new();
        while let Some(err) = cause {
            lines.push(err.to_string());
            cause = err.source();
        }
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_chain_formats_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = RouteError::with_source(500, "lookup failed", io);
        assert_eq!(err.source_chain().as_deref(), Some("disk on fire"));
        assert!(RouteError::new(404, "nope").source_chain().is_none());
    }
}
