//! Metadata model for declarative routing.
//!
//! These are the values application code attaches to its declarations:
//! a base path for a controller, a verb/path/template triple for a route
//! method, a phase for a filter method, and a path for a websocket endpoint.
//! All metadata is read-only and consumed exactly once during initialization.

/// HTTP verbs a route method may bind to.
///
/// Deliberately restricted to the verbs the registrar knows how to install;
/// anything else on the wire falls through to the not-found path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl HttpMethod {
    /// Parse a wire-format method name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When a filter hook runs relative to route dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPhase {
    Before,
    After,
}

impl std::fmt::Display for FilterPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterPhase::Before => write!(f, "before"),
            FilterPhase::After => write!(f, "after"),
        }
    }
}

/// Type-level metadata for a controller: the base path all of its routes
/// hang off. A trailing `/` is stripped before concatenation so that
/// `/pets/` + `/list` yields `/pets/list`, never a double slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerMeta {
    pub base_path: String,
}

impl ControllerMeta {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base path with any trailing slashes removed.
    #[must_use]
    pub fn normalized_base(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }
}

/// Method-level metadata for a route: relative path, verb, and the template
/// the returned model is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub path: String,
    pub method: HttpMethod,
    pub template: String,
}

impl RouteMeta {
    pub fn new(method: HttpMethod, path: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            template: template.into(),
        }
    }

    pub fn get(path: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, template)
    }

    pub fn post(path: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path, template)
    }

    pub fn put(path: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path, template)
    }

    pub fn delete(path: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path, template)
    }

    pub fn options(path: impl Into<String>, template: impl Into<String>) -> Self {
        Self::new(HttpMethod::Options, path, template)
    }
}

/// Method-level metadata for a filter hook. Filters have no path scoping;
/// they are global and ordered by declaration order within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterMeta {
    pub phase: FilterPhase,
}

impl FilterMeta {
    #[must_use]
    pub fn before() -> Self {
        Self {
            phase: FilterPhase::Before,
        }
    }

    #[must_use]
    pub fn after() -> Self {
        Self {
            phase: FilterPhase::After,
        }
    }
}

/// Type-level metadata for a websocket endpoint: the path the transport
/// binds the handler instance at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketMeta {
    pub path: String,
}

impl WebSocketMeta {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Build the effective route path from a controller base and a route path.
///
/// The base has trailing slashes stripped first; the route path is then
/// appended verbatim. An empty route path yields the bare base.
#[must_use]
pub fn effective_path(base: &str, route_path: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if route_path.is_empty() {
        trimmed.to_string()
    } else {
        format!("{trimmed}{route_path}")
    }
}
