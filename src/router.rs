//! The route table collaborator surface and a thin reference implementation.
//!
//! [`RouteTable`] is the registration surface this core expects from the
//! underlying router: verb-specific route installation, global before/after
//! hooks, error/not-found pages, and serving knobs (thread pool, static file
//! root, start). The registrars and [`Setup`](crate::setup::Setup) are
//! written against the trait only.
//!
//! [`Router`] is an in-crate implementation of that surface with exact-path
//! matching and the per-request dispatch state machine. It owns every
//! installed [`RouteEntry`]; the core never mutates an entry after handing
//! it over. Listening, connection handling, and worker threads remain the
//! serving layer's job.

use crate::errors::RouteError;
use crate::http::{Request, Response};
use crate::meta::HttpMethod;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The registered unit for one route: invokes the validated handler, wraps
/// its model with the bound template, renders, and returns the body - or a
/// structured error for the dispatcher to pattern-match on.
pub type RouteEntry =
    Arc<dyn Fn(&dyn Request, &mut dyn Response) -> Result<String, RouteError> + Send + Sync>;

/// A global before/after hook. Communicates through response mutation only.
pub type FilterHook = Arc<dyn Fn(&dyn Request, &mut dyn Response) + Send + Sync>;

/// A full error/not-found page renderer installed on the table.
pub type ErrorPage = Arc<dyn Fn(&dyn Request, &mut dyn Response) + Send + Sync>;

/// Receiver for structured handler failures.
pub type ErrorSink = Arc<dyn Fn(&RouteError, &dyn Request, &mut dyn Response) + Send + Sync>;

/// Serving-phase worker pool sizing, handed to the route table collaborator.
/// This core only carries the numbers; the pool itself lives in the serving
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_threads: usize,
    pub min_threads: usize,
    /// How long an idle worker is kept before being reclaimed.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_threads: 8,
            min_threads: 2,
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Registration surface of the underlying router.
///
/// Methods with default no-op bodies are serving-layer concerns an
/// implementation may not have (a recording table used in tests, say).
pub trait RouteTable {
    fn get(&mut self, path: &str, entry: RouteEntry);

    fn post(&mut self, path: &str, entry: RouteEntry);

    fn put(&mut self, path: &str, entry: RouteEntry);

    fn delete(&mut self, path: &str, entry: RouteEntry);

    fn options(&mut self, path: &str, entry: RouteEntry);

    fn before(&mut self, hook: FilterHook);

    fn after(&mut self, hook: FilterHook);

    fn not_found(&mut self, page: ErrorPage);

    fn internal_error(&mut self, page: ErrorPage);

    fn on_error(&mut self, sink: ErrorSink);

    fn static_files(&mut self, _location: &str) {}

    fn thread_pool(&mut self, _pool: &PoolConfig) {}

    fn start(&mut self) {}
}

enum Outcome {
    Body(String),
    NotFound,
    Failed(RouteError),
}

/// Exact-path route table with the per-request dispatch state machine.
#[derive(Default)]
pub struct Router {
    routes: HashMap<HttpMethod, HashMap<String, RouteEntry>>,
    before: Vec<FilterHook>,
    after: Vec<FilterHook>,
    not_found: Option<ErrorPage>,
    internal_error: Option<ErrorPage>,
    error_sink: Option<ErrorSink>,
    pool: PoolConfig,
    static_location: Option<String>,
    started: bool,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, method: HttpMethod, path: &str, entry: RouteEntry) {
        let table = self.routes.entry(method).or_default();
        // Duplicate (path, verb) registrations are not de-duplicated; the
        // last installation wins.
        if table.insert(path.to_string(), entry).is_some() {
            warn!(
                method = %method,
                path = path,
                "replaced existing route registration, last registration wins"
            );
        }
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn has_route(&self, method: HttpMethod, path: &str) -> bool {
        self.routes
            .get(&method)
            .is_some_and(|table| table.contains_key(path))
    }

    #[must_use]
    pub fn filter_count(&self) -> (usize, usize) {
        (self.before.len(), self.after.len())
    }

    #[must_use]
    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    #[must_use]
    pub fn static_location(&self) -> Option<&str> {
        self.static_location.as_deref()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Dispatch one request. Terminal after exactly one path: rendered body,
    /// rendered not-found page, or rendered error page. Before hooks run
    /// first; after hooks always run last, whether or not the handler failed.
    pub fn handle(&self, req: &dyn Request, resp: &mut dyn Response) {
        for hook in &self.before {
            hook(req, resp);
        }

        let outcome = match HttpMethod::parse(req.method()) {
            None => Outcome::NotFound,
            Some(method) => match self.routes.get(&method).and_then(|t| t.get(req.path())) {
                None => Outcome::NotFound,
                Some(entry) => Self::invoke(entry, req, resp),
            },
        };

        match outcome {
            Outcome::Body(body) => resp.set_body(body),
            Outcome::NotFound => {
                debug!(method = req.method(), path = req.path(), "no route matched");
                match &self.not_found {
                    Some(page) => page(req, resp),
                    None => resp.set_status(404),
                }
            }
            Outcome::Failed(err) => {
                if let Some(sink) = &self.error_sink {
                    sink(&err, req, resp);
                } else if let (500.., Some(page)) = (err.status, &self.internal_error) {
                    page(req, resp);
                } else {
                    resp.set_status(err.status);
                    resp.set_body(err.message.clone());
                }
            }
        }

        for hook in &self.after {
            hook(req, resp);
        }
    }

    /// Invoke an entry with crash containment. A panic payload that carries a
    /// `RouteError` is unwrapped and treated as a domain failure; anything
    /// else becomes a generic 500. One misbehaving handler never takes the
    /// request down unanswered.
    fn invoke(entry: &RouteEntry, req: &dyn Request, resp: &mut dyn Response) -> Outcome {
        match catch_unwind(AssertUnwindSafe(|| entry(req, resp))) {
            Ok(Ok(body)) => Outcome::Body(body),
            Ok(Err(err)) => {
                debug!(status = err.status, error = %err, "handler returned a route error");
                Outcome::Failed(err)
            }
            Err(payload) => match payload.downcast::<RouteError>() {
                Ok(err) => Outcome::Failed(*err),
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "handler panicked".to_string());
                    error!(
                        method = req.method(),
                        path = req.path(),
                        panic_message = %message,
                        "handler crashed"
                    );
                    Outcome::Failed(RouteError::internal("there was an error on the server"))
                }
            },
        }
    }
}

impl RouteTable for Router {
    fn get(&mut self, path: &str, entry: RouteEntry) {
        self.insert(HttpMethod::Get, path, entry);
    }

    fn post(&mut self, path: &str, entry: RouteEntry) {
        self.insert(HttpMethod::Post, path, entry);
    }

    fn put(&mut self, path: &str, entry: RouteEntry) {
        self.insert(HttpMethod::Put, path, entry);
    }

    fn delete(&mut self, path: &str, entry: RouteEntry) {
        self.insert(HttpMethod::Delete, path, entry);
    }

    fn options(&mut self, path: &str, entry: RouteEntry) {
        self.insert(HttpMethod::Options, path, entry);
    }

    fn before(&mut self, hook: FilterHook) {
        self.before.push(hook);
    }

    fn after(&mut self, hook: FilterHook) {
        self.after.push(hook);
    }

    fn not_found(&mut self, page: ErrorPage) {
        self.not_found = Some(page);
    }

    fn internal_error(&mut self, page: ErrorPage) {
        self.internal_error = Some(page);
    }

    fn on_error(&mut self, sink: ErrorSink) {
        self.error_sink = Some(sink);
    }

    fn static_files(&mut self, location: &str) {
        self.static_location = Some(location.to_string());
    }

    fn thread_pool(&mut self, pool: &PoolConfig) {
        self.pool = *pool;
    }

    fn start(&mut self) {
        self.started = true;
        info!(
            max_threads = self.pool.max_threads,
            min_threads = self.pool.min_threads,
            routes = self.route_count(),
            "route table started"
        );
    }
}
