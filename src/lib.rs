//! # routedecl
//!
//! A declarative routing layer: application code *declares* controllers,
//! route methods, filter hooks, and websocket endpoints as typed metadata
//! values, and a one-time discovery/validation/registration pass turns those
//! declarations into the concrete dispatch tables a request-serving layer
//! consults - HTTP routes with per-route template binding, ordered global
//! before/after filter chains, and websocket endpoint bindings backed by a
//! process-lifetime handler registry.
//!
//! ## Architecture
//!
//! - **[`meta`]** - the metadata model: base paths, verb/path/template
//!   triples, filter phases, websocket paths
//! - **[`decl`]** - typed declaration builders and the namespace registry
//!   the discovery pass walks
//! - **[`validator`]** - handler shape checks and the websocket capability
//!   check; invalid members are skipped with a warning, never fatal
//! - **[`registrar`]** - route and filter registration against the
//!   [`RouteTable`](router::RouteTable) collaborator surface
//! - **[`websocket`]** - endpoint registration, the live-handler registry,
//!   and the transport collaborator trait
//! - **[`render`]** - the template engine contract, a MiniJinja adapter, and
//!   the JSON fallback renderer used when an engine cannot be constructed
//! - **[`dispatch`]** - the error/not-found dispatcher that keeps every
//!   failure path renderable
//! - **[`router`]** - the `RouteTable` trait plus a thin exact-path
//!   reference implementation with the per-request dispatch state machine
//! - **[`setup`]** - the idempotent init orchestrator (websockets, then
//!   filters, then routes, then start)
//!
//! The HTTP listener, connection handling, worker threads, and websocket
//! wire mechanics all live in external collaborators consumed through the
//! [`http`], [`router`], and [`websocket`] traits.
//!
//! ## Quick start
//!
//! ```no_run
//! use routedecl::{
//!     ControllerBuilder, DeclRegistry, InitOptions, JinjaEngine, Model, Namespace,
//!     PoolConfig, RouteMeta, Router, Setup, SocketRegistry,
//! };
//! use routedecl::websocket::NoTransport;
//! use serde_json::json;
//!
//! struct Health;
//!
//! let mut decls = DeclRegistry::new();
//! decls.register(
//!     Namespace::new("app").controller(
//!         ControllerBuilder::new("/health/", || Ok(Health)).route(
//!             "status",
//!             RouteMeta::get("/status", "status.html"),
//!             |_c: &Health, _req, _resp| {
//!                 let mut model = Model::new();
//!                 model.insert("ok".into(), json!(true));
//!                 Ok(model)
//!             },
//!         ),
//!     ),
//! );
//!
//! let mut router = Router::new();
//! let sockets = SocketRegistry::new();
//! let setup = Setup::new();
//! setup.init(
//!     &decls,
//!     &mut router,
//!     &mut NoTransport,
//!     &sockets,
//!     &InitOptions::single_namespace(
//!         "app",
//!         PoolConfig::default(),
//!         JinjaEngine::dir_factory("templates"),
//!         "main.html",
//!     ),
//! );
//! // hand `router` to the serving layer; it calls `router.handle(...)` per request
//! ```
//!
//! ## Failure tolerance
//!
//! Registration never aborts wholesale: an unresolvable namespace skips one
//! category, an invalid handler shape skips one member, a failing
//! constructor skips one class, and a template engine that cannot be built
//! degrades to a JSON fallback renderer. At request time a handler failure,
//! whether a structured [`RouteError`] or an outright panic, is always
//! answered with a rendered error page carrying the right status code.

pub mod decl;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod meta;
pub mod registrar;
pub mod render;
pub mod router;
pub mod setup;
pub mod validator;
pub mod websocket;

pub use decl::{
    ControllerBuilder, ControllerDecl, DeclRegistry, FilterBuilder, FilterDecl, HandlerBinding,
    MethodDecl, Namespace, SocketDecl,
};
pub use dispatch::ErrorDispatcher;
pub use errors::RouteError;
pub use meta::{ControllerMeta, FilterMeta, FilterPhase, HttpMethod, RouteMeta, WebSocketMeta};
pub use render::{
    EngineFactory, FallbackRenderer, JinjaEngine, Model, RenderError, TemplateEngine, ViewModel,
};
pub use router::{PoolConfig, RouteTable, Router};
pub use setup::{InitOptions, Setup};
pub use websocket::{SocketHandler, SocketRegistry, SocketSession, SocketTransport};
