//! One-time initialization orchestration.
//!
//! `Setup::init` wires everything in a fixed order: serving knobs and error
//! pages first, then websocket registration, filter registration, route
//! registration, and finally the start signal to the route table. The whole
//! sequence runs at most once per `Setup` value; any later (or concurrently
//! racing) call is a silent no-op, so the dispatch tables a first successful
//! call built are never touched again.

use crate::decl::DeclRegistry;
use crate::dispatch::ErrorDispatcher;
use crate::registrar::{register_filters, register_routes};
use crate::render::EngineFactory;
use crate::router::{PoolConfig, RouteTable};
use crate::websocket::{register_sockets, SocketRegistry, SocketTransport};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Everything `init` needs: which namespaces to scan for each category,
/// serving pool sizing, the template engine factory, and the template used
/// for error pages.
#[derive(Clone)]
pub struct InitOptions {
    pub controller_namespace: String,
    pub filter_namespace: String,
    pub socket_namespace: String,
    pub pool: PoolConfig,
    pub engine_factory: EngineFactory,
    /// Template name used for error and not-found pages.
    pub main_template: String,
    /// Static file root forwarded to the route table collaborator, if any.
    pub static_location: Option<String>,
}

impl InitOptions {
    pub fn new(
        controller_namespace: impl Into<String>,
        filter_namespace: impl Into<String>,
        socket_namespace: impl Into<String>,
        pool: PoolConfig,
        engine_factory: EngineFactory,
        main_template: impl Into<String>,
    ) -> Self {
        Self {
            controller_namespace: controller_namespace.into(),
            filter_namespace: filter_namespace.into(),
            socket_namespace: socket_namespace.into(),
            pool,
            engine_factory,
            main_template: main_template.into(),
            static_location: None,
        }
    }

    /// Scan one namespace for controllers, filters, and websockets alike.
    pub fn single_namespace(
        namespace: impl Into<String>,
        pool: PoolConfig,
        engine_factory: EngineFactory,
        main_template: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        Self::new(
            namespace.clone(),
            namespace.clone(),
            namespace,
            pool,
            engine_factory,
            main_template,
        )
    }

    #[must_use]
    pub fn with_static_location(mut self, location: impl Into<String>) -> Self {
        self.static_location = Some(location.into());
        self
    }
}

/// The one-shot initialization guard and orchestrator.
#[derive(Default)]
pub struct Setup {
    initialized: AtomicBool,
}

impl Setup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover, validate, and register everything, then signal start.
    ///
    /// Returns `true` when this call performed initialization and `false`
    /// when a previous (or concurrently winning) call already did; the
    /// no-op path leaves the dispatch tables exactly as the first call
    /// built them.
    pub fn init(
        &self,
        decls: &DeclRegistry,
        table: &mut dyn RouteTable,
        transport: &mut dyn SocketTransport,
        sockets: &SocketRegistry,
        options: &InitOptions,
    ) -> bool {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("already initialized, ignoring re-entrant init");
            return false;
        }

        table.thread_pool(&options.pool);
        if let Some(location) = &options.static_location {
            table.static_files(location);
        }

        let dispatcher =
            ErrorDispatcher::new(options.engine_factory.clone(), options.main_template.clone());
        table.internal_error(dispatcher.internal_error_page());
        table.not_found(dispatcher.not_found_page());
        table.on_error(dispatcher.error_sink());

        register_sockets(decls, &options.socket_namespace, transport, sockets);
        register_filters(decls, &options.filter_namespace, table);
        register_routes(
            decls,
            &options.controller_namespace,
            table,
            &options.engine_factory,
        );

        table.start();
        info!("routing layer initialized");
        true
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
