//! WebSocket endpoint registration and the live-handler registry.
//!
//! The transport collaborator owns connections, frames, and the wire-level
//! broadcast mechanics. This module owns the bookkeeping: which handler
//! classes were declared, which instances were successfully constructed, and
//! how external code looks an instance up (or pushes a broadcast) later.

use crate::decl::DeclRegistry;
use crate::validator;
use parking_lot::Mutex;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A live connection handle supplied by the transport to lifecycle callbacks.
pub trait SocketSession: Send + Sync {
    /// Send a message down this connection.
    fn send(&self, message: &str);
}

/// The domain capability set a websocket endpoint class must implement:
/// connection lifecycle callbacks plus a broadcast entry point.
///
/// One instance is constructed per declared class and shared by every
/// connection the transport delivers, so implementations must be stateless
/// or synchronize their own state.
pub trait SocketHandler: Send + Sync {
    fn on_connect(&self, session: &dyn SocketSession);

    fn on_close(&self, session: &dyn SocketSession, status: u16, reason: &str);

    fn on_message(&self, session: &dyn SocketSession, message: &str);

    /// Push a message to every connection currently attached to this handler.
    fn broadcast(&self, message: &str);
}

/// The transport-level registration surface. Binding an instance at a path
/// tells the transport to deliver that endpoint's connection events to it.
pub trait SocketTransport {
    fn bind(&mut self, path: &str, handler: Arc<dyn SocketHandler>);
}

/// Transport stand-in for deployments with no websocket endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTransport;

impl SocketTransport for NoTransport {
    fn bind(&mut self, path: &str, _handler: Arc<dyn SocketHandler>) {
        warn!(path = path, "websocket endpoint declared but no transport is configured");
    }
}

struct SocketEntry {
    type_id: TypeId,
    type_name: &'static str,
    #[allow(dead_code)]
    path: String,
    instance: Arc<dyn SocketHandler>,
}

/// Registry of live websocket handler instances.
///
/// Explicitly constructed and owned by the serving process (no lazy global);
/// one entry per successfully constructed handler class, insertion order
/// preserved, no de-duplication by path. The single coarse lock is held only
/// for list mutation and snapshotting, never across a handler invocation.
#[derive(Default)]
pub struct SocketRegistry {
    entries: Mutex<Vec<SocketEntry>>,
}

impl SocketRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_handler(
        &self,
        type_id: TypeId,
        type_name: &'static str,
        path: String,
        instance: Arc<dyn SocketHandler>,
    ) {
        self.entries.lock().push(SocketEntry {
            type_id,
            type_name,
            path,
            instance,
        });
    }

    /// Snapshot of every registered handler instance, in registration order.
    #[must_use]
    pub fn handlers(&self) -> Vec<Arc<dyn SocketHandler>> {
        self.entries
            .lock()
            .iter()
            .map(|e| Arc::clone(&e.instance))
            .collect()
    }

    /// Look up the instance registered for the declaring type `T`.
    #[must_use]
    pub fn handler<T: SocketHandler + 'static>(&self) -> Option<Arc<dyn SocketHandler>> {
        let wanted = TypeId::of::<T>();
        self.entries
            .lock()
            .iter()
            .find(|e| e.type_id == wanted)
            .map(|e| Arc::clone(&e.instance))
    }

    /// Push a message to all connections of the handler declared by `T`.
    ///
    /// Returns `false` when no such handler was registered. The instance is
    /// cloned out of the registry first; the broadcast itself runs outside
    /// the registry lock.
    pub fn broadcast<T: SocketHandler + 'static>(&self, message: &str) -> bool {
        match self.handler::<T>() {
            Some(handler) => {
                handler.broadcast(message);
                true
            }
            None => {
                warn!(
                    class = std::any::type_name::<T>(),
                    "broadcast requested for an unregistered websocket handler"
                );
                false
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Type name recorded for each registry entry, in registration order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.entries.lock().iter().map(|e| e.type_name).collect()
    }
}

/// Register every valid websocket declaration in `namespace`: construct the
/// instance once, record it in the registry, and bind it to the transport at
/// its declared path.
///
/// A declaration missing either the transport marker or the handler
/// capability set is skipped with a warning; a failing constructor skips that
/// class only. An unresolved namespace skips the whole category without
/// affecting filter or route registration.
pub fn register_sockets(
    decls: &DeclRegistry,
    namespace: &str,
    transport: &mut dyn SocketTransport,
    registry: &SocketRegistry,
) {
    debug!("setting up websocket handlers");
    let Some(ns) = decls.namespace(namespace) else {
        warn!(
            namespace = namespace,
            "websocket namespace not found, skipping websocket registration"
        );
        return;
    };

    for decl in ns.sockets() {
        if !validator::valid_socket_class(decl) {
            continue;
        }

        let instance = match decl.instantiate() {
            Ok(instance) => instance,
            Err(err) => {
                error!(
                    class = decl.type_name,
                    error = %err,
                    "could not construct websocket handler"
                );
                continue;
            }
        };

        debug!(
            class = decl.type_name,
            path = %decl.meta.path,
            "adding websocket handler"
        );
        registry.add_handler(
            decl.type_id,
            decl.type_name,
            decl.meta.path.clone(),
            Arc::clone(&instance),
        );
        transport.bind(&decl.meta.path, instance);
    }
    debug!("finished setting up websocket handlers");
}
