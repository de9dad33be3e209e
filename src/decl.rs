//! Typed declarations and the namespace registry the scanner walks.
//!
//! Instead of runtime reflection, application code builds declaration values
//! describing its controllers, filters, and websocket endpoints, and files
//! them under named namespaces in a [`DeclRegistry`]. Initialization then
//! "discovers" members by enumerating these declarations: only members that
//! carry the relevant metadata marker are returned, members without one are
//! skipped silently, and an unresolved namespace is a per-category warning
//! rather than a fatal error.
//!
//! Instances are not created at declaration time. Each declaration carries a
//! fallible constructor that the registrars invoke exactly once per declaring
//! type during registration, so a failing constructor skips that class and
//! nothing else.

use crate::errors::RouteError;
use crate::http::{Request, Response};
use crate::meta::{ControllerMeta, FilterMeta, RouteMeta, WebSocketMeta};
use crate::render::Model;
use crate::websocket::SocketHandler;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// A constructed controller/filter instance, type-erased for storage.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Fallible once-per-type instance constructor.
pub type Constructor = Arc<dyn Fn() -> anyhow::Result<Instance> + Send + Sync>;

/// The route handler contract: `(request, response) -> model`.
pub type RouteFn = Arc<
    dyn Fn(&(dyn Any + Send + Sync), &dyn Request, &mut dyn Response) -> Result<Model, RouteError>
        + Send
        + Sync,
>;

/// The filter handler contract: `(request, response)`, return value none.
pub type FilterFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &dyn Request, &mut dyn Response) + Send + Sync>;

pub type SocketConstructor =
    Arc<dyn Fn() -> anyhow::Result<Arc<dyn SocketHandler>> + Send + Sync>;

/// The invocable shape a declared method was bound with.
///
/// The typed builder methods always produce `Route`/`Filter`; `Incompatible`
/// comes from [`raw_method`](ControllerBuilder::raw_method) declarations
/// whose shape could not be expressed in either contract. The validator
/// rejects shape/metadata mismatches before registration.
pub enum HandlerBinding {
    Route(RouteFn),
    Filter(FilterFn),
    /// A shape the registrar cannot invoke; `shape` describes what was
    /// actually declared and ends up in the validation warning.
    Incompatible { shape: String },
}

impl std::fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerBinding::Route(_) => f.write_str("Route"),
            HandlerBinding::Filter(_) => f.write_str("Filter"),
            HandlerBinding::Incompatible { shape } => write!(f, "Incompatible({shape})"),
        }
    }
}

/// One declared method on a controller or filter type: its name, whatever
/// metadata markers it carries, and its binding.
pub struct MethodDecl {
    pub name: &'static str,
    /// Route marker; absent means route discovery skips the member silently.
    pub route: Option<RouteMeta>,
    /// Filter marker; absent means filter discovery skips the member silently.
    pub filter: Option<FilterMeta>,
    pub binding: HandlerBinding,
}

/// A declared controller type: base path metadata, a constructor, and its
/// methods.
pub struct ControllerDecl {
    pub type_name: &'static str,
    pub meta: ControllerMeta,
    construct: Constructor,
    pub methods: Vec<MethodDecl>,
}

impl ControllerDecl {
    /// Construct the controller instance. Called once per declaring type at
    /// registration time; the instance is shared by all of the type's routes.
    pub fn instantiate(&self) -> anyhow::Result<Instance> {
        (self.construct)()
    }

    /// Members carrying the route marker, in declaration order.
    pub fn routed_methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| m.route.is_some())
    }
}

/// Typed builder for a [`ControllerDecl`].
///
/// The `route` method captures a handler borrowing the concrete controller
/// type, so shape errors are compile errors on this path; `raw_method` exists
/// for adapted handlers whose shape the caller asserts.
pub struct ControllerBuilder<C> {
    decl: ControllerDecl,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> ControllerBuilder<C> {
    pub fn new(
        base_path: impl Into<String>,
        construct: impl Fn() -> anyhow::Result<C> + Send + Sync + 'static,
    ) -> Self {
        Self {
            decl: ControllerDecl {
                type_name: short_type_name::<C>(),
                meta: ControllerMeta::new(base_path),
                construct: Arc::new(move || construct().map(|c| Arc::new(c) as Instance)),
                methods: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Declare a route method: verb/path/template metadata plus a handler
    /// with the `(request, response) -> model` shape.
    pub fn route(
        mut self,
        name: &'static str,
        meta: RouteMeta,
        handler: impl Fn(&C, &dyn Request, &mut dyn Response) -> Result<Model, RouteError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        let bound: RouteFn = Arc::new(move |instance, req, resp| {
            match instance.downcast_ref::<C>() {
                Some(controller) => handler(controller, req, resp),
                // Unreachable through this builder; kept as an error, not a panic.
                None => Err(RouteError::internal("controller instance type mismatch")),
            }
        });
        self.decl.methods.push(MethodDecl {
            name,
            route: Some(meta),
            filter: None,
            binding: HandlerBinding::Route(bound),
        });
        self
    }

    /// Declare a member without any metadata marker. Discovery never returns
    /// it; it exists so unannotated members are representable.
    pub fn plain_method(mut self, name: &'static str) -> Self {
        self.decl.methods.push(MethodDecl {
            name,
            route: None,
            filter: None,
            binding: HandlerBinding::Incompatible {
                shape: "unbound member".to_string(),
            },
        });
        self
    }

    /// Declare a member with explicit metadata and binding, bypassing the
    /// typed shape guarantees. The validator decides whether it registers.
    pub fn raw_method(
        mut self,
        name: &'static str,
        route: Option<RouteMeta>,
        filter: Option<FilterMeta>,
        binding: HandlerBinding,
    ) -> Self {
        self.decl.methods.push(MethodDecl {
            name,
            route,
            filter,
            binding,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> ControllerDecl {
        self.decl
    }
}

impl<C: Send + Sync + 'static> From<ControllerBuilder<C>> for ControllerDecl {
    fn from(builder: ControllerBuilder<C>) -> Self {
        builder.build()
    }
}

/// A declared filter type: a constructor and its hook methods. Filters have
/// no path scoping; ordering is declaration order within a phase.
pub struct FilterDecl {
    pub type_name: &'static str,
    construct: Constructor,
    pub methods: Vec<MethodDecl>,
}

impl FilterDecl {
    pub fn instantiate(&self) -> anyhow::Result<Instance> {
        (self.construct)()
    }

    /// Members carrying the filter marker, in declaration order.
    pub fn filter_methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| m.filter.is_some())
    }
}

/// Typed builder for a [`FilterDecl`].
pub struct FilterBuilder<F> {
    decl: FilterDecl,
    _marker: PhantomData<fn() -> F>,
}

impl<F: Send + Sync + 'static> FilterBuilder<F> {
    pub fn new(construct: impl Fn() -> anyhow::Result<F> + Send + Sync + 'static) -> Self {
        Self {
            decl: FilterDecl {
                type_name: short_type_name::<F>(),
                construct: Arc::new(move || construct().map(|f| Arc::new(f) as Instance)),
                methods: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Declare a hook method: phase metadata plus a `(request, response)`
    /// body whose return value is discarded.
    pub fn hook(
        mut self,
        name: &'static str,
        meta: FilterMeta,
        handler: impl Fn(&F, &dyn Request, &mut dyn Response) + Send + Sync + 'static,
    ) -> Self {
        let bound: FilterFn = Arc::new(move |instance, req, resp| {
            if let Some(filter) = instance.downcast_ref::<F>() {
                handler(filter, req, resp);
            }
        });
        self.decl.methods.push(MethodDecl {
            name,
            route: None,
            filter: Some(meta),
            binding: HandlerBinding::Filter(bound),
        });
        self
    }

    /// See [`ControllerBuilder::raw_method`].
    pub fn raw_method(
        mut self,
        name: &'static str,
        route: Option<RouteMeta>,
        filter: Option<FilterMeta>,
        binding: HandlerBinding,
    ) -> Self {
        self.decl.methods.push(MethodDecl {
            name,
            route,
            filter,
            binding,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> FilterDecl {
        self.decl
    }
}

impl<F: Send + Sync + 'static> From<FilterBuilder<F>> for FilterDecl {
    fn from(builder: FilterBuilder<F>) -> Self {
        builder.build()
    }
}

/// A declared websocket endpoint type.
///
/// Registration requires both the transport-level endpoint marker and the
/// [`SocketHandler`] capability set; either can be absent on a declaration,
/// in which case the validator skips it with a warning.
pub struct SocketDecl {
    pub type_name: &'static str,
    pub type_id: TypeId,
    pub meta: WebSocketMeta,
    /// Whether the type declared itself as an endpoint to the transport.
    pub transport_marked: bool,
    construct: Option<SocketConstructor>,
}

impl SocketDecl {
    /// Declaration with both the transport marker and the capability set.
    pub fn new<S: SocketHandler + 'static>(
        path: impl Into<String>,
        construct: impl Fn() -> anyhow::Result<S> + Send + Sync + 'static,
    ) -> Self {
        Self {
            type_name: short_type_name::<S>(),
            type_id: TypeId::of::<S>(),
            meta: WebSocketMeta::new(path),
            transport_marked: true,
            construct: Some(Arc::new(move || {
                construct().map(|s| Arc::new(s) as Arc<dyn SocketHandler>)
            })),
        }
    }

    /// Declaration for a type that never implemented the handler capability
    /// set. Registration will skip it; representable so integrations that
    /// mark endpoints separately from implementing them are observable.
    #[must_use]
    pub fn unbound<T: 'static>(path: impl Into<String>) -> Self {
        Self {
            type_name: short_type_name::<T>(),
            type_id: TypeId::of::<T>(),
            meta: WebSocketMeta::new(path),
            transport_marked: true,
            construct: None,
        }
    }

    /// Drop the transport-level marker from this declaration.
    #[must_use]
    pub fn without_transport_marker(mut self) -> Self {
        self.transport_marked = false;
        self
    }

    #[must_use]
    pub fn has_capability(&self) -> bool {
        self.construct.is_some()
    }

    pub(crate) fn instantiate(&self) -> anyhow::Result<Arc<dyn SocketHandler>> {
        match &self.construct {
            Some(construct) => construct(),
            None => Err(anyhow::anyhow!(
                "{} does not implement the socket handler capability set",
                self.type_name
            )),
        }
    }
}

/// A named group of declarations, the unit discovery is scoped to.
pub struct Namespace {
    pub name: String,
    controllers: Vec<ControllerDecl>,
    filters: Vec<FilterDecl>,
    sockets: Vec<SocketDecl>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controllers: Vec::new(),
            filters: Vec::new(),
            sockets: Vec::new(),
        }
    }

    #[must_use]
    pub fn controller(mut self, decl: impl Into<ControllerDecl>) -> Self {
        self.controllers.push(decl.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, decl: impl Into<FilterDecl>) -> Self {
        self.filters.push(decl.into());
        self
    }

    #[must_use]
    pub fn socket(mut self, decl: SocketDecl) -> Self {
        self.sockets.push(decl);
        self
    }

    #[must_use]
    pub fn controllers(&self) -> &[ControllerDecl] {
        &self.controllers
    }

    #[must_use]
    pub fn filters(&self) -> &[FilterDecl] {
        &self.filters
    }

    #[must_use]
    pub fn sockets(&self) -> &[SocketDecl] {
        &self.sockets
    }
}

/// All declared namespaces, keyed by name. Registering a namespace under an
/// existing name merges its declarations, preserving declaration order, so a
/// project can file controllers, filters, and sockets under one name from
/// several call sites.
#[derive(Default)]
pub struct DeclRegistry {
    namespaces: HashMap<String, Namespace>,
}

impl DeclRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ns: Namespace) {
        match self.namespaces.get_mut(&ns.name) {
            Some(existing) => {
                existing.controllers.extend(ns.controllers);
                existing.filters.extend(ns.filters);
                existing.sockets.extend(ns.sockets);
            }
            None => {
                self.namespaces.insert(ns.name.clone(), ns);
            }
        }
    }

    /// Resolve a namespace by name. `None` means the category registration
    /// that asked should warn and skip; it is never fatal.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }
}

/// Last path segment of a type name, for log lines and registry entries.
fn short_type_name<T: 'static>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
