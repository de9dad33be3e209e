//! Route and filter registration: declarations in, dispatch tables out.
//!
//! Both registrars follow the same tolerance rules: an unresolved namespace
//! skips its category with a warning, an invalid member is skipped with a
//! warning from the validator, and a failing constructor skips its class.
//! Nothing here aborts the scan; partial registration is the contract.

use crate::decl::{DeclRegistry, HandlerBinding, Instance, RouteFn};
use crate::errors::RouteError;
use crate::meta::{effective_path, FilterPhase, HttpMethod};
use crate::render::{engine_or_fallback, EngineFactory, TemplateEngine, ViewModel};
use crate::router::{FilterHook, RouteEntry, RouteTable};
use crate::validator;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Register every valid route method declared in `namespace`.
///
/// Per controller: the instance is constructed once and shared by all of its
/// routes. Per route: the effective path is the normalized base plus the
/// route path, the engine factory produces a dedicated template engine
/// (degrading to the fallback renderer on construction failure), and the
/// entry is installed through the table's verb-specific registration
/// function. Duplicate (path, verb) installs are left to the table's own
/// last-wins semantics.
pub fn register_routes(
    decls: &DeclRegistry,
    namespace: &str,
    table: &mut dyn RouteTable,
    factory: &EngineFactory,
) {
    debug!("setting up routes");
    let Some(ns) = decls.namespace(namespace) else {
        warn!(
            namespace = namespace,
            "controller namespace not found, skipping route registration"
        );
        return;
    };

    for controller in ns.controllers() {
        debug!(controller = controller.type_name, "adding controller");

        let instance = match controller.instantiate() {
            Ok(instance) => instance,
            Err(err) => {
                error!(
                    controller = controller.type_name,
                    error = %err,
                    "could not construct controller"
                );
                continue;
            }
        };

        for method in controller.routed_methods() {
            if !validator::valid_route_handler(controller.type_name, method) {
                continue;
            }
            let (HandlerBinding::Route(handler), Some(route)) = (&method.binding, &method.route)
            else {
                continue;
            };

            let full_path = effective_path(&controller.meta.base_path, &route.path);
            let engine = engine_or_fallback(factory);
            debug!(
                method = method.name,
                verb = %route.method,
                path = %full_path,
                template = %route.template,
                "adding route"
            );

            let entry = route_entry(
                Arc::clone(&instance),
                Arc::clone(handler),
                engine,
                route.template.clone(),
                route.method,
                full_path.clone(),
            );
            match route.method {
                HttpMethod::Get => table.get(&full_path, entry),
                HttpMethod::Post => table.post(&full_path, entry),
                HttpMethod::Put => table.put(&full_path, entry),
                HttpMethod::Delete => table.delete(&full_path, entry),
                HttpMethod::Options => table.options(&full_path, entry),
            }
        }
    }
    debug!("finished setting up routes");
}

/// Build the dispatch entry for one route: invoke the handler, wrap the
/// returned model with the route's template, render through this route's
/// own engine instance. A render failure surfaces as a 500-class error for
/// the dispatcher rather than an unanswered request.
fn route_entry(
    instance: Instance,
    handler: RouteFn,
    engine: Box<dyn TemplateEngine>,
    template: String,
    verb: HttpMethod,
    path: String,
) -> RouteEntry {
    Arc::new(move |req, resp| {
        debug!(verb = %verb, path = %path, "route invoked");
        let model = handler(instance.as_ref(), req, resp)?;
        let view = ViewModel::new(model, template.clone());
        engine
            .render(&view)
            .map_err(|err| RouteError::with_source(500, "template rendering failed", err))
    })
}

/// Register every valid filter method declared in `namespace` as a global
/// before/after hook. Same-phase hooks run in declaration order; there is no
/// priority mechanism. Return values are discarded - filters communicate by
/// mutating the response.
pub fn register_filters(decls: &DeclRegistry, namespace: &str, table: &mut dyn RouteTable) {
    debug!("setting up filters");
    let Some(ns) = decls.namespace(namespace) else {
        warn!(
            namespace = namespace,
            "filter namespace not found, skipping filter registration"
        );
        return;
    };

    for decl in ns.filters() {
        let instance = match decl.instantiate() {
            Ok(instance) => instance,
            Err(err) => {
                error!(
                    class = decl.type_name,
                    error = %err,
                    "could not construct filter class"
                );
                continue;
            }
        };

        for method in decl.filter_methods() {
            if !validator::valid_filter_handler(decl.type_name, method) {
                continue;
            }
            let Some(meta) = &method.filter else { continue };

            let hook: FilterHook = match &method.binding {
                HandlerBinding::Filter(handler) => {
                    let handler = Arc::clone(handler);
                    let instance = Arc::clone(&instance);
                    Arc::new(move |req, resp| handler(instance.as_ref(), req, resp))
                }
                HandlerBinding::Route(handler) => {
                    // Parameter shape matches the filter contract; the model
                    // (or error) it returns is discarded.
                    let handler = Arc::clone(handler);
                    let instance = Arc::clone(&instance);
                    Arc::new(move |req, resp| {
                        if let Err(err) = handler(instance.as_ref(), req, resp) {
                            debug!(error = %err, "filter hook reported an error, discarded");
                        }
                    })
                }
                HandlerBinding::Incompatible { .. } => continue,
            };

            debug!(
                method = method.name,
                class = decl.type_name,
                phase = %meta.phase,
                "adding filter"
            );
            match meta.phase {
                FilterPhase::Before => table.before(hook),
                FilterPhase::After => table.after(hook),
            }
        }
    }
    debug!("finished setting up filters");
}
