//! Registration-time behavior: marker-driven discovery, shape validation,
//! path construction, per-class instantiation, and partial-failure
//! tolerance.

mod common;

use common::{init_tracing, template_factory};
use routedecl::registrar::{register_filters, register_routes};
use routedecl::{
    ControllerBuilder, DeclRegistry, FilterBuilder, FilterMeta, HandlerBinding, HttpMethod, Model,
    Namespace, RouteMeta, Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Pets;

impl Pets {
    fn list(&self) -> Model {
        let mut model = Model::new();
        model.insert("count".into(), serde_json::json!(2));
        model
    }
}

fn pets_controller() -> ControllerBuilder<Pets> {
    ControllerBuilder::new("/pets/", || Ok(Pets))
        .route("list", RouteMeta::get("/list", "list.html"), |c: &Pets, _req, _resp| {
            Ok(c.list())
        })
        .route("create", RouteMeta::post("/create", "pet.html"), |_c: &Pets, _req, _resp| {
            Ok(Model::new())
        })
}

fn registry_of(ns: Namespace) -> DeclRegistry {
    let mut decls = DeclRegistry::new();
    decls.register(ns);
    decls
}

#[test]
fn test_trailing_slash_base_path_joins_cleanly() {
    init_tracing();
    let decls = registry_of(Namespace::new("app").controller(pets_controller()));
    let mut router = Router::new();
    register_routes(&decls, "app", &mut router, &template_factory());

    assert!(router.has_route(HttpMethod::Get, "/pets/list"));
    assert!(router.has_route(HttpMethod::Post, "/pets/create"));
    assert!(!router.has_route(HttpMethod::Get, "/pets//list"));
}

#[test]
fn test_invalid_shape_skipped_without_hurting_siblings() {
    init_tracing();
    let broken = ControllerBuilder::new("/broken", || Ok(Pets))
        .raw_method(
            "render",
            Some(RouteMeta::get("/render", "pet.html")),
            None,
            HandlerBinding::Incompatible {
                shape: "(request) -> text".to_string(),
            },
        )
        .route("ok", RouteMeta::get("/ok", "pet.html"), |_c: &Pets, _req, _resp| {
            Ok(Model::new())
        });
    let decls = registry_of(
        Namespace::new("app")
            .controller(broken)
            .controller(pets_controller()),
    );

    let mut router = Router::new();
    register_routes(&decls, "app", &mut router, &template_factory());

    // The bad member is gone; its sibling and the other controller survive.
    assert!(!router.has_route(HttpMethod::Get, "/broken/render"));
    assert!(router.has_route(HttpMethod::Get, "/broken/ok"));
    assert!(router.has_route(HttpMethod::Get, "/pets/list"));
    assert_eq!(router.route_count(), 3);
}

#[test]
fn test_unmarked_members_are_ignored_silently() {
    init_tracing();
    let controller = ControllerBuilder::new("/pets", || Ok(Pets))
        .route("list", RouteMeta::get("/list", "list.html"), |_c: &Pets, _req, _resp| {
            Ok(Model::new())
        })
        .plain_method("helper");
    let decls = registry_of(Namespace::new("app").controller(controller));

    let mut router = Router::new();
    register_routes(&decls, "app", &mut router, &template_factory());
    assert_eq!(router.route_count(), 1);
}

#[test]
fn test_controller_constructed_once_per_class() {
    init_tracing();
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructions);
    let controller = ControllerBuilder::new("/pets", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Pets)
    })
    .route("list", RouteMeta::get("/list", "list.html"), |_c: &Pets, _req, _resp| {
        Ok(Model::new())
    })
    .route("create", RouteMeta::post("/create", "pet.html"), |_c: &Pets, _req, _resp| {
        Ok(Model::new())
    });
    let decls = registry_of(Namespace::new("app").controller(controller));

    let mut router = Router::new();
    register_routes(&decls, "app", &mut router, &template_factory());

    assert_eq!(router.route_count(), 2);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_constructor_failure_skips_class_only() {
    init_tracing();
    let doomed = ControllerBuilder::new("/doomed", || {
        Err::<Pets, _>(anyhow::anyhow!("missing dependency"))
    })
    .route("list", RouteMeta::get("/list", "list.html"), |_c: &Pets, _req, _resp| {
        Ok(Model::new())
    });
    let decls = registry_of(
        Namespace::new("app")
            .controller(doomed)
            .controller(pets_controller()),
    );

    let mut router = Router::new();
    register_routes(&decls, "app", &mut router, &template_factory());

    assert!(!router.has_route(HttpMethod::Get, "/doomed/list"));
    assert_eq!(router.route_count(), 2);
}

#[test]
fn test_missing_namespace_skips_category() {
    init_tracing();
    let decls = registry_of(Namespace::new("app").controller(pets_controller()));
    let mut router = Router::new();

    register_routes(&decls, "nowhere", &mut router, &template_factory());
    assert_eq!(router.route_count(), 0);

    // The same registry still registers fine under the right name.
    register_routes(&decls, "app", &mut router, &template_factory());
    assert_eq!(router.route_count(), 2);
}

struct Audit;

#[test]
fn test_filter_shapes_and_phases() {
    init_tracing();
    let filters = FilterBuilder::new(|| Ok(Audit))
        .hook("stamp", FilterMeta::before(), |_f: &Audit, _req, resp| {
            resp.set_header("x-audit", "seen".to_string());
        })
        .hook("log", FilterMeta::after(), |_f: &Audit, _req, _resp| {})
        .raw_method(
            "bad",
            None,
            Some(FilterMeta::before()),
            HandlerBinding::Incompatible {
                shape: "() -> ()".to_string(),
            },
        );
    let decls = registry_of(Namespace::new("app").filter(filters));

    let mut router = Router::new();
    register_filters(&decls, "app", &mut router);
    assert_eq!(router.filter_count(), (1, 1));
}

#[test]
fn test_route_shaped_filter_is_accepted() {
    init_tracing();
    // A (request, response) -> model member also satisfies the filter
    // contract; the model is discarded.
    let filters = FilterBuilder::new(|| Ok(Audit)).raw_method(
        "enrich",
        None,
        Some(FilterMeta::before()),
        HandlerBinding::Route(Arc::new(|_instance, _req, _resp| Ok(Model::new()))),
    );
    let decls = registry_of(Namespace::new("app").filter(filters));

    let mut router = Router::new();
    register_filters(&decls, "app", &mut router);
    assert_eq!(router.filter_count(), (1, 0));
}
