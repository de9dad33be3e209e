//! Handler shape and capability validation.
//!
//! Run by the registrars before anything is installed. A failed check warns
//! with enough context to find the offending member and returns `false`; the
//! caller skips that single member (or class) and keeps scanning, so partial
//! registration is the expected failure mode, never an aborted scan.

use crate::decl::{HandlerBinding, MethodDecl, SocketDecl};
use tracing::warn;

/// Whether a route-marked member can be registered: its binding must have
/// the `(request, response) -> model` shape.
pub fn valid_route_handler(controller: &str, method: &MethodDecl) -> bool {
    match &method.binding {
        HandlerBinding::Route(_) => true,
        HandlerBinding::Filter(_) => {
            warn!(
                method = method.name,
                controller = controller,
                "could not register route method, handler does not return a model"
            );
            false
        }
        HandlerBinding::Incompatible { shape } => {
            warn!(
                method = method.name,
                controller = controller,
                shape = %shape,
                "could not register route method, expected a (request, response) -> model handler"
            );
            false
        }
    }
}

/// Whether a filter-marked member can be registered. Only the
/// `(request, response)` parameter shape matters; a route-shaped binding also
/// qualifies because filter return values are discarded.
pub fn valid_filter_handler(class: &str, method: &MethodDecl) -> bool {
    match &method.binding {
        HandlerBinding::Filter(_) | HandlerBinding::Route(_) => true,
        HandlerBinding::Incompatible { shape } => {
            warn!(
                method = method.name,
                class = class,
                shape = %shape,
                "could not register filter method, expected a (request, response) handler"
            );
            false
        }
    }
}

/// Whether a websocket declaration can be registered: it needs both the
/// transport-level endpoint marker and the socket handler capability set.
pub fn valid_socket_class(decl: &SocketDecl) -> bool {
    if !decl.transport_marked {
        warn!(
            class = decl.type_name,
            "websocket class is not marked as a transport endpoint, skipping"
        );
        return false;
    }
    if !decl.has_capability() {
        warn!(
            class = decl.type_name,
            "websocket class does not implement the socket handler capability set, skipping"
        );
        return false;
    }
    true
}
