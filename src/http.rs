//! Request/response capability traits.
//!
//! The serving layer owns the real request and response objects; this core
//! only needs read access to incoming data and write access to outgoing
//! status/body/headers. Handlers, filters, and the error dispatcher are all
//! written against these two traits, so any HTTP layer that can adapt its
//! types to them can host the dispatch tables this crate builds.

/// Read access to an incoming HTTP request.
pub trait Request {
    /// Wire-format method name (e.g. `GET`).
    fn method(&self) -> &str;

    /// Request path without the query string.
    fn path(&self) -> &str;

    /// Header value by case-insensitive name.
    fn header(&self, name: &str) -> Option<&str>;

    /// Query parameter value by name.
    fn query_param(&self, name: &str) -> Option<&str>;

    /// Raw request body, if one was sent.
    fn body(&self) -> Option<&str>;
}

/// Write access to an outgoing HTTP response.
///
/// Implementations are expected to start at status 200 with an empty body;
/// the core only touches the status on error paths.
pub trait Response {
    fn status(&self) -> u16;

    fn set_status(&mut self, status: u16);

    fn body(&self) -> &str;

    fn set_body(&mut self, body: String);

    fn set_header(&mut self, name: &str, value: String);
}
