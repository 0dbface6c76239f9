//! Incoming HTTP request type.
//!
//! A [`Request`] is a value. Every `with_*` method consumes it and hands back
//! a modified copy, so a middleware that decorates the request for the next
//! stage never disturbs the request an earlier stage is still holding.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;

use crate::route::RouteResult;

/// Attribute under which the routing middleware stores the [`RouteResult`].
///
/// Contains a `.`, which path-parameter names cannot, so a parameter can never
/// overwrite it.
pub const ROUTE_RESULT_ATTRIBUTE: &str = "trellis.route_result";

type Attribute = Arc<dyn Any + Send + Sync>;

/// An HTTP request as seen by the pipeline.
#[derive(Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    attributes: HashMap<String, Attribute>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            attributes: HashMap::new(),
        }
    }

    /// Builds a request from the pieces a transport hands over.
    pub fn from_parts(
        method: Method,
        path: impl Into<String>,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self { method, path: path.into(), query, headers, body, attributes: HashMap::new() }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Header lookup. Names are case-insensitive; non-UTF-8 values read as `None`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Reads a typed attribute. `None` if absent or stored with another type.
    pub fn attribute<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.attributes.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns a matched path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")` once the routing middleware has run.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.attribute::<String>(name).map(String::as_str)
    }

    /// The routing outcome, if the routing middleware recorded one.
    pub fn route_result(&self) -> Option<&RouteResult> {
        self.attribute::<RouteResult>(ROUTE_RESULT_ATTRIBUTE)
    }

    // ── Copy-on-write mutators ───────────────────────────────────────────────

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_attribute<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.attributes.insert(name.into(), Arc::new(value));
        self
    }

    pub fn without_attribute(mut self, name: &str) -> Self {
        self.attributes.remove(name);
        self
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.attributes.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("attributes", &keys)
            .finish()
    }
}
