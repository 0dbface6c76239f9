//! The routing contract and its reference backend.

mod pattern;
mod tree;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::request::Request;
use crate::route::{Route, RouteResult};

pub(crate) use pattern::PathPattern;
pub use tree::TreeRouter;

/// A routing backend.
///
/// Backends decide how patterns are matched. They must agree on the outcome:
/// among the routes serving the request method the most specific pattern
/// wins, ties go to the first registration, and a path that matches only for
/// other methods yields [`RouteResult::MethodNotAllowed`] listing every
/// method the path accepts.
pub trait Router: Send + Sync {
    fn add_route(&mut self, route: Arc<Route>) -> Result<()>;

    fn match_request(&self, req: &Request) -> RouteResult;

    /// Reverse routing: builds a path for the route called `name`.
    fn generate_uri(&self, name: &str, params: &[(&str, &str)]) -> Result<String>;
}

/// A router shared between the collector that fills it and the middleware
/// that reads it.
pub type SharedRouter = Arc<RwLock<dyn Router>>;

/// Moves `router` behind a [`SharedRouter`].
pub fn shared(router: impl Router + 'static) -> SharedRouter {
    Arc::new(RwLock::new(router))
}
