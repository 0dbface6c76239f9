//! Route registration front-end.

use std::sync::Arc;

use http::Method;
use tracing::debug;

use crate::error::{Error, Result};
use crate::middleware::MiddlewareRef;
use crate::route::{Methods, Route};
use crate::router::{PathPattern, SharedRouter};

/// Registers routes with a [`Router`](crate::Router), refusing overlaps.
///
/// Two routes may share a path only when no method is claimed by both.
/// Paths that differ only in parameter names count as the same path.
/// Routes are never removed.
pub struct RouteCollector {
    router: SharedRouter,
    routes: Vec<Arc<Route>>,
    /// Normalised pattern of each route, parallel to `routes`.
    patterns: Vec<String>,
}

impl RouteCollector {
    pub fn new(router: SharedRouter) -> Self {
        Self { router, routes: Vec::new(), patterns: Vec::new() }
    }

    pub fn router(&self) -> &SharedRouter {
        &self.router
    }

    /// Every registered route, in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Registers `middleware` at `path` for `methods`.
    pub fn route(
        &mut self,
        path: &str,
        middleware: impl Into<MiddlewareRef>,
        methods: impl Into<Methods>,
        name: Option<&str>,
    ) -> Result<Arc<Route>> {
        let mut route = Route::new(path, middleware, methods);
        if let Some(name) = name {
            route = route.with_name(name);
        }
        self.add(route)
    }

    /// Registers a fully configured route.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateRoute`] if a route at the same path claims one of
    ///   the same methods (either side accepting any method counts), or the
    ///   name is taken.
    /// - [`Error::InvalidRoute`] for an empty method list or a pattern the
    ///   router rejects.
    pub fn add(&mut self, route: Route) -> Result<Arc<Route>> {
        if route.methods().as_slice().is_some_and(<[Method]>::is_empty) {
            return Err(Error::invalid_route(route.path(), "a route needs at least one method"));
        }

        let pattern = PathPattern::parse(route.path())?.normalized();
        if let Some(existing) = self
            .routes
            .iter()
            .zip(&self.patterns)
            .find(|(r, p)| **p == pattern && r.methods().intersects(route.methods()))
            .map(|(r, _)| r)
        {
            return Err(Error::DuplicateRoute {
                path: route.path().to_owned(),
                detail: format!(
                    "methods {} overlap route `{}` ({})",
                    route.methods(),
                    existing.name(),
                    existing.methods()
                ),
            });
        }

        let name = route.name();
        if self.routes.iter().any(|r| r.name() == name) {
            return Err(Error::DuplicateRoute {
                path: route.path().to_owned(),
                detail: format!("a route named `{name}` is already registered"),
            });
        }

        let route = Arc::new(route);
        self.router.write().add_route(Arc::clone(&route))?;
        debug!(route = %name, path = route.path(), methods = %route.methods(), "route registered");
        self.routes.push(Arc::clone(&route));
        self.patterns.push(pattern);
        Ok(route)
    }

    pub fn get(&mut self, path: &str, middleware: impl Into<MiddlewareRef>) -> Result<Arc<Route>> {
        self.route(path, middleware, Method::GET, None)
    }

    pub fn post(&mut self, path: &str, middleware: impl Into<MiddlewareRef>) -> Result<Arc<Route>> {
        self.route(path, middleware, Method::POST, None)
    }

    pub fn put(&mut self, path: &str, middleware: impl Into<MiddlewareRef>) -> Result<Arc<Route>> {
        self.route(path, middleware, Method::PUT, None)
    }

    pub fn patch(&mut self, path: &str, middleware: impl Into<MiddlewareRef>) -> Result<Arc<Route>> {
        self.route(path, middleware, Method::PATCH, None)
    }

    pub fn delete(&mut self, path: &str, middleware: impl Into<MiddlewareRef>) -> Result<Arc<Route>> {
        self.route(path, middleware, Method::DELETE, None)
    }

    pub fn any(&mut self, path: &str, middleware: impl Into<MiddlewareRef>) -> Result<Arc<Route>> {
        self.route(path, middleware, Methods::Any, None)
    }
}
