//! The application facade.
//!
//! An [`Application`] owns the pipeline, the route collector and the
//! middleware factory, and exposes the single entry point a runner needs:
//! [`Application::handle`].
//!
//! Setup takes `&mut Application`; serving takes `&Application` (usually
//! through an `Arc`). Once traffic flows the routing table and pipeline can
//! no longer change.

use std::sync::Arc;

use http::Method;

use crate::collector::RouteCollector;
use crate::error::Result;
use crate::handler::{BoxedHandler, NotFoundHandler, RequestHandler};
use crate::middleware::{
    DispatchMiddleware, ImplicitHeadMiddleware, ImplicitOptionsMiddleware, MiddlewareFactory, MiddlewareRef,
    RouteMiddleware,
};
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;
use crate::route::{Methods, Route};
use crate::router::{Router, SharedRouter, shared};

/// Route-aware middleware application.
///
/// ```rust,no_run
/// use trellis::{Application, MiddlewareFactory, MiddlewareRef, Request, Response, TreeRouter};
///
/// # fn main() -> trellis::Result<()> {
/// let mut app = Application::new(MiddlewareFactory::default(), TreeRouter::new());
/// app.pipe_routing_middleware()
///     .pipe_dispatch_middleware();
/// app.get("/users/{id}", MiddlewareRef::handler_fn(show_user))?;
/// # Ok(())
/// # }
///
/// async fn show_user(req: Request) -> Response {
///     Response::text(format!("user {}", req.param("id").unwrap_or("?")))
/// }
/// ```
pub struct Application {
    factory: Arc<MiddlewareFactory>,
    pipeline: Pipeline,
    routes: RouteCollector,
    fallback: BoxedHandler,
}

impl Application {
    pub fn new(factory: MiddlewareFactory, router: impl Router + 'static) -> Self {
        Self::with_shared_router(factory, shared(router))
    }

    pub fn with_shared_router(factory: MiddlewareFactory, router: SharedRouter) -> Self {
        Self {
            factory: Arc::new(factory),
            pipeline: Pipeline::new(),
            routes: RouteCollector::new(router),
            fallback: Arc::new(NotFoundHandler),
        }
    }

    /// Replaces the terminal handler that runs when every stage delegates.
    pub fn with_fallback(mut self, fallback: impl RequestHandler + 'static) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    pub fn factory(&self) -> &Arc<MiddlewareFactory> {
        &self.factory
    }

    pub fn router(&self) -> &SharedRouter {
        self.routes.router()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        self.routes.routes()
    }

    // ── Pipeline ─────────────────────────────────────────────────────────────

    /// Appends middleware to the pipeline.
    pub fn pipe(&mut self, middleware: impl Into<MiddlewareRef>) -> Result<&mut Self> {
        let middleware = self.factory.prepare(middleware)?;
        self.pipeline.pipe(middleware);
        Ok(self)
    }

    /// Appends middleware that only runs under `prefix`.
    pub fn pipe_path(&mut self, prefix: &str, middleware: impl Into<MiddlewareRef>) -> Result<&mut Self> {
        let middleware = self.factory.prepare(middleware)?;
        self.pipeline.pipe_path(prefix, middleware);
        Ok(self)
    }

    pub fn pipe_routing_middleware(&mut self) -> &mut Self {
        let router = Arc::clone(self.router());
        self.pipeline.pipe(Arc::new(RouteMiddleware::new(router)));
        self
    }

    pub fn pipe_dispatch_middleware(&mut self) -> &mut Self {
        self.pipeline.pipe(Arc::new(DispatchMiddleware::new(Arc::clone(&self.factory))));
        self
    }

    /// Pipe before the routing middleware.
    pub fn pipe_implicit_head_middleware(&mut self) -> &mut Self {
        let router = Arc::clone(self.router());
        self.pipeline.pipe(Arc::new(ImplicitHeadMiddleware::new(router)));
        self
    }

    /// Pipe before the routing middleware.
    pub fn pipe_implicit_options_middleware(&mut self) -> &mut Self {
        let router = Arc::clone(self.router());
        self.pipeline.pipe(Arc::new(ImplicitOptionsMiddleware::new(router)));
        self
    }

    // ── Routes ───────────────────────────────────────────────────────────────

    pub fn route(
        &mut self,
        path: &str,
        middleware: impl Into<MiddlewareRef>,
        methods: impl Into<Methods>,
        name: Option<&str>,
    ) -> Result<Arc<Route>> {
        self.routes.route(path, middleware, methods, name)
    }

    /// Registers a route configured up front (name, options).
    pub fn add_route(&mut self, route: Route) -> Result<Arc<Route>> {
        self.routes.add(route)
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

    pub fn generate_uri(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        self.router().read().generate_uri(name, params)
    }

    // ── Serving ──────────────────────────────────────────────────────────────

    /// Runs `req` through the pipeline.
    ///
    /// Errors raised anywhere in the pipeline come back unchanged; turning
    /// them into responses is the job of error-handling middleware or the
    /// runner.
    pub async fn handle(&self, req: Request) -> Result<Response> {
        self.pipeline.handle(req, self.fallback.as_ref()).await
    }
}

