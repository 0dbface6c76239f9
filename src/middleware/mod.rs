//! Middleware layer.
//!
//! Middleware intercepts a request on its way to the terminal handler and is
//! the right place for cross-cutting concerns: routing, dispatch, request-id
//! injection, authentication, error translation. Each stage receives the
//! request and a continuation. It may work before and after calling the
//! continuation, or return its own response without calling it.
//!
//! Every supported middleware representation is a variant of
//! [`MiddlewareRef`]; [`MiddlewareFactory::prepare`] turns any of them into
//! one invocable `Arc<dyn Middleware>`.

mod adapter;
mod container;
mod dispatch;
mod factory;
mod implicit;
mod lazy;
mod path;
mod routing;

use std::fmt;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, Handler, RequestHandler};
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;

pub use adapter::{CallableMiddleware, DoublePassMiddleware, HandlerMiddleware};
pub use container::{MiddlewareContainer, Service, ServiceLocator, ServiceMap};
pub use dispatch::DispatchMiddleware;
pub use factory::MiddlewareFactory;
pub use implicit::{FORWARDED_METHOD_ATTRIBUTE, ImplicitHeadMiddleware, ImplicitOptionsMiddleware};
pub use lazy::LazyMiddleware;
pub use path::PathMiddleware;
pub use routing::RouteMiddleware;

pub(crate) use path::{PathPrefix, process_scoped};

/// A pipeline stage.
///
/// `handler` is the rest of the chain. Calling it continues; returning
/// without calling it short-circuits everything downstream.
pub trait Middleware: Send + Sync {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a>;
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        (**self).process(req, handler)
    }
}

// ── MiddlewareRef ─────────────────────────────────────────────────────────────

/// Any value the application may hand over as middleware.
///
/// Plain functions enter through an explicit constructor picked at
/// registration time: [`callable`](Self::callable) for
/// `(request, handler)` functions, [`double_pass`](Self::double_pass) for
/// `(request, response, handler)` functions and
/// [`handler_fn`](Self::handler_fn) for terminal `async fn(request)`.
#[derive(Clone)]
pub enum MiddlewareRef {
    /// Already satisfies the middleware contract.
    Instance(Arc<dyn Middleware>),
    /// Terminal handler; never calls the continuation.
    Handler(BoxedHandler),
    /// Resolved through the [`MiddlewareContainer`] when invoked.
    Service(String),
    /// Runs each element in order as a nested pipeline.
    Pipeline(Vec<MiddlewareRef>),
}

impl MiddlewareRef {
    pub fn instance(middleware: impl Middleware + 'static) -> Self {
        Self::Instance(Arc::new(middleware))
    }

    pub fn handler(handler: impl RequestHandler + 'static) -> Self {
        Self::Handler(Arc::new(handler))
    }

    pub fn handler_fn(handler: impl Handler) -> Self {
        Self::Handler(handler.into_boxed_handler())
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self::Service(name.into())
    }

    pub fn pipeline(refs: impl IntoIterator<Item = MiddlewareRef>) -> Self {
        Self::Pipeline(refs.into_iter().collect())
    }

    /// Wraps a `(request, handler)` function.
    ///
    /// ```rust
    /// use trellis::MiddlewareRef;
    ///
    /// let timing = MiddlewareRef::callable(|req, next| {
    ///     Box::pin(async move {
    ///         let started = std::time::Instant::now();
    ///         let res = next.handle(req).await;
    ///         tracing::debug!(elapsed = ?started.elapsed());
    ///         res
    ///     })
    /// });
    /// ```
    pub fn callable<F>(f: F) -> Self
    where
        F: for<'a> Fn(Request, &'a dyn RequestHandler) -> BoxFuture<'a> + Send + Sync + 'static,
    {
        Self::Instance(Arc::new(CallableMiddleware::new(f)))
    }

    /// Wraps a `(request, response, handler)` function. The response argument
    /// is a clone of [`Response::default`].
    pub fn double_pass<F>(f: F) -> Self
    where
        F: for<'a> Fn(Request, Response, &'a dyn RequestHandler) -> BoxFuture<'a> + Send + Sync + 'static,
    {
        Self::Instance(Arc::new(DoublePassMiddleware::new(f)))
    }

    /// `true` for an empty service name or an empty list; such a reference
    /// has nothing to invoke.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Service(name) => name.is_empty(),
            Self::Pipeline(refs) => refs.is_empty(),
            Self::Instance(_) | Self::Handler(_) => false,
        }
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        Self::Service(name.to_owned())
    }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        Self::Service(name)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        Self::Instance(middleware)
    }
}

impl From<Pipeline> for MiddlewareRef {
    fn from(pipeline: Pipeline) -> Self {
        Self::Instance(Arc::new(pipeline))
    }
}

impl From<Vec<MiddlewareRef>> for MiddlewareRef {
    fn from(refs: Vec<MiddlewareRef>) -> Self {
        Self::Pipeline(refs)
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance(..)"),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Service(name) => f.debug_tuple("Service").field(name).finish(),
            Self::Pipeline(refs) => f.debug_tuple("Pipeline").field(refs).finish(),
        }
    }
}

impl fmt::Display for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("middleware instance"),
            Self::Handler(_) => f.write_str("request handler"),
            Self::Service(name) => write!(f, "service `{name}`"),
            Self::Pipeline(refs) => write!(f, "pipeline of {} middleware", refs.len()),
        }
    }
}
