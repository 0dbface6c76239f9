//! Adapters from plain functions and handlers to [`Middleware`].

use crate::handler::{BoxFuture, BoxedHandler, RequestHandler};
use crate::request::Request;
use crate::response::Response;

use super::Middleware;

/// A terminal handler in middleware position. The continuation is never called.
pub struct HandlerMiddleware {
    handler: BoxedHandler,
}

impl HandlerMiddleware {
    pub fn new(handler: BoxedHandler) -> Self {
        Self { handler }
    }
}

impl Middleware for HandlerMiddleware {
    fn process<'a>(&'a self, req: Request, _handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        self.handler.handle(req)
    }
}

/// Middleware backed by a `(request, handler)` function.
pub struct CallableMiddleware<F> {
    f: F,
}

impl<F> CallableMiddleware<F>
where
    F: for<'a> Fn(Request, &'a dyn RequestHandler) -> BoxFuture<'a> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Middleware for CallableMiddleware<F>
where
    F: for<'a> Fn(Request, &'a dyn RequestHandler) -> BoxFuture<'a> + Send + Sync,
{
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        (self.f)(req, handler)
    }
}

/// Middleware backed by a `(request, response, handler)` function.
///
/// The function receives a fresh copy of the response prototype on every
/// call, to decorate or return as it sees fit.
pub struct DoublePassMiddleware<F> {
    f: F,
    prototype: Response,
}

impl<F> DoublePassMiddleware<F>
where
    F: for<'a> Fn(Request, Response, &'a dyn RequestHandler) -> BoxFuture<'a> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, prototype: Response::default() }
    }

    pub fn with_response_prototype(mut self, prototype: Response) -> Self {
        self.prototype = prototype;
        self
    }
}

impl<F> Middleware for DoublePassMiddleware<F>
where
    F: for<'a> Fn(Request, Response, &'a dyn RequestHandler) -> BoxFuture<'a> + Send + Sync,
{
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        (self.f)(req, self.prototype.clone(), handler)
    }
}
