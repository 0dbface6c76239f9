//! Deferred service lookup for middleware referenced by name.

use std::sync::Arc;

use crate::handler::{BoxFuture, RequestHandler};
use crate::request::Request;

use super::{Middleware, MiddlewareContainer};

/// Middleware named by service, resolved on every invocation.
///
/// Resolution errors propagate unchanged.
pub struct LazyMiddleware {
    name: String,
    container: Arc<MiddlewareContainer>,
}

impl LazyMiddleware {
    pub fn new(name: impl Into<String>, container: Arc<MiddlewareContainer>) -> Self {
        Self { name: name.into(), container }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Middleware for LazyMiddleware {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        Box::pin(async move {
            let middleware = self.container.get(&self.name)?;
            middleware.process(req, handler).await
        })
    }
}
