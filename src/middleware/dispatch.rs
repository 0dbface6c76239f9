//! The dispatch stage: runs the middleware of the matched route.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::handler::{BoxFuture, RequestHandler};
use crate::request::Request;
use crate::route::{Route, RouteResult};

use super::{Middleware, MiddlewareFactory, MiddlewareRef};

/// Invokes the middleware of the route the routing middleware matched.
///
/// Without a successful [`RouteResult`] on the request there is nothing to
/// dispatch and the chain continues.
pub struct DispatchMiddleware {
    factory: Arc<MiddlewareFactory>,
}

impl DispatchMiddleware {
    pub fn new(factory: Arc<MiddlewareFactory>) -> Self {
        Self { factory }
    }

    /// Resolves a route's middleware reference.
    ///
    /// Service names go to the container first, then to constructor-only
    /// types; whatever fails is reported as [`Error::InvalidMiddleware`]
    /// naming the route.
    fn resolve(&self, route: &Route) -> Result<Arc<dyn Middleware>> {
        let middleware = route.middleware();
        if middleware.is_empty() {
            return Err(Error::InvalidMiddleware(format!(
                "route `{}` does not have an action to dispatch",
                route.name()
            )));
        }

        match middleware {
            MiddlewareRef::Service(name) => self.factory.container().get(name).map_err(|e| {
                Error::InvalidMiddleware(format!(
                    "unable to resolve `{name}` for route `{}`: {e}",
                    route.name()
                ))
            }),
            other => self.factory.prepare(other.clone()),
        }
    }
}

impl Middleware for DispatchMiddleware {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        let matched = req.route_result().and_then(RouteResult::matched_route).cloned();
        let Some(route) = matched else {
            return handler.handle(req);
        };

        Box::pin(async move {
            let middleware = self.resolve(&route)?;
            debug!(route = %route.name(), middleware = %route.middleware(), "dispatching");
            middleware.process(req, handler).await
        })
    }
}
