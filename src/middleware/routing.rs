//! The routing stage: matches requests and records the route result.

use http::header::{ALLOW, HeaderValue};
use http::StatusCode;
use tracing::debug;

use crate::handler::{BoxFuture, RequestHandler};
use crate::request::{ROUTE_RESULT_ATTRIBUTE, Request};
use crate::response::Response;
use crate::route::{RouteResult, join};
use crate::router::SharedRouter;

use super::Middleware;

/// Matches the request against the router and records the outcome.
///
/// - match: the [`RouteResult`] and every path parameter become request
///   attributes, then the chain continues;
/// - wrong method: `405` with an `Allow` header, the chain stops here;
/// - no match: the request continues untouched.
pub struct RouteMiddleware {
    router: SharedRouter,
}

impl RouteMiddleware {
    pub fn new(router: SharedRouter) -> Self {
        Self { router }
    }
}

impl Middleware for RouteMiddleware {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        let result = self.router.read().match_request(&req);

        match result {
            RouteResult::Failure => {
                debug!(method = %req.method(), path = req.path(), "no route matched");
                handler.handle(req)
            }
            RouteResult::MethodNotAllowed { ref allowed } => {
                let allow = join(allowed, ",");
                debug!(method = %req.method(), path = req.path(), allow = %allow, "method not allowed");
                let mut res = Response::status(StatusCode::METHOD_NOT_ALLOWED);
                if let Ok(value) = HeaderValue::try_from(allow) {
                    res = res.with_header(ALLOW, value);
                }
                Box::pin(async move { Ok(res) })
            }
            RouteResult::Success { ref route, ref params } => {
                debug!(route = %route.name(), path = req.path(), "route matched");
                let mut req = req;
                for (name, value) in params {
                    req = req.with_attribute(name.clone(), value.clone());
                }
                handler.handle(req.with_attribute(ROUTE_RESULT_ATTRIBUTE, result.clone()))
            }
        }
    }
}
