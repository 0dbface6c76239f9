//! Implicit `HEAD` and `OPTIONS` support.
//!
//! Both stages sit in front of the routing middleware and only act when the
//! router reports a method mismatch, so explicitly registered `HEAD` or
//! `OPTIONS` routes always win.

use bytes::Bytes;
use http::header::{ALLOW, HeaderValue};
use http::Method;
use tracing::debug;

use crate::handler::{BoxFuture, RequestHandler};
use crate::request::Request;
use crate::response::Response;
use crate::route::{RouteResult, join};
use crate::router::SharedRouter;

use super::Middleware;

/// Attribute holding the method a request arrived with before an implicit
/// rewrite (an `http::Method`).
pub const FORWARDED_METHOD_ATTRIBUTE: &str = "trellis.forwarded_method";

fn allowed_methods(router: &SharedRouter, req: &Request) -> Option<Vec<Method>> {
    match router.read().match_request(req) {
        RouteResult::MethodNotAllowed { allowed } => Some(allowed),
        _ => None,
    }
}

/// Serves `HEAD` from the matching `GET` route with the body removed.
pub struct ImplicitHeadMiddleware {
    router: SharedRouter,
}

impl ImplicitHeadMiddleware {
    pub fn new(router: SharedRouter) -> Self {
        Self { router }
    }
}

impl Middleware for ImplicitHeadMiddleware {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        if req.method() != Method::HEAD {
            return handler.handle(req);
        }
        match allowed_methods(&self.router, &req) {
            Some(allowed) if allowed.contains(&Method::GET) => {
                debug!(path = req.path(), "answering HEAD from GET route");
                let req = req
                    .with_method(Method::GET)
                    .with_attribute(FORWARDED_METHOD_ATTRIBUTE, Method::HEAD);
                Box::pin(async move {
                    let res = handler.handle(req).await?;
                    Ok(res.with_body(Bytes::new()))
                })
            }
            _ => handler.handle(req),
        }
    }
}

/// Answers `OPTIONS` with the path's `Allow` list when no route handles it.
pub struct ImplicitOptionsMiddleware {
    router: SharedRouter,
}

impl ImplicitOptionsMiddleware {
    pub fn new(router: SharedRouter) -> Self {
        Self { router }
    }
}

impl Middleware for ImplicitOptionsMiddleware {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        if req.method() != Method::OPTIONS {
            return handler.handle(req);
        }
        match allowed_methods(&self.router, &req) {
            Some(allowed) => {
                let allow = join(&allowed, ",");
                debug!(path = req.path(), allow = %allow, "answering OPTIONS implicitly");
                let mut res = Response::default();
                if let Ok(value) = HeaderValue::try_from(allow) {
                    res = res.with_header(ALLOW, value);
                }
                Box::pin(async move { Ok(res) })
            }
            None => handler.handle(req),
        }
    }
}
