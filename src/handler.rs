//! Request handlers and type erasure.
//!
//! # Terminal vs. continuation handlers
//!
//! A [`RequestHandler`] turns a request into a response. It is both the thing
//! at the very end of a pipeline (the fallback that runs when every stage
//! delegated) and the "next" continuation each middleware receives. Calling
//! it continues the chain; not calling it stops the chain.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ MiddlewareRef::handler_fn(hello)
//! hello.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                       ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn RequestHandler>
//! handler.handle(req)  at request time             ← one vtable dispatch
//!        ↓
//! Box::pin(async { hello(req).await.into_outcome() })  ← BoxFuture
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Core types ────────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a response or an
/// error propagating up the pipeline.
///
/// The lifetime lets a middleware's future borrow the middleware itself and
/// the continuation it was handed, instead of cloning them per request.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;

/// Produces a response for a request.
///
/// Implemented by terminal handlers and by the pipeline's continuations.
pub trait RequestHandler: Send + Sync {
    fn handle<'a>(&'a self, req: Request) -> BoxFuture<'a>;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn RequestHandler>;

impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    fn handle<'a>(&'a self, req: Request) -> BoxFuture<'a> {
        (**self).handle(req)
    }
}

// ── IntoOutcome ──────────────────────────────────────────────────────────────

/// What an `async fn` handler may return: anything [`IntoResponse`], or a
/// `Result` whose error travels up the pipeline.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Response>;
}

impl IntoOutcome for Response {
    fn into_outcome(self) -> Result<Response> { Ok(self) }
}

impl IntoOutcome for StatusCode {
    fn into_outcome(self) -> Result<Response> { Ok(self.into_response()) }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Result<Response> { Ok(self.into_response()) }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Result<Response> { Ok(self.into_response()) }
}

impl IntoOutcome for Result<Response, Error> {
    fn into_outcome(self) -> Result<Response> { self }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every `async fn` usable as a terminal handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// function with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoOutcome
/// ```
///
/// The trait is **sealed**; implement [`RequestHandler`] directly for
/// handler structs.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Bridges a plain `async fn` to [`RequestHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> RequestHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + Send + 'static,
{
    fn handle<'a>(&'a self, req: Request) -> BoxFuture<'a> {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── NotFoundHandler ───────────────────────────────────────────────────────────

/// Default terminal handler of an [`Application`](crate::Application).
///
/// Answers `404` with `Cannot <METHOD> <path>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotFoundHandler;

impl RequestHandler for NotFoundHandler {
    fn handle<'a>(&'a self, req: Request) -> BoxFuture<'a> {
        let body = format!("Cannot {} {}", req.method(), req.path());
        Box::pin(async move {
            Ok(Response::builder().status(StatusCode::NOT_FOUND).text(body))
        })
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;

    #[tokio::test]
    async fn async_fn_becomes_a_request_handler() {
        async fn hello(req: Request) -> String {
            format!("hello {}", req.path())
        }

        let handler = hello.into_boxed_handler();
        let res = handler.handle(Request::new(Method::GET, "/world")).await.unwrap();
        assert_eq!(res.body().as_ref(), b"hello /world");
    }

    #[tokio::test]
    async fn handler_errors_propagate() {
        async fn broken(_req: Request) -> Result<Response> {
            Err(Error::handler("boom"))
        }

        let handler = broken.into_boxed_handler();
        let err = handler.handle(Request::new(Method::GET, "/")).await.unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
    }

    #[tokio::test]
    async fn not_found_names_method_and_path() {
        let res = NotFoundHandler
            .handle(Request::new(Method::DELETE, "/missing"))
            .await
            .unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body().as_ref(), b"Cannot DELETE /missing");
    }
}
