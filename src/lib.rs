//! # trellis
//!
//! A composable middleware pipeline with routing and dispatch.
//!
//! ## The model
//!
//! An [`Application`] is an ordered [`Pipeline`] of middleware. Each stage
//! gets the request and a continuation; it can act before and after calling
//! the continuation, or answer on its own and stop the chain. Routing is just
//! two stages:
//!
//! - [`RouteMiddleware`] asks the [`Router`] about the request. A match is
//!   recorded on the request (the [`RouteResult`] plus every path parameter
//!   as its own attribute); a path that exists with another method is
//!   answered `405` on the spot; anything else moves on untouched.
//! - [`DispatchMiddleware`] runs whatever the matched route points at.
//!
//! Stages you pipe between the two see the routing outcome before the route
//! runs, which is where authorisation by route name belongs.
//!
//! Middleware can be given as an instance, a terminal handler, a plain
//! function, a service name resolved through a [`MiddlewareContainer`], or a
//! list of any of these; [`MiddlewareFactory::prepare`] normalises them all.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{Application, MiddlewareFactory, MiddlewareRef, Request, Response, Server, TreeRouter};
//!
//! #[tokio::main]
//! async fn main() -> trellis::Result<()> {
//!     let mut app = Application::new(MiddlewareFactory::default(), TreeRouter::new());
//!     app.pipe_routing_middleware()
//!         .pipe_dispatch_middleware();
//!
//!     app.get("/users/{id}", MiddlewareRef::handler_fn(get_user))?;
//!     app.post("/users", MiddlewareRef::handler_fn(create_user))?;
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_user(_req: Request) -> Response {
//!     Response::builder()
//!         .status(http::StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(r#"{"id":"99"}"#)
//! }
//! ```

mod application;
mod collector;
mod config;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod route;
mod router;
mod server;

pub mod middleware;

pub use application::Application;
pub use collector::RouteCollector;
pub use config::{
    ApplicationConfig, DISPATCH_MIDDLEWARE, PipelineConfig, ROUTING_MIDDLEWARE, RouteConfig, to_middleware_ref,
};
pub use error::{BoxError, Error, Result};
pub use handler::{BoxFuture, BoxedHandler, Handler, IntoOutcome, NotFoundHandler, RequestHandler};
pub use middleware::{
    DispatchMiddleware, Middleware, MiddlewareContainer, MiddlewareFactory, MiddlewareRef, RouteMiddleware,
    Service, ServiceLocator, ServiceMap,
};
pub use pipeline::{Pipeline, PipelineEntry};
pub use request::{ROUTE_RESULT_ATTRIBUTE, Request};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use route::{Methods, Route, RouteResult};
pub use router::{Router, SharedRouter, TreeRouter, shared};
pub use server::Server;
