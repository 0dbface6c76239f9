//! Minimal trellis example: a routed JSON API behind an auth stage.
//!
//! Run with:
//!   cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X PUT http://localhost:3000/users/42          → 405, Allow: GET,DELETE
//!   curl http://localhost:3000/admin/stats              → 401
//!   curl -H 'authorization: demo' http://localhost:3000/admin/stats

use http::StatusCode;
use trellis::{
    Application, MiddlewareContainer, MiddlewareFactory, MiddlewareRef, Request, Response, Server, ServiceMap,
    TreeRouter,
};

#[tokio::main]
async fn main() -> trellis::Result<()> {
    tracing_subscriber::fmt::init();

    let services = ServiceMap::new().with_middleware("auth", RequireAuth);
    let factory = MiddlewareFactory::new(MiddlewareContainer::new(services));

    let mut app = Application::new(factory, TreeRouter::new());
    app.pipe(MiddlewareRef::callable(|req, next| {
        Box::pin(async move {
            let started = std::time::Instant::now();
            let method = req.method().clone();
            let path = req.path().to_owned();
            let res = next.handle(req).await;
            tracing::info!(%method, %path, elapsed = ?started.elapsed(), "request");
            res
        })
    }))?;
    app.pipe_path("/admin", "auth")?;
    app.pipe_implicit_head_middleware()
        .pipe_implicit_options_middleware()
        .pipe_routing_middleware()
        .pipe_dispatch_middleware();

    app.route("/users/{id}", MiddlewareRef::handler_fn(get_user), http::Method::GET, Some("users.show"))?;
    app.delete("/users/{id}", MiddlewareRef::handler_fn(delete_user))?;
    app.post("/users", MiddlewareRef::handler_fn(create_user))?;
    app.get("/admin/stats", MiddlewareRef::handler_fn(stats))?;

    Server::bind("0.0.0.0:3000").serve(app).await
}

async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#)
}

async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn stats(_req: Request) -> Response {
    Response::json(r#"{"users":1}"#)
}

/// Rejects requests without an `authorization` header.
struct RequireAuth;

impl trellis::Middleware for RequireAuth {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn trellis::RequestHandler) -> trellis::BoxFuture<'a> {
        if req.header("authorization").is_none() {
            return Box::pin(async { Ok(Response::status(StatusCode::UNAUTHORIZED)) });
        }
        handler.handle(req)
    }
}
