#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use trellis::{
    Application, BoxFuture, Middleware, MiddlewareFactory, MiddlewareRef, Request, RequestHandler, Response,
    TreeRouter,
};

/// Shared log of which stages ran, in order.
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Records `label` and continues.
pub fn tag(trace: &Trace, label: &'static str) -> MiddlewareRef {
    let trace = trace.clone();
    MiddlewareRef::callable(move |req, next| {
        trace.push(label);
        Box::pin(async move { next.handle(req).await })
    })
}

/// Records `before:label`, continues, records `after:label`.
pub fn wrap(trace: &Trace, label: &'static str) -> MiddlewareRef {
    let trace = trace.clone();
    MiddlewareRef::callable(move |req, next| {
        let trace = trace.clone();
        Box::pin(async move {
            trace.push(format!("before:{label}"));
            let res = next.handle(req).await;
            trace.push(format!("after:{label}"));
            res
        })
    })
}

/// Records `label` and answers with `label` as body, without continuing.
pub fn respond(trace: &Trace, label: &'static str) -> MiddlewareRef {
    let trace = trace.clone();
    MiddlewareRef::callable(move |_req, _next| {
        trace.push(label);
        Box::pin(async move { Ok(Response::text(label)) })
    })
}

/// Records the path it sees and continues.
pub fn observe_path(trace: &Trace) -> MiddlewareRef {
    let trace = trace.clone();
    MiddlewareRef::callable(move |req, next| {
        trace.push(req.path().to_owned());
        Box::pin(async move { next.handle(req).await })
    })
}

/// Terminal handler echoing the path it sees.
pub fn echo_path() -> MiddlewareRef {
    MiddlewareRef::handler_fn(|req: Request| async move { Response::text(req.path().to_owned()) })
}

/// Fallback handler that records being reached.
pub struct Fallback(pub Trace);

impl RequestHandler for Fallback {
    fn handle<'a>(&'a self, req: Request) -> BoxFuture<'a> {
        self.0.push("fallback");
        let body = format!("fallback {}", req.path());
        Box::pin(async move { Ok(Response::text(body)) })
    }
}

/// Middleware constructible by type, answering with a fixed body.
#[derive(Default)]
pub struct FromType;

impl Middleware for FromType {
    fn process<'a>(&'a self, _req: Request, _handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        Box::pin(async { Ok(Response::text("from type")) })
    }
}

/// Middleware registered as a service, answering with a fixed body.
pub struct FromService;

impl Middleware for FromService {
    fn process<'a>(&'a self, _req: Request, _handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        Box::pin(async { Ok(Response::text("from service")) })
    }
}

pub fn prepare(middleware: MiddlewareRef) -> Arc<dyn Middleware> {
    MiddlewareFactory::default().prepare(middleware).unwrap()
}

/// An application with routing and dispatch piped, nothing else.
pub fn routed_app() -> Application {
    let mut app = Application::new(MiddlewareFactory::default(), TreeRouter::new());
    app.pipe_routing_middleware().pipe_dispatch_middleware();
    app
}

pub fn body(res: &Response) -> &str {
    std::str::from_utf8(res.body()).unwrap()
}
