//! Normalising middleware references.

mod common;

use std::sync::Arc;

use common::*;
use http::{Method, StatusCode};
use trellis::{
    Error, Middleware, MiddlewareContainer, MiddlewareFactory, MiddlewareRef, Request, Service, ServiceMap,
};

#[test]
fn prepared_instances_come_back_unchanged() {
    let factory = MiddlewareFactory::default();
    let instance: Arc<dyn Middleware> = Arc::new(FromType);

    let once = factory.prepare(Arc::clone(&instance)).unwrap();
    let twice = factory.prepare(Arc::clone(&once)).unwrap();

    assert!(Arc::ptr_eq(&instance, &once));
    assert!(Arc::ptr_eq(&once, &twice));
}

#[test]
fn empty_references_are_invalid() {
    let factory = MiddlewareFactory::default();

    for empty in [MiddlewareRef::service(""), MiddlewareRef::Pipeline(Vec::new())] {
        let err = factory.prepare(empty).err().expect("empty reference should fail");
        assert!(matches!(err, Error::InvalidMiddleware(_)), "{err}");
    }
}

#[test]
fn nested_empty_lists_are_invalid_too() {
    let factory = MiddlewareFactory::default();
    let nested = MiddlewareRef::pipeline([MiddlewareRef::service("a"), MiddlewareRef::Pipeline(Vec::new())]);
    assert!(matches!(factory.prepare(nested), Err(Error::InvalidMiddleware(_))));
}

#[tokio::test]
async fn handlers_never_call_the_continuation() {
    let trace = Trace::default();
    let middleware = prepare(echo_path());

    let res = middleware
        .process(Request::new(Method::GET, "/here"), &Fallback(trace.clone()))
        .await
        .unwrap();

    assert_eq!(body(&res), "/here");
    assert!(trace.entries().is_empty());
}

#[tokio::test]
async fn service_names_resolve_lazily_on_every_call() {
    let builds = Trace::default();
    let counter = builds.clone();
    let locator = ServiceMap::new().with_factory("counted", move || {
        counter.push("built");
        Ok(Service::middleware(FromService))
    });
    let factory = MiddlewareFactory::new(MiddlewareContainer::new(locator));

    let middleware = factory.prepare("counted").unwrap();
    assert!(builds.entries().is_empty(), "preparing must not resolve");

    for _ in 0..2 {
        let res = middleware
            .process(Request::new(Method::GET, "/"), &Fallback(Trace::default()))
            .await
            .unwrap();
        assert_eq!(body(&res), "from service");
    }
    assert_eq!(builds.entries(), ["built", "built"]);
}

#[tokio::test]
async fn unknown_services_fail_at_invocation_with_missing_dependency() {
    let factory = MiddlewareFactory::default();
    let middleware = factory.prepare("ghost").expect("preparing a name never resolves it");

    let err = middleware
        .process(Request::new(Method::GET, "/"), &Fallback(Trace::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingDependency { ref name, .. } if name == "ghost"), "{err}");
}

#[tokio::test]
async fn locator_failures_keep_their_cause() {
    let locator = ServiceMap::new().with_factory("broken", || Err("database is down".into()));
    let container = MiddlewareContainer::new(locator);

    let err = container.get("broken").err().expect("resolution should fail");
    let source = std::error::Error::source(&err).expect("cause should be kept");
    assert_eq!(source.to_string(), "database is down");
}

#[test]
fn container_reports_what_it_can_resolve() {
    let container = MiddlewareContainer::new(ServiceMap::new().with_middleware("svc", FromService))
        .with_type::<FromType>("typed");

    assert!(container.has("svc"));
    assert!(container.has("typed"));
    assert!(!container.has("other"));
}

#[tokio::test]
async fn lists_become_pipelines_that_delegate_at_the_end() {
    let trace = Trace::default();
    let middleware = prepare(MiddlewareRef::pipeline([tag(&trace, "one"), tag(&trace, "two")]));

    let res = middleware
        .process(Request::new(Method::GET, "/p"), &Fallback(trace.clone()))
        .await
        .unwrap();

    assert_eq!(body(&res), "fallback /p");
    assert_eq!(trace.entries(), ["one", "two", "fallback"]);
}

#[tokio::test]
async fn path_decorator_confines_middleware_to_its_prefix() {
    let trace = Trace::default();
    let factory = MiddlewareFactory::default();
    let scoped = factory.path("/api", observe_path(&trace)).unwrap();

    scoped
        .process(Request::new(Method::GET, "/api/items"), &Fallback(trace.clone()))
        .await
        .unwrap();
    scoped
        .process(Request::new(Method::GET, "/apiary"), &Fallback(trace.clone()))
        .await
        .unwrap();

    assert_eq!(trace.entries(), ["/items", "fallback", "fallback"]);
}

#[tokio::test]
async fn path_decorator_restores_the_full_path_for_the_continuation() {
    let trace = Trace::default();
    let factory = MiddlewareFactory::default();
    let scoped = factory.path("/api/", tag(&trace, "inner")).unwrap();

    let res = scoped
        .process(Request::new(Method::GET, "/api/items"), &Fallback(trace.clone()))
        .await
        .unwrap();

    assert_eq!(body(&res), "fallback /api/items");
}

#[tokio::test]
async fn double_pass_functions_receive_a_response_prototype() {
    let middleware = prepare(MiddlewareRef::double_pass(|req, res, next| {
        Box::pin(async move {
            if req.header("x-short-circuit").is_some() {
                return Ok(res.with_status(StatusCode::ACCEPTED));
            }
            next.handle(req).await
        })
    }));

    let short = middleware
        .process(
            Request::new(Method::GET, "/").with_header(
                http::HeaderName::from_static("x-short-circuit"),
                http::HeaderValue::from_static("1"),
            ),
            &Fallback(Trace::default()),
        )
        .await
        .unwrap();
    assert_eq!(short.status_code(), StatusCode::ACCEPTED);
    assert!(short.body().is_empty());

    let through = middleware
        .process(Request::new(Method::GET, "/x"), &Fallback(Trace::default()))
        .await
        .unwrap();
    assert_eq!(body(&through), "fallback /x");
}

#[tokio::test]
async fn handler_structs_can_be_registered_directly() {
    let middleware = prepare(MiddlewareRef::handler(Fallback(Trace::default())));
    let res = middleware
        .process(Request::new(Method::GET, "/direct"), &trellis::NotFoundHandler)
        .await
        .unwrap();
    assert_eq!(body(&res), "fallback /direct");
}
