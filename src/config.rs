//! Declarative pipeline and route wiring.
//!
//! ```toml
//! [[pipeline]]
//! middleware = "trellis.routing"
//! priority = 10
//!
//! [[pipeline]]
//! middleware = ["auth", "audit"]
//! path = "/admin"
//! priority = 50
//!
//! [[pipeline]]
//! middleware = "trellis.dispatch"
//!
//! [[routes]]
//! path = "/users/{id}"
//! middleware = "users.show"
//! methods = ["GET"]
//! name = "users.show"
//! ```
//!
//! Pipeline entries run by priority, highest first; equal priorities keep
//! their order in the file. Middleware is always named by service.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::application::Application;
use crate::error::{Error, Result};
use crate::middleware::MiddlewareRef;
use crate::route::{Methods, Route};

/// Service name that pipes the routing middleware.
pub const ROUTING_MIDDLEWARE: &str = "trellis.routing";
/// Service name that pipes the dispatch middleware.
pub const DISPATCH_MIDDLEWARE: &str = "trellis.dispatch";

const DEFAULT_PRIORITY: i64 = 1;

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationConfig {
    #[serde(default)]
    pub pipeline: Vec<PipelineConfig>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// A service name or an array of them.
    pub middleware: toml::Value,
    pub path: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub path: String,
    /// A service name or an array of them.
    pub middleware: toml::Value,
    /// Absent means any method.
    pub methods: Option<Vec<String>>,
    pub name: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ApplicationConfig {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Pipeline entries by priority descending, ties in declaration order.
    pub fn ordered_pipeline(&self) -> Vec<&PipelineConfig> {
        let mut entries: Vec<&PipelineConfig> = self.pipeline.iter().collect();
        entries.sort_by_key(|entry| Reverse(entry.priority));
        entries
    }

    /// Pipes every pipeline entry and registers every route on `app`.
    pub fn apply(&self, app: &mut Application) -> Result<()> {
        for entry in self.ordered_pipeline() {
            let path = entry.path.as_deref().unwrap_or("/");
            debug!(path, priority = entry.priority, middleware = %entry.middleware, "piping configured middleware");
            let at_root = path.trim_end_matches('/').is_empty();
            match entry.middleware.as_str() {
                Some(ROUTING_MIDDLEWARE) if at_root => {
                    app.pipe_routing_middleware();
                }
                Some(DISPATCH_MIDDLEWARE) if at_root => {
                    app.pipe_dispatch_middleware();
                }
                Some(reserved @ (ROUTING_MIDDLEWARE | DISPATCH_MIDDLEWARE)) => {
                    return Err(Error::Config(format!(
                        "`{reserved}` can only be piped at the root, not under `{path}`"
                    )));
                }
                _ => {
                    app.pipe_path(path, to_middleware_ref(&entry.middleware)?)?;
                }
            }
        }

        for route in &self.routes {
            let methods = match &route.methods {
                Some(tokens) => Methods::parse(tokens)?,
                None => Methods::Any,
            };
            let mut configured = Route::new(route.path.as_str(), to_middleware_ref(&route.middleware)?, methods)
                .with_options(route.options.clone());
            if let Some(name) = &route.name {
                configured = configured.with_name(name.as_str());
            }
            app.add_route(configured)?;
        }
        Ok(())
    }
}

/// Converts a configured middleware value.
///
/// Strings become service references and arrays become nested pipelines;
/// any other TOML type is rejected by name.
pub fn to_middleware_ref(value: &toml::Value) -> Result<MiddlewareRef> {
    match value {
        toml::Value::String(name) if !name.is_empty() => Ok(MiddlewareRef::Service(name.clone())),
        toml::Value::String(_) => Err(Error::InvalidMiddleware("received an empty service name".to_owned())),
        toml::Value::Array(items) if !items.is_empty() => {
            items.iter().map(to_middleware_ref).collect::<Result<Vec<_>>>().map(MiddlewareRef::Pipeline)
        }
        toml::Value::Array(_) => Err(Error::InvalidMiddleware("received an empty middleware list".to_owned())),
        other => Err(Error::InvalidMiddleware(format!(
            "expected a service name or a list of them, received {}",
            other.type_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewareFactory;
    use crate::router::TreeRouter;

    #[test]
    fn priorities_sort_descending_and_stably() {
        let config = ApplicationConfig::from_toml(
            r#"
            [[pipeline]]
            middleware = "first-default"

            [[pipeline]]
            middleware = "high"
            priority = 100

            [[pipeline]]
            middleware = "second-default"

            [[pipeline]]
            middleware = "low"
            priority = -5
            "#,
        )
        .unwrap();

        let order: Vec<&str> = config
            .ordered_pipeline()
            .iter()
            .filter_map(|entry| entry.middleware.as_str())
            .collect();
        assert_eq!(order, ["high", "first-default", "second-default", "low"]);
    }

    #[test]
    fn non_string_middleware_is_rejected_by_type() {
        for (value, kind) in [
            (toml::Value::Integer(3), "integer"),
            (toml::Value::Boolean(true), "boolean"),
            (toml::Value::Float(1.5), "float"),
        ] {
            let err = to_middleware_ref(&value).unwrap_err();
            assert!(err.to_string().contains(kind), "{err} should name {kind}");
        }
    }

    #[test]
    fn arrays_become_nested_pipelines() {
        let value: toml::Value = toml::Value::Array(vec![
            toml::Value::String("a".into()),
            toml::Value::Array(vec![toml::Value::String("b".into())]),
        ]);
        let MiddlewareRef::Pipeline(refs) = to_middleware_ref(&value).unwrap() else {
            panic!("expected a pipeline");
        };
        assert_eq!(refs.len(), 2);
        assert!(matches!(&refs[1], MiddlewareRef::Pipeline(inner) if inner.len() == 1));
    }

    #[test]
    fn routing_and_dispatch_cannot_be_scoped_to_a_path() {
        for name in [ROUTING_MIDDLEWARE, DISPATCH_MIDDLEWARE] {
            let mut app = Application::new(MiddlewareFactory::default(), TreeRouter::new());
            let config = ApplicationConfig::from_toml(&format!(
                "[[pipeline]]\nmiddleware = \"{name}\"\npath = \"/api\""
            ))
            .unwrap();

            let err = config.apply(&mut app).unwrap_err();
            assert!(matches!(err, Error::Config(ref msg) if msg.contains(name) && msg.contains("/api")), "{err}");
            assert!(app.pipeline().is_empty());
        }
    }

    #[test]
    fn unknown_keys_are_configuration_errors() {
        let err = ApplicationConfig::from_toml("[[routes]]\npath = \"/\"\nmiddleware = \"x\"\nverb = \"GET\"")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
