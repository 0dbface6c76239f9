//! Route value objects and routing outcomes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::error::{Error, Result};
use crate::middleware::MiddlewareRef;

// ── Methods ───────────────────────────────────────────────────────────────────

/// The HTTP methods a route answers to.
///
/// Methods are an open set: anything `http::Method` accepts, including
/// extension verbs such as `PURGE`, is a valid token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Methods {
    Any,
    /// Ordered and free of duplicates; order is registration order.
    Only(Vec<Method>),
}

impl Methods {
    /// Parses method tokens. Tokens are upper-cased; duplicates are dropped.
    pub fn parse<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut methods = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim().to_ascii_uppercase();
            let method = Method::from_bytes(token.as_bytes())
                .map_err(|_| Error::Config(format!("`{token}` is not an HTTP method token")))?;
            methods.push(method);
        }
        Ok(Self::from(methods))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn allows(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(list) => list.contains(method),
        }
    }

    /// `true` when some method is claimed by both sides.
    pub fn intersects(&self, other: &Methods) -> bool {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => true,
            (Self::Only(a), Self::Only(b)) => a.iter().any(|m| b.contains(m)),
        }
    }

    /// The explicit list, or `None` for [`Methods::Any`].
    pub fn as_slice(&self) -> Option<&[Method]> {
        match self {
            Self::Any => None,
            Self::Only(list) => Some(list),
        }
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Self::Only(vec![method])
    }
}

impl From<Vec<Method>> for Methods {
    fn from(list: Vec<Method>) -> Self {
        let mut unique: Vec<Method> = Vec::with_capacity(list.len());
        for method in list {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        Self::Only(unique)
    }
}

impl<const N: usize> From<[Method; N]> for Methods {
    fn from(list: [Method; N]) -> Self {
        Self::from(Vec::from(list))
    }
}

impl fmt::Display for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(list) => f.write_str(&join(list, ",")),
        }
    }
}

pub(crate) fn join(methods: &[Method], sep: &str) -> String {
    methods.iter().map(Method::as_str).collect::<Vec<_>>().join(sep)
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// A path pattern bound to a middleware reference and a set of methods.
///
/// Configure name and options *before* handing the route to a
/// [`RouteCollector`](crate::RouteCollector); once registered it is shared as
/// `Arc<Route>` and immutable.
#[derive(Clone)]
pub struct Route {
    path: String,
    middleware: MiddlewareRef,
    methods: Methods,
    name: Option<String>,
    options: BTreeMap<String, String>,
}

impl Route {
    pub fn new(path: impl Into<String>, middleware: impl Into<MiddlewareRef>, methods: impl Into<Methods>) -> Self {
        Self {
            path: path.into(),
            middleware: middleware.into(),
            methods: methods.into(),
            name: None,
            options: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_methods(mut self, methods: impl Into<Methods>) -> Self {
        self.methods = methods.into();
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &str { &self.path }
    pub fn middleware(&self) -> &MiddlewareRef { &self.middleware }
    pub fn methods(&self) -> &Methods { &self.methods }
    pub fn options(&self) -> &BTreeMap<String, String> { &self.options }

    /// The explicit name, or one derived from path and methods:
    /// `/users` for any method, `/users^GET:POST` otherwise.
    pub fn name(&self) -> String {
        match (&self.name, &self.methods) {
            (Some(name), _) => name.clone(),
            (None, Methods::Any) => self.path.clone(),
            (None, Methods::Only(list)) => format!("{}^{}", self.path, join(list, ":")),
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.allows(method)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name())
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("middleware", &self.middleware)
            .field("options", &self.options)
            .finish()
    }
}

// ── RouteResult ───────────────────────────────────────────────────────────────

/// Outcome of matching one request against the routing table.
#[derive(Clone, Debug)]
pub enum RouteResult {
    Success {
        route: Arc<Route>,
        /// Path parameters in pattern order.
        params: Vec<(String, String)>,
    },
    /// Nothing matched the path.
    Failure,
    /// The path matched, the method did not.
    MethodNotAllowed {
        /// Every method the path accepts, in registration order.
        allowed: Vec<Method>,
    },
}

impl RouteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_method_failure(&self) -> bool {
        matches!(self, Self::MethodNotAllowed { .. })
    }

    pub fn matched_route(&self) -> Option<&Arc<Route>> {
        match self {
            Self::Success { route, .. } => Some(route),
            _ => None,
        }
    }

    pub fn matched_middleware(&self) -> Option<&MiddlewareRef> {
        self.matched_route().map(|r| r.middleware())
    }

    pub fn matched_params(&self) -> &[(String, String)] {
        match self {
            Self::Success { params, .. } => params,
            _ => &[],
        }
    }

    pub fn allowed_methods(&self) -> Option<&[Method]> {
        match self {
            Self::MethodNotAllowed { allowed } => Some(allowed),
            _ => None,
        }
    }
}
