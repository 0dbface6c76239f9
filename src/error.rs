//! Unified error type.

use thiserror::Error;

/// Boxed error produced by a service locator or by application middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across trellis.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by trellis' fallible operations.
///
/// Routing misses and method mismatches are *not* errors: they surface as a
/// forwarded request and a `405` response respectively. This type covers
/// setup mistakes (duplicate routes, bad patterns), reverse-routing failures
/// and middleware that cannot be resolved at dispatch time.
#[derive(Debug, Error)]
pub enum Error {
    /// Two routes claim the same method on the same path, or share a name.
    #[error("duplicate route `{path}`: {detail}")]
    DuplicateRoute { path: String, detail: String },

    /// `generate_uri` was asked for a route name nobody registered.
    #[error("no route named `{0}`")]
    RouteNotFound(String),

    /// `generate_uri` was not given a value for a path parameter.
    #[error("route `{route}` requires parameter `{param}`")]
    MissingParameter { route: String, param: String },

    /// The container could not produce the named service.
    #[error("unable to resolve service `{name}`")]
    MissingDependency {
        name: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A value does not satisfy the middleware contract.
    #[error("invalid middleware: {0}")]
    InvalidMiddleware(String),

    /// A route pattern the router backend refuses.
    #[error("invalid route `{path}`: {reason}")]
    InvalidRoute { path: String, reason: String },

    /// Declarative configuration could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Socket-level failure in the runner.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by application middleware or handlers.
    #[error(transparent)]
    Handler(BoxError),
}

impl Error {
    /// Wraps an application error so it can travel up the pipeline.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    pub(crate) fn missing_dependency(name: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::MissingDependency { name: name.into(), source }
    }

    pub(crate) fn invalid_route(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoute { path: path.into(), reason: reason.into() }
    }
}
