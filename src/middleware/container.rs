//! Resolving middleware by name.
//!
//! Two sources, consulted in this order:
//!
//! 1. A [`ServiceLocator`] (the application's service container).
//! 2. Constructor-only types registered with
//!    [`MiddlewareContainer::with_type`]: `Default` middleware built fresh on
//!    every lookup, with no container involvement.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{BoxError, Error, Result};
use crate::handler::{BoxedHandler, RequestHandler};

use super::{HandlerMiddleware, Middleware};

// ── Service ──────────────────────────────────────────────────────────────────

/// A value produced by a service locator.
#[derive(Clone)]
pub enum Service {
    Middleware(Arc<dyn Middleware>),
    /// Terminal handler; wrapped so it satisfies the middleware contract.
    Handler(BoxedHandler),
    /// Anything else the locator knows about. Never valid middleware.
    Value {
        type_name: &'static str,
        value: Arc<dyn Any + Send + Sync>,
    },
}

impl Service {
    pub fn middleware(middleware: impl Middleware + 'static) -> Self {
        Self::Middleware(Arc::new(middleware))
    }

    pub fn handler(handler: impl RequestHandler + 'static) -> Self {
        Self::Handler(Arc::new(handler))
    }

    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::Value { type_name: type_name::<T>(), value: Arc::new(value) }
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Middleware(_) => f.write_str("Middleware(..)"),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Value { type_name, .. } => f.debug_struct("Value").field("type_name", type_name).finish(),
        }
    }
}

// ── ServiceLocator ───────────────────────────────────────────────────────────

/// The application's service container, as far as trellis is concerned.
pub trait ServiceLocator: Send + Sync {
    fn has(&self, name: &str) -> bool;
    fn get(&self, name: &str) -> Result<Service, BoxError>;
}

type ServiceFactory = Arc<dyn Fn() -> Result<Service, BoxError> + Send + Sync>;

/// In-memory [`ServiceLocator`].
///
/// Services inserted as values are shared; services inserted as factories
/// are rebuilt on every lookup.
#[derive(Clone, Default)]
pub struct ServiceMap {
    services: HashMap<String, ServiceFactory>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, service: Service) -> &mut Self {
        self.services.insert(name.into(), Arc::new(move || Ok(service.clone())));
        self
    }

    pub fn insert_factory<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Service, BoxError> + Send + Sync + 'static,
    {
        self.services.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn with(mut self, name: impl Into<String>, service: Service) -> Self {
        self.insert(name, service);
        self
    }

    pub fn with_middleware(self, name: impl Into<String>, middleware: impl Middleware + 'static) -> Self {
        self.with(name, Service::middleware(middleware))
    }

    pub fn with_factory<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Service, BoxError> + Send + Sync + 'static,
    {
        self.insert_factory(name, factory);
        self
    }
}

impl ServiceLocator for ServiceMap {
    fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<Service, BoxError> {
        match self.services.get(name) {
            Some(factory) => factory(),
            None => Err(format!("service `{name}` is not registered").into()),
        }
    }
}

// ── MiddlewareContainer ──────────────────────────────────────────────────────

fn construct<M: Middleware + Default + 'static>() -> Service {
    Service::Middleware(Arc::new(M::default()))
}

fn construct_handler<H: RequestHandler + Default + 'static>() -> Service {
    Service::Handler(Arc::new(H::default()))
}

/// Name → middleware lookup over a [`ServiceLocator`].
pub struct MiddlewareContainer {
    locator: Arc<dyn ServiceLocator>,
    types: HashMap<String, fn() -> Service>,
}

impl MiddlewareContainer {
    pub fn new(locator: impl ServiceLocator + 'static) -> Self {
        Self::from_locator(Arc::new(locator))
    }

    pub fn from_locator(locator: Arc<dyn ServiceLocator>) -> Self {
        Self { locator, types: HashMap::new() }
    }

    /// A container with nothing in it.
    pub fn empty() -> Self {
        Self::new(ServiceMap::new())
    }

    /// Makes `M` constructible by `name` without registering it as a service.
    pub fn with_type<M: Middleware + Default + 'static>(mut self, name: impl Into<String>) -> Self {
        self.types.insert(name.into(), construct::<M>);
        self
    }

    /// Same as [`with_type`](Self::with_type), for terminal handler types.
    pub fn with_handler_type<H: RequestHandler + Default + 'static>(mut self, name: impl Into<String>) -> Self {
        self.types.insert(name.into(), construct_handler::<H>);
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.locator.has(name) || self.types.contains_key(name)
    }

    /// Resolves `name` to middleware.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingDependency`] if neither source knows the name, or the
    ///   locator failed to build it.
    /// - [`Error::InvalidMiddleware`] if the service is not middleware.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Middleware>> {
        let service = if self.locator.has(name) {
            trace!(service = name, "resolving from service locator");
            self.locator
                .get(name)
                .map_err(|e| Error::missing_dependency(name, Some(e)))?
        } else if let Some(construct) = self.types.get(name) {
            trace!(service = name, "constructing registered type");
            construct()
        } else {
            return Err(Error::missing_dependency(name, None));
        };

        match service {
            Service::Middleware(middleware) => Ok(middleware),
            Service::Handler(handler) => Ok(Arc::new(HandlerMiddleware::new(handler))),
            Service::Value { type_name, .. } => Err(Error::InvalidMiddleware(format!(
                "service `{name}` resolved to `{type_name}`, which is not middleware"
            ))),
        }
    }
}

impl Default for MiddlewareContainer {
    fn default() -> Self { Self::empty() }
}
