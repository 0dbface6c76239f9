//! Normalising middleware references.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;

use super::{HandlerMiddleware, LazyMiddleware, Middleware, MiddlewareContainer, MiddlewareRef, PathMiddleware};

/// Turns any [`MiddlewareRef`] into invocable middleware.
pub struct MiddlewareFactory {
    container: Arc<MiddlewareContainer>,
}

impl MiddlewareFactory {
    pub fn new(container: MiddlewareContainer) -> Self {
        Self { container: Arc::new(container) }
    }

    pub fn from_container(container: Arc<MiddlewareContainer>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Arc<MiddlewareContainer> {
        &self.container
    }

    /// Normalises a reference.
    ///
    /// | reference                 | result                                  |
    /// |---------------------------|-----------------------------------------|
    /// | `Instance`                | returned as-is (same `Arc`)             |
    /// | `Handler`                 | wrapped; never calls its continuation   |
    /// | `Service(name)`           | resolved through the container per call |
    /// | `Pipeline(refs)`          | each element prepared, piped in order   |
    ///
    /// Empty service names and empty lists fail with
    /// [`Error::InvalidMiddleware`].
    pub fn prepare(&self, middleware: impl Into<MiddlewareRef>) -> Result<Arc<dyn Middleware>> {
        match middleware.into() {
            MiddlewareRef::Instance(instance) => Ok(instance),
            MiddlewareRef::Handler(handler) => Ok(Arc::new(HandlerMiddleware::new(handler))),
            MiddlewareRef::Service(name) if name.is_empty() => {
                Err(Error::InvalidMiddleware("received an empty service name".to_owned()))
            }
            MiddlewareRef::Service(name) => Ok(Arc::new(LazyMiddleware::new(name, Arc::clone(&self.container)))),
            MiddlewareRef::Pipeline(refs) => Ok(Arc::new(self.pipeline(refs)?)),
        }
    }

    /// Builds a fresh [`Pipeline`] from a non-empty list of references.
    pub fn pipeline(&self, refs: impl IntoIterator<Item = MiddlewareRef>) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new();
        for middleware in refs {
            pipeline.pipe(self.prepare(middleware)?);
        }
        if pipeline.is_empty() {
            return Err(Error::InvalidMiddleware("received an empty middleware list".to_owned()));
        }
        Ok(pipeline)
    }

    /// Prepares `middleware` and confines it to `prefix`.
    pub fn path(&self, prefix: &str, middleware: impl Into<MiddlewareRef>) -> Result<Arc<dyn Middleware>> {
        Ok(Arc::new(PathMiddleware::new(prefix, self.prepare(middleware)?)))
    }
}

impl Default for MiddlewareFactory {
    fn default() -> Self {
        Self::new(MiddlewareContainer::empty())
    }
}
