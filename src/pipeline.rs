//! Ordered middleware pipeline.
//!
//! # How a request walks the pipeline
//!
//! ```text
//! pipeline.process(req, fallback)
//!        ↓
//! Next { index: 0 }.handle(req)
//!        ↓ skip entries whose prefix does not match req.path()
//! entry[i].process(req, &Next { index: i + 1 })
//!        ↓ the entry calls its continuation ... or returns early
//! Next { index: i + 1 }.handle(req)
//!        ↓ ... past the last entry
//! fallback.handle(req)
//! ```
//!
//! Each continuation is a small `Copy` value holding the entry slice and the
//! index to resume at. Nothing is shared between requests except the entry
//! list itself, which is only mutated through `&mut Pipeline`.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::handler::{BoxFuture, RequestHandler};
use crate::middleware::{Middleware, PathPrefix, process_scoped};
use crate::request::Request;

/// One piped stage: a prefix and the middleware it guards.
pub struct PipelineEntry {
    prefix: PathPrefix,
    middleware: Arc<dyn Middleware>,
}

impl PipelineEntry {
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    pub fn middleware(&self) -> &Arc<dyn Middleware> {
        &self.middleware
    }
}

impl fmt::Debug for PipelineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineEntry").field("prefix", &self.prefix.as_str()).finish_non_exhaustive()
    }
}

/// An ordered sequence of middleware, itself usable as middleware.
///
/// Entries run in insertion order. Piping twice at the same prefix keeps
/// both entries.
#[derive(Default)]
pub struct Pipeline {
    entries: Vec<PipelineEntry>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends a stage that runs for every path.
    pub fn pipe(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.pipe_path("/", middleware)
    }

    /// Appends a stage that only runs under `prefix`, seeing paths relative
    /// to it.
    pub fn pipe_path(&mut self, prefix: &str, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.entries.push(PipelineEntry { prefix: PathPrefix::new(prefix), middleware });
        self
    }

    pub fn entries(&self) -> &[PipelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the pipeline, falling through to `fallback` if every stage delegates.
    pub fn handle<'a>(&'a self, req: Request, fallback: &'a dyn RequestHandler) -> BoxFuture<'a> {
        Next { entries: &self.entries, index: 0, fallback }.resume(req)
    }
}

impl Middleware for Pipeline {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        self.handle(req, handler)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("entries", &self.entries).finish()
    }
}

/// Continuation resuming the pipeline at `index`.
#[derive(Clone, Copy)]
struct Next<'a> {
    entries: &'a [PipelineEntry],
    index: usize,
    fallback: &'a dyn RequestHandler,
}

impl<'a> Next<'a> {
    fn resume(self, req: Request) -> BoxFuture<'a> {
        let mut index = self.index;
        while let Some(entry) = self.entries.get(index) {
            if entry.prefix.matches(req.path()) {
                break;
            }
            trace!(index, prefix = entry.prefix.as_str(), path = req.path(), "skipping pipeline stage");
            index += 1;
        }

        let Some(entry) = self.entries.get(index) else {
            return self.fallback.handle(req);
        };

        let next = Next { index: index + 1, ..self };
        Box::pin(async move { process_scoped(&entry.prefix, entry.middleware.as_ref(), req, &next).await })
    }
}

impl RequestHandler for Next<'_> {
    fn handle<'b>(&'b self, req: Request) -> BoxFuture<'b> {
        self.resume(req)
    }
}
