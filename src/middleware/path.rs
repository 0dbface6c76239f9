//! Path-prefix scoping.
//!
//! A scoped stage only runs for requests under its prefix, and sees the path
//! with the prefix removed: middleware mounted at `/api` sees `/api/users` as
//! `/users`. When the stage hands the request on, the continuation puts the
//! full path back before the outer chain resumes.

use std::sync::Arc;

use tracing::trace;

use crate::handler::{BoxFuture, RequestHandler};
use crate::request::Request;

use super::Middleware;

/// A normalised, segment-aligned path prefix.
///
/// `/foo` matches `/foo` and `/foo/bar`, never `/foobar`. `/` matches
/// everything. Trailing slashes are insignificant: `/foo/` equals `/foo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PathPrefix(String);

impl PathPrefix {
    pub(crate) fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            Self("/".to_owned())
        } else if trimmed.starts_with('/') {
            Self(trimmed.to_owned())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub(crate) fn matches(&self, path: &str) -> bool {
        if self.is_root() {
            return true;
        }
        match path.strip_prefix(self.0.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The remainder of `path` below this prefix. Callers check
    /// [`matches`](Self::matches) first.
    pub(crate) fn strip<'p>(&self, path: &'p str) -> &'p str {
        if self.is_root() {
            return path;
        }
        match path.get(self.0.len()..) {
            Some("") | None => "/",
            Some(rest) => rest,
        }
    }
}

/// Continuation that restores the unscoped path before resuming the outer chain.
struct RestorePath<'a> {
    original: String,
    next: &'a dyn RequestHandler,
}

impl RequestHandler for RestorePath<'_> {
    fn handle<'b>(&'b self, req: Request) -> BoxFuture<'b> {
        self.next.handle(req.with_path(self.original.clone()))
    }
}

/// Runs `inner` against the scoped view of `req`. The caller has already
/// checked that `prefix` matches.
pub(crate) fn process_scoped<'a>(
    prefix: &'a PathPrefix,
    inner: &'a dyn Middleware,
    req: Request,
    next: &'a dyn RequestHandler,
) -> BoxFuture<'a> {
    if prefix.is_root() {
        return inner.process(req, next);
    }
    let original = req.path().to_owned();
    let scoped = prefix.strip(&original).to_owned();
    trace!(prefix = prefix.as_str(), path = %original, scoped = %scoped, "entering scoped middleware");
    Box::pin(async move {
        let restore = RestorePath { original, next };
        inner.process(req.with_path(scoped), &restore).await
    })
}

/// Decorator that confines a middleware to a path prefix.
///
/// Requests outside the prefix skip the inner middleware and go straight to
/// the continuation, untouched.
pub struct PathMiddleware {
    prefix: PathPrefix,
    inner: Arc<dyn Middleware>,
}

impl PathMiddleware {
    pub fn new(prefix: &str, inner: Arc<dyn Middleware>) -> Self {
        Self { prefix: PathPrefix::new(prefix), inner }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }
}

impl Middleware for PathMiddleware {
    fn process<'a>(&'a self, req: Request, handler: &'a dyn RequestHandler) -> BoxFuture<'a> {
        if !self.prefix.matches(req.path()) {
            return handler.handle(req);
        }
        process_scoped(&self.prefix, self.inner.as_ref(), req, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_normalised() {
        assert_eq!(PathPrefix::new("api/").as_str(), "/api");
        assert_eq!(PathPrefix::new("").as_str(), "/");
        assert_eq!(PathPrefix::new("/").as_str(), "/");
    }

    #[test]
    fn prefix_respects_segment_boundaries() {
        let prefix = PathPrefix::new("/foo");
        assert!(prefix.matches("/foo"));
        assert!(prefix.matches("/foo/"));
        assert!(prefix.matches("/foo/bar"));
        assert!(!prefix.matches("/foobar"));
        assert!(!prefix.matches("/bar/foo"));
    }

    #[test]
    fn strip_leaves_a_rooted_path() {
        let prefix = PathPrefix::new("/api");
        assert_eq!(prefix.strip("/api"), "/");
        assert_eq!(prefix.strip("/api/users/42"), "/users/42");
        assert_eq!(PathPrefix::new("/").strip("/users"), "/users");
    }
}
