//! Radix-tree router backed by `matchit`.
//!
//! One tree per HTTP method, plus one for routes that accept any method.
//! Routes accepting any method are also planted in every method tree, so a
//! single lookup in the request method's tree finds the most specific
//! pattern that serves that method. Each leaf holds a *group*: the routes
//! that share a pattern once parameter names are ignored, in registration
//! order.

use std::collections::hash_map::Entry as Slot;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;
use matchit::{Params, Router as MatchitRouter};
use tracing::trace;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::route::{Methods, Route, RouteResult};

use super::Router;
use super::pattern::PathPattern;

#[derive(Clone)]
struct Entry {
    route: Arc<Route>,
    pattern: PathPattern,
}

/// A matchit tree whose leaves index route groups.
#[derive(Default)]
struct Tree {
    tree: MatchitRouter<usize>,
    groups: Vec<Vec<Entry>>,
    by_pattern: HashMap<String, usize>,
}

impl Tree {
    fn insert(&mut self, key: &str, entry: Entry) -> Result<()> {
        let group = match self.by_pattern.get(key) {
            Some(&group) => group,
            None => {
                let group = self.groups.len();
                self.tree
                    .insert(key, group)
                    .map_err(|e| Error::invalid_route(entry.route.path(), e.to_string()))?;
                self.by_pattern.insert(key.to_owned(), group);
                self.groups.push(Vec::new());
                group
            }
        };
        self.groups[group].push(entry);
        Ok(())
    }

    /// First route of the most specific group matching `path`.
    fn lookup<'t, 'p>(&'t self, path: &'p str) -> Option<(&'t Entry, Params<'t, 'p>)> {
        let matched = self.tree.at(path).ok()?;
        let entry = self.groups.get(*matched.value)?.first()?;
        Some((entry, matched.params))
    }

    fn matches(&self, path: &str) -> bool {
        self.tree.at(path).is_ok()
    }
}

/// The reference [`Router`].
///
/// Specificity comes from the tree: static segments beat parameters, which
/// beat catch-alls. `/users/new` and `/users/{id}` coexist, and `/users/new`
/// is never captured as an id. Specificity is judged among the routes that
/// serve the request method: with `GET /users/new` and `DELETE /users/{id}`,
/// `DELETE /users/new` reaches the parameterised route.
#[derive(Default)]
pub struct TreeRouter {
    /// Every pattern ever inserted, to reject conflicts before any tree changes.
    patterns: MatchitRouter<()>,
    known: HashSet<String>,
    any: Tree,
    any_entries: Vec<(String, Entry)>,
    by_method: HashMap<Method, Tree>,
    /// Methods in the order they were first registered.
    method_order: Vec<Method>,
    by_name: HashMap<String, PathPattern>,
    len: usize,
}

impl TreeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The tree for `method`, created on first use and seeded with the
    /// any-method routes registered so far.
    fn method_tree(&mut self, method: &Method) -> Result<&mut Tree> {
        match self.by_method.entry(method.clone()) {
            Slot::Occupied(slot) => Ok(slot.into_mut()),
            Slot::Vacant(slot) => {
                let mut tree = Tree::default();
                for (key, entry) in &self.any_entries {
                    tree.insert(key, entry.clone())?;
                }
                self.method_order.push(method.clone());
                Ok(slot.insert(tree))
            }
        }
    }
}

impl Router for TreeRouter {
    fn add_route(&mut self, route: Arc<Route>) -> Result<()> {
        let pattern = PathPattern::parse(route.path())?;
        let name = route.name();
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateRoute {
                path: route.path().to_owned(),
                detail: format!("a route named `{name}` is already registered"),
            });
        }

        let key = pattern.normalized();
        if !self.known.contains(&key) {
            self.patterns
                .insert(key.as_str(), ())
                .map_err(|e| Error::invalid_route(route.path(), e.to_string()))?;
            self.known.insert(key.clone());
        }

        let entry = Entry { route: Arc::clone(&route), pattern: pattern.clone() };
        match route.methods() {
            Methods::Any => {
                self.any.insert(&key, entry.clone())?;
                for tree in self.by_method.values_mut() {
                    tree.insert(&key, entry.clone())?;
                }
                self.any_entries.push((key, entry));
            }
            Methods::Only(methods) => {
                for method in methods {
                    self.method_tree(method)?.insert(&key, entry.clone())?;
                }
            }
        }

        trace!(route = %name, path = route.path(), "route added to tree");
        self.by_name.insert(name, pattern);
        self.len += 1;
        Ok(())
    }

    fn match_request(&self, req: &Request) -> RouteResult {
        let tree = self.by_method.get(req.method()).unwrap_or(&self.any);
        if let Some((entry, matched)) = tree.lookup(req.path()) {
            let params = entry
                .pattern
                .params()
                .filter_map(|(name, key)| matched.get(&key).map(|v| (name.to_owned(), v.to_owned())))
                .collect();
            return RouteResult::Success { route: Arc::clone(&entry.route), params };
        }

        let allowed: Vec<Method> = self
            .method_order
            .iter()
            .filter(|method| self.by_method.get(*method).is_some_and(|tree| tree.matches(req.path())))
            .cloned()
            .collect();

        if allowed.is_empty() {
            RouteResult::Failure
        } else {
            RouteResult::MethodNotAllowed { allowed }
        }
    }

    fn generate_uri(&self, name: &str, params: &[(&str, &str)]) -> Result<String> {
        let pattern = self.by_name.get(name).ok_or_else(|| Error::RouteNotFound(name.to_owned()))?;
        pattern.expand(name, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: Vec<Route>) -> TreeRouter {
        let mut router = TreeRouter::new();
        for route in routes {
            router.add_route(Arc::new(route)).unwrap();
        }
        router
    }

    fn name_of(result: &RouteResult) -> Option<String> {
        result.matched_route().map(|r| r.name())
    }

    #[test]
    fn literal_segments_beat_parameters() {
        let router = router(vec![
            Route::new("/users/{id}", "show", Method::GET).with_name("show"),
            Route::new("/users/new", "new", Method::GET).with_name("new"),
        ]);

        let result = router.match_request(&Request::new(Method::GET, "/users/new"));
        assert_eq!(name_of(&result).as_deref(), Some("new"));

        let result = router.match_request(&Request::new(Method::GET, "/users/7"));
        assert_eq!(name_of(&result).as_deref(), Some("show"));
        assert_eq!(result.matched_params(), [("id".to_owned(), "7".to_owned())]);
    }

    #[test]
    fn less_specific_pattern_serves_methods_the_literal_lacks() {
        let router = router(vec![
            Route::new("/users/new", "new", Method::GET).with_name("new"),
            Route::new("/users/{id}", "remove", Method::DELETE).with_name("remove"),
        ]);

        let result = router.match_request(&Request::new(Method::DELETE, "/users/new"));
        assert_eq!(name_of(&result).as_deref(), Some("remove"));
        assert_eq!(result.matched_params(), [("id".to_owned(), "new".to_owned())]);

        let result = router.match_request(&Request::new(Method::PUT, "/users/new"));
        assert_eq!(result.allowed_methods(), Some(&[Method::GET, Method::DELETE][..]));
    }

    #[test]
    fn any_method_routes_are_seen_by_methods_registered_later() {
        let router = router(vec![
            Route::new("/files/{*path}", "files", Methods::Any).with_name("files"),
            Route::new("/files/index", "index", Method::POST).with_name("index"),
        ]);

        let result = router.match_request(&Request::new(Method::GET, "/files/index"));
        assert_eq!(name_of(&result).as_deref(), Some("files"));

        let result = router.match_request(&Request::new(Method::POST, "/files/index"));
        assert_eq!(name_of(&result).as_deref(), Some("index"));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn equally_specific_patterns_resolve_to_the_first_registered() {
        let router = router(vec![
            Route::new("/items/{id}", "by-id", Method::GET).with_name("by-id"),
            Route::new("/items/{slug}", "by-slug", Method::GET).with_name("by-slug"),
        ]);

        let result = router.match_request(&Request::new(Method::GET, "/items/abc"));
        assert_eq!(name_of(&result).as_deref(), Some("by-id"));
        assert_eq!(result.matched_params(), [("id".to_owned(), "abc".to_owned())]);
    }

    #[test]
    fn equally_specific_patterns_pick_by_method_with_their_own_param_names() {
        let router = router(vec![
            Route::new("/items/{id}", "read", Method::GET),
            Route::new("/items/{slug}", "write", Method::PUT),
        ]);

        let result = router.match_request(&Request::new(Method::PUT, "/items/abc"));
        assert_eq!(result.matched_params(), [("slug".to_owned(), "abc".to_owned())]);
    }

    #[test]
    fn wrong_method_aggregates_allowed_methods_in_registration_order() {
        let router = router(vec![
            Route::new("/foo", "a", [Method::GET, Method::POST]),
            Route::new("/foo", "b", [Method::PATCH, Method::GET]),
        ]);

        let result = router.match_request(&Request::new(Method::DELETE, "/foo"));
        assert_eq!(result.allowed_methods(), Some(&[Method::GET, Method::POST, Method::PATCH][..]));
    }

    #[test]
    fn any_method_route_always_matches() {
        let router = router(vec![Route::new("/ping", "ping", Methods::Any)]);
        let method = Method::from_bytes(b"PURGE").unwrap();
        assert!(router.match_request(&Request::new(method, "/ping")).is_success());
    }

    #[test]
    fn unknown_path_is_a_generic_failure() {
        let router = router(vec![Route::new("/foo", "a", Method::GET)]);
        assert!(matches!(router.match_request(&Request::new(Method::GET, "/bar")), RouteResult::Failure));
    }

    #[test]
    fn catch_all_captures_the_remaining_path() {
        let router = router(vec![Route::new("/files/{*path}", "files", Method::GET)]);
        let result = router.match_request(&Request::new(Method::GET, "/files/docs/readme.md"));
        assert_eq!(result.matched_params(), [("path".to_owned(), "docs/readme.md".to_owned())]);
    }

    #[test]
    fn names_are_unique() {
        let mut router = router(vec![Route::new("/a", "a", Method::GET).with_name("x")]);
        let err = router.add_route(Arc::new(Route::new("/b", "b", Method::GET).with_name("x"))).unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { .. }));
    }

    #[test]
    fn generate_uri_uses_route_names() {
        let router = router(vec![Route::new("/users/{id}", "show", Method::GET).with_name("users.show")]);
        assert_eq!(router.generate_uri("users.show", &[("id", "42")]).unwrap(), "/users/42");
        assert!(matches!(router.generate_uri("nope", &[]), Err(Error::RouteNotFound(_))));
        assert!(matches!(
            router.generate_uri("users.show", &[]),
            Err(Error::MissingParameter { .. })
        ));
    }
}
