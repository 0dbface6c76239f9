//! Route pattern parsing and URI generation.
//!
//! Syntax: `/literal/{param}/{*rest}`. A parameter takes a whole segment and
//! a catch-all must come last.

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

#[derive(Clone, Debug)]
pub(crate) struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub(crate) fn parse(path: &str) -> Result<Self> {
        let Some(body) = path.strip_prefix('/') else {
            return Err(Error::invalid_route(path, "patterns must start with `/`"));
        };

        let parts: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());
        let mut names: Vec<&str> = Vec::new();

        for (i, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(inner) => {
                    let (catch_all, name) = match inner.strip_prefix('*') {
                        Some(name) => (true, name),
                        None => (false, inner),
                    };
                    if !is_identifier(name) {
                        return Err(Error::invalid_route(path, format!("`{name}` is not a valid parameter name")));
                    }
                    if names.contains(&name) {
                        return Err(Error::invalid_route(path, format!("parameter `{name}` appears twice")));
                    }
                    if catch_all && i + 1 != parts.len() {
                        return Err(Error::invalid_route(path, "a catch-all parameter must be the last segment"));
                    }
                    names.push(name);
                    if catch_all { Segment::CatchAll(name.to_owned()) } else { Segment::Param(name.to_owned()) }
                }
                None if part.contains(['{', '}']) => {
                    return Err(Error::invalid_route(path, format!("segment `{part}` mixes literal text and braces")));
                }
                None => Segment::Literal((*part).to_owned()),
            };
            segments.push(segment);
        }

        Ok(Self { raw: path.to_owned(), segments })
    }

    /// The pattern with parameters renamed by position (`{p0}`, `{*p1}`), so
    /// patterns that differ only in parameter names collapse to one key.
    pub(crate) fn normalized(&self) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for (i, segment) in self.segments.iter().enumerate() {
            out.push('/');
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(_) => out.push_str(&format!("{{{}}}", positional(i))),
                Segment::CatchAll(_) => out.push_str(&format!("{{*{}}}", positional(i))),
            }
        }
        out
    }

    /// `(declared name, positional key)` for every parameter, in order.
    pub(crate) fn params(&self) -> impl Iterator<Item = (&str, String)> {
        self.segments.iter().enumerate().filter_map(|(i, segment)| match segment {
            Segment::Param(name) | Segment::CatchAll(name) => Some((name.as_str(), positional(i))),
            Segment::Literal(_) => None,
        })
    }

    /// Substitutes `params` into the pattern.
    pub(crate) fn expand(&self, route: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Param(name) | Segment::CatchAll(name) => {
                    let value = params
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| Error::MissingParameter { route: route.to_owned(), param: name.clone() })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn positional(index: usize) -> String {
    format!("p{index}")
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_parameter_names_by_position() {
        let a = PathPattern::parse("/users/{id}/posts/{post}").unwrap();
        let b = PathPattern::parse("/users/{name}/posts/{slug}").unwrap();
        assert_eq!(a.normalized(), "/users/{p1}/posts/{p3}");
        assert_eq!(a.normalized(), b.normalized());
    }

    #[test]
    fn root_and_trailing_slash_survive_normalisation() {
        assert_eq!(PathPattern::parse("/").unwrap().normalized(), "/");
        assert_eq!(PathPattern::parse("/users/").unwrap().normalized(), "/users/");
    }

    #[test]
    fn rejects_malformed_patterns() {
        for bad in ["users", "/files/{*rest}/more", "/a/{id}/{id}", "/a/{}", "/a/x{id}", "/a/{bad-name}"] {
            assert!(
                matches!(PathPattern::parse(bad), Err(Error::InvalidRoute { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn expand_substitutes_and_reports_missing_params() {
        let pattern = PathPattern::parse("/users/{id}/files/{*path}").unwrap();
        assert_eq!(
            pattern.expand("file", &[("id", "42"), ("path", "a/b.txt"), ("extra", "x")]).unwrap(),
            "/users/42/files/a/b.txt"
        );

        let err = pattern.expand("file", &[("id", "42")]).unwrap_err();
        assert!(matches!(err, Error::MissingParameter { ref param, .. } if param == "path"));
    }
}
