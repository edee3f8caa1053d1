//! Path matching.
//!
//! Patterns are compiled once at registration. Resolution then walks the
//! registered entries three times, once per [`PatternKind`], so an exact route
//! always beats a template and a template always beats a regex, whatever the
//! registration order. Within one kind the first registered route wins.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;

use crate::error::{Error, RoutingError};
use crate::method::Method;
use crate::route::PatternKind;
use crate::router::RouteEntry;

/// Variables captured from the request path, by name.
pub type UriVariables = BTreeMap<String, String>;

/// A compiled path pattern.
pub(crate) enum Pattern {
    Exact(String),
    Template(Template),
    Regex { source: String, regex: Regex },
}

/// `{name}` segments are matched by a single-route radix tree; the segment
/// count is checked first so `/a/{b}` can never swallow `/a/x/y`.
pub(crate) struct Template {
    source: String,
    segments: usize,
    tree: matchit::Router<()>,
}

impl Pattern {
    pub(crate) fn compile(kind: PatternKind, source: &str) -> Result<Self, Error> {
        match kind {
            PatternKind::Exact => Ok(Self::Exact(source.to_owned())),
            PatternKind::Template => Template::compile(source).map(Self::Template),
            PatternKind::Regex => {
                let regex = Regex::new(&format!("^(?:{source})$"))
                    .map_err(|e| invalid(source, e.to_string()))?;
                Ok(Self::Regex { source: source.to_owned(), regex })
            }
        }
    }

    pub(crate) fn kind(&self) -> PatternKind {
        match self {
            Self::Exact(_) => PatternKind::Exact,
            Self::Template(_) => PatternKind::Template,
            Self::Regex { .. } => PatternKind::Regex,
        }
    }

    pub(crate) fn source(&self) -> &str {
        match self {
            Self::Exact(s) => s,
            Self::Template(t) => &t.source,
            Self::Regex { source, .. } => source,
        }
    }

    pub(crate) fn is_match(&self, path: &str) -> bool {
        match self {
            Self::Exact(s) => s == path,
            Self::Template(t) => t.captures(path).is_some(),
            Self::Regex { regex, .. } => regex.is_match(path),
        }
    }

    /// Variables bound by matching `path`, or `None` when it does not match.
    pub(crate) fn captures(&self, path: &str) -> Option<UriVariables> {
        match self {
            Self::Exact(s) => (s == path).then(UriVariables::new),
            Self::Template(t) => t.captures(path),
            Self::Regex { regex, .. } => {
                let caps = regex.captures(path)?;
                let vars = regex
                    .capture_names()
                    .enumerate()
                    .skip(1)
                    .filter_map(|(i, name)| {
                        let value = caps.get(i)?.as_str().to_owned();
                        let key = name.map_or_else(|| i.to_string(), str::to_owned);
                        Some((key, value))
                    })
                    .collect();
                Some(vars)
            }
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind(), self.source())
    }
}

impl Template {
    fn compile(source: &str) -> Result<Self, Error> {
        if !source.starts_with('/') {
            return Err(invalid(source, "template must start with `/`"));
        }

        let mut names: Vec<&str> = Vec::new();
        for segment in source.split('/') {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty()
                        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                    {
                        return Err(invalid(source, format!("bad variable name `{name}`")));
                    }
                    if names.contains(&name) {
                        return Err(invalid(source, format!("variable `{name}` appears twice")));
                    }
                    names.push(name);
                }
                None if segment.contains(['{', '}']) => {
                    return Err(invalid(source, "a variable must span a whole segment"));
                }
                None => {}
            }
        }

        let mut tree = matchit::Router::new();
        tree.insert(source, ()).map_err(|e| invalid(source, e.to_string()))?;

        Ok(Self { source: source.to_owned(), segments: source.split('/').count(), tree })
    }

    fn captures(&self, path: &str) -> Option<UriVariables> {
        if path.split('/').count() != self.segments {
            return None;
        }
        let matched = self.tree.at(path).ok()?;
        let mut vars = UriVariables::new();
        for (name, value) in matched.params.iter() {
            if value.is_empty() {
                return None;
            }
            vars.insert(name.to_owned(), value.to_owned());
        }
        Some(vars)
    }
}

/// The single best route for a request, plus the variables its path bound.
#[derive(Debug)]
pub struct Match<'r> {
    pub entry: &'r RouteEntry,
    pub variables: UriVariables,
}

const PRECEDENCE: [PatternKind; 3] = [PatternKind::Exact, PatternKind::Template, PatternKind::Regex];

/// Finds the route for `method` + `path` among `entries` (registration order).
pub(crate) fn resolve<'r>(
    entries: &'r [RouteEntry],
    method: Method,
    path: &str,
) -> Result<Match<'r>, RoutingError> {
    for kind in PRECEDENCE {
        let candidates = entries
            .iter()
            .filter(|e| e.pattern.kind() == kind && e.accepts(method));
        for entry in candidates {
            if let Some(variables) = entry.pattern.captures(path) {
                return Ok(Match { entry, variables });
            }
        }
    }

    Err(unrouted(entries, path))
}

/// Why no route answered `path`: some route matches it under other methods,
/// or none matches it at all.
pub(crate) fn unrouted(entries: &[RouteEntry], path: &str) -> RoutingError {
    let mut allowed: Vec<Method> = entries
        .iter()
        .filter(|e| e.pattern.is_match(path))
        .flat_map(|e| e.methods().iter().copied())
        .collect();
    allowed.sort();
    allowed.dedup();

    if allowed.is_empty() {
        RoutingError::NoRouteFound
    } else {
        RoutingError::MethodNotAllowed { allowed }
    }
}

fn invalid(pattern: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRoute { pattern: pattern.to_owned(), reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> UriVariables {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn exact_compares_whole_path() {
        let p = Pattern::compile(PatternKind::Exact, "/test-get").unwrap();
        assert_eq!(p.captures("/test-get"), Some(UriVariables::new()));
        assert_eq!(p.captures("/test-get/"), None);
        assert_eq!(p.captures("/test"), None);
    }

    #[test]
    fn template_binds_each_variable() {
        let p = Pattern::compile(PatternKind::Template, "/aaa/{bbb}/ccc/{ddd}").unwrap();
        assert_eq!(
            p.captures("/aaa/FOO/ccc/BAR"),
            Some(vars(&[("bbb", "FOO"), ("ddd", "BAR")]))
        );
    }

    #[test]
    fn template_needs_same_segment_count_and_literals() {
        let p = Pattern::compile(PatternKind::Template, "/aaa/{bbb}").unwrap();
        assert_eq!(p.captures("/aaa/x"), Some(vars(&[("bbb", "x")])));
        assert_eq!(p.captures("/aaa/x/y"), None);
        assert_eq!(p.captures("/aaa"), None);
        assert_eq!(p.captures("/zzz/x"), None);
    }

    #[test]
    fn template_variable_never_matches_empty_segment() {
        let p = Pattern::compile(PatternKind::Template, "/aaa/{bbb}/ccc").unwrap();
        assert_eq!(p.captures("/aaa//ccc"), None);
        let tail = Pattern::compile(PatternKind::Template, "/aaa/{bbb}").unwrap();
        assert_eq!(tail.captures("/aaa/"), None);
    }

    #[test]
    fn template_rejects_partial_and_duplicate_variables() {
        assert!(Pattern::compile(PatternKind::Template, "/a/x{b}").is_err());
        assert!(Pattern::compile(PatternKind::Template, "/a/{b}/{b}").is_err());
        assert!(Pattern::compile(PatternKind::Template, "/a/{}").is_err());
        assert!(Pattern::compile(PatternKind::Template, "/a/{*rest}").is_err());
        assert!(Pattern::compile(PatternKind::Template, "a/{b}").is_err());
    }

    #[test]
    fn regex_is_anchored_at_both_ends() {
        let p = Pattern::compile(PatternKind::Regex, "/any/[a-z]+").unwrap();
        assert!(p.is_match("/any/foo"));
        assert!(!p.is_match("/any/foo/bar"));
        assert!(!p.is_match("/x/any/foo"));
    }

    #[test]
    fn regex_alternation_is_anchored_as_a_whole() {
        let p = Pattern::compile(PatternKind::Regex, "/a|/b").unwrap();
        assert!(p.is_match("/a"));
        assert!(!p.is_match("/a/tail"));
        assert!(!p.is_match("/x/b"));
    }

    #[test]
    fn regex_groups_are_keyed_by_name_or_position() {
        let p = Pattern::compile(PatternKind::Regex, "/files/(?P<dir>[^/]+)/(.*)").unwrap();
        assert_eq!(
            p.captures("/files/docs/a/b.txt"),
            Some(vars(&[("dir", "docs"), ("2", "a/b.txt")]))
        );
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = Pattern::compile(PatternKind::Regex, "/broken(").unwrap_err();
        assert!(matches!(err, Error::InvalidRoute { .. }));
    }
}
