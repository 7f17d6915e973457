//! The routing trie: one tree of path segments per HTTP method.
//!
//! Patterns are split on `/` into three segment kinds:
//!
//! - **static** (`users`) — matched literally, case-sensitively;
//! - **parameter** (`:id`) — matches any single non-empty segment and binds
//!   its text to the name;
//! - **wildcard** (`*`) — only valid as the final segment; captures the
//!   remaining path (zero or more segments) under the name `"*"`.
//!
//! Lookup walks the tree one segment at a time, trying at each node: exact
//! static child, else parameter child, else wildcard. The walk never
//! backtracks — once a branch is taken it is committed, which keeps lookup
//! O(path length) regardless of how many routes are registered. Any apparent
//! ambiguity between registered routes is resolved by that fixed order, so
//! `/user/new` beats `/user/:id` which beats `/user/*`.
//!
//! A single trailing slash is stripped on both insertion and lookup, so
//! `/a` and `/a/` name the same route. The tree is mutated only by
//! [`SegmentNode::insert`]; lookups borrow it immutably, which is what makes
//! lock-free concurrent routing sound once registration ends.

use std::collections::HashMap;

use crate::error::RouteError;
use crate::handler::HandlerFunc;

/// The name a trailing `*` binds its capture to.
pub(crate) const WILDCARD_PARAM: &str = "*";

enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    Wildcard,
}

fn classify(segment: &str) -> Segment<'_> {
    if segment == "*" {
        Segment::Wildcard
    } else if let Some(name) = segment.strip_prefix(':') {
        Segment::Param(name)
    } else {
        Segment::Static(segment)
    }
}

/// Splits an absolute path into segments, stripping one trailing slash.
/// `/` is the root: zero segments.
fn split_path(path: &str) -> Vec<&str> {
    let path = if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    };
    if path == "/" {
        return Vec::new();
    }
    path[1..].split('/').collect()
}

/// One node per distinct path prefix, per method tree.
///
/// A node may be an intermediate prefix with no handler, a terminal leaf
/// with one, or both (`/users` and `/users/:id` share the `users` node).
#[derive(Default)]
pub(crate) struct SegmentNode {
    /// Static children, keyed by the full segment text.
    children: HashMap<String, SegmentNode>,
    /// At most one parameter child; its name is fixed by the first route
    /// that registers a parameter at this position.
    param_child: Option<Box<ParamChild>>,
    /// At most one wildcard child. Always terminal — a wildcard consumes
    /// the rest of the path.
    wildcard_child: Option<Box<SegmentNode>>,
    handler: Option<HandlerFunc>,
}

struct ParamChild {
    name: String,
    node: SegmentNode,
}

impl SegmentNode {
    /// Registers `handler` under `path`, creating nodes as needed.
    ///
    /// Nodes are never deleted, and nothing mutates the tree after
    /// registration ends.
    pub(crate) fn insert(&mut self, path: &str, handler: HandlerFunc) -> Result<(), RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::NotAbsolute { path: path.to_owned() });
        }
        let segments = split_path(path);
        let last = segments.len().saturating_sub(1);

        let mut node = self;
        for (depth, segment) in segments.iter().enumerate() {
            match classify(segment) {
                Segment::Static(text) => {
                    node = node.children.entry(text.to_owned()).or_default();
                }
                Segment::Param(name) => {
                    if name.is_empty() {
                        return Err(RouteError::EmptyParamName { path: path.to_owned() });
                    }
                    let param = node.param_child.get_or_insert_with(|| {
                        Box::new(ParamChild { name: name.to_owned(), node: SegmentNode::default() })
                    });
                    if param.name != name {
                        return Err(RouteError::ParamNameConflict {
                            path: path.to_owned(),
                            existing: param.name.clone(),
                            conflicting: name.to_owned(),
                        });
                    }
                    node = &mut param.node;
                }
                Segment::Wildcard => {
                    if depth != last {
                        return Err(RouteError::WildcardNotLast { path: path.to_owned() });
                    }
                    node = node.wildcard_child.get_or_insert_with(Box::default);
                }
            }
        }

        if node.handler.is_some() {
            return Err(RouteError::DuplicateRoute { path: path.to_owned() });
        }
        node.handler = Some(handler);
        Ok(())
    }

    /// Matches `path` against the tree.
    ///
    /// On success, returns the handler and the parameter bindings collected
    /// along the way (wildcard captures under [`WILDCARD_PARAM`]). A miss is
    /// `None` — never an error.
    pub(crate) fn lookup(&self, path: &str) -> Option<(&HandlerFunc, Vec<(String, String)>)> {
        if !path.starts_with('/') {
            return None;
        }
        let segments = split_path(path);

        let mut node = self;
        let mut params = Vec::new();
        for (depth, segment) in segments.iter().enumerate() {
            if let Some(child) = node.children.get(*segment) {
                node = child;
                continue;
            }
            if !segment.is_empty() {
                if let Some(param) = &node.param_child {
                    params.push((param.name.clone(), (*segment).to_owned()));
                    node = &param.node;
                    continue;
                }
            }
            // A wildcard swallows the remainder; the walk ends here either way.
            if let Some(wildcard) = &node.wildcard_child {
                if let Some(handler) = &wildcard.handler {
                    params.push((WILDCARD_PARAM.to_owned(), segments[depth..].join("/")));
                    return Some((handler, params));
                }
            }
            return None;
        }

        if let Some(handler) = &node.handler {
            return Some((handler, params));
        }
        // Zero-segment wildcard match: `/static/*` also covers `/static`.
        if let Some(wildcard) = &node.wildcard_child {
            if let Some(handler) = &wildcard.handler {
                params.push((WILDCARD_PARAM.to_owned(), String::new()));
                return Some((handler, params));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::handler::BoxFuture;
    use crate::response::Outcome;
    use std::sync::Arc;

    fn handler() -> HandlerFunc {
        Arc::new(|_c: Context| -> BoxFuture { Box::pin(async { Ok(Outcome::Empty) }) })
    }

    fn names(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn exact_static_match() {
        let mut root = SegmentNode::default();
        root.insert("/users/all", handler()).unwrap();
        let (_, params) = root.lookup("/users/all").unwrap();
        assert!(params.is_empty());
        assert!(root.lookup("/users").is_none());
        assert!(root.lookup("/users/all/x").is_none());
    }

    #[test]
    fn parameter_binds_segment_text() {
        let mut root = SegmentNode::default();
        root.insert("/users/:id/posts/:post", handler()).unwrap();
        let (_, params) = root.lookup("/users/42/posts/7").unwrap();
        assert_eq!(names(&params), [("id", "42"), ("post", "7")]);
    }

    #[test]
    fn static_beats_parameter() {
        let mut root = SegmentNode::default();
        let fixed = handler();
        let by_id = handler();
        root.insert("/user/new", Arc::clone(&fixed)).unwrap();
        root.insert("/user/:id", Arc::clone(&by_id)).unwrap();

        let (found, params) = root.lookup("/user/new").unwrap();
        assert!(Arc::ptr_eq(found, &fixed));
        assert!(params.is_empty());

        let (found, params) = root.lookup("/user/17").unwrap();
        assert!(Arc::ptr_eq(found, &by_id));
        assert_eq!(names(&params), [("id", "17")]);
    }

    #[test]
    fn parameter_beats_wildcard() {
        let mut root = SegmentNode::default();
        let by_name = handler();
        let rest = handler();
        root.insert("/files/:name", Arc::clone(&by_name)).unwrap();
        root.insert("/files/*", Arc::clone(&rest)).unwrap();

        let (found, _) = root.lookup("/files/a").unwrap();
        assert!(Arc::ptr_eq(found, &by_name));

        // Any non-empty next segment commits to the parameter branch, and the
        // walk does not back out of it once `b` fails underneath. The
        // wildcard still covers the zero-segment case.
        assert!(root.lookup("/files/a/b").is_none());
        let (found, params) = root.lookup("/files").unwrap();
        assert!(Arc::ptr_eq(found, &rest));
        assert_eq!(names(&params), [("*", "")]);
    }

    #[test]
    fn wildcard_captures_remainder() {
        let mut root = SegmentNode::default();
        root.insert("/static/*", handler()).unwrap();
        let (_, params) = root.lookup("/static/js/a.js").unwrap();
        assert_eq!(names(&params), [("*", "js/a.js")]);
    }

    #[test]
    fn wildcard_matches_zero_segments() {
        let mut root = SegmentNode::default();
        root.insert("/static/*", handler()).unwrap();
        let (_, params) = root.lookup("/static").unwrap();
        assert_eq!(names(&params), [("*", "")]);
    }

    #[test]
    fn walk_does_not_backtrack() {
        let mut root = SegmentNode::default();
        root.insert("/a/b/c", handler()).unwrap();
        root.insert("/a/:x/d", handler()).unwrap();
        // `b` commits to the static branch; `d` only exists under the
        // parameter branch, and the walk does not go back for it.
        assert!(root.lookup("/a/b/d").is_none());
    }

    #[test]
    fn parameter_rejects_empty_segment() {
        let mut root = SegmentNode::default();
        root.insert("/users/:id", handler()).unwrap();
        assert!(root.lookup("/users//").is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let mut root = SegmentNode::default();
        root.insert("/users/", handler()).unwrap();
        assert!(root.lookup("/users").is_some());
        assert!(root.lookup("/users/").is_some());
    }

    #[test]
    fn root_route() {
        let mut root = SegmentNode::default();
        root.insert("/", handler()).unwrap();
        assert!(root.lookup("/").is_some());
        assert!(root.lookup("/x").is_none());
    }

    #[test]
    fn intermediate_prefix_without_handler_misses() {
        let mut root = SegmentNode::default();
        root.insert("/api/v1/users", handler()).unwrap();
        assert!(root.lookup("/api/v1").is_none());
    }

    #[test]
    fn wildcard_must_be_last() {
        let mut root = SegmentNode::default();
        assert_eq!(
            root.insert("/a/*/b", handler()),
            Err(RouteError::WildcardNotLast { path: "/a/*/b".to_owned() }),
        );
    }

    #[test]
    fn param_name_must_be_consistent_per_position() {
        let mut root = SegmentNode::default();
        root.insert("/user/:id", handler()).unwrap();
        assert_eq!(
            root.insert("/user/:name/x", handler()),
            Err(RouteError::ParamNameConflict {
                path: "/user/:name/x".to_owned(),
                existing: "id".to_owned(),
                conflicting: "name".to_owned(),
            }),
        );
    }

    #[test]
    fn duplicate_route_is_rejected() {
        let mut root = SegmentNode::default();
        root.insert("/dup", handler()).unwrap();
        assert_eq!(
            root.insert("/dup", handler()),
            Err(RouteError::DuplicateRoute { path: "/dup".to_owned() }),
        );
        // Same pattern spelled with a trailing slash is still the same route.
        assert_eq!(
            root.insert("/dup/", handler()),
            Err(RouteError::DuplicateRoute { path: "/dup/".to_owned() }),
        );
    }

    #[test]
    fn relative_path_is_rejected() {
        let mut root = SegmentNode::default();
        assert_eq!(
            root.insert("users", handler()),
            Err(RouteError::NotAbsolute { path: "users".to_owned() }),
        );
        assert_eq!(
            root.insert("", handler()),
            Err(RouteError::NotAbsolute { path: String::new() }),
        );
    }

    #[test]
    fn empty_param_name_is_rejected() {
        let mut root = SegmentNode::default();
        assert_eq!(
            root.insert("/users/:", handler()),
            Err(RouteError::EmptyParamName { path: "/users/:".to_owned() }),
        );
    }
}
