//! Binding registered routes onto an axum router.
//!
//! # Responsibilities
//! - Translate router-native paths (`/users/:id([0-9]+)`) into axum paths (`/users/{id}`)
//! - Enforce parameter constraints with an anchored regex route layer
//! - Forward per-file metadata to handlers as a request extension
//! - Refuse bindings axum would reject instead of panicking at build time
//! - Bind a route's layers all together or not at all
//!
//! # Design Decisions
//! - Several methods on one path are merged into a single method router
//! - A method-agnostic layer claims its path for every method
//! - Captures at the same position must share a name across files

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::{RawPathParams, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Router};
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::discovery::{RouteHandler, UNKNOWN_METHOD};
use crate::routing::slug::group_len;
use crate::routing::{LayerInfo, RouteOptions};

/// Errors raised when a route cannot be bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("{method} {path} is already bound")]
    Conflict { method: String, path: String },

    #[error("{path} collides with {existing}: captures in the same position must share a name")]
    CaptureConflict { path: String, existing: String },

    #[error("invalid constraint for parameter `{name}`: {message}")]
    InvalidConstraint { name: String, message: String },

    #[error("{path}: parameter `{name}` must span a whole path segment")]
    PartialSegment { path: String, name: String },

    #[error("{path}: segment `{segment}` is not a valid parameter name")]
    InvalidSegment { path: String, segment: String },

    #[error("{layers} layer(s) but {handlers} handler(s)")]
    HandlerMismatch { layers: usize, handlers: usize },
}

/// Receives the layers of every registered route of a run.
pub trait RouteBinder {
    /// Bind all layers of one route, pairing `layers[i]` with `handlers[i]`.
    ///
    /// Either every layer is bound or, on error, none is.
    fn bind(
        &mut self,
        layers: &[LayerInfo],
        handlers: Vec<RouteHandler>,
        options: &RouteOptions,
    ) -> Result<(), BindError>;
}

/// Per-file metadata made available to handlers through `Extension<RouteMetadata>`.
#[derive(Debug, Clone, Default)]
pub struct RouteMetadata(pub Arc<Map<String, Value>>);

impl RouteMetadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// A router-native path split into its axum form and its constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxumPath {
    pub path: String,
    /// `(name, pattern)` for every constrained capture, in path order.
    pub constraints: Vec<(String, String)>,
}

impl AxumPath {
    /// Convert a router-native path (`:name` / `:name(pattern)` tokens).
    ///
    /// Anything axum would refuse at router build time is an error here: a
    /// capture sharing its segment with other text, and segments opening with
    /// `:` or `*` that are not a capture.
    pub fn parse(native: &str) -> Result<Self, BindError> {
        let mut path = String::with_capacity(native.len());
        let mut constraints = Vec::new();
        let mut segment_start = true;
        let mut rest = native;

        while let Some(c) = rest.chars().next() {
            if c == ':' {
                let name_len = rest[1..]
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'))
                    .unwrap_or(rest.len() - 1);
                let name = &rest[1..1 + name_len];

                if !name.is_empty() {
                    if !segment_start {
                        return Err(BindError::PartialSegment {
                            path: native.to_string(),
                            name: name.to_string(),
                        });
                    }

                    let mut consumed = 1 + name_len;
                    if rest[consumed..].starts_with('(') {
                        let len = group_len(&rest[consumed..]).ok_or_else(|| {
                            BindError::InvalidConstraint {
                                name: name.to_string(),
                                message: "unbalanced parentheses".to_string(),
                            }
                        })?;
                        let pattern = &rest[consumed + 1..consumed + len - 1];
                        constraints.push((name.to_string(), pattern.to_string()));
                        consumed += len;
                    }

                    if !matches!(rest[consumed..].chars().next(), None | Some('/')) {
                        return Err(BindError::PartialSegment {
                            path: native.to_string(),
                            name: name.to_string(),
                        });
                    }

                    path.push('{');
                    path.push_str(name);
                    path.push('}');
                    segment_start = false;
                    rest = &rest[consumed..];
                    continue;
                }
            }

            if segment_start && (c == ':' || c == '*') {
                return Err(BindError::InvalidSegment {
                    path: native.to_string(),
                    segment: rest.split('/').next().unwrap_or_default().to_string(),
                });
            }

            match c {
                '{' => path.push_str("{{"),
                '}' => path.push_str("}}"),
                _ => path.push(c),
            }
            segment_start = c == '/';
            rest = &rest[c.len_utf8()..];
        }

        Ok(Self { path, constraints })
    }

    /// The path with capture names erased; equal shapes with different names collide.
    fn shape(&self) -> String {
        let mut shape = String::with_capacity(self.path.len());
        let mut in_capture = false;
        let mut chars = self.path.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    shape.push_str("{{");
                }
                '{' => {
                    in_capture = true;
                    shape.push_str("{}");
                }
                '}' if in_capture => in_capture = false,
                _ if in_capture => {}
                _ => shape.push(c),
            }
        }
        shape
    }
}

type CompiledConstraints = Arc<Vec<(String, Regex)>>;

async fn enforce_constraints(
    State(constraints): State<CompiledConstraints>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Response {
    for (name, value) in &params {
        let rejected = constraints
            .iter()
            .any(|(constrained, pattern)| constrained == name && !pattern.is_match(value));
        if rejected {
            tracing::debug!(param = name, value, "Path parameter failed its constraint");
            return StatusCode::NOT_FOUND.into_response();
        }
    }
    next.run(request).await
}

fn compile_constraints(target: &AxumPath) -> Result<Vec<(String, Regex)>, BindError> {
    target
        .constraints
        .iter()
        .map(|(name, pattern)| {
            Regex::new(&format!("^(?:{pattern})$"))
                .map(|re| (name.clone(), re))
                .map_err(|e| BindError::InvalidConstraint {
                    name: name.clone(),
                    message: e.to_string(),
                })
        })
        .collect()
}

/// Paths and methods claimed so far.
#[derive(Debug, Default)]
struct Claims {
    methods: HashMap<String, Vec<String>>,
    shapes: HashMap<String, String>,
}

impl Claims {
    fn check(&self, target: &AxumPath, method: &str, native: &str) -> Result<(), BindError> {
        if let Some(existing) = self.shapes.get(&target.shape()) {
            if existing != &target.path {
                return Err(BindError::CaptureConflict {
                    path: native.to_string(),
                    existing: existing.clone(),
                });
            }
        }

        if let Some(methods) = self.methods.get(&target.path) {
            let taken = methods
                .iter()
                .any(|m| m == method || m == UNKNOWN_METHOD || method == UNKNOWN_METHOD);
            if taken {
                return Err(BindError::Conflict {
                    method: method.to_string(),
                    path: native.to_string(),
                });
            }
        }
        Ok(())
    }

    fn record(&mut self, target: &AxumPath, method: &str) {
        self.methods
            .entry(target.path.clone())
            .or_default()
            .push(method.to_string());
        self.shapes.insert(target.shape(), target.path.clone());
    }
}

/// A layer that passed every check and waits to be committed.
struct Staged {
    target: AxumPath,
    method: String,
    native: String,
    compiled: Vec<(String, Regex)>,
}

/// Binder accumulating method routers for an axum `Router`.
#[derive(Default)]
pub struct AxumBinder {
    routes: BTreeMap<String, RouteHandler>,
    claims: Claims,
    bound: Vec<(String, String)>,
}

impl AxumBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(method, router-native path)` of every successful binding, in bind order.
    pub fn bound(&self) -> &[(String, String)] {
        &self.bound
    }

    /// Build the axum router holding every bound layer.
    pub fn into_router(self) -> Router {
        self.routes
            .into_iter()
            .fold(Router::new(), |router, (path, handler)| router.route(&path, handler))
    }

    /// Run every check for `layers` against the bound routes and each other.
    fn stage(&self, layers: &[LayerInfo]) -> Result<Vec<Staged>, BindError> {
        let mut pending = Claims::default();
        let mut staged = Vec::with_capacity(layers.len());

        for layer in layers {
            let target = AxumPath::parse(&layer.complete_path)?;
            self.claims.check(&target, &layer.method, &layer.complete_path)?;
            pending.check(&target, &layer.method, &layer.complete_path)?;
            let compiled = compile_constraints(&target)?;

            pending.record(&target, &layer.method);
            staged.push(Staged {
                target,
                method: layer.method.clone(),
                native: layer.complete_path.clone(),
                compiled,
            });
        }
        Ok(staged)
    }

    fn commit(&mut self, layer: Staged, handler: RouteHandler, options: &RouteOptions) {
        let mut handler = handler;
        if !layer.compiled.is_empty() {
            handler = handler.route_layer(middleware::from_fn_with_state(
                Arc::new(layer.compiled),
                enforce_constraints,
            ));
        }
        if !options.metadata.is_empty() {
            handler = handler.layer(Extension(RouteMetadata(Arc::new(options.metadata.clone()))));
        }

        let merged = match self.routes.remove(&layer.target.path) {
            Some(existing) => existing.merge(handler),
            None => handler,
        };
        self.routes.insert(layer.target.path.clone(), merged);
        self.claims.record(&layer.target, &layer.method);

        tracing::debug!(method = %layer.method, path = %layer.target.path, "Layer bound");
        self.bound.push((layer.method, layer.native));
    }
}

impl RouteBinder for AxumBinder {
    fn bind(
        &mut self,
        layers: &[LayerInfo],
        handlers: Vec<RouteHandler>,
        options: &RouteOptions,
    ) -> Result<(), BindError> {
        if layers.len() != handlers.len() {
            return Err(BindError::HandlerMismatch {
                layers: layers.len(),
                handlers: handlers.len(),
            });
        }

        let staged = self.stage(layers)?;
        for (layer, handler) in staged.into_iter().zip(handlers) {
            self.commit(layer, handler, options);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{any, get, post};

    fn layer(method: &str, path: &str) -> LayerInfo {
        LayerInfo {
            method: method.to_string(),
            middleware_count: 0,
            extended_path: "/".to_string(),
            complete_path: path.to_string(),
        }
    }

    fn bind_one(
        binder: &mut AxumBinder,
        method: &str,
        path: &str,
        handler: RouteHandler,
    ) -> Result<(), BindError> {
        binder.bind(&[layer(method, path)], vec![handler], &RouteOptions::default())
    }

    #[test]
    fn test_parse_native_paths() {
        let parsed = AxumPath::parse("/users/:id(user_[0-9]+)/posts/:post").unwrap();
        assert_eq!(parsed.path, "/users/{id}/posts/{post}");
        assert_eq!(parsed.constraints, vec![("id".to_string(), "user_[0-9]+".to_string())]);

        let parsed = AxumPath::parse("/tags/:tag((a|b)[xy])").unwrap();
        assert_eq!(parsed.path, "/tags/{tag}");
        assert_eq!(parsed.constraints[0].1, "(a|b)[xy]");

        let parsed = AxumPath::parse("/users/:id(([a-z]+(-[0-9]+)?))/x").unwrap();
        assert_eq!(parsed.path, "/users/{id}/x");
        assert_eq!(parsed.constraints[0].1, "([a-z]+(-[0-9]+)?)");

        assert_eq!(AxumPath::parse("/").unwrap().path, "/");
        assert_eq!(AxumPath::parse("/a/{x}").unwrap().path, "/a/{{x}}");
        assert_eq!(AxumPath::parse("/a/b:").unwrap().path, "/a/b:");
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        assert!(matches!(
            AxumPath::parse("/post-:id"),
            Err(BindError::PartialSegment { .. })
        ));
        assert!(matches!(
            AxumPath::parse("/:id((x)"),
            Err(BindError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_captures_sharing_a_segment() {
        let err = AxumPath::parse("/users/:user-id").unwrap_err();
        assert_eq!(
            err,
            BindError::PartialSegment {
                path: "/users/:user-id".to_string(),
                name: "user".to_string(),
            }
        );
        assert!(matches!(
            AxumPath::parse("/users/:id([0-9]+).json"),
            Err(BindError::PartialSegment { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_segments_axum_refuses() {
        let err = AxumPath::parse("/docs/:...rest").unwrap_err();
        assert_eq!(
            err,
            BindError::InvalidSegment {
                path: "/docs/:...rest".to_string(),
                segment: ":...rest".to_string(),
            }
        );
        assert!(matches!(
            AxumPath::parse("/files/*all"),
            Err(BindError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_merges_methods_and_detects_conflicts() {
        let mut binder = AxumBinder::new();
        bind_one(&mut binder, "get", "/users", get(|| async { "list" })).unwrap();
        bind_one(&mut binder, "post", "/users", post(|| async { "create" })).unwrap();

        let err = bind_one(&mut binder, "get", "/users", get(|| async { "again" })).unwrap_err();
        assert!(matches!(err, BindError::Conflict { .. }));

        let err = bind_one(&mut binder, "unknown", "/users", any(|| async { "any" })).unwrap_err();
        assert!(matches!(err, BindError::Conflict { .. }));

        assert_eq!(binder.bound().len(), 2);
    }

    #[test]
    fn test_capture_name_collision() {
        let mut binder = AxumBinder::new();
        bind_one(&mut binder, "get", "/users/:id", get(|| async { "a" })).unwrap();
        let err = bind_one(&mut binder, "post", "/users/:name", post(|| async { "b" })).unwrap_err();
        assert!(matches!(err, BindError::CaptureConflict { .. }));

        bind_one(&mut binder, "post", "/users/:id", post(|| async { "c" })).unwrap();
    }

    #[test]
    fn test_invalid_constraint_regex() {
        let mut binder = AxumBinder::new();
        let err = bind_one(&mut binder, "get", "/users/:id([0-9)", get(|| async { "a" })).unwrap_err();
        assert!(matches!(err, BindError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_failed_route_binds_nothing() {
        let opts = RouteOptions::default();
        let mut binder = AxumBinder::new();
        bind_one(&mut binder, "get", "/b", get(|| async { "b" })).unwrap();

        let err = binder
            .bind(
                &[layer("get", "/b/x"), layer("get", "/b")],
                vec![get(|| async { "x" }), get(|| async { "again" })],
                &opts,
            )
            .unwrap_err();
        assert!(matches!(err, BindError::Conflict { .. }));
        assert_eq!(binder.bound(), &[("get".to_string(), "/b".to_string())]);

        // Nothing of the failed route was claimed.
        bind_one(&mut binder, "get", "/b/x", get(|| async { "x" })).unwrap();
    }

    #[test]
    fn test_conflicts_within_one_route() {
        let opts = RouteOptions::default();
        let mut binder = AxumBinder::new();
        let err = binder
            .bind(
                &[layer("get", "/a"), layer("get", "/a")],
                vec![get(|| async { "1" }), get(|| async { "2" })],
                &opts,
            )
            .unwrap_err();
        assert!(matches!(err, BindError::Conflict { .. }));
        assert!(binder.bound().is_empty());

        let err = binder
            .bind(&[layer("get", "/a")], Vec::new(), &opts)
            .unwrap_err();
        assert_eq!(err, BindError::HandlerMismatch { layers: 1, handlers: 0 });
    }
}
