//! Route module loading.
//!
//! # Responsibilities
//! - Define what a loaded route file looks like (`RouteModule`)
//! - Define the loader seam every module source plugs into
//!
//! # Design Decisions
//! - A loader answers with a module, an explicit "nothing here", or an error;
//!   all shape inspection of the underlying source stays inside the loader
//! - Loaders advertise the file extensions they understand

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::handler::Handler;
use axum::routing::{self, MethodRouter};
use serde_json::Value;
use thiserror::Error;

/// Handler bound for one method layer.
pub type RouteHandler = MethodRouter;

/// Method name recorded for layers that accept any verb.
pub const UNKNOWN_METHOD: &str = "unknown";

/// Which kind of source a loader reads modules from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// Modules registered in code, keyed by file path.
    Catalog,
    /// Modules described by TOML manifest files.
    Manifest,
}

impl std::fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderKind::Catalog => f.write_str("catalog"),
            LoaderKind::Manifest => f.write_str("manifest"),
        }
    }
}

/// Errors raised while loading a route file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("route module {} failed to initialize: {message}", .path.display())]
    Module { path: PathBuf, message: String },
}

/// One method handler declared by a route module.
#[derive(Clone)]
pub struct MethodLayer {
    /// Lower-cased verb or `unknown`.
    pub method: String,
    /// Sub-path below the file's base path.
    pub path: String,
    pub middleware_count: usize,
    pub handler: RouteHandler,
}

impl std::fmt::Debug for MethodLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodLayer")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("middleware_count", &self.middleware_count)
            .finish_non_exhaustive()
    }
}

/// A loaded route file: its method layers plus the options it declared.
#[derive(Debug, Clone, Default)]
pub struct RouteModule {
    pub layers: Vec<MethodLayer>,
    /// Raw declared options; resolved by `routing::resolve_route_options`.
    pub options: Value,
}

impl RouteModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach raw declared options.
    pub fn options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Add a layer from an already built method router.
    pub fn layer(
        mut self,
        method: impl Into<String>,
        path: impl Into<String>,
        middleware_count: usize,
        handler: RouteHandler,
    ) -> Self {
        self.layers.push(MethodLayer {
            method: method.into().to_ascii_lowercase(),
            path: path.into(),
            middleware_count,
            handler,
        });
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.layer("get", path, 0, routing::get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.layer("post", path, 0, routing::post(handler))
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.layer("put", path, 0, routing::put(handler))
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.layer("patch", path, 0, routing::patch(handler))
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.layer("delete", path, 0, routing::delete(handler))
    }

    /// Layer that answers every method.
    pub fn any<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.layer(UNKNOWN_METHOD, path, 0, routing::any(handler))
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Source of route modules for discovered files.
#[async_trait]
pub trait RouteLoader: Send + Sync {
    fn kind(&self) -> LoaderKind;

    /// Extensions (without the dot) of files this loader understands.
    fn extensions(&self) -> Vec<String>;

    /// Load the module for `path`.
    ///
    /// `Ok(None)` means the file exists but provides no usable handler.
    async fn load(&self, path: &Path) -> Result<Option<RouteModule>, LoadError>;
}
