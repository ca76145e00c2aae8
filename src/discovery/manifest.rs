//! TOML route manifests.
//!
//! Each route file describes its own layers and options:
//!
//! ```toml
//! [options]
//! environments = ["development"]
//! param_constraints = { id = "[0-9]+" }
//!
//! [[layers]]
//! method = "get"
//! path = "/"
//! body = { users = [] }
//!
//! [[layers]]
//! method = "post"
//! path = "/bulk"
//! status = 202
//! ```
//!
//! A manifest without layers provides no handler. Layers without a `body`
//! answer with a description of the request they matched.

use std::path::Path;

use async_trait::async_trait;
use axum::http::{Method, StatusCode, Uri};
use axum::routing::{self, MethodFilter};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::discovery::loader::{
    LoadError, LoaderKind, RouteHandler, RouteLoader, RouteModule, UNKNOWN_METHOD,
};

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    options: Option<toml::Value>,

    #[serde(default)]
    layers: Vec<ManifestLayer>,
}

#[derive(Debug, Deserialize)]
struct ManifestLayer {
    #[serde(default = "default_method")]
    method: String,

    #[serde(default = "default_path")]
    path: String,

    #[serde(default)]
    middleware: usize,

    #[serde(default)]
    status: Option<u16>,

    #[serde(default)]
    body: Option<toml::Value>,
}

fn default_method() -> String {
    "get".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

/// Loader reading route modules from TOML manifests.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    extensions: Vec<String>,
}

impl ManifestLoader {
    pub fn new() -> Self {
        Self {
            extensions: vec!["toml".to_string()],
        }
    }

    /// Parse manifest text into a module.
    pub fn parse(path: &Path, content: &str) -> Result<Option<RouteModule>, LoadError> {
        let manifest: Manifest = toml::from_str(content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        if manifest.layers.is_empty() {
            return Ok(None);
        }

        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut module = RouteModule::new();
        if let Some(options) = manifest.options {
            module = module.options(serde_json::to_value(options).unwrap_or_default());
        }

        for layer in manifest.layers {
            let status = match layer.status {
                Some(code) => StatusCode::from_u16(code).map_err(|_| LoadError::Parse {
                    path: path.to_path_buf(),
                    message: format!("invalid status code {code}"),
                })?,
                None => StatusCode::OK,
            };
            let body = layer
                .body
                .map(|b| serde_json::to_value(b).unwrap_or_default());

            let (method, handler) = layer_handler(&layer.method, &file, status, body);
            module = module.layer(method, layer.path, layer.middleware, handler);
        }

        Ok(Some(module))
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn layer_handler(
    method: &str,
    file: &str,
    status: StatusCode,
    body: Option<Value>,
) -> (String, RouteHandler) {
    let filter = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .ok()
        .and_then(|m| MethodFilter::try_from(m).ok());
    let method = match filter {
        Some(_) => method.to_ascii_lowercase(),
        None => UNKNOWN_METHOD.to_string(),
    };

    let file = file.to_string();
    let handler = move |request_method: Method, uri: Uri| {
        let body = body.clone();
        let file = file.clone();
        async move {
            let body = body.unwrap_or_else(|| {
                json!({
                    "file": file,
                    "method": request_method.as_str(),
                    "path": uri.path(),
                })
            });
            (status, Json(body))
        }
    };

    let router = match filter {
        Some(filter) => routing::on(filter, handler),
        None => routing::any(handler),
    };
    (method, router)
}

#[async_trait]
impl RouteLoader for ManifestLoader {
    fn kind(&self) -> LoaderKind {
        LoaderKind::Manifest
    }

    fn extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    async fn load(&self, path: &Path) -> Result<Option<RouteModule>, LoadError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path, &content)
    }
}
