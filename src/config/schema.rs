//! Configuration schema definitions.
//!
//! This module defines the complete configuration for one registration run.
//! Values are produced by `resolve::resolve_global_config`; hooks are attached
//! afterwards with the `with_*` builder methods since they are not data.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::discovery::RouteHandler;
use crate::routing::{LayerInfo, RouteSchema};

/// Default scan root, resolved against the working directory.
pub const DEFAULT_ROOT_DIRECTORY: &str = "routes";

/// Default directory-index basename.
pub const DEFAULT_INDEX_FILE_NAME: &str = "index";

/// Default cap on concurrently in-flight file loads.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Runs on every fully built schema before the skip and environment checks.
///
/// Returning `None` marks the route as an error.
pub type BeforeRegistrationHook = Arc<dyn Fn(RouteSchema) -> Option<RouteSchema> + Send + Sync>;

/// Runs once per method layer with `(layer, handler, index, total)` and returns
/// the handler to bind in its place.
pub type LayerInterceptHook =
    Arc<dyn Fn(&LayerInfo, RouteHandler, usize, usize) -> RouteHandler + Send + Sync>;

/// Root configuration for a registration run.
#[derive(Clone)]
pub struct RegistrationConfig {
    /// Absolute directory scanned for route files.
    pub root_directory: PathBuf,

    /// Path prefix applied to every route (empty = none).
    pub app_mount: String,

    /// Basenames treated as directory-index files.
    pub index_file_names: Vec<String>,

    /// Environment name -> absolute directories only registered in that environment.
    pub environment_routes: BTreeMap<String, Vec<PathBuf>>,

    /// Directory receiving `routes.json` and `tree.json`, if enabled.
    pub output: Option<PathBuf>,

    /// Replace file paths in written output with a redaction token.
    pub redact_paths: bool,

    /// Abort the whole run on the first failure.
    pub strict: bool,

    /// Recognized route file extensions; empty defers to the loader.
    pub extensions: Vec<String>,

    /// Maximum number of file loads in flight at once.
    pub batch_size: usize,

    pub before_registration: Option<BeforeRegistrationHook>,

    pub layer_intercept: Option<LayerInterceptHook>,
}

impl RegistrationConfig {
    /// Install a hook run on each schema before registration is decided.
    pub fn with_before_registration<F>(mut self, hook: F) -> Self
    where
        F: Fn(RouteSchema) -> Option<RouteSchema> + Send + Sync + 'static,
    {
        self.before_registration = Some(Arc::new(hook));
        self
    }

    /// Install a hook that may wrap or replace each layer's handler.
    pub fn with_layer_intercept<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LayerInfo, RouteHandler, usize, usize) -> RouteHandler + Send + Sync + 'static,
    {
        self.layer_intercept = Some(Arc::new(hook));
        self
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            root_directory: super::resolve::absolute_path(DEFAULT_ROOT_DIRECTORY.as_ref()),
            app_mount: String::new(),
            index_file_names: vec![DEFAULT_INDEX_FILE_NAME.to_string()],
            environment_routes: BTreeMap::new(),
            output: None,
            redact_paths: false,
            strict: false,
            extensions: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            before_registration: None,
            layer_intercept: None,
        }
    }
}

impl fmt::Debug for RegistrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationConfig")
            .field("root_directory", &self.root_directory)
            .field("app_mount", &self.app_mount)
            .field("index_file_names", &self.index_file_names)
            .field("environment_routes", &self.environment_routes)
            .field("output", &self.output)
            .field("redact_paths", &self.redact_paths)
            .field("strict", &self.strict)
            .field("extensions", &self.extensions)
            .field("batch_size", &self.batch_size)
            .field("before_registration", &self.before_registration.is_some())
            .field("layer_intercept", &self.layer_intercept.is_some())
            .finish()
    }
}
