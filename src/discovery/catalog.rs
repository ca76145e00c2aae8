//! In-code route catalog.
//!
//! Route modules are registered against the path of their file relative to
//! the scan root (`users/[id].rs`). The file on disk decides where the route
//! lives; the catalog supplies its handlers.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::discovery::loader::{LoadError, LoaderKind, RouteLoader, RouteModule};

type ModuleFactory = Arc<dyn Fn() -> Result<RouteModule, String> + Send + Sync>;

/// Loader resolving files against modules registered in code.
#[derive(Clone)]
pub struct CatalogLoader {
    root: PathBuf,
    extensions: Vec<String>,
    modules: HashMap<String, ModuleFactory>,
}

impl CatalogLoader {
    /// Create an empty catalog for files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["rs".to_string()],
            modules: HashMap::new(),
        }
    }

    /// Override the recognized file extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Register a ready-made module for `relative_path`.
    pub fn register(self, relative_path: impl AsRef<Path>, module: RouteModule) -> Self {
        self.register_with(relative_path, move || Ok(module.clone()))
    }

    /// Register a factory building the module on each load.
    ///
    /// A factory error is reported as a load failure for that file.
    pub fn register_with<F>(mut self, relative_path: impl AsRef<Path>, factory: F) -> Self
    where
        F: Fn() -> Result<RouteModule, String> + Send + Sync + 'static,
    {
        self.modules
            .insert(catalog_key(relative_path.as_ref()), Arc::new(factory));
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for CatalogLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.modules.keys().collect();
        keys.sort();
        f.debug_struct("CatalogLoader")
            .field("root", &self.root)
            .field("extensions", &self.extensions)
            .field("modules", &keys)
            .finish()
    }
}

/// Separator-independent key for a relative path.
fn catalog_key(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(seg) => Some(seg.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl RouteLoader for CatalogLoader {
    fn kind(&self) -> LoaderKind {
        LoaderKind::Catalog
    }

    fn extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    async fn load(&self, path: &Path) -> Result<Option<RouteModule>, LoadError> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let Some(factory) = self.modules.get(&catalog_key(relative)) else {
            return Ok(None);
        };

        let module = factory().map_err(|message| LoadError::Module {
            path: path.to_path_buf(),
            message,
        })?;
        Ok((!module.is_empty()).then_some(module))
    }
}
