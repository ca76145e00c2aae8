//! Registration runs.
//!
//! # Data Flow
//! ```text
//! RegistrationConfig
//!     → validation (fatal only in strict mode)
//!     → TreeScanner::scan (root → TreeNode)
//!     → file nodes in chunks of `batch_size`
//!         → RouteLoader::load (concurrently within a chunk)
//!         → build_schema (in discovery order)
//!         → RouteBinder::bind (all layers of a registered route, or none)
//!         → Registry::append
//!     → OutputWriter (routes.json, tree.json) when configured
//! ```
//!
//! # Design Decisions
//! - Each run owns a fresh `Registry`; runs share no mutable state
//! - Loads are awaited chunk by chunk, so at most `batch_size` are in flight
//! - Outside strict mode one file's failure never stops the others

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::config::loader::join_errors;
use crate::config::{validate_config, RegistrationConfig, ValidationError};
use crate::discovery::{FsScanner, LoadError, RouteLoader, TreeNode, TreeScanner};
use crate::http::{BindError, RouteBinder};
use crate::output::{OutputError, OutputWriter};
use crate::routing::{build_schema, Registry, RouteSchema, RouteStatus};

/// File name of the written registry.
pub const ROUTES_FILE: &str = "routes.json";

/// File name of the written scan tree.
pub const TREE_FILE: &str = "tree.json";

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("failed to scan {}: {source}", .root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to bind {}: {source}", .source_path.display())]
    Bind {
        source_path: PathBuf,
        #[source]
        source: BindError,
    },

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Result of one registration run.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRun {
    /// The scanned tree; `None` when the root does not exist.
    pub tree: Option<TreeNode>,
    pub registry: Registry,
}

/// Route counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub registered: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RegistrationRun {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            registered: self.registry.count(RouteStatus::Registered),
            skipped: self.registry.count(RouteStatus::Skipped),
            errors: self.registry.count(RouteStatus::Error),
        }
    }
}

/// Entry point: scan, build a schema per file, bind what registers.
pub struct RouteRegistrar {
    config: RegistrationConfig,
    loader: Arc<dyn RouteLoader>,
    scanner: Arc<dyn TreeScanner>,
}

impl RouteRegistrar {
    /// Create a registrar scanning the filesystem with `loader` as module source.
    pub fn new(config: RegistrationConfig, loader: impl RouteLoader + 'static) -> Self {
        Self {
            config,
            loader: Arc::new(loader),
            scanner: Arc::new(FsScanner),
        }
    }

    /// Replace the tree scanner.
    pub fn with_scanner(mut self, scanner: impl TreeScanner + 'static) -> Self {
        self.scanner = Arc::new(scanner);
        self
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Replace the configuration used by subsequent runs.
    pub fn set_config(&mut self, config: RegistrationConfig) {
        self.config = config;
    }

    /// Run a full registration for `current_env`, binding registered layers into `binder`.
    pub async fn run<B: RouteBinder>(
        &self,
        current_env: &str,
        binder: &mut B,
    ) -> Result<RegistrationRun, RegistrarError> {
        let config = &self.config;
        validate_config(config).map_err(RegistrarError::InvalidConfig)?;

        let extensions = if config.extensions.is_empty() {
            self.loader.extensions()
        } else {
            config.extensions.clone()
        };

        tracing::info!(
            root = %config.root_directory.display(),
            loader = %self.loader.kind(),
            environment = current_env,
            strict = config.strict,
            "Starting route registration"
        );

        let tree = match self.scanner.scan(&config.root_directory, &extensions).await {
            Ok(tree) => tree,
            Err(source) if config.strict => {
                return Err(RegistrarError::Scan {
                    root: config.root_directory.clone(),
                    source,
                });
            }
            Err(e) => {
                tracing::warn!(
                    root = %config.root_directory.display(),
                    error = %e,
                    "Route tree scan failed; no routes registered"
                );
                None
            }
        };

        let mut registry = Registry::new();
        if let Some(tree) = &tree {
            let files = tree.files();
            for chunk in files.chunks(config.batch_size.max(1)) {
                let results = join_all(chunk.iter().map(|node| self.loader.load(&node.absolute_path))).await;

                for (node, result) in chunk.iter().zip(results) {
                    let built = build_schema(node, result.into(), config, current_env)?;
                    let mut schema = built.schema;

                    if schema.is_registered() {
                        match binder.bind(&schema.layers, built.handlers, &schema.resolved_options) {
                            Ok(()) => {
                                schema.message =
                                    Some(format!("registered {} layer(s)", schema.layers.len()));
                            }
                            Err(e) if config.strict => {
                                return Err(RegistrarError::Bind {
                                    source_path: schema.source_path,
                                    source: e,
                                });
                            }
                            Err(e) => {
                                schema.status = RouteStatus::Error;
                                schema.error = Some(e.to_string());
                                schema.message = Some(format!("route could not be bound: {e}"));
                            }
                        }
                    }

                    log_schema(&schema, config);
                    registry.append(schema);
                }
            }
        }

        let run = RegistrationRun { tree, registry };
        let summary = run.summary();
        tracing::info!(
            registered = summary.registered,
            skipped = summary.skipped,
            errors = summary.errors,
            "Route registration finished"
        );

        if let Some(dir) = &config.output {
            if let Err(e) = self.write_output(dir, &run).await {
                if config.strict {
                    return Err(e.into());
                }
                tracing::warn!(error = %e, "Failed to write route output");
            }
        }

        Ok(run)
    }

    async fn write_output(&self, dir: &std::path::Path, run: &RegistrationRun) -> Result<(), OutputError> {
        let writer = OutputWriter::new(dir, self.config.redact_paths);
        writer.write(ROUTES_FILE, &run.registry).await?;
        if let Some(tree) = &run.tree {
            writer.write(TREE_FILE, tree).await?;
        }
        tracing::info!(dir = %dir.display(), "Route output written");
        Ok(())
    }
}

fn log_schema(schema: &RouteSchema, config: &RegistrationConfig) {
    let source = schema
        .source_path
        .strip_prefix(&config.root_directory)
        .unwrap_or(&schema.source_path)
        .display();
    let path = schema.base_path.as_deref().unwrap_or("-");

    match schema.status {
        RouteStatus::Registered => {
            tracing::info!(%source, path, layers = schema.layers.len(), "Route registered")
        }
        RouteStatus::Skipped => tracing::debug!(
            %source,
            path,
            reason = schema.message.as_deref().unwrap_or_default(),
            "Route skipped"
        ),
        RouteStatus::Error => tracing::warn!(
            %source,
            error = schema.error.as_deref().unwrap_or_default(),
            "Route failed"
        ),
    }
}
