//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use fs_router::config::resolve_global_config;
use fs_router::RegistrationConfig;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A temporary route root populated file by file.
pub struct RouteTree {
    dir: TempDir,
}

impl RouteTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    /// Resolve a config rooted at this tree, merged with `extra`.
    pub fn config(&self, extra: Value) -> RegistrationConfig {
        let mut raw = json!({ "root_directory": self.root().to_string_lossy() });
        if let (Some(base), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        resolve_global_config(&raw)
    }
}

/// A manifest with a single GET layer at `/`.
pub const GET_ROOT: &str = "[[layers]]\nmethod = \"get\"\npath = \"/\"\n";

/// A manifest with `[options]` but no layers.
pub const NO_LAYERS: &str = "[options]\nskip = false\n";
