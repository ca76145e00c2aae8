//! Route schema records.
//!
//! One `RouteSchema` is produced per discovered file. Serialization uses the
//! camelCase field names of the written `routes.json`.

use std::path::PathBuf;

use serde::Serialize;

use crate::routing::options::RouteOptions;

/// Registration verdict for a route file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Registered,
    Skipped,
    Error,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Registered => "registered",
            RouteStatus::Skipped => "skipped",
            RouteStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One HTTP-method sub-route declared within a route file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    /// Lower-cased HTTP verb, or `unknown` for method-agnostic layers.
    pub method: String,
    pub middleware_count: usize,
    /// In-file sub-path (`/` when the layer serves the base path).
    pub extended_path: String,
    /// Base path joined with the extended path.
    pub complete_path: String,
}

/// Outcome of deriving a route from one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSchema {
    pub source_path: PathBuf,
    /// `None` when the file produced no usable route.
    pub base_path: Option<String>,
    pub layers: Vec<LayerInfo>,
    pub resolved_options: RouteOptions,
    pub status: RouteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RouteSchema {
    /// A record for a file that yielded no route at all.
    pub fn unusable(source_path: PathBuf, status: RouteStatus, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            source_path,
            base_path: None,
            layers: Vec::new(),
            resolved_options: RouteOptions::default(),
            status,
            message: Some(error.clone()),
            error: Some(error),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.status == RouteStatus::Registered
    }

    pub(crate) fn mark_failed(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.status = RouteStatus::Error;
        self.message = Some(error.clone());
        self.error = Some(error);
    }

    pub(crate) fn mark_skipped(&mut self, message: impl Into<String>) {
        self.status = RouteStatus::Skipped;
        self.message = Some(message.into());
    }
}
