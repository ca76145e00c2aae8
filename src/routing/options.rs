//! Per-file route options.
//!
//! # Responsibilities
//! - Define the options a route file may declare about itself
//! - Normalize whatever the file declared into a fully populated `RouteOptions`
//!
//! # Design Decisions
//! - Resolution is total: bad fields fall back to defaults, nothing is rejected
//! - `environments` distinguishes "unset" (`None`) from an explicit wildcard

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::resolve::field;

/// Marker meaning "register in every environment".
pub const WILDCARD_ENVIRONMENT: &str = "*";

/// Environments a route file declared for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentSet {
    /// Wildcard: every environment.
    Any,
    /// Only the named environments.
    Named(BTreeSet<String>),
}

impl EnvironmentSet {
    /// Returns true if a route with this set registers in `env`.
    pub fn allows(&self, env: &str) -> bool {
        match self {
            EnvironmentSet::Any => true,
            EnvironmentSet::Named(names) => names.contains(env),
        }
    }

    fn from_names<I>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let names: BTreeSet<String> = names.into_iter().filter(|n| !n.is_empty()).collect();
        if names.is_empty() {
            None
        } else if names.contains(WILDCARD_ENVIRONMENT) {
            Some(EnvironmentSet::Any)
        } else {
            Some(EnvironmentSet::Named(names))
        }
    }
}

impl Serialize for EnvironmentSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EnvironmentSet::Any => serializer.serialize_str(WILDCARD_ENVIRONMENT),
            EnvironmentSet::Named(names) => {
                let mut seq = serializer.serialize_seq(Some(names.len()))?;
                for name in names {
                    seq.serialize_element(name)?;
                }
                seq.end()
            }
        }
    }
}

/// Normalized options declared by a single route file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    /// Declared environments; `None` defers to the directory map.
    pub environments: Option<EnvironmentSet>,

    /// Tri-state index flag; `None` defers to `index_file_names`.
    pub is_index: Option<bool>,

    /// Never register this file.
    pub skip: bool,

    /// Parameter name -> constraint pattern source.
    pub param_constraints: BTreeMap<String, String>,

    /// Opaque values forwarded to handlers at request time.
    pub metadata: Map<String, Value>,
}

/// Resolve raw declared options into `RouteOptions`.
///
/// Never fails. Anything that is not an object resolves to the defaults, and each
/// field that does not have the expected shape falls back to its own default.
pub fn resolve_route_options(raw: &Value) -> RouteOptions {
    let Some(obj) = raw.as_object() else {
        return RouteOptions::default();
    };

    RouteOptions {
        environments: field(obj, &["environments", "environment", "env"]).and_then(resolve_environments),
        is_index: field(obj, &["is_index", "isIndex"]).and_then(Value::as_bool),
        skip: field(obj, &["skip"]).and_then(Value::as_bool).unwrap_or(false),
        param_constraints: field(obj, &["param_constraints", "paramConstraints"])
            .map(resolve_constraints)
            .unwrap_or_default(),
        metadata: field(obj, &["metadata"])
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    }
}

fn resolve_environments(value: &Value) -> Option<EnvironmentSet> {
    match value {
        Value::String(name) => EnvironmentSet::from_names([name.clone()]),
        Value::Array(items) => EnvironmentSet::from_names(
            items.iter().filter_map(|v| v.as_str().map(str::to_string)),
        ),
        _ => None,
    }
}

fn resolve_constraints(value: &Value) -> BTreeMap<String, String> {
    let Some(obj) = value.as_object() else {
        return BTreeMap::new();
    };

    obj.iter()
        .filter_map(|(name, pattern)| pattern_source(pattern).map(|src| (name.clone(), src)))
        .collect()
}

/// Reduce a constraint to its textual pattern.
///
/// Accepts a plain string or a compiled-pattern object carrying its `source`.
fn pattern_source(value: &Value) -> Option<String> {
    match value {
        Value::String(src) => Some(src.clone()),
        Value::Object(obj) => field(obj, &["source", "pattern", "regex"])
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
