//! Raw configuration resolution.
//!
//! # Responsibilities
//! - Turn an arbitrary JSON value into a fully populated `RegistrationConfig`
//! - Resolve the scan root (and relative environment directories) to absolute paths
//!
//! # Design Decisions
//! - Total function: unknown or mistyped fields fall back to their default
//! - Keys are snake_case; camelCase aliases are accepted for the same field

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::schema::{RegistrationConfig, DEFAULT_BATCH_SIZE, DEFAULT_INDEX_FILE_NAME};

/// Look a field up under any of its accepted names.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(*name))
}

/// Resolve `path` against the current working directory without touching the filesystem.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Overlay `overrides` onto a raw configuration value.
///
/// Applied before `resolve_global_config`, so directories resolved against the
/// root (environment routes) follow an overridden root.
pub fn merge_raw(raw: &mut Value, overrides: Map<String, Value>) {
    if !raw.is_object() {
        *raw = Value::Object(Map::new());
    }
    if let Some(obj) = raw.as_object_mut() {
        obj.extend(overrides);
    }
}

/// Resolve a raw configuration value.
pub fn resolve_global_config(raw: &Value) -> RegistrationConfig {
    let mut config = RegistrationConfig::default();
    let Some(obj) = raw.as_object() else {
        return config;
    };

    if let Some(root) = field(obj, &["root_directory", "rootDirectory", "root"])
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
    {
        config.root_directory = absolute_path(Path::new(root));
    }

    if let Some(mount) = field(obj, &["app_mount", "appMount", "mount"]).and_then(Value::as_str) {
        config.app_mount = mount.trim().to_string();
    }

    let index_names = field(obj, &["index_file_names", "indexFileNames"])
        .map(string_list)
        .unwrap_or_default();
    config.index_file_names = if index_names.is_empty() {
        vec![DEFAULT_INDEX_FILE_NAME.to_string()]
    } else {
        dedup(index_names)
    };

    if let Some(routes) = field(obj, &["environment_routes", "environmentRoutes"]).and_then(Value::as_object) {
        config.environment_routes = resolve_environment_routes(routes, &config.root_directory);
    }

    config.output = field(obj, &["output", "output_target", "outputTarget"]).and_then(|v| match v {
        Value::String(dir) if !dir.trim().is_empty() => Some(absolute_path(Path::new(dir))),
        _ => None,
    });

    config.redact_paths = field(obj, &["redact_paths", "redactPaths"])
        .and_then(Value::as_bool)
        .unwrap_or(false);

    config.strict = field(obj, &["strict"]).and_then(Value::as_bool).unwrap_or(false);

    config.extensions = field(obj, &["extensions"])
        .map(string_list)
        .unwrap_or_default()
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .collect();

    config.batch_size = field(obj, &["batch_size", "batchSize"])
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_BATCH_SIZE);

    config
}

fn resolve_environment_routes(
    routes: &Map<String, Value>,
    root: &Path,
) -> BTreeMap<String, Vec<PathBuf>> {
    routes
        .iter()
        .filter_map(|(env, dirs)| {
            let dirs: Vec<PathBuf> = string_list(dirs)
                .into_iter()
                .map(|dir| environment_dir(root, &dir))
                .collect();
            (!dirs.is_empty()).then(|| (env.clone(), dirs))
        })
        .collect()
}

/// Directories are relative to the root; an absolute one outside the root is re-rooted.
fn environment_dir(root: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() && path.starts_with(root) {
        return path.to_path_buf();
    }
    root.join(dir.trim_start_matches(['/', '\\']))
}

/// Accept a single string or an array of strings; anything else is dropped.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_yields_defaults() {
        let config = resolve_global_config(&Value::Null);
        assert!(config.root_directory.is_absolute());
        assert!(config.root_directory.ends_with("routes"));
        assert_eq!(config.index_file_names, vec!["index".to_string()]);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert!(!config.strict);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_relative_root_is_made_absolute() {
        let config = resolve_global_config(&json!({ "root_directory": "src/routes" }));
        assert!(config.root_directory.is_absolute());
        assert!(config.root_directory.ends_with("src/routes"));
    }

    #[test]
    fn test_index_names_accept_string_and_list() {
        let config = resolve_global_config(&json!({ "indexFileNames": "main" }));
        assert_eq!(config.index_file_names, vec!["main".to_string()]);

        let config = resolve_global_config(&json!({ "index_file_names": ["index", 3, "home", "index"] }));
        assert_eq!(config.index_file_names, vec!["index".to_string(), "home".to_string()]);

        let config = resolve_global_config(&json!({ "index_file_names": [] }));
        assert_eq!(config.index_file_names, vec!["index".to_string()]);
    }

    #[test]
    fn test_environment_routes_resolve_under_root() {
        let config = resolve_global_config(&json!({
            "root_directory": "/srv/routes",
            "environment_routes": {
                "development": ["debug", "/internal"],
                "staging": "preview",
                "broken": 12,
            }
        }));
        assert_eq!(config.environment_routes.len(), 2);
        assert_eq!(
            config.environment_routes["development"],
            vec![PathBuf::from("/srv/routes/debug"), PathBuf::from("/srv/routes/internal")]
        );
        assert_eq!(config.environment_routes["staging"], vec![PathBuf::from("/srv/routes/preview")]);
    }

    #[test]
    fn test_output_disabled_marker() {
        let config = resolve_global_config(&json!({ "output": false }));
        assert!(config.output.is_none());

        let config = resolve_global_config(&json!({ "output": "/tmp/out" }));
        assert_eq!(config.output, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_mistyped_scalars_fall_back() {
        let config = resolve_global_config(&json!({
            "strict": "yes",
            "redact_paths": 1,
            "batch_size": 0,
            "app_mount": ["api"],
            "extensions": [".toml", "", "rs"],
        }));
        assert!(!config.strict);
        assert!(!config.redact_paths);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.app_mount, "");
        assert_eq!(config.extensions, vec!["toml".to_string(), "rs".to_string()]);
    }

    #[test]
    fn test_merged_root_reroots_environment_dirs() {
        let mut raw = json!({
            "root_directory": "/srv/old",
            "environment_routes": { "production": ["admin"] },
        });
        let mut overrides = Map::new();
        overrides.insert("root_directory".into(), json!("/srv/new"));
        overrides.insert("app_mount".into(), json!("api"));
        merge_raw(&mut raw, overrides);

        let config = resolve_global_config(&raw);
        assert_eq!(config.root_directory, Path::new("/srv/new"));
        assert_eq!(config.app_mount, "api");
        assert_eq!(config.environment_routes["production"], vec![Path::new("/srv/new/admin")]);
    }

    #[test]
    fn test_merge_into_non_object() {
        let mut raw = Value::Null;
        let mut overrides = Map::new();
        overrides.insert("strict".into(), json!(true));
        merge_raw(&mut raw, overrides);
        assert!(resolve_global_config(&raw).strict);
    }
}
