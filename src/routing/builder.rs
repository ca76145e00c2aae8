//! Schema building.
//!
//! # Responsibilities
//! - Turn one file node and its load outcome into a `RouteSchema`
//! - Compute base and complete paths for every method layer
//! - Run the configured hooks
//! - Decide the final status (registered / skipped / error)
//!
//! # Design Decisions
//! - Only a load failure in strict mode escapes as an `Err`; every other problem
//!   is recorded on the schema so one bad file never hides the others
//! - The before-registration hook sees the schema before the skip and
//!   environment checks, so it can change their outcome

use crate::config::RegistrationConfig;
use crate::discovery::{LoadError, RouteHandler, RouteModule, TreeNode};
use crate::routing::environment::should_register;
use crate::routing::options::resolve_route_options;
use crate::routing::path::{complete_path, normalize};
use crate::routing::schema::{LayerInfo, RouteSchema, RouteStatus};

const EMPTY_MODULE_MESSAGE: &str = "file does not provide a route handler";
const SKIP_MESSAGE: &str = "route skipped by its `skip` option";
const HOOK_REJECTED_MESSAGE: &str = "before-registration hook did not return a schema";
const HOOK_CLEARED_BASE_MESSAGE: &str = "before-registration hook removed the base path";
const HOOK_CHANGED_LAYERS_MESSAGE: &str =
    "before-registration hook added, removed or reordered method layers";

/// What the loader produced for one file.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(RouteModule),
    Empty,
    Failed(LoadError),
}

impl From<Result<Option<RouteModule>, LoadError>> for LoadOutcome {
    fn from(result: Result<Option<RouteModule>, LoadError>) -> Self {
        match result {
            Ok(Some(module)) if !module.is_empty() => LoadOutcome::Loaded(module),
            Ok(_) => LoadOutcome::Empty,
            Err(e) => LoadOutcome::Failed(e),
        }
    }
}

/// A finished schema plus the handlers to bind, one per layer.
///
/// `handlers` is empty unless the schema is registered.
#[derive(Debug)]
pub struct BuiltRoute {
    pub schema: RouteSchema,
    pub handlers: Vec<RouteHandler>,
}

impl BuiltRoute {
    fn unbound(schema: RouteSchema) -> Self {
        Self {
            schema,
            handlers: Vec::new(),
        }
    }
}

/// Build the schema for one discovered file.
pub fn build_schema(
    node: &TreeNode,
    outcome: LoadOutcome,
    config: &RegistrationConfig,
    current_env: &str,
) -> Result<BuiltRoute, LoadError> {
    let source = node.absolute_path.clone();

    let module = match outcome {
        LoadOutcome::Loaded(module) if !module.is_empty() => module,
        LoadOutcome::Loaded(_) | LoadOutcome::Empty => {
            let status = if config.strict {
                RouteStatus::Error
            } else {
                RouteStatus::Skipped
            };
            return Ok(BuiltRoute::unbound(RouteSchema::unusable(
                source,
                status,
                EMPTY_MODULE_MESSAGE,
            )));
        }
        LoadOutcome::Failed(e) if config.strict => return Err(e),
        LoadOutcome::Failed(e) => {
            return Ok(BuiltRoute::unbound(RouteSchema::unusable(
                source,
                RouteStatus::Error,
                e.to_string(),
            )));
        }
    };

    let options = resolve_route_options(&module.options);
    let base_path = normalize(&source, &options, config);

    let total = module.layers.len();
    let mut layers = Vec::with_capacity(total);
    let mut handlers = Vec::with_capacity(total);
    for (index, layer) in module.layers.into_iter().enumerate() {
        let extended_path = extended_path(&layer.path);
        let info = LayerInfo {
            complete_path: complete_path(&base_path, &extended_path, &options),
            method: layer.method,
            middleware_count: layer.middleware_count,
            extended_path,
        };
        let handler = match &config.layer_intercept {
            Some(intercept) => intercept(&info, layer.handler, index, total),
            None => layer.handler,
        };
        layers.push(info);
        handlers.push(handler);
    }

    let mut schema = RouteSchema {
        source_path: source,
        base_path: Some(base_path),
        layers,
        resolved_options: options,
        status: RouteStatus::Registered,
        error: None,
        message: None,
    };

    if let Some(hook) = &config.before_registration {
        let original = schema.clone();
        match hook(schema) {
            Some(updated) => schema = updated,
            None => {
                let mut failed = original;
                failed.mark_failed(HOOK_REJECTED_MESSAGE);
                return Ok(BuiltRoute::unbound(failed));
            }
        }

        // Handlers stay paired with layers by position.
        if layer_methods(&schema) != layer_methods(&original) {
            let mut failed = original;
            failed.mark_failed(HOOK_CHANGED_LAYERS_MESSAGE);
            return Ok(BuiltRoute::unbound(failed));
        }

        match schema.base_path.clone() {
            None => {
                schema.layers.clear();
                schema.mark_failed(HOOK_CLEARED_BASE_MESSAGE);
                return Ok(BuiltRoute::unbound(schema));
            }
            Some(base) if Some(&base) != original.base_path.as_ref() => {
                for layer in &mut schema.layers {
                    layer.complete_path =
                        complete_path(&base, &layer.extended_path, &schema.resolved_options);
                }
            }
            Some(_) => {}
        }
    }

    if schema.resolved_options.skip {
        schema.mark_skipped(SKIP_MESSAGE);
        return Ok(BuiltRoute::unbound(schema));
    }

    if !should_register(&schema.resolved_options, &schema.source_path, config, current_env) {
        schema.mark_skipped(format!(
            "route is not enabled in the `{current_env}` environment"
        ));
        return Ok(BuiltRoute::unbound(schema));
    }

    Ok(BuiltRoute { schema, handlers })
}

fn layer_methods(schema: &RouteSchema) -> Vec<&str> {
    schema.layers.iter().map(|l| l.method.as_str()).collect()
}

fn extended_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "/" {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_global_config;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(extra: Value) -> RegistrationConfig {
        let mut raw = json!({ "root_directory": "/srv/routes" });
        if let (Some(base), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        resolve_global_config(&raw)
    }

    fn node(relative: &str) -> TreeNode {
        TreeNode::file(PathBuf::from("/srv/routes").join(relative))
    }

    fn users_module(options: Value) -> RouteModule {
        RouteModule::new()
            .options(options)
            .get("/", || async { "list" })
            .post("/[id]/posts", || async { "create" })
    }

    #[test]
    fn test_registered_route_layers() {
        let built = build_schema(
            &node("users/index.rs"),
            LoadOutcome::Loaded(users_module(json!({ "param_constraints": { "id": "[0-9]+" } }))),
            &config(json!({ "app_mount": "api" })),
            "development",
        )
        .unwrap();

        let schema = &built.schema;
        assert_eq!(schema.status, RouteStatus::Registered);
        assert_eq!(schema.base_path.as_deref(), Some("/api/users"));
        assert_eq!(schema.layers[0].extended_path, "/");
        assert_eq!(schema.layers[0].complete_path, "/api/users");
        assert_eq!(schema.layers[1].method, "post");
        assert_eq!(schema.layers[1].complete_path, "/api/users/:id([0-9]+)/posts");
        assert_eq!(built.handlers.len(), 2);
    }

    #[test]
    fn test_empty_module_depends_on_strictness() {
        let relaxed = build_schema(&node("a.rs"), LoadOutcome::Empty, &config(json!({})), "dev").unwrap();
        assert_eq!(relaxed.schema.status, RouteStatus::Skipped);
        assert!(relaxed.schema.base_path.is_none());
        assert!(relaxed.schema.layers.is_empty());
        assert!(relaxed.schema.error.is_some());

        let strict = build_schema(&node("a.rs"), LoadOutcome::Empty, &config(json!({ "strict": true })), "dev").unwrap();
        assert_eq!(strict.schema.status, RouteStatus::Error);
        assert!(strict.schema.base_path.is_none());
    }

    #[test]
    fn test_load_failure() {
        let failure = || LoadError::Module {
            path: "/srv/routes/a.rs".into(),
            message: "boom".into(),
        };

        let relaxed = build_schema(&node("a.rs"), LoadOutcome::Failed(failure()), &config(json!({})), "dev").unwrap();
        assert_eq!(relaxed.schema.status, RouteStatus::Error);
        assert!(relaxed.schema.error.as_deref().unwrap().contains("boom"));

        let strict = build_schema(&node("a.rs"), LoadOutcome::Failed(failure()), &config(json!({ "strict": true })), "dev");
        assert!(strict.is_err());
    }

    #[test]
    fn test_skip_option_wins_over_environment() {
        let built = build_schema(
            &node("a.rs"),
            LoadOutcome::Loaded(users_module(json!({ "skip": true, "environments": "*" }))),
            &config(json!({})),
            "dev",
        )
        .unwrap();
        assert_eq!(built.schema.status, RouteStatus::Skipped);
        assert_eq!(built.schema.message.as_deref(), Some(SKIP_MESSAGE));
        assert!(built.handlers.is_empty());
        assert_eq!(built.schema.base_path.as_deref(), Some("/a"));
    }

    #[test]
    fn test_environment_skip_names_current_env() {
        let built = build_schema(
            &node("a.rs"),
            LoadOutcome::Loaded(users_module(json!({ "environments": ["production"] }))),
            &config(json!({})),
            "development",
        )
        .unwrap();
        assert_eq!(built.schema.status, RouteStatus::Skipped);
        assert!(built.schema.message.as_deref().unwrap().contains("development"));
    }

    #[test]
    fn test_layer_intercept_called_per_layer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let cfg = config(json!({})).with_layer_intercept(move |info, handler, index, total| {
            assert_eq!(total, 2);
            assert!(info.complete_path.starts_with("/users"));
            assert_eq!(seen.fetch_add(1, Ordering::SeqCst), index);
            handler
        });

        build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &cfg, "dev").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_hook_can_rewrite_base_and_force_skip() {
        let cfg = config(json!({})).with_before_registration(|mut schema| {
            schema.base_path = Some("/people".into());
            Some(schema)
        });
        let built = build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &cfg, "dev").unwrap();
        assert_eq!(built.schema.layers[0].complete_path, "/people");
        assert_eq!(built.schema.layers[1].complete_path, "/people/:id/posts");

        let cfg = config(json!({})).with_before_registration(|mut schema| {
            schema.resolved_options.skip = true;
            Some(schema)
        });
        let built = build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &cfg, "dev").unwrap();
        assert_eq!(built.schema.status, RouteStatus::Skipped);
    }

    #[test]
    fn test_hook_rejection_is_error() {
        let cfg = config(json!({})).with_before_registration(|_| None);
        let built = build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &cfg, "dev").unwrap();
        assert_eq!(built.schema.status, RouteStatus::Error);
        assert_eq!(built.schema.error.as_deref(), Some(HOOK_REJECTED_MESSAGE));
        assert!(built.handlers.is_empty());
    }

    #[test]
    fn test_hook_changing_layers_is_error() {
        let dropped = config(json!({})).with_before_registration(|mut schema| {
            schema.layers.remove(0);
            Some(schema)
        });
        let built = build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &dropped, "dev").unwrap();
        assert_eq!(built.schema.status, RouteStatus::Error);
        assert_eq!(built.schema.error.as_deref(), Some(HOOK_CHANGED_LAYERS_MESSAGE));
        assert_eq!(built.schema.layers.len(), 2);
        assert!(built.handlers.is_empty());

        let reordered = config(json!({})).with_before_registration(|mut schema| {
            schema.layers.reverse();
            Some(schema)
        });
        let built = build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &reordered, "dev").unwrap();
        assert_eq!(built.schema.status, RouteStatus::Error);
    }

    #[test]
    fn test_hook_emptying_layers_is_error() {
        let cfg = config(json!({})).with_before_registration(|mut schema| {
            schema.layers.clear();
            Some(schema)
        });
        let built = build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &cfg, "dev").unwrap();
        assert_eq!(built.schema.status, RouteStatus::Error);
        assert!(built.schema.base_path.is_some());
        assert!(!built.schema.layers.is_empty());
        assert!(built.handlers.is_empty());
    }

    #[test]
    fn test_loaded_empty_module_is_empty() {
        let built = build_schema(&node("a.rs"), LoadOutcome::Loaded(RouteModule::new()), &config(json!({})), "dev").unwrap();
        assert_eq!(built.schema.status, RouteStatus::Skipped);
        assert!(built.schema.base_path.is_none());
    }

    #[test]
    fn test_hook_may_edit_layer_paths() {
        let cfg = config(json!({})).with_before_registration(|mut schema| {
            schema.layers[1].complete_path = "/users/:id/items".into();
            Some(schema)
        });
        let built = build_schema(&node("users.rs"), LoadOutcome::Loaded(users_module(json!({}))), &cfg, "dev").unwrap();
        assert_eq!(built.schema.status, RouteStatus::Registered);
        assert_eq!(built.schema.layers[1].complete_path, "/users/:id/items");
        assert_eq!(built.handlers.len(), 2);
    }

    #[test]
    fn test_load_outcome_from_result() {
        assert!(matches!(LoadOutcome::from(Ok(None)), LoadOutcome::Empty));
        assert!(matches!(LoadOutcome::from(Ok(Some(RouteModule::new()))), LoadOutcome::Empty));
        assert!(matches!(
            LoadOutcome::from(Ok(Some(users_module(json!({}))))),
            LoadOutcome::Loaded(_)
        ));
    }
}
