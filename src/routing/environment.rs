//! Environment gating.
//!
//! # Precedence (first matching rule wins)
//! 1. No per-file environments and no directory map → register
//! 2. Per-file environments present → register iff wildcard or current env listed
//! 3. Directory map: every env whose directory contains the file casts a vote of
//!    `env == current`; the first `true` vote wins, otherwise any vote means `false`
//! 4. No directory contains the file → register
//!
//! The current environment is always passed in explicitly.

use std::path::Path;

use crate::config::RegistrationConfig;
use crate::routing::options::RouteOptions;

/// Decide whether the route file at `source` registers in `current_env`.
pub fn should_register(
    options: &RouteOptions,
    source: &Path,
    config: &RegistrationConfig,
    current_env: &str,
) -> bool {
    let directory_map = &config.environment_routes;

    match &options.environments {
        None if directory_map.is_empty() => true,
        Some(environments) => environments.allows(current_env),
        None => {
            let mut verdict = None;
            for (env, dirs) in directory_map {
                if !dirs.iter().any(|dir| source.starts_with(dir)) {
                    continue;
                }
                if env == current_env {
                    return true;
                }
                verdict = Some(false);
            }
            verdict.unwrap_or(true)
        }
    }
}
