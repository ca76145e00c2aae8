//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks the resolver cannot express (filesystem state)
//! - Only strict runs treat a missing root or environment directory as fatal
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure apart from `stat` calls: RegistrationConfig → Result<(), Vec<ValidationError>>

use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::RegistrationConfig;

/// A semantic problem with a resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("root directory {} does not exist", .0.display())]
    RootMissing(PathBuf),

    #[error("root directory {} is not a directory", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("directory {} for environment `{env}` does not exist", .dir.display())]
    EnvironmentDirMissing { env: String, dir: PathBuf },
}

/// Validate a resolved configuration.
pub fn validate_config(config: &RegistrationConfig) -> Result<(), Vec<ValidationError>> {
    if !config.strict {
        if !config.root_directory.is_dir() {
            tracing::warn!(
                root = %config.root_directory.display(),
                "Root directory is missing; the scan will yield no routes"
            );
        }
        return Ok(());
    }

    let mut errors = Vec::new();
    let root = &config.root_directory;
    if !root.exists() {
        errors.push(ValidationError::RootMissing(root.clone()));
    } else if !root.is_dir() {
        errors.push(ValidationError::RootNotDirectory(root.clone()));
    }

    for (env, dirs) in &config.environment_routes {
        for dir in dirs.iter().filter(|d| !d.is_dir()) {
            errors.push(ValidationError::EnvironmentDirMissing {
                env: env.clone(),
                dir: dir.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
