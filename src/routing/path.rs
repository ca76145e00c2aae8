//! File path to URL path normalization.
//!
//! # Responsibilities
//! - Derive a route's base path from its file's position under the scan root
//! - Collapse directory-index files onto their directory
//! - Prefix the app mount and rewrite slugs
//! - Join a base path with a layer's extended path
//!
//! # Design Decisions
//! - Steps run in a fixed order; later steps assume the shape earlier ones produce
//! - Separators are normalized from path components, never from raw string splits

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::config::RegistrationConfig;
use crate::routing::options::RouteOptions;
use crate::routing::slug::rewrite_slugs;

/// Compute the base URL path for the route file at `file`.
pub fn normalize(file: &Path, options: &RouteOptions, config: &RegistrationConfig) -> String {
    // 1. extension
    let stripped = file.with_extension("");

    // 2. index collapsing
    let collapsed = match options.is_index {
        None if is_index_name(&stripped, &config.index_file_names) => parent_of(&stripped),
        Some(true) => explicit_index_parent(&stripped, config),
        _ => stripped,
    };

    // 3 + 4. root prefix and separators
    let relative = collapsed
        .strip_prefix(&config.root_directory)
        .unwrap_or(&collapsed);
    let relative = to_url_segments(relative);

    // 5. mount
    let mut path = match mount_prefix(&config.app_mount) {
        Some(mount) if relative.is_empty() => mount,
        Some(mount) => format!("{mount}/{relative}"),
        None => relative,
    };

    // 6. trailing slash
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    // 7. slugs
    let path = rewrite_slugs(&path, Some(&options.param_constraints));

    // 8. leading slash
    ensure_leading_slash(&path)
}

/// Join a base path with a layer's extended path.
///
/// An extended path of `/` (or empty) resolves to the base path itself.
pub fn complete_path(base: &str, extended: &str, options: &RouteOptions) -> String {
    let extended = rewrite_slugs(extended.trim(), Some(&options.param_constraints));
    let extended = extended.trim_end_matches('/');
    if extended.is_empty() {
        return ensure_leading_slash(base);
    }

    let extended = ensure_leading_slash(extended);
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        extended
    } else {
        format!("{}{}", ensure_leading_slash(base), extended)
    }
}

/// Normalize a mount to a single `/token` prefix, or `None` when empty.
pub fn mount_prefix(mount: &str) -> Option<String> {
    let token = mount.trim().trim_matches('/');
    if token.is_empty() {
        None
    } else {
        Some(format!("/{token}"))
    }
}

fn ensure_leading_slash(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    format!("/{trimmed}")
}

fn is_index_name(stripped: &Path, index_names: &[String]) -> bool {
    let Some(stem) = stripped.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    index_names.iter().any(|name| {
        let candidate = Path::new(name).with_extension("");
        candidate.to_str() == Some(stem)
    })
}

/// The basename goes, and so does a parent directory named like the mount,
/// so `<root>/api/main` under mount `api` lands on the mount itself.
fn explicit_index_parent(stripped: &Path, config: &RegistrationConfig) -> PathBuf {
    let parent = parent_of(stripped);
    let mount = config.app_mount.trim().trim_matches('/');
    let below_root = parent != config.root_directory && parent.starts_with(&config.root_directory);
    if !mount.is_empty() && below_root && parent.file_name() == Some(OsStr::new(mount)) {
        parent_of(&parent)
    } else {
        parent
    }
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn to_url_segments(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(seg) => Some(seg.to_string_lossy().replace('\\', "/")),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
