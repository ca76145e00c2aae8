//! JSON output of a run.
//!
//! # Responsibilities
//! - Serialize payloads (registry, tree) to pretty JSON files
//! - Optionally redact every file path before writing
//!
//! # Design Decisions
//! - Redaction works on the serialized JSON, so it covers nested tree children
//!   and any payload shape without knowing its types
//! - Only `sourcePath` and `absolutePath` keys are replaced; nothing else changes

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Token written in place of redacted paths.
pub const REDACTED_PATH: &str = "<redacted>";

const PATH_KEYS: [&str; 2] = ["sourcePath", "absolutePath"];

/// Errors raised while writing output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize {file}: {source}")]
    Serialize {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Replace every path field in `value`, recursively, with `REDACTED_PATH`.
pub fn redact_paths(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if PATH_KEYS.contains(&key.as_str()) {
                    *child = Value::String(REDACTED_PATH.to_string());
                } else {
                    redact_paths(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_paths),
        _ => {}
    }
}

/// Serialize `payload` to JSON, redacting paths when asked.
pub fn to_json<T: Serialize>(payload: &T, redact: bool) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(payload)?;
    if redact {
        redact_paths(&mut value);
    }
    Ok(value)
}

/// Writes JSON payloads into a target directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    redact: bool,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, redact: bool) -> Self {
        Self {
            dir: dir.into(),
            redact,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `payload` as `<dir>/<file_name>`, returning the written path.
    pub async fn write<T: Serialize>(&self, file_name: &str, payload: &T) -> Result<PathBuf, OutputError> {
        let serialize_err = |source| OutputError::Serialize {
            file: file_name.to_string(),
            source,
        };
        let value = to_json(payload, self.redact).map_err(serialize_err)?;
        let body = serde_json::to_vec_pretty(&value).map_err(serialize_err)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| OutputError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(file_name);
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| OutputError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), redacted = self.redact, "Output written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "absolutePath": "/srv/routes",
            "name": "routes",
            "children": [
                { "absolutePath": "/srv/routes/a.rs", "name": "a.rs" },
                { "absolutePath": "/srv/routes/sub", "children": [
                    { "absolutePath": "/srv/routes/sub/b.rs", "name": "b.rs" }
                ]}
            ],
            "schemas": [{ "sourcePath": "/srv/routes/a.rs", "basePath": "/a" }]
        })
    }

    #[test]
    fn test_redacts_nested_paths() {
        let mut value = sample();
        redact_paths(&mut value);

        assert_eq!(value["absolutePath"], REDACTED_PATH);
        assert_eq!(value["children"][1]["children"][0]["absolutePath"], REDACTED_PATH);
        assert_eq!(value["schemas"][0]["sourcePath"], REDACTED_PATH);
        assert_eq!(value["schemas"][0]["basePath"], "/a");
        assert_eq!(value["children"][0]["name"], "a.rs");
    }

    #[test]
    fn test_no_redaction_is_lossless() {
        let value = to_json(&sample(), false).unwrap();
        assert_eq!(value, sample());
    }

    #[tokio::test]
    async fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("out"), true);

        let path = writer.write("tree.json", &sample()).await.unwrap();
        let written: Value = serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(written["absolutePath"], REDACTED_PATH);
    }
}
