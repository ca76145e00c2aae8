//! Run output.
//!
//! # Data Flow
//! ```text
//! Registry / TreeNode
//!     → writer.rs (serialize, optional redaction)
//!     → <output>/routes.json, <output>/tree.json
//! ```

pub mod writer;

pub use writer::{redact_paths, to_json, OutputError, OutputWriter, REDACTED_PATH};
