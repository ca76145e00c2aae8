//! Route schema derivation.
//!
//! # Data Flow
//! ```text
//! TreeNode + LoadOutcome + RegistrationConfig + current env
//!     → options.rs (resolve declared options)
//!     → path.rs + slug.rs (base path, per-layer complete paths)
//!     → builder.rs (hooks, skip check)
//!     → environment.rs (registration gate)
//!     → RouteSchema (+ handlers when registered)
//!     → registry.rs (ordered accumulation)
//! ```
//!
//! # Design Decisions
//! - Pure and synchronous: no I/O, no globals, the environment is a parameter
//! - Deterministic: same inputs always produce the same schema
//! - Paths are computed once as strings; the bound router is never patched afterwards

pub mod builder;
pub mod environment;
pub mod options;
pub mod path;
pub mod registry;
pub mod schema;
pub mod slug;

pub use builder::{build_schema, BuiltRoute, LoadOutcome};
pub use environment::should_register;
pub use options::{resolve_route_options, EnvironmentSet, RouteOptions, WILDCARD_ENVIRONMENT};
pub use path::{complete_path, normalize};
pub use registry::Registry;
pub use schema::{LayerInfo, RouteSchema, RouteStatus};
pub use slug::rewrite_slugs;
