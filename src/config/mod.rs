//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or raw JSON value
//!     → loader.rs (read & parse)
//!     → resolve.rs (total resolution against defaults)
//!     → validation.rs (filesystem checks, fatal only in strict mode)
//!     → RegistrationConfig (+ hooks attached by the caller)
//!     → shared by reference with every stage of a run
//! ```
//!
//! # Design Decisions
//! - Resolution never fails; malformed values become defaults
//! - The root directory is absolute before any path is normalized
//! - Hooks are code, not data, and are attached with builder methods

pub mod loader;
pub mod resolve;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use resolve::resolve_global_config;
pub use schema::{BeforeRegistrationHook, LayerInterceptHook, RegistrationConfig};
pub use validation::{validate_config, ValidationError};
