//! File-based route registration.
//!
//! Scans a directory of route files, derives a `RouteSchema` for each one
//! (URL path, method layers, options, status) and binds the registered
//! layers onto an axum router.

pub mod config;
pub mod discovery;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod output;
pub mod registrar;
pub mod routing;

pub use config::schema::RegistrationConfig;
pub use discovery::{CatalogLoader, ManifestLoader, RouteLoader, RouteModule};
pub use http::{AxumBinder, RouteServer};
pub use lifecycle::Shutdown;
pub use registrar::{RegistrarError, RegistrationRun, RouteRegistrar, RunSummary};
pub use routing::{Registry, RouteSchema, RouteStatus};
