//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! registered layer (complete path + handler + options)
//!     → binding.rs (axum path, constraint layer, metadata extension)
//!     → axum::Router
//!     → server.rs (trace layer, serve until shutdown)
//! ```

pub mod binding;
pub mod server;

pub use binding::{AxumBinder, AxumPath, BindError, RouteBinder, RouteMetadata};
pub use server::RouteServer;
