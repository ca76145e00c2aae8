//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (registrar, binder, scanner, server)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stderr, filtered by RUST_LOG)
//! ```

pub mod logging;

pub use logging::init_logging;
