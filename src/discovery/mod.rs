//! Route discovery subsystem.
//!
//! # Data Flow
//! ```text
//! scan root
//!     → tree.rs (depth-first walk, extension filter)
//!     → TreeNode (immutable, owned by the run)
//!
//! each file node
//!     → RouteLoader::load (catalog.rs | manifest.rs)
//!     → RouteModule (layers + raw options) | None | LoadError
//! ```
//!
//! # Design Decisions
//! - Both the walk and loading are async; everything downstream is synchronous
//! - The loader kind is chosen once, when the registrar is constructed

pub mod catalog;
pub mod loader;
pub mod manifest;
pub mod tree;

pub use catalog::CatalogLoader;
pub use loader::{LoadError, LoaderKind, MethodLayer, RouteHandler, RouteLoader, RouteModule, UNKNOWN_METHOD};
pub use manifest::ManifestLoader;
pub use tree::{FsScanner, NodeKind, TreeNode, TreeScanner};
