//! Contentroute: schema-driven content tree routing
//!
//! Resolves request paths through a tree of independently stored content structures linked
//! by `(structure, element)` parent pointers, rebuilds the ancestry of elements loaded by id,
//! retypes leaves to the structure they declare and expands embedded templates.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod listing;
pub mod logging;
pub mod model;
pub mod roster;
pub mod router;
pub mod store;
pub mod structure;
pub mod template;
pub mod tree;
pub mod types;

pub use config::{ConfigLoader, RouterConfig};
pub use dispatch::ModelDispatcher;
pub use error::{ConfigurationError, RouteError, StorageError};
pub use listing::{ListQuery, Pager};
pub use model::{ContentModel, ModelState, ModelType};
pub use router::{ControllerName, Dispatch, Request, Router, RoutingSettings};
pub use store::{MemoryStorage, SledStorage, Storage};
pub use structure::{StructureDescriptor, StructureRegistry};
pub use template::TemplateMaterializer;
pub use tree::{AncestryResolver, Path, PathNode, PathResolver};
pub use types::{Context, ElementId, ParentPointer, StructureId};
