//! Error types for the content routing core.
//!
//! Not-found conditions are never errors: they travel as the `not_found` flag on a
//! [`crate::model::ContentModel`]. Everything here aborts the request.

use crate::types::{ElementId, ParentPointer, StructureId};
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Malformed row in table '{table}': {reason}")]
    MalformedRow { table: String, reason: String },

    #[error("Invalid parent pointer: {0:?}")]
    InvalidParentPointer(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Broken tree topology or structure configuration.
///
/// Always fatal: the request cannot be served when the configured types and the stored
/// parent pointers disagree.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Unknown structure name: {0}")]
    UnknownStructureName(String),

    #[error("Unknown structure id: {0}")]
    UnknownStructureId(StructureId),

    #[error("No structure is configured for model type {0}")]
    UnknownStructureClass(String),

    #[error("Structure '{structure}' uses unknown kind '{kind}'")]
    UnknownBehavior { structure: String, kind: String },

    #[error("Duplicate structure {field}: {value}")]
    DuplicateStructure { field: &'static str, value: String },

    #[error("Root structure {0} is not configured")]
    MissingRootStructure(StructureId),

    #[error("Cannot determine owning structure for embedded template in field '{field}' of {model}")]
    TemplateOwnerUnknown { model: String, field: String },

    #[error("Template nesting deeper than {limit} levels while expanding '{template}'")]
    TemplateDepthExceeded { template: String, limit: usize },

    #[error("Parent pointer {pointer} does not resolve to a row in structure {structure}")]
    DanglingParent {
        pointer: ParentPointer,
        structure: String,
    },

    #[error("Element {element} not found in structure {structure}")]
    ElementNotFound { structure: String, element: ElementId },

    #[error("Parent chain longer than {0} hops")]
    AncestryTooDeep(usize),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by the router and its resolvers
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for RouteError {
    fn from(err: config::ConfigError) -> Self {
        RouteError::ConfigLoad(err.to_string())
    }
}
