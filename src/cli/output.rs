//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ConfigurationError, RouteError};

/// Map routing errors to a string for CLI output, prefixed by category.
pub fn map_error(e: &RouteError) -> String {
    match e {
        RouteError::Configuration(ConfigurationError::ElementNotFound { .. }) => {
            format!("not found: {}", e)
        }
        RouteError::Configuration(_) | RouteError::ConfigLoad(_) => {
            format!("configuration error: {}", e)
        }
        RouteError::Storage(_) => format!("storage error: {}", e),
        RouteError::Logging(_) => format!("logging error: {}", e),
    }
}
