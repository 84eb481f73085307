//! Configuration System
//!
//! Site routing settings, the structure and template catalog, recursion limits, storage and
//! logging. Loaded in layers by [`ConfigLoader`]; [`RouterConfig::validate`] reports every
//! problem at once.

use crate::listing::DEFAULT_PAGER_WINDOW;
use crate::logging::LoggingConfig;
use crate::structure::registry::DEFAULT_HOME_STRUCTURE;
use crate::structure::{split_qualified_name, StructureConfig};
use crate::template::DEFAULT_MAX_TEMPLATE_DEPTH;
use crate::tree::ancestry::DEFAULT_MAX_ANCESTRY_DEPTH;
use crate::types::{StructureId, ROOT_SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::environment::ENV_PREFIX;
pub use sources::workspace_file::ENV_SELECTOR;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub site: SiteConfig,

    /// Routable structures
    #[serde(default)]
    pub structures: Vec<StructureConfig>,

    /// Embeddable templates
    #[serde(default)]
    pub templates: Vec<StructureConfig>,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Site-wide routing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Mount prefix under which routing operates (empty when mounted at the site root)
    #[serde(default)]
    pub start_url: String,

    /// Suffix every non-root url must end with, e.g. `.html`
    #[serde(default)]
    pub url_suffix: String,

    /// Root structure id; defaults to the first configured structure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_structure: Option<StructureId>,

    /// Structure whose controller serves the root url
    #[serde(default = "default_home_structure")]
    pub home_structure: String,

    /// Prefix of derived table names
    #[serde(default)]
    pub db_prefix: String,
}

fn default_home_structure() -> String {
    DEFAULT_HOME_STRUCTURE.to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            url_suffix: String::new(),
            root_structure: None,
            home_structure: default_home_structure(),
            db_prefix: String::new(),
        }
    }
}

/// Bounds on recursive resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Deepest template nesting materialized before failing
    #[serde(default = "default_max_template_depth")]
    pub max_template_depth: usize,

    /// Most structure hops (and in-structure levels) followed by ancestry detection
    #[serde(default = "default_max_ancestry_depth")]
    pub max_ancestry_depth: usize,

    /// Page links shown around the current page
    #[serde(default = "default_pager_window")]
    pub pager_window: u32,
}

fn default_max_template_depth() -> usize {
    DEFAULT_MAX_TEMPLATE_DEPTH
}

fn default_max_ancestry_depth() -> usize {
    DEFAULT_MAX_ANCESTRY_DEPTH
}

fn default_pager_window() -> u32 {
    DEFAULT_PAGER_WINDOW
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_template_depth: default_max_template_depth(),
            max_ancestry_depth: default_max_ancestry_depth(),
            pager_window: default_pager_window(),
        }
    }
}

/// Storage paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory, relative to the workspace root
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".contentroute/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Site(String),
    Structure(String, String),
    Limits(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Site(msg) => write!(f, "Site: {}", msg),
            ValidationError::Structure(name, msg) => write!(f, "Structure '{}': {}", name, msg),
            ValidationError::Limits(msg) => write!(f, "Limits: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SiteConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.start_url.contains(['?', '#']) {
            return Err(format!("start_url '{}' must be a plain path", self.start_url));
        }
        if self.url_suffix.contains(['/', '?', '#']) {
            return Err(format!(
                "url_suffix '{}' must not contain '/', '?' or '#'",
                self.url_suffix
            ));
        }
        if split_qualified_name(&self.home_structure).is_none() {
            return Err(format!(
                "home_structure '{}' is not of the form Module_Name",
                self.home_structure
            ));
        }
        Ok(())
    }
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_template_depth == 0 {
            return Err("max_template_depth must be at least 1".to_string());
        }
        if self.max_ancestry_depth == 0 {
            return Err("max_ancestry_depth must be at least 1".to_string());
        }
        if self.pager_window == 0 {
            return Err("pager_window must be at least 1".to_string());
        }
        Ok(())
    }
}

impl RouterConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.site.validate() {
            errors.push(ValidationError::Site(e));
        }

        let mut ids: HashMap<StructureId, &str> = HashMap::new();
        let mut names: HashMap<&str, StructureId> = HashMap::new();
        for structure in self.structures.iter().chain(&self.templates) {
            let name = structure.name.as_str();
            if split_qualified_name(name).is_none() {
                errors.push(ValidationError::Structure(
                    name.to_string(),
                    "name is not of the form Module_Name".to_string(),
                ));
            }
            if structure.id == ROOT_SENTINEL {
                errors.push(ValidationError::Structure(
                    name.to_string(),
                    format!("id {} is reserved for the root sentinel", ROOT_SENTINEL),
                ));
            }
            if structure.kind.is_empty() {
                errors.push(ValidationError::Structure(
                    name.to_string(),
                    "kind cannot be empty".to_string(),
                ));
            }
            if let Err(e) = structure.params.validate() {
                errors.push(ValidationError::Structure(name.to_string(), e));
            }
            if let Some(existing) = ids.insert(structure.id, name) {
                errors.push(ValidationError::Structure(
                    name.to_string(),
                    format!("Duplicate id {} (also used by '{}')", structure.id, existing),
                ));
            }
            if names.insert(name, structure.id).is_some() {
                errors.push(ValidationError::Structure(
                    name.to_string(),
                    "Duplicate name".to_string(),
                ));
            }
        }

        if self.structures.is_empty() {
            errors.push(ValidationError::Site(
                "at least one routable structure is required".to_string(),
            ));
        }
        if let Some(root) = self.site.root_structure {
            if !self.structures.iter().any(|s| s.id == root) {
                errors.push(ValidationError::Site(format!(
                    "root_structure {} is not a configured structure",
                    root
                )));
            }
        }

        if let Err(e) = self.limits.validate() {
            errors.push(ValidationError::Limits(e));
        }
        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
