//! Layered configuration loading

use super::merge::merge_policy;
use super::sources::{environment, workspace_file};
use super::RouterConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

/// Loads [`RouterConfig`] from defaults, config files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): built-in defaults, `config/config.toml`,
    /// `config/{CONTENTROUTE_ENV}.toml`, `CONTENTROUTE__SECTION__KEY` variables.
    pub fn load(workspace_root: &Path) -> Result<RouterConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = workspace_file::add_to_builder(builder, workspace_root);
        let builder = environment::add_to_builder(builder);
        let config: RouterConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            structures = config.structures.len(),
            templates = config.templates.len(),
            "Loaded workspace configuration"
        );
        Ok(config)
    }

    /// Load configuration from one explicit file, still honoring environment overrides
    pub fn load_from_file(path: &Path) -> Result<RouterConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }

    /// Parse configuration from TOML text, over the built-in defaults
    pub fn from_toml_str(text: &str) -> Result<RouterConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
