//! Merge rules: built-in defaults applied beneath every other source.

use crate::listing::DEFAULT_PAGER_WINDOW;
use crate::structure::registry::DEFAULT_HOME_STRUCTURE;
use crate::template::DEFAULT_MAX_TEMPLATE_DEPTH;
use crate::tree::ancestry::DEFAULT_MAX_ANCESTRY_DEPTH;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("site.start_url", "")?
        .set_default("site.url_suffix", "")?
        .set_default("site.home_structure", DEFAULT_HOME_STRUCTURE)?
        .set_default("site.db_prefix", "")?
        .set_default("limits.max_template_depth", DEFAULT_MAX_TEMPLATE_DEPTH as i64)?
        .set_default("limits.max_ancestry_depth", DEFAULT_MAX_ANCESTRY_DEPTH as i64)?
        .set_default("limits.pager_window", i64::from(DEFAULT_PAGER_WINDOW))?
        .set_default("storage.store_path", ".contentroute/store")
}
