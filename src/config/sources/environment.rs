//! Environment source: CONTENTROUTE__SECTION__KEY overrides

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Prefix of configuration overrides
pub const ENV_PREFIX: &str = "CONTENTROUTE";

/// Add environment overrides to builder. `CONTENTROUTE__SITE__URL_SUFFIX=.html` sets
/// `site.url_suffix`; single-underscore variables such as `CONTENTROUTE_LOG` are not matched.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
