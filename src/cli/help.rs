//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string for log records (e.g. "route", "list").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Route { .. } => "route",
        Commands::Breadcrumb { .. } => "breadcrumb",
        Commands::List { .. } => "list",
        Commands::Delete { .. } => "delete",
        Commands::Import { .. } => "import",
        Commands::Config => "config",
    }
}
