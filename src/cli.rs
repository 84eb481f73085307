//! CLI domain: parse, route, help, output, and presentation only.
//! No routing logic of its own; the route table hands commands to the library.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_breadcrumb_json, format_breadcrumb_text, format_config_toml, format_route_json,
    format_rows_json, format_rows_table,
};
pub use route::RunContext;
