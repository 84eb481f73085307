//! CLI parse: clap types for contentroute. No behavior; definitions only.

use crate::types::ElementId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Contentroute CLI - inspect and exercise content tree routing
#[derive(Parser)]
#[command(name = "contentroute")]
#[command(about = "Resolve urls, breadcrumbs and listings of a structured content tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a request path and print the dispatch result
    Route {
        /// Request path, e.g. /about/team.html?page=2
        path: String,
        /// Route in the admin context (segments are element ids)
        #[arg(long)]
        admin: bool,
        /// Extra query parameter (repeatable)
        #[arg(long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
        /// Query parameter carrying the page number
        #[arg(long, default_value = "page")]
        page_param: String,
    },
    /// Rebuild the ancestry of a stored element
    Breadcrumb {
        /// Qualified structure name, e.g. Ideal_Part
        structure: String,
        /// Element id
        id: ElementId,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the elements stored under a parent pointer
    List {
        /// Qualified structure name
        structure: String,
        /// Parent pointer, e.g. 0-1 or 1-5
        parent: String,
        /// Page number (omit to list everything)
        #[arg(long)]
        page: Option<u32>,
        /// Use the admin page size
        #[arg(long)]
        admin: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete an element and close the gap in its siblings' positions
    Delete {
        /// Qualified structure name
        structure: String,
        /// Element id
        id: ElementId,
    },
    /// Import rows from a JSON file of the form {"<table or structure>": [rows]}
    Import {
        /// JSON file to import
        file: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config,
}
