//! Presentation: dispatch, breadcrumb, listing and config formatters.

use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::listing::Pager;
use crate::router::DispatchSummary;
use crate::store::{Row, ID_FIELD, NAME_FIELD, POSITION_FIELD, STRUCTURE_FIELD, URL_FIELD};
use crate::tree::Breadcrumb;
use serde::Serialize;
use serde_json::Value;

const ROW_COLUMNS: [&str; 5] = [ID_FIELD, URL_FIELD, NAME_FIELD, STRUCTURE_FIELD, POSITION_FIELD];

fn to_json<T: Serialize>(value: &T) -> Result<String, RouteError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| RouteError::ConfigLoad(format!("Failed to encode output: {}", e)))
}

#[derive(Serialize)]
struct RouteOutput<'a> {
    #[serde(flatten)]
    dispatch: &'a DispatchSummary,
    pager: Option<&'a Pager>,
}

pub fn format_route_json(summary: &DispatchSummary, pager: Option<&Pager>) -> Result<String, RouteError> {
    to_json(&RouteOutput {
        dispatch: summary,
        pager,
    })
}

pub fn format_breadcrumb_text(crumbs: &[Breadcrumb]) -> String {
    if crumbs.is_empty() {
        return "Path is empty.".to_string();
    }
    let trail: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
    let mut lines = vec![trail.join(" > ")];
    for crumb in crumbs {
        lines.push(format!("  {}  {}", crumb.url, crumb.name));
    }
    lines.join("\n")
}

pub fn format_breadcrumb_json(crumbs: &[Breadcrumb]) -> Result<String, RouteError> {
    to_json(&crumbs)
}

fn cell(row: &Row, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn format_rows_table(rows: &[Row], total: u64) -> String {
    if rows.is_empty() {
        return format!("No elements (total {}).", total);
    }
    use comfy_table::Table;
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(ROW_COLUMNS.to_vec());
    for row in rows {
        table.add_row(ROW_COLUMNS.iter().map(|c| cell(row, c)).collect::<Vec<_>>());
    }
    format!("{}\nShowing {} of {}", table, rows.len(), total)
}

pub fn format_rows_json(rows: &[Row], total: u64) -> Result<String, RouteError> {
    to_json(&serde_json::json!({ "total": total, "rows": rows }))
}

pub fn format_config_toml(config: &RouterConfig) -> Result<String, RouteError> {
    toml::to_string_pretty(config)
        .map_err(|e| RouteError::ConfigLoad(format!("Failed to encode configuration: {}", e)))
}
