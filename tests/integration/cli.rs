//! CLI commands against a workspace on disk

use contentroute::cli::{Commands, RunContext};
use contentroute::error::RouteError;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WORKSPACE_TOML: &str = r#"
[site]
url_suffix = ".html"
db_prefix = "i_"

[[structures]]
id = 1
name = "Ideal_Part"
kind = "tree"
title = "Home"
fields = [
    { name = "name", type = "text" },
    { name = "content", type = "Ideal_Template" },
]

[[structures]]
id = 2
name = "Ideal_News"
kind = "list"

[structures.params]
field_sort = "date DESC"
elements_site = 2

[[templates]]
id = 100
name = "Ideal_Text"
kind = "template"
"#;

const IMPORT_JSON: &str = r#"{
    "Ideal_Part": [
        {"ID": 1, "url": "about", "name": "About", "prev_structure": "0-1", "pos": 1, "structure": "Ideal_Part", "content": "Ideal_Text"},
        {"ID": 2, "url": "news", "name": "News", "prev_structure": "0-1", "pos": 2, "structure": "Ideal_News"},
        {"ID": 3, "url": "contacts", "name": "Contacts", "prev_structure": "0-1", "pos": 3, "structure": "Ideal_Part"}
    ],
    "Ideal_News": [
        {"ID": 1, "url": "first", "name": "First", "date": "2024-03-01", "prev_structure": "1-2"},
        {"ID": 2, "url": "second", "name": "Second", "date": "2024-03-02", "prev_structure": "1-2"},
        {"ID": 3, "url": "third", "name": "Third", "date": "2024-03-03", "prev_structure": "1-2"}
    ],
    "Ideal_Text": [
        {"ID": 1, "prev_structure": "1-1", "body": "Hello"}
    ]
}"#;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(dir.path().join("config").join("config.toml"), WORKSPACE_TOML).unwrap();
    fs::write(dir.path().join("import.json"), IMPORT_JSON).unwrap();
    dir
}

fn imported(root: &Path) -> RunContext {
    let context = RunContext::new(root.to_path_buf(), None).unwrap();
    let output = context
        .execute(&Commands::Import {
            file: root.join("import.json"),
        })
        .unwrap();
    assert_eq!(output, "Imported 7 rows into 3 tables");
    context
}

fn route(context: &RunContext, path: &str, query: &[&str]) -> Value {
    let output = context
        .execute(&Commands::Route {
            path: path.to_string(),
            admin: false,
            query: query.iter().map(|q| q.to_string()).collect(),
            page_param: "page".to_string(),
        })
        .unwrap();
    serde_json::from_str(&output).unwrap()
}

#[test]
fn test_import_uses_derived_tables() {
    let dir = workspace();
    let context = imported(dir.path());
    let tables: Vec<String> = context
        .registry()
        .descriptors()
        .map(|d| d.table.clone())
        .collect();
    assert_eq!(
        tables,
        vec![
            "i_ideal_structure_part",
            "i_ideal_structure_news",
            "i_ideal_template_text"
        ]
    );
    assert!(dir.path().join(".contentroute").join("store").exists());
}

#[test]
fn test_route_command_reports_dispatch() {
    let dir = workspace();
    let context = imported(dir.path());

    let output = route(&context, "/news/second.html", &[]);
    assert_eq!(output["controller"], "Ideal_News::site");
    assert_eq!(output["not_found"], false);
    assert_eq!(output["parent_pointer"], "2-2");
    assert_eq!(output["page_data"]["name"], "Second");

    let output = route(&context, "/about.html", &[]);
    assert_eq!(output["page_data"]["content"]["body"], "Hello");
}

#[test]
fn test_route_command_paginates() {
    let dir = workspace();
    let context = imported(dir.path());

    let output = route(&context, "/news.html", &["page=2"]);
    assert_eq!(output["not_found"], false);
    assert_eq!(output["pager"]["current"], 2);
    assert_eq!(output["pager"]["prev"]["link"], "?page=1");

    let output = route(&context, "/news.html", &["page=5"]);
    assert_eq!(output["not_found"], true);
    assert!(output["pager"].is_null());
}

#[test]
fn test_breadcrumb_and_list_commands() {
    let dir = workspace();
    let context = imported(dir.path());

    let text = context
        .execute(&Commands::Breadcrumb {
            structure: "Ideal_News".to_string(),
            id: 3,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(text.starts_with("Home > News > Third"));
    assert!(text.contains("/news/third.html"));

    let listing = context
        .execute(&Commands::List {
            structure: "Ideal_News".to_string(),
            parent: "1-2".to_string(),
            page: Some(1),
            admin: false,
            format: "json".to_string(),
        })
        .unwrap();
    let listing: Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(listing["total"], 3);
    assert_eq!(listing["rows"].as_array().unwrap().len(), 2);
    assert_eq!(listing["rows"][0]["url"], "third");
}

#[test]
fn test_delete_command() {
    let dir = workspace();
    let context = imported(dir.path());

    let output = context
        .execute(&Commands::Delete {
            structure: "Ideal_Part".to_string(),
            id: 1,
        })
        .unwrap();
    assert_eq!(output, "Deleted Ideal_Part 1");

    let table = context
        .execute(&Commands::List {
            structure: "Ideal_Part".to_string(),
            parent: "0-1".to_string(),
            page: None,
            admin: true,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(table.ends_with("Showing 2 of 2"));
    assert!(!table.contains("about"));

    let err = context
        .execute(&Commands::Delete {
            structure: "Ideal_Part".to_string(),
            id: 1,
        })
        .unwrap_err();
    assert!(contentroute::cli::map_error(&err).starts_with("not found:"));
}

#[test]
fn test_config_command_prints_effective_config() {
    let dir = workspace();
    let context = RunContext::new(dir.path().to_path_buf(), None).unwrap();
    let output = context.execute(&Commands::Config).unwrap();
    assert!(output.contains("url_suffix = \".html\""));
    assert!(output.contains("name = \"Ideal_News\""));
}

#[test]
fn test_invalid_workspace_is_rejected() {
    let dir = TempDir::new().unwrap();
    let result = RunContext::new(dir.path().to_path_buf(), None);
    match result {
        Err(RouteError::ConfigLoad(message)) => {
            assert!(message.contains("at least one routable structure"));
        }
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("an empty workspace must not validate"),
    }
}
