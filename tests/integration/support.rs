//! Shared site fixture for integration tests
//!
//! A small site rooted at `Ideal_Part`:
//!
//! ```text
//! /                 root (Ideal_Part id 1)
//! /about            part 1, embeds Ideal_Text
//! /about/team       part 2
//! /about/team/alice part 5
//! /news             part 3, declares Ideal_News (23 items)
//! /contacts         part 4, embeds Ideal_Gallery, which embeds Ideal_Text
//! /archive          part 6, declares Ideal_News (no items)
//! /broken           part 7, embeds Ideal_Text without a stored row
//! ```

use contentroute::store::Row;
use contentroute::structure::{FieldDef, StructureClass, StructureDescriptor, StructureParams};
use contentroute::{MemoryStorage, Router, RoutingSettings, StructureRegistry};
use serde_json::{json, Value};

pub const PART: u32 = 1;
pub const NEWS: u32 = 2;
pub const TEXT: u32 = 100;
pub const GALLERY: u32 = 101;
pub const LOOP: u32 = 102;

pub const NEWS_ITEMS: u64 = 23;

pub fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap()
}

fn descriptor(
    id: u32,
    name: &str,
    class: StructureClass,
    kind: &str,
    table: &str,
    fields: Vec<FieldDef>,
    params: StructureParams,
) -> StructureDescriptor {
    StructureDescriptor {
        id,
        name: name.to_string(),
        class,
        kind: kind.to_string(),
        title: String::new(),
        table: table.to_string(),
        fields,
        params,
    }
}

pub fn registry() -> StructureRegistry {
    let mut part = descriptor(
        PART,
        "Ideal_Part",
        StructureClass::Structure,
        "tree",
        "parts",
        vec![
            FieldDef::new("name", "text"),
            FieldDef::new("content", "Ideal_Template"),
        ],
        StructureParams::default(),
    );
    part.title = "Home".to_string();

    let news = descriptor(
        NEWS,
        "Ideal_News",
        StructureClass::Structure,
        "list",
        "news",
        vec![FieldDef::new("name", "text"), FieldDef::new("date", "date")],
        StructureParams {
            field_sort: "date DESC".to_string(),
            elements_site: 10,
            elements_admin: 5,
            ..StructureParams::default()
        },
    );

    let text = descriptor(
        TEXT,
        "Ideal_Text",
        StructureClass::Template,
        "template",
        "texts",
        vec![FieldDef::new("body", "html")],
        StructureParams::default(),
    );
    let gallery = descriptor(
        GALLERY,
        "Ideal_Gallery",
        StructureClass::Template,
        "template",
        "galleries",
        vec![
            FieldDef::new("title", "text"),
            FieldDef::new("caption", "Ideal_Template"),
        ],
        StructureParams::default(),
    );
    let looping = descriptor(
        LOOP,
        "Ideal_Loop",
        StructureClass::Template,
        "template",
        "loops",
        vec![FieldDef::new("inner", "Ideal_Template")],
        StructureParams::default(),
    );

    StructureRegistry::builder()
        .structure(part)
        .structure(news)
        .structure(text)
        .structure(gallery)
        .structure(looping)
        .root(PART)
        .build()
        .unwrap()
}

fn part(id: u64, url: &str, parent: &str, pos: i64, extra: Value) -> Row {
    let mut row = row(json!({
        "ID": id,
        "url": url,
        "name": url.to_uppercase(),
        "prev_structure": parent,
        "pos": pos,
        "structure": "Ideal_Part",
    }));
    if let Value::Object(extra) = extra {
        row.extend(extra);
    }
    row
}

pub fn storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    let parts = [
        part(1, "about", "0-1", 1, json!({"content": "Ideal_Text"})),
        part(2, "team", "1-1", 1, json!({})),
        part(3, "news", "0-1", 2, json!({"structure": "Ideal_News"})),
        part(4, "contacts", "0-1", 3, json!({"content": "Ideal_Gallery"})),
        part(5, "alice", "1-2", 1, json!({})),
        part(6, "archive", "0-1", 4, json!({"structure": "Ideal_News"})),
        part(7, "broken", "0-1", 5, json!({"content": "Ideal_Text"})),
    ];
    for row in parts {
        storage.insert("parts", row).unwrap();
    }

    for n in 1..=NEWS_ITEMS {
        storage
            .insert(
                "news",
                row(json!({
                    "ID": n,
                    "url": format!("item-{}", n),
                    "name": format!("Item {}", n),
                    "date": format!("2024-01-{:02}", n),
                    "prev_structure": "1-3",
                })),
            )
            .unwrap();
    }

    storage
        .insert(
            "texts",
            row(json!({"ID": 1, "prev_structure": "1-1", "body": "About us"})),
        )
        .unwrap();
    storage
        .insert(
            "texts",
            row(json!({"ID": 2, "prev_structure": "101-1", "body": "Office photos"})),
        )
        .unwrap();
    storage
        .insert(
            "galleries",
            row(json!({"ID": 1, "prev_structure": "1-4", "title": "Office", "caption": "Ideal_Text"})),
        )
        .unwrap();
    storage
}

pub fn settings() -> RoutingSettings {
    RoutingSettings {
        url_suffix: ".html".to_string(),
        ..RoutingSettings::default()
    }
}

pub fn router<'a>(registry: &'a StructureRegistry, storage: &'a MemoryStorage) -> Router<'a> {
    Router::new(registry, storage).with_settings(settings())
}
