//! Routing and sibling maintenance on the sled-backed store

use super::support::{registry, settings, storage};
use contentroute::roster::{delete_element, next_position};
use contentroute::store::{Filter, Query};
use contentroute::{Context, Request, Router, SledStorage, Storage};
use serde_json::json;
use tempfile::TempDir;

const TABLES: [&str; 4] = ["parts", "news", "texts", "galleries"];

fn sled_fixture(dir: &TempDir) -> SledStorage {
    let memory = storage();
    let sled = SledStorage::new(dir.path()).unwrap();
    for table in TABLES {
        for row in memory.query_rows(table, &Query::new(Filter::All)).unwrap() {
            sled.insert(table, row).unwrap();
        }
    }
    sled.flush().unwrap();
    sled
}

#[test]
fn test_routes_from_sled() {
    let dir = TempDir::new().unwrap();
    let sled = sled_fixture(&dir);
    let registry = registry();
    let router = Router::new(&registry, &sled).with_settings(settings());

    let dispatch = router.route(&Request::new("/contacts.html")).unwrap();
    assert!(!dispatch.not_found);
    let data = dispatch.model.unwrap().page_data().cloned().unwrap();
    assert_eq!(data["content"]["caption"]["body"], json!("Office photos"));

    let news = router.locate("Ideal_News", 23, Context::Admin).unwrap();
    assert_eq!(news.path().len(), 3);
}

#[test]
fn test_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let sled = sled_fixture(&dir);
        assert_eq!(sled.count("news", &Filter::All).unwrap(), 23);
    }

    let sled = SledStorage::new(dir.path()).unwrap();
    let registry = registry();
    let dispatch = Router::new(&registry, &sled)
        .with_settings(settings())
        .route(&Request::new("/about/team/alice.html"))
        .unwrap();
    assert!(!dispatch.not_found);
}

#[test]
fn test_delete_shifts_following_siblings() {
    let dir = TempDir::new().unwrap();
    let sled = sled_fixture(&dir);
    let registry = registry();
    let router = Router::new(&registry, &sled).with_settings(settings());

    let news = router.locate("Ideal_Part", 3, Context::Admin).unwrap();
    assert!(delete_element(&sled, &news).unwrap());
    sled.flush().unwrap();

    let first_level = sled
        .query_rows(
            "parts",
            &Query::new(Filter::eq("prev_structure", "0-1"))
                .order_by(contentroute::store::OrderBy::parse("pos")),
        )
        .unwrap();
    let order: Vec<(String, i64)> = first_level
        .iter()
        .map(|r| (r["url"].as_str().unwrap().to_string(), r["pos"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("about".to_string(), 1),
            ("contacts".to_string(), 2),
            ("archive".to_string(), 3),
            ("broken".to_string(), 4),
        ]
    );
    // the nested level keeps its own numbering
    let team = sled
        .query_rows("parts", &Query::new(Filter::eq("ID", 2u64)))
        .unwrap();
    assert_eq!(team[0]["pos"], json!(1));

    let section = router.locate("Ideal_Part", 1, Context::Admin).unwrap();
    assert_eq!(next_position(&sled, &section).unwrap(), 2);
}
