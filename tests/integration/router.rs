//! End-to-end routing through hooks, resolution, dispatch and controller selection

use super::support::{registry, router, row, settings, storage, PART};
use contentroute::error::{ConfigurationError, RouteError};
use contentroute::model::{ModelState, ModelType};
use contentroute::router::{DispatchHook, HookBroker, RouterState};
use contentroute::{ContentModel, Context, ControllerName, ParentPointer, Path, Request, Router};
use contentroute::RoutingSettings;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

fn controller(structure: &str, context: Context) -> ControllerName {
    ControllerName::Structure {
        structure: structure.to_string(),
        context,
    }
}

#[test]
fn test_root_url_is_served_by_home() {
    let registry = registry();
    let storage = storage();
    let dispatch = router(&registry, &storage).route(&Request::new("/")).unwrap();

    assert_eq!(dispatch.controller, controller("Ideal_Home", Context::Site));
    assert!(!dispatch.not_found);
    let model = dispatch.model.unwrap();
    assert!(model.is_home());
    assert_eq!(model.page_data().unwrap()["url"], serde_json::json!("/"));
    assert_eq!(storage.read_count(), 0);
}

#[test]
fn test_tree_page_uses_its_declared_structure() {
    let registry = registry();
    let storage = storage();
    let dispatch = router(&registry, &storage)
        .route(&Request::new("/about/team.html"))
        .unwrap();

    assert_eq!(dispatch.controller.to_string(), "Ideal_Part::site");
    let model = dispatch.model.unwrap();
    assert_eq!(model.path().keys(), vec![(0, PART as u64), (PART, 1), (PART, 2)]);
    assert_eq!(model.parent_pointer(), Some(ParentPointer::new(PART, 2)));
}

#[test]
fn test_section_is_retyped_and_served_by_its_structure() {
    let registry = registry();
    let storage = storage();
    let dispatch = router(&registry, &storage)
        .route(&Request::new("/news.html"))
        .unwrap();

    assert_eq!(dispatch.controller, controller("Ideal_News", Context::Site));
    let model = dispatch.model.unwrap();
    assert_eq!(model.model_type(), &ModelType::Structure("Ideal_News".to_string()));
    assert_eq!(model.parent_pointer(), Some(ParentPointer::new(PART, 3)));
}

#[test]
fn test_retyped_section_keeps_its_embedded_template() {
    let registry = registry();
    let storage = storage();
    let mut news = storage.get("parts", 3).unwrap();
    news.insert("content".to_string(), json!("Ideal_Text"));
    storage.insert("parts", news).unwrap();
    storage
        .insert(
            "texts",
            row(json!({"ID": 3, "prev_structure": "1-3", "body": "News intro"})),
        )
        .unwrap();

    let dispatch = router(&registry, &storage)
        .route(&Request::new("/news.html"))
        .unwrap();

    assert_eq!(dispatch.controller, controller("Ideal_News", Context::Site));
    let model = dispatch.model.unwrap();
    assert_eq!(model.model_type(), &ModelType::Structure("Ideal_News".to_string()));
    let data = model.page_data().unwrap();
    assert_eq!(data["content"]["body"], json!("News intro"));
    assert_eq!(data["content"]["prev_structure"], json!("1-3"));
}

#[test]
fn test_element_falls_back_to_parent_declaration() {
    let registry = registry();
    let storage = storage();
    let dispatch = router(&registry, &storage)
        .route(&Request::new("/news/item-3.html").with_context(Context::Site))
        .unwrap();
    assert_eq!(dispatch.controller, controller("Ideal_News", Context::Site));
    assert!(!dispatch.not_found);
}

#[test]
fn test_admin_context_routes_by_id() {
    let registry = registry();
    let storage = storage();
    let dispatch = router(&registry, &storage)
        .route(&Request::new("/3/7.html").with_context(Context::Admin))
        .unwrap();
    assert_eq!(dispatch.controller, controller("Ideal_News", Context::Admin));
    assert_eq!(dispatch.model.unwrap().path().leaf().unwrap().url, "item-7");
}

#[test]
fn test_miss_keeps_partial_path() {
    let registry = registry();
    let storage = storage();
    let dispatch = router(&registry, &storage)
        .route(&Request::new("/about/missing.html"))
        .unwrap();

    assert!(dispatch.not_found);
    assert_eq!(dispatch.controller, controller("Ideal_Part", Context::Site));
    let model = dispatch.model.unwrap();
    assert_eq!(model.path().len(), 2);
}

#[test]
fn test_malformed_urls_are_not_found() {
    let registry = registry();
    let storage = storage();
    let router = router(&registry, &storage);

    for path in ["/about", "/about/", "/about.htm"] {
        let dispatch = router.route(&Request::new(path)).unwrap();
        assert!(dispatch.not_found, "{} should be not found", path);
    }
    assert!(!router.route(&Request::new("/about.html")).unwrap().not_found);
}

#[test]
fn test_mount_prefix() {
    let registry = registry();
    let storage = storage();
    let router = Router::new(&registry, &storage).with_settings(RoutingSettings {
        start_url: "/shop/".to_string(),
        ..settings()
    });

    let dispatch = router.route(&Request::new("/shop/about/team.html")).unwrap();
    assert!(!dispatch.not_found);
    let summary = dispatch.summary(router.settings());
    let urls: Vec<&str> = summary.breadcrumbs.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(urls, vec!["/shop/", "/shop/about.html", "/shop/about/team.html"]);

    assert!(router.route(&Request::new("/about/team.html")).unwrap().not_found);
    assert!(!router.route(&Request::new("/shop")).unwrap().not_found);
}

#[test]
fn test_summary_reports_path_and_pointer() {
    let registry = registry();
    let storage = storage();
    let router = router(&registry, &storage);
    let dispatch = router.route(&Request::new("/news/item-9.html")).unwrap();
    let summary = dispatch.summary(router.settings());

    assert_eq!(summary.controller, "Ideal_News::site");
    assert_eq!(summary.model.as_deref(), Some("Ideal_News"));
    assert_eq!(summary.parent_pointer.as_deref(), Some("2-9"));
    assert_eq!(summary.path.len(), 3);
    assert_eq!(summary.path[2].url, "item-9");
    assert_eq!(summary.page_data.unwrap()["name"], serde_json::json!("Item 9"));
}

#[test]
fn test_router_pager_uses_request_query() {
    let registry = registry();
    let storage = storage();
    let router = router(&registry, &storage);
    let request = Request::new("/news.html?page=2&sort=date");
    let mut model = router.route(&request).unwrap().model.unwrap();

    let pager = router.pager(&mut model, &request, "page").unwrap().unwrap();
    assert_eq!(pager.current, 2);
    assert_eq!(pager.next.unwrap().link, "?sort=date&page=3");

    let request = Request::new("/news.html?page=9");
    let mut model = router.route(&request).unwrap().model.unwrap();
    assert!(router.pager(&mut model, &request, "page").unwrap().is_none());
    assert!(model.is_not_found());
}

#[test]
fn test_model_without_path_falls_back_to_root() {
    let registry = registry();
    let storage = storage();
    let router = router(&registry, &storage);
    let mut model = registry
        .instantiate("Ideal_Part", Context::Site, ModelState::default())
        .unwrap();

    let name = router.controller_name(&mut model).unwrap();
    assert_eq!(name, controller("Ideal_Home", Context::Site));
    assert!(model.is_not_found());
    assert_eq!(model.path().len(), 1);
}

#[test]
fn test_locate_through_router() {
    let registry = registry();
    let storage = storage();
    let router = router(&registry, &storage);
    let model = router.locate("Ideal_Part", 5, Context::Admin).unwrap();
    assert_eq!(
        model.path().url(&router.settings().start_url, &router.settings().url_suffix),
        "/about/team/alice.html"
    );
}

/// Serves a prepared model instead of resolving the url
struct Preloaded {
    model: Mutex<Option<ContentModel>>,
}

impl DispatchHook for Preloaded {
    fn name(&self) -> &str {
        "preloaded"
    }

    fn pre_dispatch(&self, state: &mut RouterState) -> Result<(), RouteError> {
        state.model = self.model.lock().take();
        Ok(())
    }
}

struct Maintenance;

impl DispatchHook for Maintenance {
    fn name(&self) -> &str {
        "maintenance"
    }

    fn post_dispatch(&self, state: &mut RouterState) -> Result<(), RouteError> {
        if state.request.query.contains_key("maintenance") {
            state.controller = Some(ControllerName::Named {
                name: "Ideal_Maintenance".to_string(),
            });
        }
        Ok(())
    }
}

struct Refuse;

impl DispatchHook for Refuse {
    fn name(&self) -> &str {
        "refuse"
    }

    fn pre_dispatch(&self, _state: &mut RouterState) -> Result<(), RouteError> {
        Err(ConfigurationError::Invalid("refused".to_string()).into())
    }
}

#[test]
fn test_pre_dispatch_hook_skips_resolution() {
    let registry = registry();
    let storage = storage();
    let home = registry.home_model(
        Context::Site,
        ModelState {
            path: Path::from_nodes(vec![registry.root_node()]),
            ..ModelState::default()
        },
    );
    let mut hooks = HookBroker::new();
    hooks.register(Arc::new(Preloaded {
        model: Mutex::new(Some(home)),
    }));

    let dispatch = router(&registry, &storage)
        .with_hooks(hooks)
        .route(&Request::new("/about.html"))
        .unwrap();
    assert_eq!(dispatch.controller, controller("Ideal_Home", Context::Site));
    assert_eq!(storage.read_count(), 0);
}

#[test]
fn test_post_dispatch_hook_forces_controller() {
    let registry = registry();
    let storage = storage();
    let mut hooks = HookBroker::new();
    hooks.register(Arc::new(Maintenance));
    let router = router(&registry, &storage).with_hooks(hooks);

    let dispatch = router
        .route(&Request::new("/about.html?maintenance=1"))
        .unwrap();
    assert_eq!(dispatch.controller.to_string(), "Ideal_Maintenance");
    assert!(dispatch.model.is_some());

    let dispatch = router.route(&Request::new("/about.html")).unwrap();
    assert_eq!(dispatch.controller.to_string(), "Ideal_Part::site");
}

#[test]
fn test_hook_errors_abort_the_request() {
    let registry = registry();
    let storage = storage();
    let mut hooks = HookBroker::new();
    hooks.register(Arc::new(Refuse));
    assert_eq!(hooks.len(), 1);

    let result = router(&registry, &storage)
        .with_hooks(hooks)
        .route(&Request::new("/about.html"));
    assert!(matches!(
        result,
        Err(RouteError::Configuration(ConfigurationError::Invalid(_)))
    ));
}
