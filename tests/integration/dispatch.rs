//! Retyping resolved leaves to the structure they declare

use super::support::{registry, storage, PART};
use contentroute::model::ModelType;
use contentroute::{Context, ModelDispatcher, ParentPointer, PathResolver};

#[test]
fn test_retypes_leaf_to_declared_structure() {
    let registry = registry();
    let storage = storage();
    let model = PathResolver::new(&registry, &storage)
        .resolve(Context::Site, &["news"])
        .unwrap();
    let path = model.path().clone();

    let model = ModelDispatcher::new(&registry).dispatch(model).unwrap();
    assert_eq!(model.model_type(), &ModelType::Structure("Ideal_News".to_string()));
    assert_eq!(model.parent_pointer(), Some(ParentPointer::new(PART, 3)));
    assert_eq!(model.path(), &path);
    assert!(!model.is_not_found());
}

#[test]
fn test_dispatch_is_idempotent() {
    let registry = registry();
    let storage = storage();
    let dispatcher = ModelDispatcher::new(&registry);
    let model = PathResolver::new(&registry, &storage)
        .resolve(Context::Site, &["archive"])
        .unwrap();

    let once = dispatcher.dispatch(model).unwrap();
    let pointer = once.parent_pointer();
    let path = once.path().clone();
    let twice = dispatcher.dispatch(once).unwrap();

    assert_eq!(twice.model_type(), &ModelType::Structure("Ideal_News".to_string()));
    assert_eq!(twice.parent_pointer(), pointer);
    assert_eq!(twice.path(), &path);
}

#[test]
fn test_home_and_undeclared_leaves_pass_through() {
    let registry = registry();
    let storage = storage();
    let resolver = PathResolver::new(&registry, &storage);
    let dispatcher = ModelDispatcher::new(&registry);

    let segments: [&str; 0] = [];
    let home = dispatcher
        .dispatch(resolver.resolve(Context::Site, &segments).unwrap())
        .unwrap();
    assert!(home.is_home());

    let item = dispatcher
        .dispatch(resolver.resolve(Context::Site, &["news", "item-2"]).unwrap())
        .unwrap();
    assert_eq!(item.model_type(), &ModelType::Structure("Ideal_News".to_string()));
}

#[test]
fn test_not_found_survives_dispatch() {
    let registry = registry();
    let storage = storage();
    let model = PathResolver::new(&registry, &storage)
        .resolve(Context::Site, &["news", "item-99"])
        .unwrap();
    assert!(model.is_not_found());

    let model = ModelDispatcher::new(&registry).dispatch(model).unwrap();
    assert!(model.is_not_found());
    assert_eq!(model.path().len(), 2);
}
