//! Property-based tests for resolution round trips

use contentroute::listing::{ListingWindow, Pager};
use contentroute::store::Row;
use contentroute::structure::{FieldDef, StructureClass, StructureDescriptor, StructureParams};
use contentroute::{AncestryResolver, Context, MemoryStorage, ParentPointer, PathResolver};
use contentroute::StructureRegistry;
use proptest::prelude::*;
use proptest::sample::Index;
use serde_json::json;

fn registry() -> StructureRegistry {
    StructureRegistry::builder()
        .structure(StructureDescriptor {
            id: 1,
            name: "Ideal_Part".to_string(),
            class: StructureClass::Structure,
            kind: "tree".to_string(),
            title: "Home".to_string(),
            table: "parts".to_string(),
            fields: vec![FieldDef::new("name", "text")],
            params: StructureParams::default(),
        })
        .build()
        .unwrap()
}

/// Parent of element `id` (1-based) picked among the root and earlier elements
fn parents(choices: &[Index]) -> Vec<u64> {
    choices
        .iter()
        .enumerate()
        .map(|(i, choice)| choice.index(i + 1) as u64)
        .collect()
}

fn slugs(parents: &[u64], id: u64) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = id;
    while current != 0 {
        chain.push(format!("n{}", current));
        current = parents[current as usize - 1];
    }
    chain.reverse();
    chain
}

/// Test that a pointer survives its textual column encoding
#[test]
fn test_parent_pointer_codec_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<u32>(), any::<u64>()), |(structure_id, element_id)| {
            let pointer = ParentPointer::new(structure_id, element_id);
            let decoded: ParentPointer = pointer.to_string().parse().unwrap();
            prop_assert_eq!(decoded, pointer);
            Ok(())
        })
        .unwrap();
}

/// Test that reverse resolution rebuilds exactly the path forward resolution walks
#[test]
fn test_forward_reverse_round_trip_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec(any::<Index>(), 1..24), any::<Index>()),
            |(choices, target)| {
                let registry = registry();
                let storage = MemoryStorage::new();
                let parents = parents(&choices);
                for (i, parent) in parents.iter().enumerate() {
                    let id = i as u64 + 1;
                    let prev = if *parent == 0 {
                        ParentPointer::root(1)
                    } else {
                        ParentPointer::new(1, *parent)
                    };
                    let row: Row = json!({
                        "ID": id,
                        "url": format!("n{}", id),
                        "prev_structure": prev.to_string(),
                        "structure": "Ideal_Part",
                    })
                    .as_object()
                    .cloned()
                    .unwrap();
                    storage.insert("parts", row).unwrap();
                }

                let id = target.index(parents.len()) as u64 + 1;
                let segments = slugs(&parents, id);
                let forward = PathResolver::new(&registry, &storage)
                    .resolve(Context::Site, &segments)
                    .unwrap();
                let reverse = AncestryResolver::new(&registry, &storage)
                    .locate("Ideal_Part", id, Context::Site)
                    .unwrap();

                prop_assert!(!forward.is_not_found());
                prop_assert_eq!(forward.path().len(), segments.len() + 1);
                prop_assert_eq!(forward.path().adjacency_violation(), None);
                prop_assert_eq!(forward.path(), reverse.path());
                prop_assert_eq!(forward.parent_pointer(), Some(ParentPointer::new(1, id)));
                prop_assert_eq!(reverse.parent_pointer(), forward.parent_pointer());
                Ok(())
            },
        )
        .unwrap();
}

/// Test that pagers stay inside the listing and flag only pages past a non-empty end
#[test]
fn test_pager_bounds_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(0u64..500, 1u32..50, 1u32..60, 1u32..12),
            |(total_count, page_size, page_number, visible)| {
                let window = ListingWindow {
                    page_number,
                    page_size,
                    total_count,
                };
                let page_count = window.page_count();
                prop_assert_eq!(u64::from(page_count), total_count.div_ceil(u64::from(page_size)));

                match Pager::compute(window, "", "page", visible) {
                    None => {
                        prop_assert!(total_count > 0);
                        prop_assert!(page_number > page_count);
                    }
                    Some(pager) => {
                        prop_assert!(total_count == 0 || page_number <= page_count);
                        prop_assert!(pager.pages.len() as u32 <= visible);
                        prop_assert!(pager.pages.iter().all(|p| p.number >= 1 && p.number <= page_count));
                        if total_count > 0 {
                            prop_assert!(pager.pages.iter().any(|p| p.current && p.number == page_number));
                            prop_assert!(window.offset() < total_count as usize);
                        }
                        prop_assert_eq!(pager.next.is_some(), page_number < page_count);
                        prop_assert_eq!(pager.prev.is_some(), page_number > 1);
                    }
                }
                Ok(())
            },
        )
        .unwrap();
}
