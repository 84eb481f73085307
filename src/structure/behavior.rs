//! Structure behaviours
//!
//! The part of a structure that differs between content types. Every behaviour must know
//! how to build the path of one of its elements inside its own structure; the ancestry
//! resolver stitches those local paths together across structures.

use crate::error::{ConfigurationError, RouteError};
use crate::model::load_row;
use crate::store::Storage;
use crate::structure::StructureDescriptor;
use crate::tree::PathNode;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type-specific behaviour of a structure
pub trait StructureBehavior: Send + Sync + fmt::Debug {
    /// Tag this behaviour is registered under
    fn kind(&self) -> &'static str;

    /// Root-first path of `element` inside `descriptor`, ending with `element`.
    ///
    /// The first returned node's parent pointer leads out of this structure. Behaviours
    /// whose elements never appear on a path return an empty list.
    fn local_path(
        &self,
        descriptor: &StructureDescriptor,
        element: PathNode,
        storage: &dyn Storage,
        max_depth: usize,
    ) -> Result<Vec<PathNode>, RouteError>;
}

/// Constructor registered for a behaviour tag
pub type BehaviorFactory = fn() -> Arc<dyn StructureBehavior>;

/// Hierarchical structure: elements may nest under elements of the same structure
#[derive(Debug, Default)]
pub struct TreeBehavior;

impl StructureBehavior for TreeBehavior {
    fn kind(&self) -> &'static str {
        "tree"
    }

    fn local_path(
        &self,
        descriptor: &StructureDescriptor,
        element: PathNode,
        storage: &dyn Storage,
        max_depth: usize,
    ) -> Result<Vec<PathNode>, RouteError> {
        let mut chain = vec![element];
        loop {
            let pointer = match chain.last().and_then(|node| node.parent) {
                Some(pointer) if pointer.structure_id == descriptor.id => pointer,
                _ => break,
            };
            if chain.len() > max_depth {
                return Err(ConfigurationError::AncestryTooDeep(max_depth).into());
            }
            let row = load_row(storage, descriptor, pointer.element_id)?.ok_or_else(|| {
                ConfigurationError::DanglingParent {
                    pointer,
                    structure: descriptor.name.clone(),
                }
            })?;
            chain.push(PathNode::from_row(descriptor.id, &descriptor.table, row)?);
        }
        chain.reverse();
        Ok(chain)
    }
}

/// Flat listing: every element hangs directly off an element of another structure
#[derive(Debug, Default)]
pub struct ListBehavior;

impl StructureBehavior for ListBehavior {
    fn kind(&self) -> &'static str {
        "list"
    }

    fn local_path(
        &self,
        _descriptor: &StructureDescriptor,
        element: PathNode,
        _storage: &dyn Storage,
        _max_depth: usize,
    ) -> Result<Vec<PathNode>, RouteError> {
        Ok(vec![element])
    }
}

/// Embedded template: owned by another element, never part of a path
#[derive(Debug, Default)]
pub struct TemplateBehavior;

impl StructureBehavior for TemplateBehavior {
    fn kind(&self) -> &'static str {
        "template"
    }

    fn local_path(
        &self,
        _descriptor: &StructureDescriptor,
        _element: PathNode,
        _storage: &dyn Storage,
        _max_depth: usize,
    ) -> Result<Vec<PathNode>, RouteError> {
        Ok(Vec::new())
    }
}

fn tree_factory() -> Arc<dyn StructureBehavior> {
    Arc::new(TreeBehavior)
}

fn list_factory() -> Arc<dyn StructureBehavior> {
    Arc::new(ListBehavior)
}

fn template_factory() -> Arc<dyn StructureBehavior> {
    Arc::new(TemplateBehavior)
}

/// Tag to factory mapping used when the structure registry is built
#[derive(Clone)]
pub struct BehaviorRegistry {
    factories: HashMap<String, BehaviorFactory>,
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl BehaviorRegistry {
    /// Registry without any tags
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the `tree`, `list` and `template` behaviours
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("tree", tree_factory);
        registry.register("list", list_factory);
        registry.register("template", template_factory);
        registry
    }

    /// Register (or replace) the factory for a tag
    pub fn register(&mut self, kind: &str, factory: BehaviorFactory) {
        self.factories.insert(kind.to_string(), factory);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn create(&self, kind: &str) -> Option<Arc<dyn StructureBehavior>> {
        self.factories.get(kind).map(|factory| factory())
    }
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("BehaviorRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
