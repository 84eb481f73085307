//! Reverse resolution: a loaded node back up to the root

use crate::error::{ConfigurationError, RouteError};
use crate::model::{ContentModel, ModelState};
use crate::store::Storage;
use crate::structure::StructureRegistry;
use crate::tree::{Path, PathNode};
use crate::types::{Context, ElementId};
use tracing::debug;

/// Default bound on structure hops and in-structure nesting
pub const DEFAULT_MAX_ANCESTRY_DEPTH: usize = 64;

/// Rebuilds the full path of a model that was loaded by id rather than by a URL walk.
///
/// Each hop asks the current structure for the element's local path, then follows the
/// parent pointer of the first local node into the owning structure, instantiated through
/// the registry. The walk ends at the root sentinel.
pub struct AncestryResolver<'a> {
    registry: &'a StructureRegistry,
    storage: &'a dyn Storage,
    max_depth: usize,
}

impl<'a> AncestryResolver<'a> {
    pub fn new(registry: &'a StructureRegistry, storage: &'a dyn Storage) -> Self {
        Self {
            registry,
            storage,
            max_depth: DEFAULT_MAX_ANCESTRY_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Root-first path ending with the model's loaded row.
    ///
    /// A model without a loaded row contributes no local nodes; its own parent pointer is
    /// followed instead, so the path ends at the element that pointer names.
    pub fn detect_path(&self, model: &ContentModel) -> Result<Path, RouteError> {
        self.detect(model, 0)
    }

    /// Detect the path and store it on the model
    pub fn attach(&self, model: &mut ContentModel) -> Result<(), RouteError> {
        let path = self.detect_path(model)?;
        model.set_path(path, self.registry)?;
        Ok(())
    }

    /// Load element `id` of `structure` and attach its full path, as an edit screen does
    pub fn locate(
        &self,
        structure: &str,
        id: ElementId,
        context: Context,
    ) -> Result<ContentModel, RouteError> {
        let mut model = self
            .registry
            .instantiate(structure, context, ModelState::default())?;
        if !model.load_by_id(self.storage, id)? {
            return Err(ConfigurationError::ElementNotFound {
                structure: structure.to_string(),
                element: id,
            }
            .into());
        }
        self.attach(&mut model)?;
        Ok(model)
    }

    fn detect(&self, model: &ContentModel, hops: usize) -> Result<Path, RouteError> {
        let local = model.local_path(self.storage, self.max_depth)?;
        let pointer = match local.first() {
            Some(first) => first.parent.ok_or_else(|| {
                ConfigurationError::Invalid(format!(
                    "element {} of {} has no parent pointer",
                    first.id,
                    model.descriptor().name
                ))
            })?,
            None => model.parent_pointer().ok_or_else(|| {
                ConfigurationError::Invalid(format!(
                    "{} model has neither a loaded row nor a parent pointer",
                    model.model_type()
                ))
            })?,
        };

        if pointer.is_root() {
            let root = self.registry.by_root_pointer(pointer)?;
            let mut nodes = Vec::with_capacity(local.len() + 1);
            nodes.push(PathNode::root(root));
            nodes.extend(local);
            return Ok(Path::from_nodes(nodes));
        }

        if hops >= self.max_depth {
            return Err(ConfigurationError::AncestryTooDeep(self.max_depth).into());
        }

        let parent_descriptor = self.registry.by_parent_pointer(pointer)?;
        debug!(
            from = %model.descriptor().name,
            to = %parent_descriptor.name,
            element = pointer.element_id,
            "Following parent pointer"
        );
        let mut parent =
            self.registry
                .instantiate(&parent_descriptor.name, model.context(), ModelState::default())?;
        if !parent.load_by_id(self.storage, pointer.element_id)? {
            return Err(ConfigurationError::DanglingParent {
                pointer,
                structure: parent_descriptor.name.clone(),
            }
            .into());
        }

        let mut path = self.detect(&parent, hops + 1)?;
        path.extend(local);
        Ok(path)
    }
}
