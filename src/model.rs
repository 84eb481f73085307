//! Content models
//!
//! A [`ContentModel`] is the request-scoped unit bound to one structure descriptor: it holds
//! the loaded row, the path resolved so far, the parent pointer under which its listing
//! lives and the not-found flag. Models are never shared between requests.

use crate::error::{ConfigurationError, RouteError, StorageError};
use crate::store::{Filter, Query, Row, Storage, ID_FIELD};
use crate::structure::{StructureBehavior, StructureDescriptor, StructureRegistry};
use crate::tree::{Path, PathNode};
use crate::types::{Context, ElementId, ParentPointer, StructureId};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Owning-class tag of a model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ModelType {
    /// Model of a routable structure
    Structure(String),
    /// Model serving the root url; bound to the root descriptor but owned by no structure
    Home,
    /// Model of an embedded template
    Template(String),
}

impl ModelType {
    /// Structure or template name; `None` for the home model
    pub fn structure_name(&self) -> Option<&str> {
        match self {
            ModelType::Structure(name) | ModelType::Template(name) => Some(name),
            ModelType::Home => None,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::Structure(name) | ModelType::Template(name) => write!(f, "{}", name),
            ModelType::Home => write!(f, "Home"),
        }
    }
}

/// Externally visible state of a model.
///
/// Built once and handed to whichever constructor the registry selects, so retyping a model
/// moves this value instead of copying fields between two live models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelState {
    pub path: Path,
    pub parent_pointer: Option<ParentPointer>,
    pub not_found: bool,
    pub page_data: Option<Row>,
}

impl ModelState {
    /// Fresh state scoped to the given parent pointer
    pub fn scoped(pointer: ParentPointer) -> Self {
        Self {
            parent_pointer: Some(pointer),
            ..Self::default()
        }
    }
}

/// Element owning an embedded template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OwnerLink {
    pub structure_id: StructureId,
    pub element_id: ElementId,
}

/// Runtime unit bound to one structure descriptor
#[derive(Debug, Clone)]
pub struct ContentModel {
    descriptor: Arc<StructureDescriptor>,
    behavior: Arc<dyn StructureBehavior>,
    model_type: ModelType,
    context: Context,
    state: ModelState,
    owner: Option<OwnerLink>,
}

impl ContentModel {
    pub(crate) fn new(
        descriptor: Arc<StructureDescriptor>,
        behavior: Arc<dyn StructureBehavior>,
        model_type: ModelType,
        context: Context,
        state: ModelState,
    ) -> Self {
        Self {
            descriptor,
            behavior,
            model_type,
            context,
            state,
            owner: None,
        }
    }

    pub fn descriptor(&self) -> &Arc<StructureDescriptor> {
        &self.descriptor
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn is_home(&self) -> bool {
        self.model_type == ModelType::Home
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn path(&self) -> &Path {
        &self.state.path
    }

    pub fn parent_pointer(&self) -> Option<ParentPointer> {
        self.state.parent_pointer
    }

    pub fn set_parent_pointer(&mut self, pointer: Option<ParentPointer>) {
        self.state.parent_pointer = pointer;
    }

    pub fn is_not_found(&self) -> bool {
        self.state.not_found
    }

    pub fn mark_not_found(&mut self) {
        self.state.not_found = true;
    }

    pub fn owner(&self) -> Option<OwnerLink> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: OwnerLink) {
        self.owner = Some(owner);
    }

    /// Replace the path; with two or more nodes the parent pointer is re-scoped to the
    /// children of the leaf
    pub fn set_path(
        &mut self,
        path: Path,
        registry: &StructureRegistry,
    ) -> Result<(), ConfigurationError> {
        if let Some(pointer) = path.children_pointer(registry)? {
            self.state.parent_pointer = Some(pointer);
        }
        self.state.path = path;
        Ok(())
    }

    /// Loaded row, falling back to the leaf of the path
    pub fn page_data(&self) -> Option<&Row> {
        self.state
            .page_data
            .as_ref()
            .or_else(|| self.state.path.leaf().map(|node| &node.row))
    }

    /// Row explicitly loaded or assigned, without the path fallback
    pub fn loaded_page_data(&self) -> Option<&Row> {
        self.state.page_data.as_ref()
    }

    pub fn page_data_mut(&mut self) -> Option<&mut Row> {
        self.state.page_data.as_mut()
    }

    pub fn set_page_data(&mut self, row: Option<Row>) {
        self.state.page_data = row;
    }

    pub fn into_page_data(self) -> Option<Row> {
        self.state.page_data
    }

    pub fn into_state(self) -> ModelState {
        self.state
    }

    /// Load the row with the given id; returns whether it exists
    pub fn load_by_id(&mut self, storage: &dyn Storage, id: ElementId) -> Result<bool, StorageError> {
        let row = load_row(storage, &self.descriptor, id)?;
        let found = row.is_some();
        if found {
            self.state.page_data = row;
        }
        Ok(found)
    }

    /// Load the first row stored under this model's parent pointer
    pub fn load_by_parent(&mut self, storage: &dyn Storage) -> Result<bool, StorageError> {
        let Some(pointer) = self.state.parent_pointer else {
            return Ok(false);
        };
        let query = Query::new(Filter::parent(pointer))
            .order_by(self.descriptor.params.order_by())
            .limit(1);
        let row = storage
            .query_rows(&self.descriptor.table, &query)?
            .into_iter()
            .next();
        let found = row.is_some();
        if found {
            self.state.page_data = row;
        }
        Ok(found)
    }

    /// The loaded row as a path node of this structure
    pub fn element(&self) -> Result<Option<PathNode>, StorageError> {
        self.state
            .page_data
            .clone()
            .map(|row| PathNode::from_row(self.descriptor.id, &self.descriptor.table, row))
            .transpose()
    }

    /// Path of the loaded row inside this model's own structure
    pub fn local_path(
        &self,
        storage: &dyn Storage,
        max_depth: usize,
    ) -> Result<Vec<PathNode>, RouteError> {
        match self.element()? {
            Some(element) => {
                self.behavior
                    .local_path(&self.descriptor, element, storage, max_depth)
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Fetch one row of `descriptor`'s table by id
pub fn load_row(
    storage: &dyn Storage,
    descriptor: &StructureDescriptor,
    id: ElementId,
) -> Result<Option<Row>, StorageError> {
    let query = Query::new(Filter::eq(ID_FIELD, id)).limit(1);
    Ok(storage
        .query_rows(&descriptor.table, &query)?
        .into_iter()
        .next())
}
