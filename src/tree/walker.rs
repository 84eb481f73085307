//! Forward resolution: URL segments down to a content node

use crate::error::RouteError;
use crate::model::{ContentModel, ModelState};
use crate::store::{Filter, Query, Row, Storage, ID_FIELD, URL_FIELD};
use crate::structure::{StructureDescriptor, StructureRegistry};
use crate::tree::slug::normalize_segment;
use crate::tree::{Path, PathNode};
use crate::types::{Context, ElementId, ParentPointer};
use std::sync::Arc;
use tracing::{debug, warn};

/// Walks URL segments from the root structure down through nested structures
pub struct PathResolver<'a> {
    registry: &'a StructureRegistry,
    storage: &'a dyn Storage,
}

impl<'a> PathResolver<'a> {
    pub fn new(registry: &'a StructureRegistry, storage: &'a dyn Storage) -> Self {
        Self { registry, storage }
    }

    /// Resolve `segments` to a model whose path holds every matched node, root first.
    ///
    /// An empty segment list yields the home model without touching storage. The walk stops
    /// at the first segment with no matching row and flags the model as not found; the nodes
    /// matched up to that point stay on the path. On the site segments match slugs, in the
    /// admin area they match numeric ids.
    pub fn resolve<S: AsRef<str>>(
        &self,
        context: Context,
        segments: &[S],
    ) -> Result<ContentModel, RouteError> {
        let root = Arc::clone(self.registry.root());
        let mut pointer = ParentPointer::root(root.id);
        let mut path = Path::from_nodes(vec![self.registry.root_node()]);

        if segments.is_empty() {
            debug!(structure = %root.name, "Root url resolved to home");
            let state = ModelState {
                path,
                parent_pointer: Some(pointer),
                ..ModelState::default()
            };
            return Ok(self.registry.home_model(context, state));
        }

        let mut descriptor = root;
        let mut not_found = false;
        for (depth, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            let Some(row) = self.find_child(&descriptor, pointer, segment, context)? else {
                warn!(
                    segment,
                    depth,
                    structure = %descriptor.name,
                    parent = %pointer,
                    "No element matches url segment"
                );
                not_found = true;
                break;
            };

            let node = PathNode::from_row(descriptor.id, &descriptor.table, row)?;
            debug!(
                segment,
                depth,
                structure = %descriptor.name,
                element = node.id,
                "Matched url segment"
            );
            pointer = ParentPointer::new(descriptor.id, node.id);

            let has_more = depth + 1 < segments.len();
            if has_more {
                if let Some(declared) = &node.declared_structure {
                    if declared != &descriptor.name {
                        descriptor = Arc::clone(self.registry.by_name(declared)?);
                        debug!(structure = %descriptor.name, "Descending into nested structure");
                    }
                }
            }
            path.push(node);
        }

        let state = ModelState {
            parent_pointer: Some(pointer),
            not_found,
            ..ModelState::default()
        };
        let mut model = self.registry.instantiate(&descriptor.name, context, state)?;
        model.set_path(path, self.registry)?;
        Ok(model)
    }

    fn find_child(
        &self,
        descriptor: &StructureDescriptor,
        pointer: ParentPointer,
        segment: &str,
        context: Context,
    ) -> Result<Option<Row>, RouteError> {
        let key = match context {
            Context::Site => Filter::eq(URL_FIELD, normalize_segment(segment)),
            Context::Admin => match segment.trim().parse::<ElementId>() {
                Ok(id) => Filter::eq(ID_FIELD, id),
                Err(_) => return Ok(None),
            },
        };
        let query = Query::new(key.and(Filter::parent(pointer))).limit(1);
        Ok(self
            .storage
            .query_rows(&descriptor.table, &query)?
            .into_iter()
            .next())
    }
}
