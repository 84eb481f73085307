//! Embedded template materialization
//!
//! Fields whose type marks them as template references hold the name of a template
//! structure. The referenced template row is stored under the owning element's pointer;
//! materialization loads it, expands its own template fields, and replaces the field's
//! raw value with the resulting document.

use crate::error::{ConfigurationError, RouteError, StorageError};
use crate::model::{ContentModel, ModelState, OwnerLink};
use crate::store::{row_id, Storage, ID_FIELD};
use crate::structure::{FieldDef, StructureDescriptor, StructureRegistry};
use crate::types::ParentPointer;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Default bound on template nesting
pub const DEFAULT_MAX_TEMPLATE_DEPTH: usize = 8;

pub struct TemplateMaterializer<'a> {
    registry: &'a StructureRegistry,
    storage: &'a dyn Storage,
    max_depth: usize,
}

impl<'a> TemplateMaterializer<'a> {
    pub fn new(registry: &'a StructureRegistry, storage: &'a dyn Storage) -> Self {
        Self {
            registry,
            storage,
            max_depth: DEFAULT_MAX_TEMPLATE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Populate the model's row from its path leaf when nothing was loaded yet, then
    /// materialize its template fields
    pub fn init_page_data(&self, model: &mut ContentModel) -> Result<(), RouteError> {
        if model.loaded_page_data().is_none() {
            let leaf = model.path().leaf().map(|node| node.row.clone());
            model.set_page_data(leaf);
        }
        self.materialize(model, 0)
    }

    fn materialize(&self, model: &mut ContentModel, depth: usize) -> Result<(), RouteError> {
        let fields: Vec<FieldDef> = model.descriptor().template_fields().cloned().collect();
        for field in fields {
            let template_name = match model.loaded_page_data().and_then(|d| d.get(&field.name)) {
                Some(Value::String(name)) if !name.is_empty() => name.clone(),
                _ => continue,
            };

            let owner = self.owner_structure(model, &field)?;
            let owner_element = model
                .loaded_page_data()
                .and_then(row_id)
                .ok_or_else(|| StorageError::MalformedRow {
                    table: model.descriptor().table.clone(),
                    reason: format!("template owner row has no {} column", ID_FIELD),
                })?;
            if depth >= self.max_depth {
                return Err(ConfigurationError::TemplateDepthExceeded {
                    template: template_name,
                    limit: self.max_depth,
                }
                .into());
            }

            let pointer = ParentPointer::new(owner.id, owner_element);
            let mut template = self.registry.instantiate(
                &template_name,
                model.context(),
                ModelState::scoped(pointer),
            )?;
            template.set_owner(OwnerLink {
                structure_id: owner.id,
                element_id: owner_element,
            });
            let found = template.load_by_parent(self.storage)?;
            debug!(
                field = %field.name,
                template = %template_name,
                owner = %pointer,
                found,
                depth,
                "Materializing embedded template"
            );
            self.materialize(&mut template, depth + 1)?;

            let value = template
                .into_page_data()
                .map(Value::Object)
                .unwrap_or(Value::Null);
            if let Some(data) = model.page_data_mut() {
                data.insert(field.name.clone(), value);
            }
        }
        Ok(())
    }

    /// Structure owning the model's row: the model's own structure, or for the home model
    /// the structure declared by the second-to-last path node
    fn owner_structure(
        &self,
        model: &ContentModel,
        field: &FieldDef,
    ) -> Result<Arc<StructureDescriptor>, ConfigurationError> {
        if let Some(descriptor) = self.registry.find_by_owning_class(model.model_type()) {
            return Ok(Arc::clone(descriptor));
        }
        let unknown = || ConfigurationError::TemplateOwnerUnknown {
            model: model.model_type().to_string(),
            field: field.name.clone(),
        };
        let declared = model
            .path()
            .second_to_last()
            .and_then(|prev| prev.declared_structure.as_deref())
            .ok_or_else(unknown)?;
        Ok(Arc::clone(self.registry.by_name(declared)?))
    }
}
