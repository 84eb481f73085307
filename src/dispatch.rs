//! Model dispatch: retyping the resolved leaf to its declared structure

use crate::error::ConfigurationError;
use crate::model::ContentModel;
use crate::structure::StructureRegistry;
use tracing::info;

/// Replaces a generically loaded model with a model of the structure its leaf declares.
///
/// A listing element (say a page of the site tree) may declare that it is a news section;
/// the walker reaches it through the page structure, but it has to be served, listed and
/// paginated as news. Applying the dispatcher to an already dispatched model is a no-op.
pub struct ModelDispatcher<'a> {
    registry: &'a StructureRegistry,
}

impl<'a> ModelDispatcher<'a> {
    pub fn new(registry: &'a StructureRegistry) -> Self {
        Self { registry }
    }

    pub fn dispatch(&self, model: ContentModel) -> Result<ContentModel, ConfigurationError> {
        if model.is_home() || model.path().len() < 2 {
            return Ok(model);
        }
        let Some(declared) = model
            .path()
            .leaf()
            .and_then(|leaf| leaf.declared_structure.clone())
        else {
            return Ok(model);
        };
        if model.model_type().structure_name() == Some(declared.as_str()) {
            return Ok(model);
        }

        let pointer = model.path().children_pointer(self.registry)?;
        let from = model.model_type().to_string();
        let context = model.context();
        let mut state = model.into_state();
        state.parent_pointer = pointer;

        let retyped = self.registry.instantiate(&declared, context, state)?;
        info!(
            from = %from,
            to = %declared,
            parent = ?retyped.parent_pointer(),
            "Retyped leaf model to declared structure"
        );
        Ok(retyped)
    }
}
