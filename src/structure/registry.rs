//! Structure registry: process-wide, read-only catalog of structure descriptors.
//!
//! Built once at startup and shared immutably between requests. Every lookup failure is a
//! [`ConfigurationError`]: a name or id that the registry does not know means the stored
//! tree and the configuration disagree.

use crate::config::RouterConfig;
use crate::error::ConfigurationError;
use crate::model::{ContentModel, ModelState, ModelType};
use crate::structure::behavior::{BehaviorFactory, BehaviorRegistry, StructureBehavior};
use crate::structure::{split_qualified_name, StructureClass, StructureDescriptor};
use crate::tree::PathNode;
use crate::types::{Context, ParentPointer, StructureId, ROOT_SENTINEL};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Default name of the structure whose controller serves the root url
pub const DEFAULT_HOME_STRUCTURE: &str = "Ideal_Home";

struct Entry {
    descriptor: Arc<StructureDescriptor>,
    behavior: Arc<dyn StructureBehavior>,
}

/// Catalog of structures keyed by id and by qualified name
pub struct StructureRegistry {
    entries: BTreeMap<StructureId, Entry>,
    ids_by_name: HashMap<String, StructureId>,
    root: StructureId,
    home: String,
}

impl StructureRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build the registry from loaded configuration with the built-in behaviours
    pub fn from_config(config: &RouterConfig) -> Result<Self, ConfigurationError> {
        Self::from_config_with(config, BehaviorRegistry::with_builtins())
    }

    /// Build the registry from loaded configuration with host-supplied behaviours
    pub fn from_config_with(
        config: &RouterConfig,
        behaviors: BehaviorRegistry,
    ) -> Result<Self, ConfigurationError> {
        let prefix = config.site.db_prefix.as_str();
        let mut builder = Self::builder()
            .behaviors(behaviors)
            .home(&config.site.home_structure);
        if let Some(root) = config.site.root_structure {
            builder = builder.root(root);
        }
        for structure in &config.structures {
            builder = builder.structure(StructureDescriptor::from_config(
                structure,
                StructureClass::Structure,
                prefix,
            )?);
        }
        for template in &config.templates {
            builder = builder.structure(StructureDescriptor::from_config(
                template,
                StructureClass::Template,
                prefix,
            )?);
        }
        builder.build()
    }

    pub fn by_id(&self, id: StructureId) -> Result<&Arc<StructureDescriptor>, ConfigurationError> {
        self.entries
            .get(&id)
            .map(|e| &e.descriptor)
            .ok_or(ConfigurationError::UnknownStructureId(id))
    }

    pub fn by_name(&self, name: &str) -> Result<&Arc<StructureDescriptor>, ConfigurationError> {
        self.ids_by_name
            .get(name)
            .and_then(|id| self.entries.get(id))
            .map(|e| &e.descriptor)
            .ok_or_else(|| ConfigurationError::UnknownStructureName(name.to_string()))
    }

    /// Descriptor configured for a model type; the home model has none
    pub fn find_by_owning_class(&self, model_type: &ModelType) -> Option<&Arc<StructureDescriptor>> {
        match model_type {
            ModelType::Structure(name) | ModelType::Template(name) => self.by_name(name).ok(),
            ModelType::Home => None,
        }
    }

    pub fn by_owning_class(
        &self,
        model_type: &ModelType,
    ) -> Result<&Arc<StructureDescriptor>, ConfigurationError> {
        self.find_by_owning_class(model_type)
            .ok_or_else(|| ConfigurationError::UnknownStructureClass(model_type.to_string()))
    }

    /// Descriptor of the structure a parent pointer points into
    pub fn by_parent_pointer(
        &self,
        pointer: ParentPointer,
    ) -> Result<&Arc<StructureDescriptor>, ConfigurationError> {
        self.by_id(pointer.structure_id)
    }

    /// Descriptor named by the element half of a root sentinel pointer
    pub fn by_root_pointer(
        &self,
        pointer: ParentPointer,
    ) -> Result<&Arc<StructureDescriptor>, ConfigurationError> {
        let id = StructureId::try_from(pointer.element_id).map_err(|_| {
            ConfigurationError::Invalid(format!("root pointer {} names no structure", pointer))
        })?;
        self.by_id(id)
    }

    pub fn behavior(&self, id: StructureId) -> Result<Arc<dyn StructureBehavior>, ConfigurationError> {
        self.entries
            .get(&id)
            .map(|e| Arc::clone(&e.behavior))
            .ok_or(ConfigurationError::UnknownStructureId(id))
    }

    pub fn root_id(&self) -> StructureId {
        self.root
    }

    /// Root structure descriptor (guaranteed present by the builder)
    pub fn root(&self) -> &Arc<StructureDescriptor> {
        &self.entries[&self.root].descriptor
    }

    /// Synthetic root node of the tree
    pub fn root_node(&self) -> PathNode {
        PathNode::root(self.root())
    }

    /// Structure whose controller serves the root url
    pub fn home_name(&self) -> &str {
        &self.home
    }

    /// All descriptors in id order
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<StructureDescriptor>> {
        self.entries.values().map(|e| &e.descriptor)
    }

    /// Construct a model of the named structure carrying `state`
    pub fn instantiate(
        &self,
        name: &str,
        context: Context,
        state: ModelState,
    ) -> Result<ContentModel, ConfigurationError> {
        let id = *self
            .ids_by_name
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownStructureName(name.to_string()))?;
        let entry = &self.entries[&id];
        let model_type = match entry.descriptor.class {
            StructureClass::Structure => ModelType::Structure(name.to_string()),
            StructureClass::Template => ModelType::Template(name.to_string()),
        };
        Ok(ContentModel::new(
            Arc::clone(&entry.descriptor),
            Arc::clone(&entry.behavior),
            model_type,
            context,
            state,
        ))
    }

    /// Construct the home model, bound to the root structure's descriptor
    pub fn home_model(&self, context: Context, state: ModelState) -> ContentModel {
        let entry = &self.entries[&self.root];
        ContentModel::new(
            Arc::clone(&entry.descriptor),
            Arc::clone(&entry.behavior),
            ModelType::Home,
            context,
            state,
        )
    }
}

impl std::fmt::Debug for StructureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureRegistry")
            .field("structures", &self.ids_by_name)
            .field("root", &self.root)
            .field("home", &self.home)
            .finish()
    }
}

/// Incremental construction and validation of a [`StructureRegistry`]
pub struct RegistryBuilder {
    descriptors: Vec<StructureDescriptor>,
    root: Option<StructureId>,
    home: String,
    behaviors: BehaviorRegistry,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            descriptors: Vec::new(),
            root: None,
            home: DEFAULT_HOME_STRUCTURE.to_string(),
            behaviors: BehaviorRegistry::with_builtins(),
        }
    }
}

impl RegistryBuilder {
    pub fn structure(mut self, descriptor: StructureDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Root structure; defaults to the first routable structure added
    pub fn root(mut self, id: StructureId) -> Self {
        self.root = Some(id);
        self
    }

    pub fn home(mut self, name: &str) -> Self {
        self.home = name.to_string();
        self
    }

    pub fn behaviors(mut self, behaviors: BehaviorRegistry) -> Self {
        self.behaviors = behaviors;
        self
    }

    pub fn register_behavior(mut self, kind: &str, factory: BehaviorFactory) -> Self {
        self.behaviors.register(kind, factory);
        self
    }

    pub fn build(self) -> Result<StructureRegistry, ConfigurationError> {
        let mut entries = BTreeMap::new();
        let mut ids_by_name = HashMap::new();
        let mut tables = HashSet::new();

        for descriptor in &self.descriptors {
            if descriptor.id == ROOT_SENTINEL {
                return Err(ConfigurationError::Invalid(format!(
                    "structure '{}' uses reserved id {}",
                    descriptor.name, ROOT_SENTINEL
                )));
            }
            if split_qualified_name(&descriptor.name).is_none() {
                return Err(ConfigurationError::Invalid(format!(
                    "structure name '{}' is not of the form Module_Name",
                    descriptor.name
                )));
            }
            if let Err(e) = descriptor.params.validate() {
                return Err(ConfigurationError::Invalid(format!(
                    "structure '{}': {}",
                    descriptor.name, e
                )));
            }
        }

        let root = match self.root {
            Some(root) => root,
            None => self
                .descriptors
                .iter()
                .find(|d| d.class == StructureClass::Structure)
                .map(|d| d.id)
                .ok_or(ConfigurationError::MissingRootStructure(ROOT_SENTINEL))?,
        };

        for descriptor in self.descriptors {
            if entries.contains_key(&descriptor.id) {
                return Err(ConfigurationError::DuplicateStructure {
                    field: "id",
                    value: descriptor.id.to_string(),
                });
            }
            if ids_by_name.contains_key(&descriptor.name) {
                return Err(ConfigurationError::DuplicateStructure {
                    field: "name",
                    value: descriptor.name,
                });
            }
            if !tables.insert(descriptor.table.clone()) {
                return Err(ConfigurationError::DuplicateStructure {
                    field: "table",
                    value: descriptor.table,
                });
            }
            let behavior = self.behaviors.create(&descriptor.kind).ok_or_else(|| {
                ConfigurationError::UnknownBehavior {
                    structure: descriptor.name.clone(),
                    kind: descriptor.kind.clone(),
                }
            })?;
            debug!(
                structure = %descriptor.name,
                id = descriptor.id,
                table = %descriptor.table,
                kind = behavior.kind(),
                "Registered structure"
            );
            ids_by_name.insert(descriptor.name.clone(), descriptor.id);
            entries.insert(
                descriptor.id,
                Entry {
                    descriptor: Arc::new(descriptor),
                    behavior,
                },
            );
        }

        match entries.get(&root) {
            Some(entry) if entry.descriptor.class == StructureClass::Structure => {}
            _ => return Err(ConfigurationError::MissingRootStructure(root)),
        }

        Ok(StructureRegistry {
            entries,
            ids_by_name,
            root,
            home: self.home,
        })
    }
}
