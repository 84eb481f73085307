//! Structure descriptors
//!
//! A structure is a configured content type with its own storage table, ordered field
//! schema and listing parameters. Templates are structures embedded inside another
//! structure's fields.

pub mod behavior;
pub mod registry;

pub use behavior::{BehaviorFactory, BehaviorRegistry, StructureBehavior};
pub use registry::{RegistryBuilder, StructureRegistry};

use crate::error::ConfigurationError;
use crate::store::OrderBy;
use crate::types::{Context, StructureId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker contained in the type of fields that embed a template
pub const TEMPLATE_FIELD_MARKER: &str = "_Template";

/// Whether a descriptor is a routable structure or an embeddable template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureClass {
    Structure,
    Template,
}

impl StructureClass {
    fn table_segment(self) -> &'static str {
        match self {
            StructureClass::Structure => "structure",
            StructureClass::Template => "template",
        }
    }
}

/// Field definition of a structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: String,
}

impl FieldDef {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            label: String::new(),
            field_type: field_type.to_string(),
        }
    }

    /// Whether the field holds the name of an embedded template
    pub fn is_template(&self) -> bool {
        self.field_type.contains(TEMPLATE_FIELD_MARKER)
    }
}

/// Listing parameters of a structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureParams {
    /// Sort specification, e.g. `pos` or `date DESC`
    #[serde(default = "default_field_sort")]
    pub field_sort: String,

    /// Page size on the public site
    #[serde(default = "default_elements_site")]
    pub elements_site: u32,

    /// Page size in the admin area
    #[serde(default = "default_elements_admin")]
    pub elements_admin: u32,

    /// Free-form parameters consumed by controllers
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

fn default_field_sort() -> String {
    "pos".to_string()
}

fn default_elements_site() -> u32 {
    15
}

fn default_elements_admin() -> u32 {
    20
}

impl Default for StructureParams {
    fn default() -> Self {
        Self {
            field_sort: default_field_sort(),
            elements_site: default_elements_site(),
            elements_admin: default_elements_admin(),
            extra: BTreeMap::new(),
        }
    }
}

impl StructureParams {
    /// Page sizes must be at least 1 in both contexts
    pub fn validate(&self) -> Result<(), String> {
        if self.elements_site == 0 {
            return Err("elements_site must be at least 1".to_string());
        }
        if self.elements_admin == 0 {
            return Err("elements_admin must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn page_size(&self, context: Context) -> u32 {
        match context {
            Context::Site => self.elements_site,
            Context::Admin => self.elements_admin,
        }
    }

    pub fn order_by(&self) -> Option<OrderBy> {
        OrderBy::parse(&self.field_sort)
    }
}

/// Structure as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureConfig {
    pub id: StructureId,

    /// Qualified name `Module_Name`
    pub name: String,

    /// Behaviour tag (`tree`, `list`, `template`, or a host-registered tag)
    pub kind: String,

    #[serde(default)]
    pub title: String,

    /// Explicit storage table; derived from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDef>,

    #[serde(default)]
    pub params: StructureParams,
}

/// Immutable descriptor of one structure or template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureDescriptor {
    pub id: StructureId,
    pub name: String,
    pub class: StructureClass,
    pub kind: String,
    pub title: String,
    pub table: String,
    pub fields: Vec<FieldDef>,
    pub params: StructureParams,
}

impl StructureDescriptor {
    pub fn from_config(
        config: &StructureConfig,
        class: StructureClass,
        db_prefix: &str,
    ) -> Result<Self, ConfigurationError> {
        let table = match &config.table {
            Some(table) if !table.is_empty() => table.clone(),
            _ => derive_table_name(db_prefix, &config.name, class)?,
        };
        Ok(Self {
            id: config.id,
            name: config.name.clone(),
            class,
            kind: config.kind.clone(),
            title: config.title.clone(),
            table,
            fields: config.fields.clone(),
            params: config.params.clone(),
        })
    }

    /// Module half of the qualified name
    pub fn module(&self) -> &str {
        self.name.split_once('_').map(|(m, _)| m).unwrap_or(&self.name)
    }

    pub fn is_template(&self) -> bool {
        self.class == StructureClass::Template
    }

    pub fn template_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_template())
    }
}

/// Split a qualified `Module_Name` into its two halves
pub fn split_qualified_name(name: &str) -> Option<(&str, &str)> {
    let (module, short) = name.split_once('_')?;
    if module.is_empty() || short.is_empty() {
        return None;
    }
    Some((module, short))
}

/// Storage table of a structure: `<prefix><module>_<structure|template>_<name>`, lowercased
pub fn derive_table_name(
    db_prefix: &str,
    name: &str,
    class: StructureClass,
) -> Result<String, ConfigurationError> {
    let (module, short) = split_qualified_name(name).ok_or_else(|| {
        ConfigurationError::Invalid(format!(
            "structure name '{}' is not of the form Module_Name",
            name
        ))
    })?;
    Ok(format!("{}{}_{}_{}", db_prefix, module, class.table_segment(), short).to_lowercase())
}
