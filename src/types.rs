//! Core identifier types shared across the routing core.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric id of a configured structure or template
pub type StructureId = u32;

/// Numeric id of a row inside a structure's storage table
pub type ElementId = u64;

/// Structure id reserved for the "no parent" sentinel
pub const ROOT_SENTINEL: StructureId = 0;

/// Composite link from a row to its logical parent.
///
/// Stored as `"<structure_id>-<element_id>"` in the `prev_structure` column. A pointer whose
/// `structure_id` is [`ROOT_SENTINEL`] marks a first-level element; its `element_id` then holds
/// the id of the root structure itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParentPointer {
    pub structure_id: StructureId,
    pub element_id: ElementId,
}

impl ParentPointer {
    pub fn new(structure_id: StructureId, element_id: ElementId) -> Self {
        Self {
            structure_id,
            element_id,
        }
    }

    /// Pointer carried by first-level elements of the tree rooted at `root_structure`
    pub fn root(root_structure: StructureId) -> Self {
        Self::new(ROOT_SENTINEL, ElementId::from(root_structure))
    }

    pub fn is_root(&self) -> bool {
        self.structure_id == ROOT_SENTINEL
    }
}

impl fmt::Display for ParentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.structure_id, self.element_id)
    }
}

impl FromStr for ParentPointer {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (structure, element) = s
            .split_once('-')
            .ok_or_else(|| StorageError::InvalidParentPointer(s.to_string()))?;
        let structure_id = structure
            .trim()
            .parse::<StructureId>()
            .map_err(|_| StorageError::InvalidParentPointer(s.to_string()))?;
        let element_id = element
            .trim()
            .parse::<ElementId>()
            .map_err(|_| StorageError::InvalidParentPointer(s.to_string()))?;
        Ok(Self::new(structure_id, element_id))
    }
}

/// Calling context of a request.
///
/// Selects the page-size parameter of a structure and how URL segments are matched
/// against rows (slug on the site, numeric id in the admin area).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    #[default]
    Site,
    Admin,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Site => write!(f, "site"),
            Context::Admin => write!(f, "admin"),
        }
    }
}
