//! Path nodes and root-first paths through the content tree

use crate::error::{ConfigurationError, StorageError};
use crate::store::{row_id, row_parent, Row, ID_FIELD, NAME_FIELD, STRUCTURE_FIELD, URL_FIELD};
use crate::structure::{StructureDescriptor, StructureRegistry};
use crate::types::{ElementId, ParentPointer, StructureId, ROOT_SENTINEL};
use serde::Serialize;
use serde_json::Value;

/// Url of the synthetic root node
pub const ROOT_URL: &str = "/";

/// One row on a path, annotated with the structure whose table produced it.
///
/// The root node is synthesized from the root structure descriptor: its `structure_id` is the
/// sentinel and its `id` is the root structure id, so that first-level elements (whose parent
/// pointer is `0-<root>`) satisfy the same adjacency rule as every other pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathNode {
    pub structure_id: StructureId,
    pub id: ElementId,
    pub url: String,
    pub declared_structure: Option<String>,
    pub parent: Option<ParentPointer>,
    pub row: Row,
}

impl PathNode {
    /// Annotate a stored row of `table`
    pub fn from_row(structure_id: StructureId, table: &str, row: Row) -> Result<Self, StorageError> {
        let id = row_id(&row).ok_or_else(|| StorageError::MalformedRow {
            table: table.to_string(),
            reason: format!("missing or non-numeric {} column", ID_FIELD),
        })?;
        let parent = row_parent(&row)?;
        let url = match row.get(URL_FIELD) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };
        let declared_structure = match row.get(STRUCTURE_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };
        Ok(Self {
            structure_id,
            id,
            url,
            declared_structure,
            parent,
            row,
        })
    }

    /// Synthetic root node for the tree rooted at `descriptor`
    pub fn root(descriptor: &StructureDescriptor) -> Self {
        let mut row = Row::new();
        row.insert(ID_FIELD.to_string(), Value::from(descriptor.id));
        row.insert(URL_FIELD.to_string(), Value::from(ROOT_URL));
        row.insert(STRUCTURE_FIELD.to_string(), Value::from(descriptor.name.clone()));
        row.insert(NAME_FIELD.to_string(), Value::from(descriptor.title.clone()));
        Self {
            structure_id: ROOT_SENTINEL,
            id: ElementId::from(descriptor.id),
            url: ROOT_URL.to_string(),
            declared_structure: Some(descriptor.name.clone()),
            parent: None,
            row,
        }
    }

    pub fn is_root(&self) -> bool {
        self.structure_id == ROOT_SENTINEL
    }

    /// Display name, falling back to the slug
    pub fn name(&self) -> &str {
        match self.row.get(NAME_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => &self.url,
        }
    }

    /// Pointer carried by rows stored under this node in its own structure
    pub fn child_pointer(&self) -> ParentPointer {
        ParentPointer::new(self.structure_id, self.id)
    }
}

/// Breadcrumb entry for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
}

/// Root-first ordered sequence of path nodes; the last node is the leaf being served
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Path {
    nodes: Vec<PathNode>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<PathNode>) -> Self {
        Self { nodes }
    }

    pub fn push(&mut self, node: PathNode) {
        self.nodes.push(node);
    }

    pub fn extend<I: IntoIterator<Item = PathNode>>(&mut self, nodes: I) {
        self.nodes.extend(nodes);
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<PathNode> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaf(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    pub fn second_to_last(&self) -> Option<&PathNode> {
        self.nodes.len().checked_sub(2).map(|i| &self.nodes[i])
    }

    /// `(structure id, element id)` pairs, root first
    pub fn keys(&self) -> Vec<(StructureId, ElementId)> {
        self.nodes.iter().map(|n| (n.structure_id, n.id)).collect()
    }

    /// Index of the first node whose parent pointer does not name its predecessor
    pub fn adjacency_violation(&self) -> Option<usize> {
        self.nodes
            .windows(2)
            .position(|pair| pair[1].parent != Some(pair[0].child_pointer()))
            .map(|i| i + 1)
    }

    /// Pointer under which the children of the leaf are stored.
    ///
    /// The structure half is the one declared by the second-to-last node (the structure the
    /// leaf lives in); when that node declares nothing, the leaf's own table is used.
    /// `None` for paths shorter than two nodes.
    pub fn children_pointer(
        &self,
        registry: &StructureRegistry,
    ) -> Result<Option<ParentPointer>, ConfigurationError> {
        let (Some(prev), Some(leaf)) = (self.second_to_last(), self.leaf()) else {
            return Ok(None);
        };
        let structure_id = match &prev.declared_structure {
            Some(name) => registry.by_name(name)?.id,
            None => leaf.structure_id,
        };
        Ok(Some(ParentPointer::new(structure_id, leaf.id)))
    }

    /// Public url of the leaf
    pub fn url(&self, start_url: &str, suffix: &str) -> String {
        self.url_of(self.nodes.len(), start_url, suffix)
    }

    /// Url of a direct child of the leaf with the given slug
    pub fn link_to(&self, child_url: &str, start_url: &str, suffix: &str) -> String {
        let mut segments = self.segments(self.nodes.len());
        segments.push(child_url);
        join_url(start_url, &segments, suffix)
    }

    /// Name and url of every node, root first
    pub fn breadcrumbs(&self, start_url: &str, suffix: &str) -> Vec<Breadcrumb> {
        (1..=self.nodes.len())
            .map(|end| Breadcrumb {
                name: self.nodes[end - 1].name().to_string(),
                url: self.url_of(end, start_url, suffix),
            })
            .collect()
    }

    fn segments(&self, end: usize) -> Vec<&str> {
        self.nodes[..end]
            .iter()
            .filter(|n| !n.is_root())
            .map(|n| n.url.as_str())
            .collect()
    }

    fn url_of(&self, end: usize, start_url: &str, suffix: &str) -> String {
        join_url(start_url, &self.segments(end), suffix)
    }
}

fn join_url(start_url: &str, segments: &[&str], suffix: &str) -> String {
    let mut url = String::from("/");
    let prefix = start_url.trim_matches('/');
    if !prefix.is_empty() {
        url.push_str(prefix);
        url.push('/');
    }
    if segments.is_empty() {
        return url;
    }
    url.push_str(&segments.join("/"));
    url.push_str(suffix);
    url
}
