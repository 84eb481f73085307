//! Row Store
//!
//! The narrow storage interface the routing core consumes: filtered and ordered row
//! queries, counting, deletion and simple mutations over named tables. Two backends are
//! provided, an in-process [`MemoryStorage`] and the sled-backed [`SledStorage`].

pub mod memory;
pub mod persistence;

pub use memory::MemoryStorage;
pub use persistence::SledStorage;

use crate::error::StorageError;
use crate::types::{ElementId, ParentPointer};
use serde_json::Value;
use std::cmp::Ordering;

/// Primary key column
pub const ID_FIELD: &str = "ID";
/// Slug column matched against URL segments
pub const URL_FIELD: &str = "url";
/// Declared structure of an element (the structure its children live in)
pub const STRUCTURE_FIELD: &str = "structure";
/// Serialized parent pointer column
pub const PARENT_FIELD: &str = "prev_structure";
/// Manual ordering column of roster-like listings
pub const POSITION_FIELD: &str = "pos";
/// Display name column
pub const NAME_FIELD: &str = "name";

/// One stored row: column name to value
pub type Row = serde_json::Map<String, Value>;

/// Row predicate evaluated by the storage backends
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    Gt(String, Value),
    Lt(String, Value),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Gt(field.to_string(), value.into())
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Filter::Lt(field.to_string(), value.into())
    }

    /// Rows whose parent pointer equals `pointer`
    pub fn parent(pointer: ParentPointer) -> Self {
        Filter::Eq(PARENT_FIELD.to_string(), Value::String(pointer.to_string()))
    }

    /// Conjunction; `All` is the identity and nested conjunctions are flattened
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, expected) => row
                .get(field)
                .map(|v| compare_values(v, expected) == Some(Ordering::Equal))
                .unwrap_or(false),
            Filter::Gt(field, bound) => row
                .get(field)
                .map(|v| compare_values(v, bound) == Some(Ordering::Greater))
                .unwrap_or(false),
            Filter::Lt(field, bound) => row
                .get(field)
                .map(|v| compare_values(v, bound) == Some(Ordering::Less))
                .unwrap_or(false),
            Filter::And(filters) => filters.iter().all(|f| f.matches(row)),
        }
    }
}

/// Sort specification, parsed from a structure's `field_sort` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            descending: false,
        }
    }

    /// Parse `"field"`, `"field ASC"` or `"field DESC"` (case-insensitive direction)
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let field = parts.next()?;
        let descending = match parts.next() {
            None => false,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }

    /// Compare two rows; rows that tie fall back to ascending `ID` so output is stable
    pub fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let left = a.get(&self.field).unwrap_or(&Value::Null);
        let right = b.get(&self.field).unwrap_or(&Value::Null);
        let ordering = match (left, right) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            _ => compare_values(left, right).unwrap_or(Ordering::Equal),
        };
        let ordering = if self.descending {
            ordering.reverse()
        } else {
            ordering
        };
        ordering.then_with(|| row_id(a).cmp(&row_id(b)))
    }
}

/// A row query: predicate, ordering and an optional window
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            order_by: None,
            limit: None,
            offset: 0,
        }
    }

    pub fn order_by(mut self, order: Option<OrderBy>) -> Self {
        self.order_by = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Apply this query to a full table scan
    pub fn evaluate<I>(&self, rows: I) -> Vec<Row>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut matched: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.filter.matches(row))
            .collect();
        if let Some(order) = &self.order_by {
            matched.sort_by(|a, b| order.compare(a, b));
        }
        let window = matched.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        }
    }
}

/// Column update applied by [`Mutation::Update`]
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Set(Value),
    /// Add to an integer column (missing or non-integer values count as 0)
    Add(i64),
}

impl Change {
    pub fn apply(&self, current: Option<&Value>) -> Value {
        match self {
            Change::Set(value) => value.clone(),
            Change::Add(delta) => {
                let base = current.and_then(Value::as_i64).unwrap_or(0);
                Value::from(base.saturating_add(*delta))
            }
        }
    }
}

/// Mutating statement accepted by [`Storage::execute`]
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert or replace a row; a missing `ID` is assigned by the backend
    Insert { table: String, row: Row },
    Update {
        table: String,
        filter: Filter,
        changes: Vec<(String, Change)>,
    },
}

/// Storage collaborator interface
pub trait Storage: Send + Sync {
    /// Rows of `table` matching the query, in query order
    fn query_rows(&self, table: &str, query: &Query) -> Result<Vec<Row>, StorageError>;

    /// Number of rows matching `filter`, ignoring any window
    fn count(&self, table: &str, filter: &Filter) -> Result<u64, StorageError>;

    /// Delete one row by id; `false` when no such row existed
    fn delete(&self, table: &str, id: ElementId) -> Result<bool, StorageError>;

    /// Apply a mutation; `false` when it touched nothing
    fn execute(&self, mutation: &Mutation) -> Result<bool, StorageError>;
}

/// Numeric id of a row, accepting numbers and numeric strings
pub fn row_id(row: &Row) -> Option<ElementId> {
    match row.get(ID_FIELD)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decoded parent pointer of a row, `None` when the column is absent or empty
pub fn row_parent(row: &Row) -> Result<Option<ParentPointer>, StorageError> {
    match row.get(PARENT_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(other) => Err(StorageError::InvalidParentPointer(other.to_string())),
    }
}

/// Value ordering used by filters and sorting; `None` for incomparable types
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
