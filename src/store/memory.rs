//! In-process row store
//!
//! Tables live in ordered maps behind a `parking_lot::RwLock`. Used for fixtures, tests and
//! embedding hosts that keep their content in memory.

use crate::error::StorageError;
use crate::store::{row_id, Filter, Mutation, Query, Row, Storage, ID_FIELD};
use crate::types::ElementId;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type Table = BTreeMap<ElementId, Row>;

/// Memory-backed implementation of [`Storage`]
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<BTreeMap<String, Table>>,
    reads: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a row, assigning the next free `ID` when absent
    pub fn insert(&self, table: &str, row: Row) -> Result<ElementId, StorageError> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        insert_into(table, rows, row)
    }

    /// Number of read calls (`query_rows` and `count`) served so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn table_len(&self, table: &str) -> usize {
        self.tables.read().get(table).map(|t| t.len()).unwrap_or(0)
    }

    pub fn get(&self, table: &str, id: ElementId) -> Option<Row> {
        self.tables.read().get(table)?.get(&id).cloned()
    }
}

fn insert_into(table: &str, rows: &mut Table, mut row: Row) -> Result<ElementId, StorageError> {
    let id = match row.get(ID_FIELD) {
        None | Some(Value::Null) => {
            let next = rows.keys().next_back().map(|id| id + 1).unwrap_or(1);
            row.insert(ID_FIELD.to_string(), Value::from(next));
            next
        }
        Some(_) => row_id(&row).ok_or_else(|| StorageError::MalformedRow {
            table: table.to_string(),
            reason: format!("non-numeric {} column", ID_FIELD),
        })?,
    };
    rows.insert(id, row);
    Ok(id)
}

impl Storage for MemoryStorage {
    fn query_rows(&self, table: &str, query: &Query) -> Result<Vec<Row>, StorageError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .map(|t| t.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.evaluate(rows))
    }

    fn count(&self, table: &str, filter: &Filter) -> Result<u64, StorageError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let tables = self.tables.read();
        let count = tables
            .get(table)
            .map(|t| t.values().filter(|row| filter.matches(row)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    fn delete(&self, table: &str, id: ElementId) -> Result<bool, StorageError> {
        let mut tables = self.tables.write();
        Ok(tables
            .get_mut(table)
            .map(|t| t.remove(&id).is_some())
            .unwrap_or(false))
    }

    fn execute(&self, mutation: &Mutation) -> Result<bool, StorageError> {
        let mut tables = self.tables.write();
        match mutation {
            Mutation::Insert { table, row } => {
                let rows = tables.entry(table.clone()).or_default();
                insert_into(table, rows, row.clone())?;
                Ok(true)
            }
            Mutation::Update {
                table,
                filter,
                changes,
            } => {
                let Some(rows) = tables.get_mut(table) else {
                    return Ok(false);
                };
                let mut touched = false;
                for row in rows.values_mut().filter(|row| filter.matches(row)) {
                    for (field, change) in changes {
                        let value = change.apply(row.get(field));
                        row.insert(field.clone(), value);
                    }
                    touched = true;
                }
                Ok(touched)
            }
        }
    }
}
