//! Persistence layer for the row store

use crate::error::StorageError;
use crate::store::{row_id, Filter, Mutation, Query, Row, Storage, ID_FIELD};
use crate::types::ElementId;
use serde_json::Value;
use sled;
use std::path::Path;

/// Sled-based implementation of [`Storage`]
///
/// Each table is a separate sled tree keyed by the big-endian element id, so a tree scan
/// yields rows in ascending id order. Rows are stored as JSON documents.
pub struct SledStorage {
    db: sled::Db,
}

fn backend_error(action: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(format!("Failed to {}: {}", action, e))
}

impl SledStorage {
    /// Open (or create) a store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| backend_error("open sled database", e))?;
        Ok(Self { db })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    fn table(&self, table: &str) -> Result<sled::Tree, StorageError> {
        self.db
            .open_tree(table)
            .map_err(|e| backend_error(&format!("open table '{}'", table), e))
    }

    fn scan(&self, table: &str) -> Result<Vec<Row>, StorageError> {
        let tree = self.table(table)?;
        let mut rows = Vec::new();
        for item in tree.iter() {
            let (_, value) = item.map_err(|e| backend_error("iterate table", e))?;
            rows.push(decode_row(table, &value)?);
        }
        Ok(rows)
    }

    /// Insert (or replace) a row, assigning the next free `ID` when absent
    pub fn insert(&self, table: &str, mut row: Row) -> Result<ElementId, StorageError> {
        let tree = self.table(table)?;
        let id = match row.get(ID_FIELD) {
            None | Some(Value::Null) => {
                let next = match tree.last().map_err(|e| backend_error("read last key", e))? {
                    Some((key, _)) => decode_key(table, &key)? + 1,
                    None => 1,
                };
                row.insert(ID_FIELD.to_string(), Value::from(next));
                next
            }
            Some(_) => row_id(&row).ok_or_else(|| StorageError::MalformedRow {
                table: table.to_string(),
                reason: format!("non-numeric {} column", ID_FIELD),
            })?,
        };
        let value = serde_json::to_vec(&row).map_err(|e| backend_error("serialize row", e))?;
        tree.insert(id.to_be_bytes(), value)
            .map_err(|e| backend_error("insert row", e))?;
        Ok(id)
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| backend_error("flush database", e))?;
        Ok(())
    }
}

fn decode_row(table: &str, bytes: &[u8]) -> Result<Row, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::MalformedRow {
        table: table.to_string(),
        reason: e.to_string(),
    })
}

fn decode_key(table: &str, key: &[u8]) -> Result<ElementId, StorageError> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| StorageError::MalformedRow {
        table: table.to_string(),
        reason: format!("key of {} bytes", key.len()),
    })?;
    Ok(ElementId::from_be_bytes(bytes))
}

impl Storage for SledStorage {
    fn query_rows(&self, table: &str, query: &Query) -> Result<Vec<Row>, StorageError> {
        Ok(query.evaluate(self.scan(table)?))
    }

    fn count(&self, table: &str, filter: &Filter) -> Result<u64, StorageError> {
        let count = self
            .scan(table)?
            .iter()
            .filter(|row| filter.matches(row))
            .count();
        Ok(count as u64)
    }

    fn delete(&self, table: &str, id: ElementId) -> Result<bool, StorageError> {
        let removed = self
            .table(table)?
            .remove(id.to_be_bytes())
            .map_err(|e| backend_error("delete row", e))?;
        Ok(removed.is_some())
    }

    fn execute(&self, mutation: &Mutation) -> Result<bool, StorageError> {
        match mutation {
            Mutation::Insert { table, row } => {
                self.insert(table, row.clone())?;
                Ok(true)
            }
            Mutation::Update {
                table,
                filter,
                changes,
            } => {
                let tree = self.table(table)?;
                let mut batch = sled::Batch::default();
                let mut touched = false;
                for item in tree.iter() {
                    let (key, value) = item.map_err(|e| backend_error("iterate table", e))?;
                    let mut row = decode_row(table, &value)?;
                    if !filter.matches(&row) {
                        continue;
                    }
                    for (field, change) in changes {
                        let updated = change.apply(row.get(field));
                        row.insert(field.clone(), updated);
                    }
                    let encoded =
                        serde_json::to_vec(&row).map_err(|e| backend_error("serialize row", e))?;
                    batch.insert(key, encoded);
                    touched = true;
                }
                tree.apply_batch(batch)
                    .map_err(|e| backend_error("apply batch", e))?;
                Ok(touched)
            }
        }
    }
}
