//! Ordered sibling maintenance for `pos`-sorted listings

use crate::error::{RouteError, StorageError};
use crate::model::ContentModel;
use crate::store::{
    row_id, row_parent, Change, Filter, Mutation, OrderBy, Query, Row, Storage, POSITION_FIELD,
};
use crate::types::ParentPointer;
use serde_json::Value;
use tracing::{debug, info};

fn position(row: &Row) -> Option<i64> {
    match row.get(POSITION_FIELD)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn missing_row(model: &ContentModel) -> StorageError {
    StorageError::MalformedRow {
        table: model.descriptor().table.clone(),
        reason: "model has no loaded row".to_string(),
    }
}

/// Pointer scoping the loaded row's siblings: the row's own, else the model's
fn sibling_pointer(model: &ContentModel, row: &Row) -> Result<Option<ParentPointer>, StorageError> {
    Ok(row_parent(row)?.or(model.parent_pointer()))
}

/// Delete the model's loaded row and close the gap it leaves in the sibling order.
///
/// Returns `false` when the row was already gone.
pub fn delete_element(storage: &dyn Storage, model: &ContentModel) -> Result<bool, RouteError> {
    let row = model.loaded_page_data().ok_or_else(|| missing_row(model))?;
    let table = &model.descriptor().table;
    let id = row_id(row).ok_or_else(|| StorageError::MalformedRow {
        table: table.clone(),
        reason: "row has no ID".to_string(),
    })?;

    if !storage.delete(table, id)? {
        debug!(table = %table, id, "Element already deleted");
        return Ok(false);
    }

    if let (Some(pos), Some(pointer)) = (position(row), sibling_pointer(model, row)?) {
        let shifted = storage.execute(&Mutation::Update {
            table: table.clone(),
            filter: Filter::parent(pointer).and(Filter::gt(POSITION_FIELD, pos)),
            changes: vec![(POSITION_FIELD.to_string(), Change::Add(-1))],
        })?;
        debug!(table = %table, parent = %pointer, pos, shifted, "Closed position gap");
    }
    info!(table = %table, id, "Deleted element");
    Ok(true)
}

/// Position for a new element appended under the model's parent pointer
pub fn next_position(storage: &dyn Storage, model: &ContentModel) -> Result<i64, StorageError> {
    let filter = model
        .parent_pointer()
        .map(Filter::parent)
        .unwrap_or(Filter::All);
    let query = Query::new(filter)
        .order_by(Some(OrderBy {
            field: POSITION_FIELD.to_string(),
            descending: true,
        }))
        .limit(1);
    let last = storage
        .query_rows(&model.descriptor().table, &query)?
        .first()
        .and_then(position);
    Ok(last.map_or(1, |pos| pos + 1))
}
