use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        column::{Column, ColumnKind},
        store::Store,
    },
    services::{LookupError, resolve_board, resolve_column},
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum SyncColumnsError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct SyncColumnsParameters {
    pub board: String,
    /// Canonical column names in their intended order.
    pub names: Vec<String>,
}

pub struct SyncColumnsResult {
    /// Columns matching the canonical list, in list order.
    pub columns: Vec<Column>,
    /// Names of columns on the board that the list does not mention.
    /// Deleting them is destructive and stays a separate, explicit step.
    pub extraneous: Vec<String>,
}

/// Synchronizes a board's column set toward a canonical name list: existing
/// same-named columns are repositioned to their list index (identity
/// preserved), missing ones are created. Extraneous columns are only
/// reported, never deleted.
pub fn sync_columns(
    store: &mut Store,
    storage: &impl Storage,
    parameters: SyncColumnsParameters,
) -> Result<SyncColumnsResult, SyncColumnsError> {
    let board_id = resolve_board(store, &parameters.board)?;

    let mut columns = Vec::with_capacity(parameters.names.len());
    for (index, name) in parameters.names.iter().enumerate() {
        let position = index as i64;
        match store.find_column_by_name(board_id, name).map(|c| c.id) {
            Some(id) => {
                if let Some(column) = store.get_column_mut(id) {
                    column.position = position;
                    columns.push(column.clone());
                }
            }
            None => {
                let column = Column {
                    id: Uuid::new_v4(),
                    board_id,
                    name: name.clone(),
                    kind: ColumnKind::Normal,
                    position,
                    created_at: Timestamp::now(),
                };
                store.add_column(column.clone());
                columns.push(column);
            }
        }
    }

    let extraneous: Vec<String> = store
        .columns_for_board(board_id)
        .into_iter()
        .filter(|c| !parameters.names.iter().any(|n| c.name.eq_ignore_ascii_case(n)))
        .map(|c| c.name.clone())
        .collect();

    storage.save(store)?;
    Ok(SyncColumnsResult { columns, extraneous })
}

#[derive(Debug, Error)]
pub enum ReindexColumnError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Administrative recovery from position drift: rewrites task positions
/// 0..N-1 in the column's current read order. Never called automatically.
pub fn reindex_column(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    column: &str,
) -> Result<usize, ReindexColumnError> {
    let board_id = resolve_board(store, board)?;
    let column_id = resolve_column(store, board_id, column)?;

    let ordered: Vec<Uuid> = store.tasks_in_column(column_id).iter().map(|t| t.id).collect();
    let count = ordered.len();
    for (index, task_id) in ordered.into_iter().enumerate() {
        if let Some(task) = store.get_task_mut(task_id) {
            task.position = index as i64;
        }
    }

    storage.save(store)?;
    Ok(count)
}

#[derive(Debug, Error)]
pub enum RenameColumnError {
    #[error("Column name must not be empty")]
    BlankName,

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn rename_column(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    column: &str,
    new_name: &str,
) -> Result<Column, RenameColumnError> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(RenameColumnError::BlankName);
    }

    let board_id = resolve_board(store, board)?;
    let column_id = resolve_column(store, board_id, column)?;

    let entry = store
        .get_column_mut(column_id)
        .ok_or_else(|| LookupError::ColumnNotFound(column.to_string()))?;
    entry.name = new_name.to_string();
    let renamed = entry.clone();

    storage.save(store)?;
    Ok(renamed)
}

#[derive(Debug, Error)]
pub enum DeleteColumnError {
    #[error("Column '{0}' still contains {1} task(s). Move or delete them first.")]
    NotEmpty(String, usize),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Columns are only deletable once empty; contained tasks must be moved or
/// deleted explicitly first.
pub fn delete_column(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    column: &str,
) -> Result<Column, DeleteColumnError> {
    let board_id = resolve_board(store, board)?;
    let column_id = resolve_column(store, board_id, column)?;

    let task_count = store.tasks_in_column(column_id).len();
    if task_count > 0 {
        return Err(DeleteColumnError::NotEmpty(column.to_string(), task_count));
    }

    let removed = store
        .remove_column(column_id)
        .ok_or_else(|| LookupError::ColumnNotFound(column.to_string()))?;
    storage.save(store)?;
    Ok(removed)
}
