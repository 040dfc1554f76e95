use thiserror::Error;
use uuid::Uuid;

use crate::models::store::Store;

pub mod boards;
pub mod cockpit;
pub mod columns;
pub mod import;
pub mod planning;
pub mod share;
pub mod tasks;

/// Name-based resolution shared by the service operations. Lookups are
/// case-insensitive first-match; task lookup accepts a full uuid or a
/// fuzzy title and reports ambiguity instead of guessing.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Board '{0}' not found")]
    BoardNotFound(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Task '{0}' not found")]
    TaskNotFound(String),

    #[error("Task name is ambiguous. Multiple tasks found: {}", .0.join(", "))]
    AmbiguousTask(Vec<String>),

    #[error("User '{0}' not found")]
    UserNotFound(String),
}

pub fn resolve_board(store: &Store, name: &str) -> Result<Uuid, LookupError> {
    store
        .find_board_by_name(name)
        .map(|b| b.id)
        .ok_or_else(|| LookupError::BoardNotFound(name.to_string()))
}

pub fn resolve_column(store: &Store, board_id: Uuid, name: &str) -> Result<Uuid, LookupError> {
    store
        .find_column_by_name(board_id, name)
        .map(|c| c.id)
        .ok_or_else(|| LookupError::ColumnNotFound(name.to_string()))
}

pub fn resolve_user(store: &Store, name: &str) -> Result<Uuid, LookupError> {
    store
        .find_user_by_name(name)
        .map(|u| u.id)
        .ok_or_else(|| LookupError::UserNotFound(name.to_string()))
}

pub fn resolve_task(store: &Store, board_id: Uuid, needle: &str) -> Result<Uuid, LookupError> {
    if let Ok(id) = needle.parse::<Uuid>() {
        return store
            .get_task(id)
            .filter(|t| t.board_id == board_id)
            .map(|t| t.id)
            .ok_or_else(|| LookupError::TaskNotFound(needle.to_string()));
    }

    let matching: Vec<_> = store
        .tasks_for_board(board_id)
        .filter(|t| t.title.to_lowercase().contains(&needle.to_lowercase()))
        .collect();

    match matching.len() {
        0 => Err(LookupError::TaskNotFound(needle.to_string())),
        1 => Ok(matching[0].id),
        _ => {
            let titles: Vec<String> = matching.iter().map(|t| t.title.clone()).collect();
            Err(LookupError::AmbiguousTask(titles))
        }
    }
}
