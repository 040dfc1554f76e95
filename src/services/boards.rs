use jiff::civil::Date;
use slug::slugify;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{area::Area, board::Board, project::Project, store::Store, workspace::Workspace},
    notes::{self, MarkerKey},
    services::{LookupError, resolve_board},
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum EnsureBoardError {
    #[error("Board name must not be empty")]
    BlankName,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct EnsureBoardParameters {
    pub workspace: String,
    pub project: String,
    pub area: String,
    pub name: String,
}

/// Find-or-create along the whole container chain: workspace → project →
/// area → board, each matched case-insensitively by name within its parent.
/// Re-running with the same names is a no-op that returns the same board.
pub fn ensure_board(
    store: &mut Store,
    storage: &impl Storage,
    parameters: EnsureBoardParameters,
) -> Result<Board, EnsureBoardError> {
    let name = parameters.name.trim();
    if name.is_empty() {
        return Err(EnsureBoardError::BlankName);
    }

    let workspace_id = match store.find_workspace_by_name(&parameters.workspace) {
        Some(workspace) => workspace.id,
        None => {
            let workspace = Workspace {
                id: Uuid::new_v4(),
                name: parameters.workspace.clone(),
                slug: slugify(&parameters.workspace),
            };
            let id = workspace.id;
            store.add_workspace(workspace);
            id
        }
    };

    let project_id = match store.find_project_by_name(workspace_id, &parameters.project) {
        Some(project) => project.id,
        None => {
            let project = Project {
                id: Uuid::new_v4(),
                workspace_id,
                name: parameters.project.clone(),
                slug: slugify(&parameters.project),
            };
            let id = project.id;
            store.add_project(project);
            id
        }
    };

    let area_id = match store.find_area_by_name(project_id, &parameters.area) {
        Some(area) => area.id,
        None => {
            let area = Area {
                id: Uuid::new_v4(),
                project_id,
                name: parameters.area.clone(),
                slug: slugify(&parameters.area),
            };
            let id = area.id;
            store.add_area(area);
            id
        }
    };

    let board = match store.find_board_by_name(name) {
        Some(board) => board.clone(),
        None => {
            let board = Board {
                id: Uuid::new_v4(),
                area_id,
                name: name.to_string(),
                slug: slugify(name),
                notes: None,
            };
            store.add_board(board.clone());
            board
        }
    };

    storage.save(store)?;
    Ok(board)
}

#[derive(Debug, Error)]
pub enum RenameBoardError {
    #[error("Board name must not be empty")]
    BlankName,

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn rename_board(
    store: &mut Store,
    storage: &impl Storage,
    name: &str,
    new_name: &str,
) -> Result<Board, RenameBoardError> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(RenameBoardError::BlankName);
    }

    let board_id = resolve_board(store, name)?;
    let board = store
        .get_board_mut(board_id)
        .ok_or_else(|| LookupError::BoardNotFound(name.to_string()))?;
    board.name = new_name.to_string();
    board.slug = slugify(new_name);
    let renamed = board.clone();

    storage.save(store)?;
    Ok(renamed)
}

#[derive(Debug, Error)]
pub enum MeetingDateError {
    #[error("Invalid meeting date '{0}': {1}")]
    InvalidDate(String, String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Stores the next meeting date inside the board notes as a
/// `[meeting-date:...]` marker, replacing any previous one. None clears it.
pub fn set_meeting_date(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    date: Option<&str>,
) -> Result<Board, MeetingDateError> {
    let date = match date {
        Some(raw) => {
            let raw = raw.trim();
            raw.parse::<Date>()
                .map_err(|e| MeetingDateError::InvalidDate(raw.to_string(), e.to_string()))?;
            Some(raw.to_string())
        }
        None => None,
    };

    let board_id = resolve_board(store, board)?;
    let entry = store
        .get_board_mut(board_id)
        .ok_or_else(|| LookupError::BoardNotFound(board.to_string()))?;
    entry.notes = notes::attach_opt(entry.notes.as_deref(), MarkerKey::MeetingDate, date.as_deref());
    let updated = entry.clone();

    storage.save(store)?;
    Ok(updated)
}

/// Reads the meeting date back out of a board's notes, if one is set.
pub fn meeting_date(board: &Board) -> Option<String> {
    notes::extract_opt(board.notes.as_deref(), MarkerKey::MeetingDate).value
}

#[derive(Debug, Error)]
pub enum DeleteBoardError {
    #[error("Board '{0}' still has {1} column(s). Remove them first.")]
    NotEmpty(String, usize),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Boards are only deletable once all their columns are gone.
pub fn delete_board(
    store: &mut Store,
    storage: &impl Storage,
    name: &str,
) -> Result<Board, DeleteBoardError> {
    let board_id = resolve_board(store, name)?;

    let column_count = store.columns_for_board(board_id).len();
    if column_count > 0 {
        return Err(DeleteBoardError::NotEmpty(name.to_string(), column_count));
    }

    let removed = store
        .boards
        .remove(&board_id)
        .ok_or_else(|| LookupError::BoardNotFound(name.to_string()))?;
    let share_ids: Vec<Uuid> = store
        .shares
        .values()
        .filter(|s| s.board_id == board_id)
        .map(|s| s.id)
        .collect();
    for id in share_ids {
        store.shares.remove(&id);
    }

    storage.save(store)?;
    Ok(removed)
}
