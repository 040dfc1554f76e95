use jiff::civil::Date;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        column::ColumnKind,
        store::Store,
        task::{Priority, Task},
    },
    notes::{self, MarkerKey},
    services::{LookupError, resolve_board, resolve_column, resolve_task, resolve_user},
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum CreateTaskError {
    #[error("Task title must not be empty")]
    BlankTitle,

    #[error("Board '{0}' has no columns yet")]
    NoColumns(String),

    #[error("Invalid due date '{0}': {1}")]
    InvalidDueDate(String, String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CreateTaskParameters {
    pub board: String,
    /// Target column name. Defaults to the board's first column.
    pub column: Option<String>,
    pub title: String,
    pub notes: Option<String>,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
}

/// Creates a task at the end of its column: position is the column's
/// current maximum plus one. Two racing appends may tie; the read side
/// breaks ties by creation time, so no column-wide lock is taken here.
pub fn create_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CreateTaskParameters,
) -> Result<Task, CreateTaskError> {
    let title = parameters.title.trim();
    if title.is_empty() {
        return Err(CreateTaskError::BlankTitle);
    }

    let board_id = resolve_board(store, &parameters.board)?;

    let column_id = match parameters.column {
        Some(name) => resolve_column(store, board_id, &name)?,
        None => store
            .columns_for_board(board_id)
            .first()
            .map(|c| c.id)
            .ok_or_else(|| CreateTaskError::NoColumns(parameters.board.clone()))?,
    };

    let assignee_id = match parameters.assignee {
        Some(name) => Some(resolve_user(store, &name)?),
        None => None,
    };

    let due_date = match parameters.due_date {
        Some(raw) => Some(
            raw.parse::<Date>()
                .map_err(|e| CreateTaskError::InvalidDueDate(raw.clone(), e.to_string()))?,
        ),
        None => None,
    };

    let now = jiff::Timestamp::now();
    let task = Task {
        id: Uuid::new_v4(),
        board_id,
        column_id,
        title: title.to_string(),
        notes: parameters
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from),
        priority: parameters.priority,
        assignee_id,
        due_date,
        position: store.max_task_position(column_id) + 1,
        created_at: now,
        updated_at: now,
    };

    store.add_task(task.clone());
    storage.save(store)?;

    Ok(task)
}

#[derive(Debug, Error)]
pub enum MoveTaskError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct MoveTaskParameters {
    pub board: String,
    pub task: String,
    pub to_column: String,
    /// Explicit target position. Callers derive it from a fresh read of the
    /// target column; siblings are never shifted to make room.
    pub position: Option<i64>,
}

/// Moves a task to a column. Without an explicit position this is append
/// semantics: strictly greater than everything already in the target.
/// Moving into the current column with no explicit position leaves the
/// ordering alone and only refreshes the modification time.
pub fn move_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: MoveTaskParameters,
) -> Result<Task, MoveTaskError> {
    let board_id = resolve_board(store, &parameters.board)?;
    let task_id = resolve_task(store, board_id, &parameters.task)?;
    let target_column_id = resolve_column(store, board_id, &parameters.to_column)?;

    let current_column_id = store
        .get_task(task_id)
        .map(|t| t.column_id)
        .ok_or_else(|| LookupError::TaskNotFound(parameters.task.clone()))?;

    let new_position = match parameters.position {
        Some(explicit) => Some(explicit),
        None if current_column_id == target_column_id => None,
        None => Some(store.max_task_position(target_column_id) + 1),
    };

    let now = jiff::Timestamp::now();
    let task = store
        .get_task_mut(task_id)
        .ok_or_else(|| LookupError::TaskNotFound(parameters.task.clone()))?;
    task.column_id = target_column_id;
    if let Some(position) = new_position {
        task.position = position;
    }
    task.updated_at = now;
    let moved = task.clone();

    storage.save(store)?;
    Ok(moved)
}

#[derive(Debug, Error)]
pub enum CompleteTaskError {
    #[error("Board '{0}' has no Done column")]
    NoDoneColumn(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CompleteTaskParameters {
    pub board: String,
    pub task: String,
}

/// "Done" is modeled as a move into the board's Done column, appended.
pub fn complete_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CompleteTaskParameters,
) -> Result<Task, CompleteTaskError> {
    let board_id = resolve_board(store, &parameters.board)?;
    let done_column = store
        .columns_for_board(board_id)
        .into_iter()
        .find(|c| c.kind == ColumnKind::Done)
        .map(|c| c.name.clone())
        .ok_or_else(|| CompleteTaskError::NoDoneColumn(parameters.board.clone()))?;

    move_task(
        store,
        storage,
        MoveTaskParameters {
            board: parameters.board,
            task: parameters.task,
            to_column: done_column,
            position: None,
        },
    )
    .map_err(|e| match e {
        MoveTaskError::Lookup(e) => CompleteTaskError::Lookup(e),
        MoveTaskError::Storage(e) => CompleteTaskError::Storage(e),
    })
}

#[derive(Debug, Error)]
pub enum DeleteTaskError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DeleteTaskParameters {
    pub board: String,
    pub task: String,
}

/// Deletes a task. Sibling positions are left untouched; gaps are fine.
pub fn delete_task(
    store: &mut Store,
    storage: &impl Storage,
    parameters: DeleteTaskParameters,
) -> Result<Task, DeleteTaskError> {
    let board_id = resolve_board(store, &parameters.board)?;
    let task_id = resolve_task(store, board_id, &parameters.task)?;

    let task = store
        .remove_task(task_id)
        .ok_or_else(|| LookupError::TaskNotFound(parameters.task.clone()))?;
    storage.save(store)?;
    Ok(task)
}

#[derive(Debug, Error)]
pub enum UpdateTaskError {
    #[error("Task title must not be empty")]
    BlankTitle,

    #[error("Invalid due date '{0}': {1}")]
    InvalidDueDate(String, String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn with_task<F>(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    task: &str,
    update: F,
) -> Result<Task, UpdateTaskError>
where
    F: FnOnce(&mut Task),
{
    let board_id = resolve_board(store, board)?;
    let task_id = resolve_task(store, board_id, task)?;

    let entry = store
        .get_task_mut(task_id)
        .ok_or_else(|| LookupError::TaskNotFound(task.to_string()))?;
    update(entry);
    entry.updated_at = jiff::Timestamp::now();
    let updated = entry.clone();

    storage.save(store)?;
    Ok(updated)
}

pub fn update_title(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    task: &str,
    title: &str,
) -> Result<Task, UpdateTaskError> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(UpdateTaskError::BlankTitle);
    }
    with_task(store, storage, board, task, |t| t.title = title)
}

/// Rewrites the prose of a task's notes while preserving the cockpit
/// `assign-board` marker embedded after it.
pub fn update_notes(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    task: &str,
    prose: &str,
) -> Result<Task, UpdateTaskError> {
    let board_id = resolve_board(store, board)?;
    let task_id = resolve_task(store, board_id, task)?;
    let assigned_board = store
        .get_task(task_id)
        .and_then(|t| notes::extract_opt(t.notes.as_deref(), MarkerKey::AssignBoard).value);

    let merged = notes::attach(prose, MarkerKey::AssignBoard, assigned_board.as_deref());
    with_task(store, storage, board, task, |t| t.notes = merged)
}

pub fn update_priority(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    task: &str,
    priority: Priority,
) -> Result<Task, UpdateTaskError> {
    with_task(store, storage, board, task, |t| t.priority = priority)
}

pub fn assign_task(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    task: &str,
    assignee: Option<&str>,
) -> Result<Task, UpdateTaskError> {
    let assignee_id = match assignee {
        Some(name) => Some(resolve_user(store, name)?),
        None => None,
    };
    with_task(store, storage, board, task, |t| t.assignee_id = assignee_id)
}

pub fn set_due_date(
    store: &mut Store,
    storage: &impl Storage,
    board: &str,
    task: &str,
    due_date: Option<&str>,
) -> Result<Task, UpdateTaskError> {
    let parsed = match due_date {
        Some(raw) => Some(
            raw.parse::<Date>()
                .map_err(|e| UpdateTaskError::InvalidDueDate(raw.to_string(), e.to_string()))?,
        ),
        None => None,
    };
    with_task(store, storage, board, task, |t| t.due_date = parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{board::Board, column::Column};
    use crate::storage::testing::NullStorage;

    fn fixture() -> (Store, String, String, String) {
        let mut store = Store::default();
        let board = Board {
            id: Uuid::new_v4(),
            name: String::from("Team"),
            ..Board::default()
        };
        let board_id = board.id;
        store.add_board(board);

        for (i, (name, kind)) in [
            ("Inbox", ColumnKind::Inbox),
            ("Doing", ColumnKind::Normal),
            ("Done", ColumnKind::Done),
        ]
        .iter()
        .enumerate()
        {
            store.add_column(Column {
                id: Uuid::new_v4(),
                board_id,
                name: name.to_string(),
                kind: *kind,
                position: i as i64,
                created_at: jiff::Timestamp::now(),
            });
        }

        (
            store,
            String::from("Team"),
            String::from("Inbox"),
            String::from("Doing"),
        )
    }

    fn add(store: &mut Store, board: &str, column: &str, title: &str) -> Task {
        create_task(
            store,
            &NullStorage,
            CreateTaskParameters {
                board: board.to_string(),
                column: Some(column.to_string()),
                title: title.to_string(),
                notes: None,
                priority: Priority::Medium,
                assignee: None,
                due_date: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn first_append_gets_position_one_then_strictly_greater() {
        let (mut store, board, inbox, _) = fixture();
        let first = add(&mut store, &board, &inbox, "first");
        assert_eq!(first.position, 1);

        let second = add(&mut store, &board, &inbox, "second");
        assert!(second.position > first.position);
    }

    #[test]
    fn blank_title_is_rejected_and_nothing_is_stored() {
        let (mut store, board, inbox, _) = fixture();
        let result = create_task(
            &mut store,
            &NullStorage,
            CreateTaskParameters {
                board,
                column: Some(inbox),
                title: String::from("   "),
                notes: None,
                priority: Priority::Medium,
                assignee: None,
                due_date: None,
            },
        );
        assert!(matches!(result, Err(CreateTaskError::BlankTitle)));
        assert!(store.tasks.is_empty());
    }

    #[test]
    fn move_appends_after_every_existing_task_in_target() {
        let (mut store, board, inbox, doing) = fixture();
        add(&mut store, &board, &doing, "existing low");
        let high = add(&mut store, &board, &doing, "existing high");
        let task = add(&mut store, &board, &inbox, "incoming");

        let moved = move_task(
            &mut store,
            &NullStorage,
            MoveTaskParameters {
                board,
                task: task.id.to_string(),
                to_column: doing,
                position: None,
            },
        )
        .unwrap();

        assert_eq!(moved.column_id, high.column_id);
        assert!(moved.position > high.position);
    }

    #[test]
    fn move_to_current_column_keeps_position_but_touches_updated_at() {
        let (mut store, board, inbox, _) = fixture();
        let task = add(&mut store, &board, &inbox, "stay put");
        add(&mut store, &board, &inbox, "neighbor");

        let moved = move_task(
            &mut store,
            &NullStorage,
            MoveTaskParameters {
                board,
                task: task.id.to_string(),
                to_column: inbox,
                position: None,
            },
        )
        .unwrap();

        assert_eq!(moved.position, task.position);
        assert!(moved.updated_at >= task.updated_at);
    }

    #[test]
    fn explicit_position_is_used_verbatim() {
        let (mut store, board, inbox, doing) = fixture();
        add(&mut store, &board, &doing, "occupies 1");
        let task = add(&mut store, &board, &inbox, "jump the queue");

        let moved = move_task(
            &mut store,
            &NullStorage,
            MoveTaskParameters {
                board,
                task: task.id.to_string(),
                to_column: doing,
                position: Some(0),
            },
        )
        .unwrap();
        assert_eq!(moved.position, 0);
    }

    #[test]
    fn complete_moves_into_the_done_column() {
        let (mut store, board, inbox, _) = fixture();
        let task = add(&mut store, &board, &inbox, "ship it");

        let done = complete_task(
            &mut store,
            &NullStorage,
            CompleteTaskParameters {
                board: board.clone(),
                task: task.id.to_string(),
            },
        )
        .unwrap();

        let done_column = store.find_column_by_name(done.board_id, "Done").unwrap();
        assert_eq!(done.column_id, done_column.id);
    }

    #[test]
    fn delete_does_not_renumber_siblings() {
        let (mut store, board, inbox, _) = fixture();
        let first = add(&mut store, &board, &inbox, "first");
        let second = add(&mut store, &board, &inbox, "second");
        let third = add(&mut store, &board, &inbox, "third");

        delete_task(
            &mut store,
            &NullStorage,
            DeleteTaskParameters {
                board,
                task: second.id.to_string(),
            },
        )
        .unwrap();

        assert_eq!(store.get_task(first.id).unwrap().position, first.position);
        assert_eq!(store.get_task(third.id).unwrap().position, third.position);
    }

    #[test]
    fn notes_update_preserves_the_assign_board_marker() {
        let (mut store, board, inbox, _) = fixture();
        let task = add(&mut store, &board, &inbox, "annotated");
        store.get_task_mut(task.id).unwrap().notes =
            Some(String::from("old prose\n\n[assign-board:b-42]"));

        let updated = update_notes(&mut store, &NullStorage, &board, &task.id.to_string(), "new prose")
            .unwrap();
        assert_eq!(
            updated.notes.as_deref(),
            Some("new prose\n\n[assign-board:b-42]")
        );
    }

    #[test]
    fn ambiguous_fuzzy_title_is_an_error() {
        let (mut store, board, inbox, _) = fixture();
        add(&mut store, &board, &inbox, "write report");
        add(&mut store, &board, &inbox, "review report");

        let result = delete_task(
            &mut store,
            &NullStorage,
            DeleteTaskParameters {
                board,
                task: String::from("report"),
            },
        );
        assert!(matches!(
            result,
            Err(DeleteTaskError::Lookup(LookupError::AmbiguousTask(_)))
        ));
    }
}
