use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{board::Board, store::Store, task::Task, user::User},
    notes::{self, MarkerKey},
    services::{LookupError, resolve_board, resolve_task, resolve_user},
    storage::{Storage, StorageError},
};

/// One board's worth of a person's tasks in the cockpit view.
pub struct CockpitGroup<'a> {
    pub board: &'a Board,
    pub tasks: Vec<&'a Task>,
}

pub struct PersonCockpit<'a> {
    pub user: &'a User,
    pub groups: Vec<CockpitGroup<'a>>,
}

/// Board a task counts under in the cockpit: the `assign-board` marker in
/// its notes wins over the board it physically lives on, as long as the
/// marker resolves to a real board.
fn effective_board_id(store: &Store, task: &Task) -> Uuid {
    notes::extract_opt(task.notes.as_deref(), MarkerKey::AssignBoard)
        .value
        .and_then(|raw| raw.parse::<Uuid>().ok())
        .filter(|id| store.boards.contains_key(id))
        .unwrap_or(task.board_id)
}

/// Cross-board aggregation of one person's tasks, grouped by effective
/// board, boards alphabetical, tasks in column order.
pub fn person_cockpit<'a>(
    store: &'a Store,
    user_name: &str,
) -> Result<PersonCockpit<'a>, LookupError> {
    let user_id = resolve_user(store, user_name)?;
    let user = store
        .get_user(user_id)
        .ok_or_else(|| LookupError::UserNotFound(user_name.to_string()))?;

    let mut by_board: HashMap<Uuid, Vec<&Task>> = HashMap::new();
    for task in store.tasks_for_assignee(user_id) {
        by_board
            .entry(effective_board_id(store, task))
            .or_default()
            .push(task);
    }

    let mut groups: Vec<CockpitGroup<'a>> = by_board
        .into_iter()
        .filter_map(|(board_id, mut tasks)| {
            tasks.sort_by_key(|t| (t.position, t.created_at));
            store.get_board(board_id).map(|board| CockpitGroup { board, tasks })
        })
        .collect();
    groups.sort_by(|a, b| a.board.name.cmp(&b.board.name));

    Ok(PersonCockpit { user, groups })
}

#[derive(Debug, Error)]
pub enum AssignBoardError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct AssignBoardParameters {
    pub board: String,
    pub task: String,
    /// Board the task should count under in the cockpit; None restores the
    /// task to its owning board.
    pub target_board: Option<String>,
}

/// Records the cockpit board assignment inside the task notes via the
/// `assign-board` marker (kept in this exact text form because other
/// tooling scans for it).
pub fn set_assigned_board(
    store: &mut Store,
    storage: &impl Storage,
    parameters: AssignBoardParameters,
) -> Result<Task, AssignBoardError> {
    let board_id = resolve_board(store, &parameters.board)?;
    let task_id = resolve_task(store, board_id, &parameters.task)?;

    let target_id = match parameters.target_board {
        Some(name) => Some(resolve_board(store, &name)?.to_string()),
        None => None,
    };

    let task = store
        .get_task_mut(task_id)
        .ok_or_else(|| LookupError::TaskNotFound(parameters.task.clone()))?;
    task.notes = notes::attach_opt(task.notes.as_deref(), MarkerKey::AssignBoard, target_id.as_deref());
    task.updated_at = jiff::Timestamp::now();
    let updated = task.clone();

    storage.save(store)?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::NullStorage;

    fn board(store: &mut Store, name: &str) -> Uuid {
        let board = Board {
            id: Uuid::new_v4(),
            name: name.to_string(),
            ..Board::default()
        };
        let id = board.id;
        store.add_board(board);
        id
    }

    fn assigned_task(store: &mut Store, board_id: Uuid, title: &str, user_id: Uuid) -> Uuid {
        let task = Task {
            id: Uuid::new_v4(),
            board_id,
            title: title.to_string(),
            assignee_id: Some(user_id),
            ..Task::default()
        };
        let id = task.id;
        store.add_task(task);
        id
    }

    #[test]
    fn cockpit_groups_by_board_and_honors_assign_marker() {
        let mut store = Store::default();
        let alpha = board(&mut store, "Alpha");
        let beta = board(&mut store, "Beta");
        let user = User {
            id: Uuid::new_v4(),
            name: String::from("Jan"),
        };
        let user_id = user.id;
        store.add_user(user);

        assigned_task(&mut store, alpha, "stays on alpha", user_id);
        let reassigned = assigned_task(&mut store, alpha, "counts under beta", user_id);
        store.get_task_mut(reassigned).unwrap().notes =
            Some(format!("notes\n\n[assign-board:{beta}]"));

        // Unassigned tasks never show up.
        let other = Task {
            id: Uuid::new_v4(),
            board_id: alpha,
            title: String::from("nobody's"),
            ..Task::default()
        };
        store.add_task(other);

        let cockpit = person_cockpit(&store, "jan").unwrap();
        assert_eq!(cockpit.groups.len(), 2);
        assert_eq!(cockpit.groups[0].board.name, "Alpha");
        assert_eq!(cockpit.groups[0].tasks.len(), 1);
        assert_eq!(cockpit.groups[1].board.name, "Beta");
        assert_eq!(cockpit.groups[1].tasks[0].title, "counts under beta");
    }

    #[test]
    fn dangling_assign_marker_falls_back_to_owning_board() {
        let mut store = Store::default();
        let alpha = board(&mut store, "Alpha");
        let user = User {
            id: Uuid::new_v4(),
            name: String::from("Chris"),
        };
        let user_id = user.id;
        store.add_user(user);

        let task_id = assigned_task(&mut store, alpha, "dangling", user_id);
        store.get_task_mut(task_id).unwrap().notes =
            Some(format!("notes\n\n[assign-board:{}]", Uuid::new_v4()));

        let cockpit = person_cockpit(&store, "Chris").unwrap();
        assert_eq!(cockpit.groups.len(), 1);
        assert_eq!(cockpit.groups[0].board.name, "Alpha");
    }

    #[test]
    fn set_assigned_board_writes_and_clears_the_marker() {
        let mut store = Store::default();
        let alpha = board(&mut store, "Alpha");
        let beta = board(&mut store, "Beta");
        let user = User {
            id: Uuid::new_v4(),
            name: String::from("Lenni"),
        };
        let user_id = user.id;
        store.add_user(user);
        let task_id = assigned_task(&mut store, alpha, "move me", user_id);

        let updated = set_assigned_board(
            &mut store,
            &NullStorage,
            AssignBoardParameters {
                board: String::from("Alpha"),
                task: task_id.to_string(),
                target_board: Some(String::from("Beta")),
            },
        )
        .unwrap();
        assert_eq!(
            updated.notes.as_deref(),
            Some(format!("[assign-board:{beta}]").as_str())
        );

        let cleared = set_assigned_board(
            &mut store,
            &NullStorage,
            AssignBoardParameters {
                board: String::from("Alpha"),
                task: task_id.to_string(),
                target_board: None,
            },
        )
        .unwrap();
        assert!(cleared.notes.is_none());
    }
}
