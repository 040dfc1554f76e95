use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    area::Area,
    board::Board,
    column::Column,
    planning::TaskPlanning,
    project::Project,
    share::ShareLink,
    task::Task,
    user::User,
    workspace::Workspace,
};

/// Current schema version
pub const CURRENT_VERSION: u32 = 1;

/// Arena-style store: every entity lives in a map keyed by its id, with
/// parent ids as back-references. No cyclic in-memory graph.
#[derive(Serialize, Deserialize)]
pub struct Store {
    pub version: u32,
    pub workspaces: HashMap<Uuid, Workspace>,
    pub projects: HashMap<Uuid, Project>,
    pub areas: HashMap<Uuid, Area>,
    pub boards: HashMap<Uuid, Board>,
    pub columns: HashMap<Uuid, Column>,
    pub tasks: HashMap<Uuid, Task>,
    pub users: HashMap<Uuid, User>,
    /// Keyed by task id (1:1 attachment)
    pub planning: HashMap<Uuid, TaskPlanning>,
    pub shares: HashMap<Uuid, ShareLink>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            workspaces: HashMap::new(),
            projects: HashMap::new(),
            areas: HashMap::new(),
            boards: HashMap::new(),
            columns: HashMap::new(),
            tasks: HashMap::new(),
            users: HashMap::new(),
            planning: HashMap::new(),
            shares: HashMap::new(),
        }
    }
}

impl Store {
    // --- Inserts ---

    pub fn add_workspace(&mut self, workspace: Workspace) {
        self.workspaces.insert(workspace.id, workspace);
    }

    pub fn add_project(&mut self, project: Project) {
        self.projects.insert(project.id, project);
    }

    pub fn add_area(&mut self, area: Area) {
        self.areas.insert(area.id, area);
    }

    pub fn add_board(&mut self, board: Board) {
        self.boards.insert(board.id, board);
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.insert(column.id, column);
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    pub fn add_user(&mut self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn add_share(&mut self, share: ShareLink) {
        self.shares.insert(share.id, share);
    }

    // --- Lookups by id ---

    pub fn get_board(&self, id: Uuid) -> Option<&Board> {
        self.boards.get(&id)
    }

    pub fn get_board_mut(&mut self, id: Uuid) -> Option<&mut Board> {
        self.boards.get_mut(&id)
    }

    pub fn get_column(&self, id: Uuid) -> Option<&Column> {
        self.columns.get(&id)
    }

    pub fn get_column_mut(&mut self, id: Uuid) -> Option<&mut Column> {
        self.columns.get_mut(&id)
    }

    pub fn get_task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn get_task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn get_user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn get_area(&self, id: Uuid) -> Option<&Area> {
        self.areas.get(&id)
    }

    pub fn get_project(&self, id: Uuid) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn get_workspace(&self, id: Uuid) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    // --- First-match-by-name queries (case-insensitive) ---

    pub fn find_workspace_by_name(&self, name: &str) -> Option<&Workspace> {
        self.workspaces
            .values()
            .find(|w| w.name.eq_ignore_ascii_case(name))
    }

    pub fn find_project_by_name(&self, workspace_id: Uuid, name: &str) -> Option<&Project> {
        self.projects
            .values()
            .find(|p| p.workspace_id == workspace_id && p.name.eq_ignore_ascii_case(name))
    }

    pub fn find_area_by_name(&self, project_id: Uuid, name: &str) -> Option<&Area> {
        self.areas
            .values()
            .find(|a| a.project_id == project_id && a.name.eq_ignore_ascii_case(name))
    }

    pub fn find_board_by_name(&self, name: &str) -> Option<&Board> {
        self.boards
            .values()
            .find(|b| b.name.eq_ignore_ascii_case(name))
    }

    pub fn find_column_by_name(&self, board_id: Uuid, name: &str) -> Option<&Column> {
        self.columns
            .values()
            .find(|c| c.board_id == board_id && c.name.eq_ignore_ascii_case(name))
    }

    pub fn find_user_by_name(&self, name: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.name.eq_ignore_ascii_case(name))
    }

    pub fn find_share_by_token(&self, token: &str) -> Option<&ShareLink> {
        self.shares.values().find(|s| s.token == token)
    }

    // --- Ordered reads ---

    /// Columns of a board, position ascending, creation time as tiebreak.
    pub fn columns_for_board(&self, board_id: Uuid) -> Vec<&Column> {
        let mut columns: Vec<_> = self
            .columns
            .values()
            .filter(|c| c.board_id == board_id)
            .collect();
        columns.sort_by_key(|c| (c.position, c.created_at));
        columns
    }

    /// Tasks of a column, position ascending. Duplicate positions from
    /// racing appends are resolved by creation time.
    pub fn tasks_in_column(&self, column_id: Uuid) -> Vec<&Task> {
        let mut tasks: Vec<_> = self
            .tasks
            .values()
            .filter(|t| t.column_id == column_id)
            .collect();
        tasks.sort_by_key(|t| (t.position, t.created_at));
        tasks
    }

    pub fn tasks_for_board(&self, board_id: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(move |t| t.board_id == board_id)
    }

    pub fn tasks_for_assignee(&self, user_id: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks
            .values()
            .filter(move |t| t.assignee_id == Some(user_id))
    }

    // --- Position scans ---

    /// Highest position currently used in a column, 0 if the column is empty.
    pub fn max_task_position(&self, column_id: Uuid) -> i64 {
        self.tasks
            .values()
            .filter(|t| t.column_id == column_id)
            .map(|t| t.position)
            .max()
            .unwrap_or(0)
    }

    // --- Marker scan (importer dedup) ---

    /// First task on the board whose notes contain the exact marker substring.
    pub fn find_task_with_marker(&self, board_id: Uuid, marker: &str) -> Option<&Task> {
        self.tasks.values().find(|t| {
            t.board_id == board_id
                && t.notes.as_deref().is_some_and(|n| n.contains(marker))
        })
    }

    // --- Planning ---

    pub fn planning_for(&self, task_id: Uuid) -> Option<&TaskPlanning> {
        self.planning.get(&task_id)
    }

    pub fn upsert_planning(&mut self, planning: TaskPlanning) {
        self.planning.insert(planning.task_id, planning);
    }

    // --- Users ---

    pub fn users_sorted(&self) -> Vec<&User> {
        let mut users: Vec<_> = self.users.values().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    // --- Removals ---

    pub fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        self.planning.remove(&id);
        self.tasks.remove(&id)
    }

    pub fn remove_column(&mut self, id: Uuid) -> Option<Column> {
        self.columns.remove(&id)
    }

    /// Removes a user and nulls out every assignee reference that pointed
    /// at them. Returns how many tasks were unassigned.
    pub fn remove_user(&mut self, id: Uuid) -> Option<(User, usize)> {
        let user = self.users.remove(&id)?;
        let mut unassigned = 0;
        for task in self.tasks.values_mut() {
            if task.assignee_id == Some(id) {
                task.assignee_id = None;
                unassigned += 1;
            }
        }
        Some((user, unassigned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn task_at(column_id: Uuid, position: i64, created_secs: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            column_id,
            position,
            created_at: Timestamp::from_second(created_secs).unwrap(),
            ..Task::default()
        }
    }

    #[test]
    fn tasks_in_column_sorts_by_position_then_creation() {
        let mut store = Store::default();
        let column_id = Uuid::new_v4();

        let late = task_at(column_id, 2, 200);
        let early_tie = task_at(column_id, 1, 50);
        let late_tie = task_at(column_id, 1, 100);
        let (late_id, early_tie_id, late_tie_id) = (late.id, early_tie.id, late_tie.id);

        store.add_task(late);
        store.add_task(late_tie);
        store.add_task(early_tie);

        let ordered: Vec<Uuid> = store.tasks_in_column(column_id).iter().map(|t| t.id).collect();
        assert_eq!(ordered, vec![early_tie_id, late_tie_id, late_id]);
    }

    #[test]
    fn max_task_position_is_zero_for_empty_column() {
        let store = Store::default();
        assert_eq!(store.max_task_position(Uuid::new_v4()), 0);
    }

    #[test]
    fn find_board_by_name_is_case_insensitive() {
        let mut store = Store::default();
        let board = Board {
            id: Uuid::new_v4(),
            name: String::from("Organisation"),
            ..Board::default()
        };
        let board_id = board.id;
        store.add_board(board);

        assert_eq!(store.find_board_by_name("organisation").map(|b| b.id), Some(board_id));
        assert!(store.find_board_by_name("missing").is_none());
    }

    #[test]
    fn remove_user_nulls_out_assignees() {
        let mut store = Store::default();
        let user = User {
            id: Uuid::new_v4(),
            name: String::from("Jan"),
        };
        let user_id = user.id;
        store.add_user(user);

        let mut task = task_at(Uuid::new_v4(), 1, 0);
        task.assignee_id = Some(user_id);
        let task_id = task.id;
        store.add_task(task);

        let (_, unassigned) = store.remove_user(user_id).unwrap();
        assert_eq!(unassigned, 1);
        assert!(store.get_task(task_id).unwrap().assignee_id.is_none());
    }
}
