use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use uuid::Uuid;

use crate::{
    config::{MailConfig, ShareConfig},
    mail::{parser::HeaderParser, spool::SpoolMailbox},
    models::{planning::PlanBucket, store::Store, task::Priority, user::User},
    services::{
        boards::{
            EnsureBoardParameters, delete_board, ensure_board, rename_board, set_meeting_date,
        },
        cockpit::{AssignBoardParameters, person_cockpit, set_assigned_board},
        columns::{
            SyncColumnsParameters, delete_column, reindex_column, rename_column, sync_columns,
        },
        import::run_import,
        planning::{SetPlanningParameters, set_planning},
        share::{CreateShareParameters, constant_time_eq, create_share, unlock_share},
        tasks::{
            CompleteTaskParameters, CreateTaskParameters, DeleteTaskParameters,
            MoveTaskParameters, assign_task, complete_task, create_task, delete_task, move_task,
            set_due_date, update_notes, update_priority, update_title,
        },
    },
    storage::{Storage, json::JsonFileStorage},
};

mod config;
mod mail;
mod models;
mod notes;
mod services;
mod storage;
mod ui;

#[derive(Parser)]
#[command(
    name = "crewboard",
    about = "A small team project management tool for your terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage boards
    #[command(subcommand)]
    Board(BoardCommands),

    /// Manage columns of a board
    #[command(subcommand)]
    Column(ColumnCommands),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Manage people
    #[command(subcommand)]
    User(UserCommands),

    /// Put a task into a planning bucket (none, today, week, later)
    Plan {
        board: String,
        task: String,
        bucket: String,

        /// Start of the planned date range (e.g., "2026-03-01")
        #[arg(long)]
        from: Option<String>,

        /// End of the planned date range
        #[arg(long)]
        to: Option<String>,
    },

    /// Per-person overview of assigned tasks across all boards
    Cockpit {
        /// Person to show; omit to list everyone
        person: Option<String>,
    },

    /// Manage password-gated read-only share links
    #[command(subcommand)]
    Share(ShareCommands),

    /// Run the mailbox importer
    #[command(subcommand)]
    Import(ImportCommands),
}

#[derive(Debug, Subcommand)]
enum BoardCommands {
    /// List all boards
    List,
    /// View a board's columns and tasks
    View { name: String },
    /// Create a board (and its workspace/project/area, if missing)
    New {
        name: String,

        #[arg(long, default_value = "Main")]
        workspace: String,

        #[arg(long, default_value = "General")]
        project: String,

        #[arg(long, default_value = "Team")]
        area: String,
    },
    /// Rename a board
    Rename { name: String, new_name: String },
    /// Set or clear the board's meeting date
    Meeting {
        name: String,

        /// Meeting date (e.g., "2026-03-01"); omit to clear
        date: Option<String>,
    },
    /// Delete an empty board
    Delete { name: String },
}

#[derive(Debug, Subcommand)]
enum ColumnCommands {
    /// Sync the board's columns toward the given name list, in order
    Sync {
        board: String,

        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Rewrite task positions 0..N-1 in a column (recovers position drift)
    Reindex { board: String, column: String },
    /// Rename a column
    Rename {
        board: String,
        column: String,
        new_name: String,
    },
    /// Delete an empty column
    Delete { board: String, column: String },
}

#[derive(Debug, Subcommand)]
enum TaskCommands {
    /// Add a task to a board (appends to the end of the column)
    Add {
        board: String,
        title: String,

        /// Target column; defaults to the board's first column
        #[arg(short, long)]
        column: Option<String>,

        /// Notes text
        #[arg(short, long)]
        notes: Option<String>,

        /// Priority: high, medium or low
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Assign to a person
        #[arg(short, long)]
        assignee: Option<String>,

        /// Due date (e.g., "2026-03-01")
        #[arg(short, long)]
        due: Option<String>,
    },
    /// Move a task to another column (appends unless --position is given)
    Move {
        board: String,
        task: String,
        column: String,

        /// Exact position in the target column; siblings are not shifted
        #[arg(long)]
        position: Option<i64>,
    },
    /// Move a task into the board's Done column
    Done { board: String, task: String },
    /// Delete a task
    Delete { board: String, task: String },
    /// Change a task's title
    Title {
        board: String,
        task: String,
        title: String,
    },
    /// Rewrite a task's notes (markers embedded in them are preserved)
    Notes {
        board: String,
        task: String,
        notes: String,
    },
    /// Change a task's priority
    Priority {
        board: String,
        task: String,
        priority: String,
    },
    /// Assign a task to a person; omit the person to unassign
    Assign {
        board: String,
        task: String,
        person: Option<String>,
    },
    /// Set a task's due date; omit the date to clear it
    Due {
        board: String,
        task: String,
        date: Option<String>,
    },
    /// Make a task count under another board in the cockpit; omit to reset
    CockpitBoard {
        board: String,
        task: String,
        target: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommands {
    /// Add a person
    Add { name: String },
    /// List everyone
    List,
    /// Remove a person (their tasks become unassigned)
    Remove { name: String },
}

#[derive(Debug, Subcommand)]
enum ShareCommands {
    /// Create a password-gated read-only share link for a board
    New { board: String, password: String },
    /// Unlock a share link; prints the session cookie on success
    Unlock { token: String, password: String },
}

#[derive(Debug, Subcommand)]
enum ImportCommands {
    /// Import unseen mailbox messages as tasks
    Run {
        /// Shared secret for scheduled triggers (checked against
        /// CREWBOARD_CRON_SECRET when that is set)
        #[arg(long)]
        secret: Option<String>,
    },
}

fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red(), error);
    std::process::exit(1);
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crewboard")
}

fn parse_priority(raw: &str) -> Priority {
    match Priority::parse(raw) {
        Ok(priority) => priority,
        Err(e) => fail(e),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let data_dir = data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        fail(format!("Failed to create data directory: {e}"));
    }

    let storage = JsonFileStorage::new(data_dir.join("store.json"));
    let mut store = match storage.load() {
        Ok(store) => store,
        Err(e) => fail(format!("Failed to load store: {e}")),
    };

    match cli.command {
        Some(Commands::Board(command)) => run_board(&mut store, &storage, command),
        Some(Commands::Column(command)) => run_column(&mut store, &storage, command),
        Some(Commands::Task(command)) => run_task(&mut store, &storage, command),
        Some(Commands::User(command)) => run_user(&mut store, &storage, command),
        Some(Commands::Plan {
            board,
            task,
            bucket,
            from,
            to,
        }) => {
            let bucket = match PlanBucket::parse(&bucket) {
                Ok(bucket) => bucket,
                Err(e) => fail(e),
            };
            match set_planning(
                &mut store,
                &storage,
                SetPlanningParameters {
                    board,
                    task,
                    bucket,
                    from,
                    to,
                },
            ) {
                Ok(planning) => println!("Planned: {}", planning.bucket.label().cyan()),
                Err(e) => fail(e),
            }
        }
        Some(Commands::Cockpit { person }) => match person {
            Some(person) => match person_cockpit(&store, &person) {
                Ok(cockpit) => ui::render_cockpit(&store, &cockpit),
                Err(e) => fail(e),
            },
            None => {
                let users = store.users_sorted();
                if users.is_empty() {
                    println!("Nobody here yet. Add people with `crewboard user add <name>`");
                } else {
                    println!("\n  {} ({})\n", "Cockpit".cyan().bold(), users.len());
                    for user in users {
                        let count = store.tasks_for_assignee(user.id).count();
                        println!("  {}  {}", user.name.bold(), format!("({count})").dimmed());
                    }
                }
            }
        },
        Some(Commands::Share(command)) => run_share(&mut store, &storage, command),
        Some(Commands::Import(ImportCommands::Run { secret })) => {
            let config = match MailConfig::from_env(data_dir.join("mailspool.json")) {
                Ok(config) => config,
                Err(e) => fail(e),
            };

            if let Some(expected) = &config.cron_secret {
                let presented = secret.unwrap_or_default();
                if !constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
                    fail("Unauthorized.");
                }
            }

            let mut mailbox = SpoolMailbox::new(config.spool_path.clone());
            match run_import(&mut store, &storage, &config, &mut mailbox, &HeaderParser) {
                Ok(summary) => println!(
                    "Imported: {} created, {} skipped, {} errors ({} processed)",
                    summary.created.to_string().green(),
                    summary.skipped,
                    summary.errors,
                    summary.processed
                ),
                Err(e) => fail(e),
            }
        }
        None => ui::render_board_list(&store),
    }
}

fn run_board(store: &mut Store, storage: &impl Storage, command: BoardCommands) {
    match command {
        BoardCommands::List => ui::render_board_list(store),
        BoardCommands::View { name } => match store.find_board_by_name(&name) {
            Some(board) => ui::render_board(store, &board.clone()),
            None => fail(format!("Board '{name}' not found")),
        },
        BoardCommands::New {
            name,
            workspace,
            project,
            area,
        } => match ensure_board(
            store,
            storage,
            EnsureBoardParameters {
                workspace,
                project,
                area,
                name,
            },
        ) {
            Ok(board) => println!("Board ready: {}", board.name.bold()),
            Err(e) => fail(e),
        },
        BoardCommands::Rename { name, new_name } => {
            match rename_board(store, storage, &name, &new_name) {
                Ok(board) => println!("Renamed to {}", board.name.bold()),
                Err(e) => fail(e),
            }
        }
        BoardCommands::Meeting { name, date } => {
            match set_meeting_date(store, storage, &name, date.as_deref()) {
                Ok(board) => match services::boards::meeting_date(&board) {
                    Some(date) => println!("Meeting date set to {}", date.cyan()),
                    None => println!("Meeting date cleared"),
                },
                Err(e) => fail(e),
            }
        }
        BoardCommands::Delete { name } => match delete_board(store, storage, &name) {
            Ok(board) => println!("Deleted board {}", board.name),
            Err(e) => fail(e),
        },
    }
}

fn run_column(store: &mut Store, storage: &impl Storage, command: ColumnCommands) {
    match command {
        ColumnCommands::Sync { board, names } => {
            match sync_columns(store, storage, SyncColumnsParameters { board, names }) {
                Ok(result) => {
                    for column in &result.columns {
                        println!("  {} {}", column.position, column.name.bold());
                    }
                    if !result.extraneous.is_empty() {
                        println!(
                            "{} not in the list (kept): {}",
                            "Note:".yellow(),
                            result.extraneous.join(", ")
                        );
                    }
                }
                Err(e) => fail(e),
            }
        }
        ColumnCommands::Reindex { board, column } => {
            match reindex_column(store, storage, &board, &column) {
                Ok(count) => println!("Reindexed {count} task(s)"),
                Err(e) => fail(e),
            }
        }
        ColumnCommands::Rename {
            board,
            column,
            new_name,
        } => match rename_column(store, storage, &board, &column, &new_name) {
            Ok(column) => println!("Renamed to {}", column.name.bold()),
            Err(e) => fail(e),
        },
        ColumnCommands::Delete { board, column } => {
            match delete_column(store, storage, &board, &column) {
                Ok(column) => println!("Deleted column {}", column.name),
                Err(e) => fail(e),
            }
        }
    }
}

fn run_task(store: &mut Store, storage: &impl Storage, command: TaskCommands) {
    match command {
        TaskCommands::Add {
            board,
            title,
            column,
            notes,
            priority,
            assignee,
            due,
        } => {
            let priority = parse_priority(&priority);
            match create_task(
                store,
                storage,
                CreateTaskParameters {
                    board,
                    column,
                    title,
                    notes,
                    priority,
                    assignee,
                    due_date: due,
                },
            ) {
                Ok(task) => println!("{} {}", "Added".green(), task.title.bold()),
                Err(e) => fail(e),
            }
        }
        TaskCommands::Move {
            board,
            task,
            column,
            position,
        } => match move_task(
            store,
            storage,
            MoveTaskParameters {
                board,
                task,
                to_column: column,
                position,
            },
        ) {
            Ok(task) => println!("Moved {} (position {})", task.title.bold(), task.position),
            Err(e) => fail(e),
        },
        TaskCommands::Done { board, task } => {
            match complete_task(store, storage, CompleteTaskParameters { board, task }) {
                Ok(task) => println!("{} {}", "Done".green(), task.title.bold()),
                Err(e) => fail(e),
            }
        }
        TaskCommands::Delete { board, task } => {
            match delete_task(store, storage, DeleteTaskParameters { board, task }) {
                Ok(task) => println!("Deleted {}", task.title),
                Err(e) => fail(e),
            }
        }
        TaskCommands::Title { board, task, title } => {
            match update_title(store, storage, &board, &task, &title) {
                Ok(task) => println!("Renamed to {}", task.title.bold()),
                Err(e) => fail(e),
            }
        }
        TaskCommands::Notes { board, task, notes } => {
            match update_notes(store, storage, &board, &task, &notes) {
                Ok(task) => println!("Updated notes of {}", task.title.bold()),
                Err(e) => fail(e),
            }
        }
        TaskCommands::Priority {
            board,
            task,
            priority,
        } => {
            let priority = parse_priority(&priority);
            match update_priority(store, storage, &board, &task, priority) {
                Ok(task) => println!("{} is now {}", task.title.bold(), priority.label()),
                Err(e) => fail(e),
            }
        }
        TaskCommands::Assign {
            board,
            task,
            person,
        } => match assign_task(store, storage, &board, &task, person.as_deref()) {
            Ok(task) => match task.assignee_id.and_then(|id| store.get_user(id)) {
                Some(user) => println!("{} → {}", task.title.bold(), user.name),
                None => println!("{} is now unassigned", task.title.bold()),
            },
            Err(e) => fail(e),
        },
        TaskCommands::Due { board, task, date } => {
            match set_due_date(store, storage, &board, &task, date.as_deref()) {
                Ok(task) => match task.due_date {
                    Some(date) => println!("{} due {}", task.title.bold(), date),
                    None => println!("{} has no due date anymore", task.title.bold()),
                },
                Err(e) => fail(e),
            }
        }
        TaskCommands::CockpitBoard {
            board,
            task,
            target,
        } => match set_assigned_board(
            store,
            storage,
            AssignBoardParameters {
                board,
                task,
                target_board: target,
            },
        ) {
            Ok(task) => println!("Cockpit assignment of {} updated", task.title.bold()),
            Err(e) => fail(e),
        },
    }
}

fn run_user(store: &mut Store, storage: &impl Storage, command: UserCommands) {
    match command {
        UserCommands::Add { name } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                fail("Name must not be empty");
            }
            if store.find_user_by_name(&name).is_some() {
                fail(format!("'{name}' already exists"));
            }
            let user = User {
                id: Uuid::new_v4(),
                name: name.clone(),
            };
            store.add_user(user);
            if let Err(e) = storage.save(store) {
                fail(e);
            }
            println!("Added {}", name.bold());
        }
        UserCommands::List => {
            let users = store.users_sorted();
            if users.is_empty() {
                println!("Nobody here yet");
            } else {
                for user in users {
                    println!("  {}", user.name);
                }
            }
        }
        UserCommands::Remove { name } => {
            let Some(user_id) = store.find_user_by_name(&name).map(|u| u.id) else {
                fail(format!("User '{name}' not found"));
            };
            match store.remove_user(user_id) {
                Some((user, unassigned)) => {
                    if let Err(e) = storage.save(store) {
                        fail(e);
                    }
                    println!("Removed {} ({unassigned} task(s) unassigned)", user.name);
                }
                None => fail(format!("User '{name}' not found")),
            }
        }
    }
}

fn run_share(store: &mut Store, storage: &impl Storage, command: ShareCommands) {
    match command {
        ShareCommands::New { board, password } => {
            match create_share(store, storage, CreateShareParameters { board, password }) {
                Ok(share) => {
                    println!("Share link created");
                    println!("  token: {}", share.token.bold());
                }
                Err(e) => fail(e),
            }
        }
        ShareCommands::Unlock { token, password } => {
            let config = match ShareConfig::from_env() {
                Ok(config) => config,
                Err(e) => fail(e),
            };
            match unlock_share(store, &config, &token, &password) {
                Ok(unlocked) => {
                    let board_name = store
                        .get_board(unlocked.board_id)
                        .map(|b| b.name.clone())
                        .unwrap_or_else(|| unlocked.board_id.to_string());
                    println!("{} read-only view of {}", "Unlocked".green(), board_name.bold());
                    println!("  cookie: {}={}", unlocked.cookie_name, unlocked.cookie_value);
                }
                Err(e) => fail(e),
            }
        }
    }
}
