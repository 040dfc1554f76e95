use colored::*;
use jiff::civil::Date;

use crate::models::{board::Board, store::Store, task::Priority, task::Task};
use crate::services::{boards, cockpit::PersonCockpit, planning};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Get the status glyph for a task based on priority and due state
pub fn get_status_glyph(task: &Task, is_overdue: bool) -> ColoredString {
    if is_overdue {
        "●".red()
    } else {
        match task.priority {
            Priority::High => "!".red().bold(),
            Priority::Medium => "○".normal(),
            Priority::Low => "·".dimmed(),
        }
    }
}

/// Check if a task's due date has passed
pub fn is_overdue(task: &Task) -> bool {
    if let Some(due) = task.due_date {
        let today = jiff::Zoned::now().date();
        return due < today;
    }
    false
}

/// Format a date relative to today (e.g., "today", "tomorrow", "Feb 17")
pub fn format_date(date: Date) -> String {
    let today = jiff::Zoned::now().date();
    if date == today {
        "today".to_string()
    } else if date == today.tomorrow().expect("tomorrow should be valid") {
        "tomorrow".to_string()
    } else {
        date.strftime("%b %d").to_string()
    }
}

/// Build the right-aligned context string for a task (assignee • due date)
fn get_task_context(task: &Task, store: &Store) -> Option<String> {
    let mut parts = vec![];

    if let Some(assignee_id) = task.assignee_id
        && let Some(user) = store.get_user(assignee_id)
    {
        parts.push(user.name.clone());
    }

    if let Some(due) = task.due_date {
        parts.push(format!("due {}", format_date(due)));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" • "))
    }
}

/// Render a single task line with glyph, title, and right-aligned context
pub fn render_task_line(task: &Task, store: &Store) {
    let terminal_width = get_terminal_width();

    let overdue = is_overdue(task);
    let glyph = get_status_glyph(task, overdue);
    let left_section = format!("  {}  {}", glyph, task.title);
    let styled_left = left_section.bold();

    if let Some(context) = get_task_context(task, store) {
        let left_visible_len = format!("     {}", task.title).len();
        let total_content = left_visible_len + context.chars().count();

        if total_content + 4 < terminal_width {
            let padding = terminal_width - total_content - 2;
            println!("{}{}{}", styled_left, " ".repeat(padding), context.dimmed());
        } else {
            println!("{}", styled_left);
        }
    } else {
        println!("{}", styled_left);
    }
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let task_word = if count == 1 { "task" } else { "tasks" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, task_word);
}

/// Render a section header (e.g., a column or board name)
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

/// Render a full board: columns in position order, tasks in column order
pub fn render_board(store: &Store, board: &Board) {
    let columns = store.columns_for_board(board.id);
    let total: usize = columns
        .iter()
        .map(|c| store.tasks_in_column(c.id).len())
        .sum();

    render_view_header(&board.name, total);

    if let Some(date) = boards::meeting_date(board) {
        println!("  {} {}", "next meeting:".dimmed(), date.cyan());
    }

    for column in columns {
        let tasks = store.tasks_in_column(column.id);
        render_section_header(&format!("{} ({})", column.name, tasks.len()));
        for task in tasks {
            render_task_line(task, store);
        }
    }
}

/// Breadcrumb for a board: Workspace / Project / Area
fn board_breadcrumb(store: &Store, board: &Board) -> Option<String> {
    let area = store.get_area(board.area_id)?;
    let project = store.get_project(area.project_id)?;
    let workspace = store.get_workspace(project.workspace_id)?;
    Some(format!("{} / {} / {}", workspace.name, project.name, area.name))
}

/// Render the board list with hierarchy breadcrumbs
pub fn render_board_list(store: &Store) {
    let mut boards_sorted: Vec<&Board> = store.boards.values().collect();
    boards_sorted.sort_by(|a, b| a.name.cmp(&b.name));

    if boards_sorted.is_empty() {
        println!("No boards yet");
        return;
    }

    println!("\n  {} ({})\n", "Boards".cyan().bold(), boards_sorted.len());
    for board in boards_sorted {
        print!("  {}", board.name.bold());
        if let Some(date) = boards::meeting_date(board) {
            print!("  {}", format!("[meeting {}]", date).cyan());
        }
        println!();
        if let Some(breadcrumb) = board_breadcrumb(store, board) {
            println!("    {}", breadcrumb.dimmed());
        }
    }
    println!();
}

/// Render the per-person cockpit: the person's tasks grouped by board
pub fn render_cockpit(store: &Store, cockpit: &PersonCockpit) {
    let total: usize = cockpit.groups.iter().map(|g| g.tasks.len()).sum();
    render_view_header(&format!("Cockpit · {}", cockpit.user.name), total);

    if cockpit.groups.is_empty() {
        println!("  Nothing assigned");
        return;
    }

    let today = jiff::Zoned::now().date();
    for group in &cockpit.groups {
        render_section_header(&group.board.name);
        for task in &group.tasks {
            render_task_line(task, store);
            if let Some(plan) = store.planning_for(task.id)
                && plan.bucket != crate::models::planning::PlanBucket::None
            {
                let mut line = plan.bucket.label().to_string();
                if let Some(from) = plan.planned_from {
                    let tag = planning::describe_planned_date(from, today);
                    line.push_str(&format!(" (from {}, {})", from, tag));
                }
                println!("      {}", line.dimmed());
            }
        }
    }
}
