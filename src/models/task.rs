use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid priority '{0}'. Use one of: high, medium, low")]
pub struct PriorityParseError(pub String);

impl Priority {
    pub fn parse(raw: &str) -> Result<Self, PriorityParseError> {
        match raw.to_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            _ => Err(PriorityParseError(raw.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Task {
    /// UUID to identify the task
    pub id: Uuid,
    /// Board this task lives on
    pub board_id: Uuid,
    /// Column that currently owns the task
    pub column_id: Uuid,
    /// Title of the task (non-empty, trimmed)
    pub title: String,
    /// Free-text notes. May carry `[key:value]` markers after the prose.
    pub notes: Option<String>,
    /// Priority of the task
    pub priority: Priority,
    /// Assigned user, if any
    pub assignee_id: Option<Uuid>,
    /// Due date (calendar date, no time component)
    pub due_date: Option<Date>,
    /// Ordering key within the owning column. Appends assign max + 1;
    /// ties from racing appends are broken by created_at at read time.
    pub position: i64,
    /// When the task was created
    pub created_at: Timestamp,
    /// When the task was last modified
    pub updated_at: Timestamp,
}
