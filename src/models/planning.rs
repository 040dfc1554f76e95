use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PlanBucket {
    #[default]
    None,
    Today,
    ThisWeek,
    Later,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid planning bucket '{0}'. Use one of: none, today, week, later")]
pub struct PlanBucketParseError(pub String);

impl PlanBucket {
    pub fn parse(raw: &str) -> Result<Self, PlanBucketParseError> {
        match raw.to_lowercase().as_str() {
            "none" => Ok(PlanBucket::None),
            "today" => Ok(PlanBucket::Today),
            "week" | "this-week" => Ok(PlanBucket::ThisWeek),
            "later" => Ok(PlanBucket::Later),
            _ => Err(PlanBucketParseError(raw.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanBucket::None => "unplanned",
            PlanBucket::Today => "today",
            PlanBucket::ThisWeek => "this week",
            PlanBucket::Later => "later",
        }
    }
}

/// Optional 1:1 scheduling attachment for a task. Absence means "unplanned".
#[derive(Serialize, Deserialize, Default, Clone)]
pub struct TaskPlanning {
    pub task_id: Uuid,
    pub bucket: PlanBucket,
    /// Optional date range the planning refers to
    pub planned_from: Option<Date>,
    pub planned_to: Option<Date>,
    /// When the bucket was last set to something other than None
    pub planned_at: Option<Timestamp>,
}
