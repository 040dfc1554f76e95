use jiff::civil::Date;
use thiserror::Error;

use crate::{
    models::{
        planning::{PlanBucket, TaskPlanning},
        store::Store,
    },
    services::{LookupError, resolve_board, resolve_task},
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum SetPlanningError {
    #[error("Invalid planning date '{0}': {1}")]
    InvalidDate(String, String),

    #[error("Planning range ends before it starts ({from} > {to})")]
    InvertedRange { from: Date, to: Date },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct SetPlanningParameters {
    pub board: String,
    pub task: String,
    pub bucket: PlanBucket,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_date(raw: &str) -> Result<Date, SetPlanningError> {
    raw.trim()
        .parse::<Date>()
        .map_err(|e| SetPlanningError::InvalidDate(raw.to_string(), e.to_string()))
}

/// Upserts the planning attachment of a task. Bucket None clears the
/// planned-at stamp; the attachment itself stays so the date range can
/// outlive a temporary unplanning.
pub fn set_planning(
    store: &mut Store,
    storage: &impl Storage,
    parameters: SetPlanningParameters,
) -> Result<TaskPlanning, SetPlanningError> {
    let board_id = resolve_board(store, &parameters.board)?;
    let task_id = resolve_task(store, board_id, &parameters.task)?;

    let planned_from = parameters.from.as_deref().map(parse_date).transpose()?;
    let planned_to = parameters.to.as_deref().map(parse_date).transpose()?;
    if let (Some(from), Some(to)) = (planned_from, planned_to)
        && from > to
    {
        return Err(SetPlanningError::InvertedRange { from, to });
    }

    let planning = TaskPlanning {
        task_id,
        bucket: parameters.bucket,
        planned_from,
        planned_to,
        planned_at: match parameters.bucket {
            PlanBucket::None => None,
            _ => Some(jiff::Timestamp::now()),
        },
    };

    store.upsert_planning(planning.clone());
    storage.save(store)?;
    Ok(planning)
}

/// ISO week bounds (Monday through Sunday) containing `reference`.
pub fn week_range(reference: Date) -> (Date, Date) {
    let offset = reference.weekday().to_monday_zero_offset() as i64;
    let monday = reference
        .checked_sub(jiff::Span::new().days(offset))
        .expect("week start should be a valid date");
    let sunday = monday
        .checked_add(jiff::Span::new().days(6))
        .expect("week end should be a valid date");
    (monday, sunday)
}

pub fn is_today(date: Date, reference: Date) -> bool {
    date == reference
}

pub fn is_this_week(date: Date, reference: Date) -> bool {
    let (monday, sunday) = week_range(reference);
    date >= monday && date <= sunday
}

pub fn is_overdue(date: Date, reference: Date) -> bool {
    date < reference
}

/// Cockpit tag for a planned date relative to `reference`.
pub fn describe_planned_date(date: Date, reference: Date) -> &'static str {
    if is_overdue(date, reference) {
        "overdue"
    } else if is_today(date, reference) {
        "today"
    } else if is_this_week(date, reference) {
        "this week"
    } else {
        "upcoming"
    }
}
