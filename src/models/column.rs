use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    #[default]
    Normal,
    Inbox,
    Done,
    Blocked,
}

#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Column {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    pub kind: ColumnKind,
    /// Ordering key within the board. Not necessarily contiguous;
    /// ties are broken by creation time at read time.
    pub position: i64,
    pub created_at: Timestamp,
}
