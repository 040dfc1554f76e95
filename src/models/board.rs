use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Board {
    /// UUID of the board
    pub id: Uuid,
    /// Area this board belongs to
    pub area_id: Uuid,
    /// Name of the board
    pub name: String,
    /// Slug of the board
    pub slug: String,
    /// Free-text notes. May carry a `[meeting-date:...]` marker.
    pub notes: Option<String>,
}
