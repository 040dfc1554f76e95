use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Root node of the container hierarchy: Workspace → Project → Area → Board.
#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}
