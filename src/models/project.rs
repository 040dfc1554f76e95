use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Default, Clone)]
pub struct Project {
    /// UUID of the project
    pub id: Uuid,
    /// Workspace this project belongs to
    pub workspace_id: Uuid,
    /// Name of the project
    pub name: String,
    /// Slug of the project
    pub slug: String,
}
