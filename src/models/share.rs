use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Password-protected, token-addressed read-only view of one board.
/// Never expires automatically.
#[derive(Serialize, Deserialize, Default, Clone)]
pub struct ShareLink {
    pub id: Uuid,
    /// Opaque token used in the share URL and cookie name
    pub token: String,
    pub board_id: Uuid,
    /// Salted one-way hash, `sha256$<salt>$<hex>`
    pub password_hash: String,
    pub created_at: Timestamp,
}
