//! Identity domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A party authenticated by the external identity backend.
///
/// The id is issued by the backend and never changes; the email and
/// display metadata are whatever the backend reported at exchange time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}
