//! Brand domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A brand listed in the directory.
///
/// Ownership is not stored here: it lives on each profile's
/// `owned_brands` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    /// URL-safe unique identifier (e.g., `maison-noir`).
    pub slug: String,
    /// Profile that created the brand, cleared when that profile is deleted.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBrand {
    pub name: String,
    pub slug: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBrand {
    pub name: Option<String>,
    pub slug: Option<String>,
}
