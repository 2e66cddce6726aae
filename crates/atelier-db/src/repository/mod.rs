//! SurrealDB repository implementations.

mod brand;
mod profile;

pub use brand::SurrealBrandRepository;
pub use profile::SurrealProfileRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}
