//! Database-specific error types and conversions.

use atelier_core::error::AtelierError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness constraint or optimistic transaction rejected the write.
    #[error("Conflicting write on {entity}: {detail}")]
    Conflict { entity: String, detail: String },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed row: {0}")]
    Decode(String),
}

impl DbError {
    /// Classify an error returned while executing a statement.
    ///
    /// SurrealDB reports unique-key violations and transaction conflicts
    /// only through the message text, so the match is textual.
    pub(crate) fn from_statement(entity: &str, err: surrealdb::Error) -> Self {
        let detail = err.to_string();
        let lowered = detail.to_lowercase();
        if lowered.contains("already exists")
            || lowered.contains("already contains")
            || lowered.contains("can be retried")
        {
            DbError::Conflict {
                entity: entity.into(),
                detail,
            }
        } else {
            DbError::Query(detail)
        }
    }
}

impl From<DbError> for AtelierError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AtelierError::NotFound { entity, id },
            DbError::Conflict { entity, .. } => AtelierError::AlreadyExists { entity },
            other => AtelierError::Database(other.to_string()),
        }
    }
}
