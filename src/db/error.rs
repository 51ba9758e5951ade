use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors surfaced by the repositories.
///
/// Constraint violations reported by the database are classified here, so
/// uniqueness and referential integrity are always decided by the storage
/// layer rather than by a prior lookup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conflict on {table}: {detail}")]
    Conflict { table: &'static str, detail: String },

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Map a write error on `table` to the store taxonomy.
    pub(crate) fn classify(table: &'static str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict { table, detail },
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => Self::ForeignKey(detail),
            _ => Self::Database(err),
        }
    }

    /// Whether this is a uniqueness conflict mentioning `column`
    /// (e.g. `"username"` for `UNIQUE constraint failed: users.username`).
    #[must_use]
    pub fn is_conflict_on(&self, column: &str) -> bool {
        match self {
            Self::Conflict { detail, .. } => detail.contains(column),
            _ => false,
        }
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_passes_through_non_constraint_errors() {
        let err = StoreError::classify("users", DbErr::Custom("boom".to_string()));
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_conflict_on("username"));
    }

    #[test]
    fn test_is_conflict_on() {
        let err = StoreError::Conflict {
            table: "users",
            detail: "UNIQUE constraint failed: users.username".to_string(),
        };
        assert!(err.is_conflict_on("username"));
        assert!(!err.is_conflict_on("api_key"));
        assert_eq!(
            err.to_string(),
            "Conflict on users: UNIQUE constraint failed: users.username"
        );
    }
}
