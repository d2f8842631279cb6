//! Error types for table orchestration.

use thiserror::Error;

use rowmap_core::ComposeError;

use crate::sink::DbError;

/// Errors surfaced by table operations.
#[derive(Debug, Error)]
pub enum TableError {
    /// Statement composition failed before anything was executed.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// The execution sink reported a database error.
    #[error("database error: {0}")]
    Database(#[from] DbError),

    /// Auto-creating a missing table failed.
    #[error("auto creating table {table} failed: {cause}\nsql: {sql}")]
    AutoCreate {
        /// Physical table that was being created.
        table: String,
        /// DDL that was executed.
        sql: String,
        /// Driver error reported for the DDL.
        cause: DbError,
    },

    /// The statement still failed after the table was auto-created.
    #[error("error also happened after table auto created: {0}")]
    AfterAutoCreate(DbError),

    /// More than one row matched a presumed-unique primary-key filter.
    #[error("record count with same primary keys > 1, table schema may be out of sync with the database")]
    DuplicateIntegrity,

    /// A JSON record payload could not be decoded.
    #[error("invalid record payload")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
