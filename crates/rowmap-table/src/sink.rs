//! The execution collaborator contract.
//!
//! The orchestrator never talks to a database itself; it hands rendered
//! statement text and named bindings to an [`ExecutionSink`] and interprets
//! the outcome. Connection management, pooling and cursor iteration all
//! live behind this seam.

use thiserror::Error;

use rowmap_core::Bindings;

/// Values of one result row, keyed by storage column name.
pub type RowValues = Bindings;

/// A database-native error surfaced by an execution sink.
///
/// Carries the driver's message text verbatim; the orchestrator pattern-
/// matches it to recognize the "table doesn't exist" class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DbError(pub String);

impl DbError {
    /// Creates an error from a driver message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Returns the driver message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Outcome of a mutating statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Last insert id reported by the driver, when applicable.
    pub last_insert_id: i64,
    /// Number of rows affected.
    pub rows_affected: u64,
}

/// Executes rendered statements against a real database.
#[allow(async_fn_in_trait)]
pub trait ExecutionSink {
    /// Executes a mutating statement with named bindings.
    async fn execute(&self, sql: &str, bindings: &Bindings) -> Result<ExecResult, DbError>;

    /// Runs a query and materializes every row's values by column name.
    async fn query(&self, sql: &str, bindings: &Bindings) -> Result<Vec<RowValues>, DbError>;
}
