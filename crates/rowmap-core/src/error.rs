//! Error types for statement composition.

use thiserror::Error;

use crate::dialect::Dialect;

/// Errors raised while deriving schemas or composing statements.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The dialect forbids an identity column next to explicit primary keys.
    #[error("{dialect} does not support an auto-increment column combined with explicit primary key columns")]
    AutoIncrementConflict {
        /// Dialect that rejected the schema.
        dialect: Dialect,
    },

    /// LIKE filter was built without a key or a pattern.
    #[error("like filter requires both a key and a value")]
    LikeFilterIncomplete,

    /// Range filter was built without a column name.
    #[error("range filter requires a column name")]
    RangeFilterMissingColumn,

    /// Range filter was built with an absent bound.
    #[error("range filter on {column} requires both bounds")]
    RangeFilterMissingBound {
        /// Column the range applies to.
        column: String,
    },

    /// Value-list filter was built without a column name.
    #[error("value list filter requires a column name")]
    ListFilterMissingColumn,

    /// Value-list filter was built with no values.
    #[error("value list filter on {column} requires at least one value")]
    ListFilterEmpty {
        /// Column the list applies to.
        column: String,
    },

    /// JSON probe filter was built without a column name.
    #[error("json probe filter requires a column name")]
    JsonFilterMissingColumn,

    /// More than one combined filter carried join information.
    #[error("table join cannot be combined with another join filter")]
    JoinNotCombinable,

    /// A join-carrying filter was used where joins are forbidden.
    #[error("table join is not allowed in {operation} conditions")]
    JoinNotAllowed {
        /// Operation that rejected the join.
        operation: &'static str,
    },

    /// Delete was requested without any condition.
    #[error("delete without a where condition is forbidden")]
    DeleteWithoutCondition,

    /// A shard column had no value in the rendered bindings.
    #[error("column {column} is required in the where bindings to compute the target table name")]
    ShardColumnMissing {
        /// Shard column without a binding.
        column: String,
    },

    /// A shard column was bound to a value that cannot name a table.
    #[error("column {column} cannot select a shard: the bound value is not discrete")]
    ShardValueNotDiscrete {
        /// Shard column with the offending value.
        column: String,
    },

    /// Save requires an identity to address the existing row.
    #[error("table schema needs a key column or primary key columns")]
    MissingKeyColumns,

    /// A record field could not be serialized to its column text.
    #[error("serializing field {column} failed")]
    FieldSerialize {
        /// Column whose value failed to serialize.
        column: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// A result row lacked an expected column.
    #[error("row is missing column {column}")]
    RowColumnMissing {
        /// Missing column name.
        column: String,
    },

    /// A result row held a value of an unexpected shape.
    #[error("row column {column} holds an incompatible value")]
    RowTypeMismatch {
        /// Column with the incompatible value.
        column: String,
    },
}

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, ComposeError>;
