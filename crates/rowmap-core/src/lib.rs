//! # rowmap-core
//!
//! Struct-to-relational-table mapping without a full ORM: record types
//! register an explicit column description, and this crate derives the
//! table schema, composes parameterized CRUD statement text, renders
//! composable WHERE predicates, and resolves sharded physical table names.
//!
//! Everything is a pure value-to-value transform; executing the emitted
//! SQL belongs to the caller.
//!
//! ```rust
//! use rowmap_core::{integer, varchar, Dialect, Filter, ListOptions, TableSchema};
//!
//! let columns = vec![
//!     integer("id").auto_increment().key().build(),
//!     varchar("name", 64).not_null().primary().build(),
//!     varchar("region", 16).split().build(),
//! ];
//! let schema = TableSchema::new("hosts", Dialect::MySql, columns).unwrap();
//!
//! // the shard column binds through the filter and selects the table
//! let filter = Filter::eq("region", "eu");
//! let (query, bindings) = schema.select_sql(Some(&filter), &ListOptions::default()).unwrap();
//! assert_eq!(
//!     query.to_string(),
//!     "SELECT id, name, region FROM hosts_eu WHERE region=:region"
//! );
//! assert_eq!(bindings.len(), 1);
//! ```

pub mod column;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod query;
pub mod record;
pub mod schema;
pub mod statement;
pub mod value;

pub use column::{
    bigint, blob, boolean, datetime, double, integer, json, text, varchar, ColumnBuilder,
    ColumnSchema, ValueKind, CURRENT_TIMESTAMP,
};
pub use dialect::Dialect;
pub use error::{ComposeError, Result};
pub use filter::{Filter, JoinRewrite, SqlWhere};
pub use query::{ListOptions, OrderBy, OrderDirection, Query};
pub use record::{json_field, row_i64, row_text, Record};
pub use schema::TableSchema;
pub use statement::Statement;
pub use value::{datetime_now, Bindings, SqlValue, ToSqlValue, DATETIME_FORMAT};
