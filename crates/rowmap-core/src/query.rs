//! Assembled SELECT statements and listing options.

use std::fmt;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by.
    pub column: String,
    /// Order direction.
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates an ascending order specification.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a descending order specification.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{} ASC", self.column),
            OrderDirection::Desc => format!("{} DESC", self.column),
        }
    }
}

/// Options for listing records.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Explicit column subset; ignored when `all_columns` is set.
    pub columns: Vec<String>,
    /// Select every column, including serialized-blob columns.
    pub all_columns: bool,
    /// Select distinct rows; the schema's key column is dropped from the
    /// column list, since a unique identity defeats DISTINCT.
    pub distinct: bool,
    /// Ordering specification.
    pub order_by: Option<OrderBy>,
    /// Row limit.
    pub limit: Option<i64>,
}

/// An assembled SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// DISTINCT flag.
    pub distinct: bool,
    /// Ordered column list.
    pub columns: Vec<String>,
    /// Source table text.
    pub from: String,
    /// Optional WHERE clause text.
    pub where_clause: Option<String>,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
    /// Optional row limit.
    pub limit: Option<i64>,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        write!(f, "{} FROM {}", self.columns.join(", "), self.from)?;
        if let Some(where_clause) = &self.where_clause {
            if !where_clause.is_empty() {
                write!(f, " WHERE {where_clause}")?;
            }
        }
        if let Some(order_by) = &self.order_by {
            write!(f, " ORDER BY {}", order_by.to_sql())?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}
