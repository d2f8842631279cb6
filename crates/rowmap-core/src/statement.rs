//! Statement composer: CRUD statement text plus bound parameters.
//!
//! Everything here is a pure transform from (schema, filter, options or
//! record) to SQL text and named bindings; execution belongs to the
//! caller's sink.

use regex::{NoExpand, Regex};

use crate::dialect::Dialect;
use crate::error::{ComposeError, Result};
use crate::filter::Filter;
use crate::query::{ListOptions, Query};
use crate::record::Record;
use crate::schema::TableSchema;
use crate::value::Bindings;

/// Alias given to the base table when a join rewrite is applied.
const JOIN_ALIAS: &str = "t";

/// One composed statement against a resolved physical table.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Resolved physical (possibly sharded) table name.
    pub table: String,
    /// Statement text with named `:placeholder` parameters.
    pub sql: String,
    /// Values for the named placeholders.
    pub bindings: Bindings,
}

impl TableSchema {
    /// Composes the INSERT statement for a record.
    ///
    /// When the schema has upsert columns, the dialect's conflict-update
    /// clause is appended so a duplicate key turns into an update.
    pub fn insert_sql<R: Record>(&self, record: &R) -> Result<Statement> {
        let table = self.target_name_for(record)?;
        let columns = self.insert_columns();
        let placeholders: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();
        let mut sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(","),
            placeholders.join(",")
        );
        sql.push_str(&self.conflict_clause());

        Ok(Statement {
            table,
            sql,
            bindings: record.bindings()?,
        })
    }

    fn conflict_clause(&self) -> String {
        let assignments = self.upsert_assignments();
        if assignments.is_empty() {
            return String::new();
        }
        match self.dialect() {
            Dialect::MySql => format!(" ON DUPLICATE KEY UPDATE {assignments}"),
            Dialect::Sqlite => {
                if self.primary_columns().is_empty() {
                    // no conflict target to name
                    return String::new();
                }
                format!(
                    " ON CONFLICT({}) DO UPDATE SET {assignments}",
                    self.primary_columns().join(",")
                )
            }
        }
    }

    /// Composes the UPDATE statement that saves an existing record,
    /// addressed by its key column or primary key columns.
    pub fn save_sql<R: Record>(&self, record: &R) -> Result<Statement> {
        let where_columns: Vec<String> = match self.key_column() {
            Some(key) => vec![key.to_string()],
            None => self.primary_columns().to_vec(),
        };
        if where_columns.is_empty() {
            return Err(ComposeError::MissingKeyColumns);
        }

        let table = self.target_name_for(record)?;
        let conditions: Vec<String> = where_columns.iter().map(|c| format!("{c}=:{c}")).collect();
        let sql = format!(
            "UPDATE {table} SET {} WHERE {}",
            self.upsert_assignments(),
            conditions.join(" AND ")
        );

        Ok(Statement {
            table,
            sql,
            bindings: record.bindings()?,
        })
    }

    /// Composes the UPDATE statement for a filter and a payload keyed by
    /// storage column name.
    ///
    /// The filter's placeholders are substituted inline with escaped
    /// literals: the payload and the condition are bound separately and
    /// must not collide on parameter names.
    pub fn update_sql(&self, filter: &Filter, parts: &Bindings) -> Result<Statement> {
        let where_text = inline_where(filter)?;
        let table = self.target_name(Some(filter))?;
        let assignments: Vec<String> = parts.keys().map(|c| format!("{c}=:{c}")).collect();
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(","));
        if !where_text.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_text);
        }

        Ok(Statement {
            table,
            sql,
            bindings: parts.clone(),
        })
    }

    /// Composes the DELETE statement for a filter.
    ///
    /// A filter that renders no condition is rejected; unconditional
    /// deletes are forbidden.
    pub fn delete_sql(&self, filter: &Filter) -> Result<Statement> {
        let Some(where_) = filter.render()? else {
            return Err(ComposeError::DeleteWithoutCondition);
        };
        if where_.format.is_empty() {
            return Err(ComposeError::DeleteWithoutCondition);
        }
        if where_.join.is_some() {
            return Err(ComposeError::JoinNotAllowed {
                operation: "delete",
            });
        }

        let table = self.target_name(Some(filter))?;
        let sql = format!("DELETE FROM {table} WHERE {}", where_.format);
        Ok(Statement {
            table,
            sql,
            bindings: where_.bindings,
        })
    }

    /// Composes the SELECT query for a filter and listing options.
    pub fn select_sql(
        &self,
        filter: Option<&Filter>,
        options: &ListOptions,
    ) -> Result<(Query, Bindings)> {
        let columns = if !options.all_columns && !options.columns.is_empty() {
            options.columns.clone()
        } else if options.all_columns {
            vec![String::from("*")]
        } else {
            self.column_names(false)
        };

        let mut query = Query {
            distinct: options.distinct,
            columns,
            from: self.target_name(filter)?,
            where_clause: None,
            order_by: options.order_by.clone(),
            limit: options.limit,
        };
        if options.distinct {
            if let Some(key) = self.key_column() {
                query.columns.retain(|c| c != key);
            }
        }

        let Some(filter) = filter else {
            return Ok((query, Bindings::new()));
        };
        let Some(where_) = filter.render()? else {
            return Ok((query, Bindings::new()));
        };

        if let Some(join) = &where_.join {
            query.from = format!("{} {JOIN_ALIAS}", query.from);
            let rewritten = where_
                .format
                .replace(&join.origin_placeholder, self.name())
                .replace(&join.temp_placeholder, JOIN_ALIAS);
            query.where_clause = Some(rewritten);
        } else {
            query.where_clause = Some(where_.format);
        }

        Ok((query, where_.bindings))
    }
}

/// Renders a filter with every placeholder substituted inline.
fn inline_where(filter: &Filter) -> Result<String> {
    let Some(where_) = filter.render()? else {
        return Ok(String::new());
    };
    if where_.join.is_some() {
        return Err(ComposeError::JoinNotAllowed {
            operation: "update",
        });
    }

    let mut text = where_.format;
    for (key, value) in &where_.bindings {
        let pattern = Regex::new(&format!(":{}\\b", regex::escape(key)))
            .expect("placeholder pattern is valid");
        let literal = value.to_sql_inline();
        text = pattern.replace_all(&text, NoExpand(&literal)).into_owned();
    }
    Ok(text)
}
