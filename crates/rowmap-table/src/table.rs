//! The CRUD orchestrator.
//!
//! A [`Table`] ties a record type, a dialect and an execution sink to one
//! logical table. It sequences operation hooks, composes statements
//! through the schema, delegates execution to the sink, and retries once
//! with an auto-created table when the driver reports the table missing.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use rowmap_core::{Bindings, Dialect, Filter, ListOptions, Record, Statement, TableSchema};

use crate::error::{Result, TableError};
use crate::hooks::TableHooks;
use crate::sink::{DbError, ExecResult, ExecutionSink, RowValues};

/// Message pattern of the driver's "table doesn't exist" error class.
pub const TABLE_NOT_EXIST_PATTERN: &str = r"[tT]able\s+.+\s+doesn't\s+exist";

fn table_not_exist_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TABLE_NOT_EXIST_PATTERN).expect("pattern is valid"))
}

fn is_table_missing(err: &DbError) -> bool {
    table_not_exist_re().is_match(err.message())
}

/// One logical table bound to a record type and an execution sink.
pub struct Table<R: Record, S: ExecutionSink> {
    name: String,
    dialect: Dialect,
    sink: S,
    hooks: TableHooks<R>,
    schema: OnceLock<TableSchema>,
}

impl<R: Record, S: ExecutionSink> Table<R, S> {
    /// Creates a table handle.
    pub fn new(name: impl Into<String>, dialect: Dialect, sink: S) -> Self {
        Self {
            name: name.into(),
            dialect,
            sink,
            hooks: TableHooks::default(),
            schema: OnceLock::new(),
        }
    }

    /// Returns the logical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the execution sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the hook set.
    #[must_use]
    pub fn hooks(&self) -> &TableHooks<R> {
        &self.hooks
    }

    /// Returns the hook set for registration.
    pub fn hooks_mut(&mut self) -> &mut TableHooks<R> {
        &mut self.hooks
    }

    /// Returns the table schema, building it on first access.
    ///
    /// Concurrent first callers observe exactly one constructed schema.
    pub fn schema(&self) -> Result<&TableSchema> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema);
        }
        let built = TableSchema::new(self.name.clone(), self.dialect, R::columns())?;
        Ok(self.schema.get_or_init(|| built))
    }

    /// Creates the logical table if it does not exist.
    pub async fn create(&self) -> Result<()> {
        let sql = self.schema()?.create_sql();
        debug!(sql = %sql, "creating table");
        self.sink.execute(&sql, &Bindings::new()).await?;
        Ok(())
    }

    /// Inserts a record; a duplicate key turns into an update of the
    /// schema's upsert columns. Returns the last insert id.
    pub async fn insert(&self, record: &R) -> Result<i64> {
        for hook in &self.hooks.insert.before {
            hook(record)?;
        }

        let insert_id = self.insert_row(record).await?;

        for hook in &self.hooks.insert.after {
            hook(record)?;
        }

        Ok(insert_id)
    }

    async fn insert_row(&self, record: &R) -> Result<i64> {
        let statement = self.schema()?.insert_sql(record)?;
        let outcome = self.exec_with_auto_create(&statement).await?;
        Ok(outcome.last_insert_id)
    }

    /// Inserts several records one by one, returning their insert ids.
    pub async fn insert_many(&self, records: &[R]) -> Result<Vec<i64>> {
        for hook in &self.hooks.insert_many.before {
            hook(records)?;
        }

        let mut insert_ids = Vec::with_capacity(records.len());
        for record in records {
            insert_ids.push(self.insert_row(record).await?);
        }

        for hook in &self.hooks.insert_many.after {
            hook(records)?;
        }

        Ok(insert_ids)
    }

    /// Decodes a JSON payload into a record and inserts it.
    pub async fn insert_json(&self, payload: &str) -> Result<i64>
    where
        R: DeserializeOwned,
    {
        let record: R = serde_json::from_str(payload)?;
        self.insert(&record).await
    }

    /// Saves an existing record, addressed by its key or primary columns.
    pub async fn save(&self, record: &R) -> Result<()> {
        for hook in &self.hooks.save.before {
            hook(record)?;
        }

        let statement = self.schema()?.save_sql(record)?;
        self.exec_with_auto_create(&statement).await?;

        for hook in &self.hooks.save.after {
            hook(record)?;
        }

        Ok(())
    }

    /// Updates rows matching `filter` with a payload keyed by the columns'
    /// display names. Unknown keys are ignored; an empty effective payload
    /// is a no-op. Returns the number of affected rows.
    pub async fn update(&self, filter: &Filter, parts: &Bindings) -> Result<u64> {
        if parts.is_empty() {
            return Ok(0);
        }

        for hook in &self.hooks.update.before {
            hook(filter, parts)?;
        }

        let schema = self.schema()?;
        let mut payload = Bindings::new();
        for column in schema.columns() {
            if let Some(value) = parts.get(&column.display_name) {
                payload.insert(column.name.clone(), value.clone());
            }
        }
        if payload.is_empty() {
            return Ok(0);
        }

        let statement = schema.update_sql(filter, &payload)?;
        let outcome = self.exec_with_auto_create(&statement).await?;

        for hook in &self.hooks.update.after {
            hook(filter, parts)?;
        }

        Ok(outcome.rows_affected)
    }

    /// Deletes rows matching `filter`. Returns the number of affected rows.
    pub async fn delete(&self, filter: &Filter) -> Result<u64> {
        for hook in &self.hooks.delete.before {
            hook(filter)?;
        }

        let statement = self.schema()?.delete_sql(filter)?;
        let outcome = self.exec_with_auto_create(&statement).await?;

        for hook in &self.hooks.delete.after {
            hook(filter)?;
        }

        Ok(outcome.rows_affected)
    }

    /// Lists records matching `filter` under the given options.
    pub async fn list(&self, filter: Option<&Filter>, options: &ListOptions) -> Result<Vec<R>> {
        let schema = self.schema()?;
        let (query, bindings) = schema.select_sql(filter, options)?;
        let target = schema.target_name(filter)?;

        let rows = self
            .query_with_auto_create(&target, &query.to_string(), &bindings)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(R::from_row(row)?);
        }
        Ok(records)
    }

    /// Returns the first record matching `filter`, with all columns loaded.
    pub async fn get_first(&self, filter: Option<&Filter>) -> Result<Option<R>> {
        let options = ListOptions {
            all_columns: true,
            limit: Some(1),
            ..ListOptions::default()
        };
        let records = self.list(filter, &options).await?;
        Ok(records.into_iter().next())
    }

    /// Looks for an existing row with this record's primary key values.
    ///
    /// Zero rows means no duplicate; exactly one row is returned
    /// materialized; more than one is an integrity violation and is
    /// reported, never resolved silently.
    pub async fn is_dup(&self, record: &R) -> Result<Option<R>> {
        let schema = self.schema()?;
        let target = schema.target_name_for(record)?;
        let mut sql = format!(
            "SELECT {} FROM {target}",
            schema.column_names(true).join(",")
        );
        let where_format = schema.primary_where_format();
        if !where_format.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_format);
        }

        let rows = self.sink.query(&sql, &record.bindings()?).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(R::from_row(&rows[0])?)),
            _ => Err(TableError::DuplicateIntegrity),
        }
    }

    async fn exec_with_auto_create(&self, statement: &Statement) -> Result<ExecResult> {
        debug!(sql = %statement.sql, table = %statement.table, "executing statement");
        match self.sink.execute(&statement.sql, &statement.bindings).await {
            Ok(outcome) => Ok(outcome),
            Err(err) if is_table_missing(&err) => {
                self.auto_create(&statement.table).await?;
                match self.sink.execute(&statement.sql, &statement.bindings).await {
                    Ok(outcome) => Ok(outcome),
                    Err(err) if is_table_missing(&err) => Err(TableError::AfterAutoCreate(err)),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn query_with_auto_create(
        &self,
        target: &str,
        sql: &str,
        bindings: &Bindings,
    ) -> Result<Vec<RowValues>> {
        debug!(sql = %sql, table = %target, "executing query");
        match self.sink.query(sql, bindings).await {
            Ok(rows) => Ok(rows),
            Err(err) if is_table_missing(&err) => {
                self.auto_create(target).await?;
                match self.sink.query(sql, bindings).await {
                    Ok(rows) => Ok(rows),
                    Err(err) if is_table_missing(&err) => Err(TableError::AfterAutoCreate(err)),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn auto_create(&self, target: &str) -> Result<()> {
        let sql = self.schema()?.create_sql_named(target);
        info!(table = %target, "table missing, creating before retry");
        self.sink
            .execute(&sql, &Bindings::new())
            .await
            .map_err(|cause| TableError::AutoCreate {
                table: target.to_string(),
                sql: sql.clone(),
                cause,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_not_exist_pattern() {
        assert!(is_table_missing(&DbError::new(
            "Error 1146: Table 'db.alerts_7' doesn't exist"
        )));
        assert!(is_table_missing(&DbError::new(
            "no such thing: table alerts_7 doesn't exist"
        )));
        assert!(!is_table_missing(&DbError::new("syntax error near WHERE")));
        assert!(!is_table_missing(&DbError::new("duplicate entry 'x'")));
    }
}
