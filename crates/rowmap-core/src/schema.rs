//! Table schema: ordered columns plus derived column groupings.
//!
//! A [`TableSchema`] is built once per (record type, table name, dialect)
//! and never mutated afterwards; the dialect-sensitive identity/primary-key
//! resolution happens inside [`TableSchema::new`], so a schema the dialect
//! rejects never exists. All derived groupings are computed during
//! construction and exposed through infallible accessors.

use crate::column::ColumnSchema;
use crate::dialect::Dialect;
use crate::error::{ComposeError, Result};
use crate::filter::Filter;
use crate::record::Record;

const CREATE_TABLE_TEMPLATE_PREFIX: &str = "CREATE TABLE IF NOT EXISTS";

/// Ordered column list for one logical table, with derived groupings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    dialect: Dialect,
    columns: Vec<ColumnSchema>,
    split_columns: Vec<String>,
    primary_columns: Vec<String>,
    insert_columns: Vec<String>,
    update_columns: Vec<String>,
    upsert_columns: Vec<String>,
    key_column: Option<String>,
}

impl TableSchema {
    /// Builds a schema for `name` under `dialect`.
    ///
    /// Fails when the dialect forbids the declared combination of identity
    /// and explicit primary key columns.
    pub fn new(
        name: impl Into<String>,
        dialect: Dialect,
        mut columns: Vec<ColumnSchema>,
    ) -> Result<Self> {
        resolve_identity(dialect, &mut columns)?;

        let mut split_columns: Vec<String> = columns
            .iter()
            .filter(|c| c.split)
            .map(|c| c.name.clone())
            .collect();
        // the sorted order defines the shard suffix composition order
        split_columns.sort();

        let primary_columns = names(&columns, |c| c.primary);
        let insert_columns = names(&columns, |c| !c.not_insert && !c.auto_increment);
        let update_columns = names(&columns, |c| {
            !c.auto_increment && !c.not_update && c.on_update_expr.is_none() && !c.split
        });
        let upsert_columns = names(&columns, |c| {
            !c.primary && !c.auto_increment && !c.not_update && c.on_update_expr.is_none() && !c.split
        });
        let key_column = columns
            .iter()
            .find(|c| (c.auto_increment || c.key) && !c.primary)
            .map(|c| c.name.clone());

        Ok(Self {
            name: name.into(),
            dialect,
            columns,
            split_columns,
            primary_columns,
            insert_columns,
            update_columns,
            upsert_columns,
            key_column,
        })
    }

    /// Returns the logical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rendering dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the column definitions in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Lists column names; `include_complex` keeps serialized-blob columns.
    #[must_use]
    pub fn column_names(&self, include_complex: bool) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| include_complex || !c.complex)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Lists the serialized-blob column names.
    #[must_use]
    pub fn complex_column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.complex)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Shard columns in suffix composition order.
    #[must_use]
    pub fn split_columns(&self) -> &[String] {
        &self.split_columns
    }

    /// Primary key columns after dialect resolution.
    #[must_use]
    pub fn primary_columns(&self) -> &[String] {
        &self.primary_columns
    }

    /// Columns filled on insert.
    #[must_use]
    pub fn insert_columns(&self) -> &[String] {
        &self.insert_columns
    }

    /// Columns assignable on update.
    #[must_use]
    pub fn update_columns(&self) -> &[String] {
        &self.update_columns
    }

    /// Columns re-assigned when an insert hits a key conflict.
    #[must_use]
    pub fn upsert_columns(&self) -> &[String] {
        &self.upsert_columns
    }

    /// First secondary-index or identity column outside the primary key.
    #[must_use]
    pub fn key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    /// Assignment list for the conflict-update clause: `col=:col,...`.
    #[must_use]
    pub fn upsert_assignments(&self) -> String {
        self.upsert_columns
            .iter()
            .map(|c| format!("{c}=:{c}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// WHERE format addressing a row by its primary key columns.
    #[must_use]
    pub fn primary_where_format(&self) -> String {
        self.primary_columns
            .iter()
            .map(|c| format!("{c}=:{c}"))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Renders the CREATE-TABLE-IF-NOT-EXISTS DDL for the logical table.
    #[must_use]
    pub fn create_sql(&self) -> String {
        self.create_sql_named(&self.name)
    }

    /// Renders the CREATE DDL against an explicit (possibly sharded)
    /// physical table name.
    #[must_use]
    pub fn create_sql_named(&self, target: &str) -> String {
        format!(
            "{CREATE_TABLE_TEMPLATE_PREFIX} {target} (\n{}\n)",
            self.schema_lines().join(",\n")
        )
    }

    fn schema_lines(&self) -> Vec<String> {
        let inline_primary = self.primary_columns.len() == 1;
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.ddl_line(self.dialect, inline_primary))
            .collect();

        if self.primary_columns.len() > 1 {
            lines.push(format!("PRIMARY KEY ({})", self.primary_columns.join(",")));
        }
        if self.dialect == Dialect::MySql {
            if let Some(key) = &self.key_column {
                lines.push(format!("KEY {key} ({key})"));
            }
        }

        lines
    }

    /// Resolves the physical table name for a filter.
    ///
    /// Without shard columns this is always the logical name. Otherwise
    /// every shard column must be present in the filter's rendered
    /// bindings, and each bound value must be discrete.
    pub fn target_name(&self, filter: Option<&Filter>) -> Result<String> {
        let Some(filter) = filter else {
            return Ok(self.name.clone());
        };
        if self.split_columns.is_empty() {
            return Ok(self.name.clone());
        }

        let bindings = filter.render()?.map(|w| w.bindings).unwrap_or_default();
        let mut target = self.name.clone();
        for column in &self.split_columns {
            let value = bindings
                .get(column)
                .ok_or_else(|| ComposeError::ShardColumnMissing {
                    column: column.clone(),
                })?;
            target.push('_');
            target.push_str(&value.shard_text(column)?);
        }

        Ok(target)
    }

    /// Resolves the physical table name for a record value.
    pub fn target_name_for<R: Record>(&self, record: &R) -> Result<String> {
        if self.split_columns.is_empty() {
            return Ok(self.name.clone());
        }
        let filter = Filter::from_record(record, &self.split_columns)?;
        self.target_name(Some(&filter))
    }
}

fn names(columns: &[ColumnSchema], keep: impl Fn(&ColumnSchema) -> bool) -> Vec<String> {
    columns
        .iter()
        .filter(|c| keep(c))
        .map(|c| c.name.clone())
        .collect()
}

/// Applies the dialect-sensitive identity/primary-key resolution.
fn resolve_identity(dialect: Dialect, columns: &mut [ColumnSchema]) -> Result<()> {
    let Some(idx) = columns.iter().position(|c| c.auto_increment) else {
        return Ok(());
    };
    let has_explicit_primary = columns.iter().any(|c| c.primary);

    match dialect {
        Dialect::MySql => {
            let column = &mut columns[idx];
            column.not_null = true;
            if !has_explicit_primary {
                column.primary = true;
                column.normalize_key_attrs();
            }
        }
        Dialect::Sqlite => {
            if has_explicit_primary {
                return Err(ComposeError::AutoIncrementConflict { dialect });
            }
            // sqlite's rowid alias carries the identity behavior itself
            let column = &mut columns[idx];
            column.auto_increment = false;
            column.primary = true;
            column.normalize_key_attrs();
            column.sql_type = String::from("INTEGER");
            column.not_null = false;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{integer, json, varchar};
    use crate::filter::Filter;
    use crate::value::SqlValue;

    fn sharded_schema() -> TableSchema {
        TableSchema::new(
            "t",
            Dialect::MySql,
            vec![
                varchar("q", 16).split().build(),
                integer("p").split().build(),
                varchar("name", 32).build(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_split_columns_sorted() {
        // declaration order is q then p; the suffix order is always sorted
        assert_eq!(sharded_schema().split_columns(), ["p", "q"]);
    }

    #[test]
    fn test_column_names_excludes_complex() {
        let schema = TableSchema::new(
            "users",
            Dialect::MySql,
            vec![
                varchar("username", 32).primary().build(),
                varchar("password", 64).complex().build(),
            ],
        )
        .unwrap();
        assert_eq!(schema.column_names(true), ["username", "password"]);
        assert_eq!(schema.column_names(false), ["username"]);
        assert_eq!(schema.complex_column_names(), ["password"]);
    }

    #[test]
    fn test_identity_promoted_to_primary_mysql() {
        let schema = TableSchema::new(
            "test",
            Dialect::MySql,
            vec![integer("id").auto_increment().build()],
        )
        .unwrap();
        assert_eq!(schema.primary_columns(), ["id"]);
        assert_eq!(schema.key_column(), None);
        assert_eq!(
            schema.create_sql(),
            "CREATE TABLE IF NOT EXISTS test (\nid INT NOT NULL PRIMARY KEY AUTO_INCREMENT\n)"
        );
    }

    #[test]
    fn test_identity_with_explicit_primary_mysql() {
        let schema = TableSchema::new(
            "test",
            Dialect::MySql,
            vec![
                integer("id").auto_increment().key().build(),
                varchar("a", 32).primary().build(),
                varchar("b", 32).primary().build(),
            ],
        )
        .unwrap();
        assert_eq!(schema.primary_columns(), ["a", "b"]);
        assert_eq!(schema.key_column(), Some("id"));
        assert_eq!(
            schema.create_sql(),
            "CREATE TABLE IF NOT EXISTS test (\n\
             id INT NOT NULL AUTO_INCREMENT,\n\
             a VARCHAR(32) NOT NULL,\n\
             b VARCHAR(32) NOT NULL,\n\
             PRIMARY KEY (a,b),\n\
             KEY id (id)\n)"
        );
    }

    #[test]
    fn test_identity_with_explicit_primary_sqlite_rejected() {
        let err = TableSchema::new(
            "test",
            Dialect::Sqlite,
            vec![
                integer("id").auto_increment().build(),
                varchar("a", 32).primary().build(),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::AutoIncrementConflict { .. }));
    }

    #[test]
    fn test_identity_rewritten_sqlite() {
        let schema = TableSchema::new(
            "test",
            Dialect::Sqlite,
            vec![integer("id").auto_increment().build()],
        )
        .unwrap();
        assert_eq!(schema.primary_columns(), ["id"]);
        assert_eq!(
            schema.create_sql(),
            "CREATE TABLE IF NOT EXISTS test (\nid INTEGER PRIMARY KEY\n)"
        );
    }

    #[test]
    fn test_create_sql_no_columns() {
        let schema = TableSchema::new("test", Dialect::MySql, vec![]).unwrap();
        assert_eq!(schema.create_sql(), "CREATE TABLE IF NOT EXISTS test (\n\n)");
    }

    #[test]
    fn test_create_sql_matches_primary_columns() {
        // the rendered DDL names exactly the primary key set the schema reports
        let schema = TableSchema::new(
            "test",
            Dialect::MySql,
            vec![
                varchar("a", 32).primary().build(),
                varchar("b", 32).primary().build(),
            ],
        )
        .unwrap();
        let ddl = schema.create_sql();
        assert!(ddl.contains(&format!("PRIMARY KEY ({})", schema.primary_columns().join(","))));
    }

    #[test]
    fn test_derived_column_groups() {
        let schema = TableSchema::new(
            "users",
            Dialect::MySql,
            vec![
                integer("id").auto_increment().key().build(),
                varchar("username", 32).not_null().primary().build(),
                integer("type").not_null().build(),
                json("attr").build(),
                varchar("region", 16).split().build(),
            ],
        )
        .unwrap();
        assert_eq!(schema.insert_columns(), ["username", "type", "attr", "region"]);
        assert_eq!(schema.update_columns(), ["username", "type", "attr"]);
        assert_eq!(schema.upsert_columns(), ["type", "attr"]);
        assert_eq!(schema.upsert_assignments(), "type=:type,attr=:attr");
        assert_eq!(schema.primary_where_format(), "username=:username");
    }

    #[test]
    fn test_target_name_without_split_columns() {
        let schema = TableSchema::new(
            "plain",
            Dialect::MySql,
            vec![varchar("name", 32).build()],
        )
        .unwrap();
        let filter = Filter::eq("name", "x");
        assert_eq!(schema.target_name(None).unwrap(), "plain");
        assert_eq!(schema.target_name(Some(&filter)).unwrap(), "plain");
    }

    #[test]
    fn test_target_name_with_split_columns() {
        let schema = sharded_schema();
        let filter = Filter::eq("p", 1).and(Filter::eq("q", "x"));
        assert_eq!(schema.target_name(Some(&filter)).unwrap(), "t_1_x");
    }

    #[test]
    fn test_target_name_deterministic() {
        let schema = sharded_schema();
        let filter = Filter::eq("q", "x").and(Filter::eq("p", 1));
        let first = schema.target_name(Some(&filter)).unwrap();
        let second = schema.target_name(Some(&filter)).unwrap();
        assert_eq!(first, "t_1_x");
        assert_eq!(first, second);
    }

    #[test]
    fn test_target_name_missing_column() {
        let schema = sharded_schema();
        let filter = Filter::eq("p", 1);
        let err = schema.target_name(Some(&filter)).unwrap_err();
        assert!(matches!(err, ComposeError::ShardColumnMissing { column } if column == "q"));
    }

    #[test]
    fn test_target_name_rejects_float_and_bytes() {
        let schema = sharded_schema();
        let filter = Filter::eq("p", 1.5).and(Filter::eq("q", "x"));
        assert!(matches!(
            schema.target_name(Some(&filter)).unwrap_err(),
            ComposeError::ShardValueNotDiscrete { .. }
        ));

        let filter = Filter::eq("p", 1).and(Filter::eq("q", SqlValue::Blob(vec![1])));
        assert!(matches!(
            schema.target_name(Some(&filter)).unwrap_err(),
            ComposeError::ShardValueNotDiscrete { .. }
        ));
    }
}
