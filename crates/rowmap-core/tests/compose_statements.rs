//! End-to-end composition tests: a registered record type driven through
//! schema derivation, filters and the statement composer.

use std::collections::BTreeMap;

use rowmap_core::{
    datetime, integer, json_field, row_i64, row_text, varchar, Bindings, ColumnBuilder,
    ColumnSchema, ComposeError, Dialect, Filter, ListOptions, Record, SqlValue, TableSchema,
    ValueKind,
};

/// An alert record split across per-project physical tables.
#[derive(Debug, Clone, Default, PartialEq)]
struct Alert {
    id: i64,
    project_id: i64,
    rule_id: i64,
    title: String,
    labels: BTreeMap<String, String>,
    createtime: String,
}

impl Record for Alert {
    fn columns() -> Vec<ColumnSchema> {
        vec![
            integer("id").auto_increment().key().build(),
            integer("projectId")
                .display_name("project_id")
                .not_null()
                .primary()
                .split()
                .build(),
            integer("ruleId")
                .display_name("rule_id")
                .not_null()
                .primary()
                .build(),
            varchar("title", 128).not_null().build(),
            rowmap_core::json("labels").complex().build(),
            datetime("createtime")
                .default_value("CURRENT_TIMESTAMP")
                .not_insert()
                .not_update()
                .build(),
        ]
    }

    fn field_value(&self, column: &str) -> rowmap_core::Result<Option<SqlValue>> {
        Ok(match column {
            "id" => Some(SqlValue::Int(self.id)),
            "projectId" => Some(SqlValue::Int(self.project_id)),
            "ruleId" => Some(SqlValue::Int(self.rule_id)),
            "title" => Some(SqlValue::Text(self.title.clone())),
            "labels" => Some(json_field("labels", &self.labels)?),
            "createtime" => Some(SqlValue::Text(self.createtime.clone())),
            _ => None,
        })
    }

    fn from_row(row: &Bindings) -> rowmap_core::Result<Self> {
        Ok(Self {
            id: row_i64(row, "id")?,
            project_id: row_i64(row, "projectId")?,
            rule_id: row_i64(row, "ruleId")?,
            title: row_text(row, "title")?,
            labels: serde_json::from_str(&row_text(row, "labels")?).map_err(|_| {
                ComposeError::RowTypeMismatch {
                    column: String::from("labels"),
                }
            })?,
            createtime: row_text(row, "createtime")?,
        })
    }
}

fn alert() -> Alert {
    Alert {
        id: 0,
        project_id: 7,
        rule_id: 3,
        title: String::from("cpu high"),
        labels: BTreeMap::new(),
        createtime: String::new(),
    }
}

fn schema() -> TableSchema {
    TableSchema::new("alerts", Dialect::MySql, Alert::columns()).unwrap()
}

#[test]
fn create_sql_renders_composite_primary_and_key_lines() {
    assert_eq!(
        schema().create_sql(),
        "CREATE TABLE IF NOT EXISTS alerts (\n\
         id INT NOT NULL AUTO_INCREMENT,\n\
         projectId INT NOT NULL,\n\
         ruleId INT NOT NULL,\n\
         title VARCHAR(128) NOT NULL,\n\
         labels TEXT,\n\
         createtime DATETIME DEFAULT CURRENT_TIMESTAMP,\n\
         PRIMARY KEY (projectId,ruleId),\n\
         KEY id (id)\n)"
    );
}

#[test]
fn insert_targets_the_project_shard() {
    let statement = schema().insert_sql(&alert()).unwrap();
    assert_eq!(statement.table, "alerts_7");
    assert_eq!(
        statement.sql,
        "INSERT INTO alerts_7 (projectId,ruleId,title,labels) \
         VALUES (:projectId,:ruleId,:title,:labels) \
         ON DUPLICATE KEY UPDATE title=:title,labels=:labels"
    );
}

#[test]
fn record_round_trips_through_a_row() {
    let source = alert();
    let mut row = source.bindings().unwrap();
    row.insert("createtime".into(), SqlValue::Text("2024-01-01 00:00:00".into()));
    let loaded = Alert::from_row(&row).unwrap();
    assert_eq!(loaded.project_id, source.project_id);
    assert_eq!(loaded.title, source.title);
    assert_eq!(loaded.createtime, "2024-01-01 00:00:00");
}

#[test]
fn select_excludes_complex_columns_by_default() {
    let filter = Filter::eq("projectId", 7);
    let (query, bindings) = schema().select_sql(Some(&filter), &ListOptions::default()).unwrap();
    assert_eq!(
        query.to_string(),
        "SELECT id, projectId, ruleId, title, createtime FROM alerts_7 \
         WHERE projectId=:projectId"
    );
    assert_eq!(bindings.get("projectId"), Some(&SqlValue::Int(7)));
}

#[test]
fn delete_requires_shard_binding() {
    let err = schema().delete_sql(&Filter::eq("ruleId", 3)).unwrap_err();
    assert!(matches!(err, ComposeError::ShardColumnMissing { column } if column == "projectId"));
}

#[test]
fn target_name_from_record_matches_filter_resolution() {
    let schema = schema();
    let by_record = schema.target_name_for(&alert()).unwrap();
    let filter = Filter::eq("projectId", 7);
    let by_filter = schema.target_name(Some(&filter)).unwrap();
    assert_eq!(by_record, "alerts_7");
    assert_eq!(by_record, by_filter);
}

#[test]
fn tag_form_matches_builder_form() {
    let tagged = ColumnBuilder::from_tag(
        "ProjectID",
        "project_id",
        ValueKind::Integer,
        "projectId,type=INT,not_null,primary,split",
    )
    .unwrap()
    .build();
    let built = integer("projectId")
        .display_name("project_id")
        .not_null()
        .primary()
        .split()
        .build();
    assert_eq!(tagged, built);
}
