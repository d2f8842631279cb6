//! Composing statements for a sharded record type.
//!
//! Run with: cargo run --example compose

use std::collections::BTreeMap;

use rowmap_core::{
    integer, json, json_field, row_i64, row_text, varchar, Bindings, ColumnSchema, ComposeError,
    Dialect, Filter, ListOptions, OrderBy, Record, Result, SqlValue, TableSchema,
};

/// A device reading, stored in one physical table per region.
#[derive(Debug, Clone)]
struct Reading {
    id: i64,
    device: String,
    region: String,
    payload: BTreeMap<String, i64>,
}

impl Record for Reading {
    fn columns() -> Vec<ColumnSchema> {
        vec![
            integer("id").auto_increment().key().build(),
            varchar("device", 64).not_null().primary().build(),
            varchar("region", 16).not_null().primary().split().build(),
            json("payload").complex().build(),
        ]
    }

    fn field_value(&self, column: &str) -> Result<Option<SqlValue>> {
        Ok(match column {
            "id" => Some(SqlValue::Int(self.id)),
            "device" => Some(SqlValue::Text(self.device.clone())),
            "region" => Some(SqlValue::Text(self.region.clone())),
            "payload" => Some(json_field("payload", &self.payload)?),
            _ => None,
        })
    }

    fn from_row(row: &Bindings) -> Result<Self> {
        Ok(Self {
            id: row_i64(row, "id")?,
            device: row_text(row, "device")?,
            region: row_text(row, "region")?,
            payload: serde_json::from_str(&row_text(row, "payload")?).map_err(|_| {
                ComposeError::RowTypeMismatch {
                    column: String::from("payload"),
                }
            })?,
        })
    }
}

fn main() -> Result<()> {
    let schema = TableSchema::new("readings", Dialect::MySql, Reading::columns())?;

    println!("-- create\n{}\n", schema.create_sql());

    let reading = Reading {
        id: 0,
        device: String::from("sensor-1"),
        region: String::from("eu"),
        payload: BTreeMap::from([(String::from("temp"), 21)]),
    };
    let insert = schema.insert_sql(&reading)?;
    println!("-- insert into {}\n{}\n", insert.table, insert.sql);

    let filter = Filter::eq("region", "eu").and(Filter::like("device", "sensor-%"));
    let options = ListOptions {
        order_by: Some(OrderBy::desc("device")),
        limit: Some(10),
        ..ListOptions::default()
    };
    let (query, bindings) = schema.select_sql(Some(&filter), &options)?;
    println!("-- select\n{query}\n-- bindings: {bindings:?}");

    Ok(())
}
