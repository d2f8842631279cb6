//! Column schema derivation.
//!
//! One [`ColumnSchema`] describes one table column derived from one record
//! field. Columns are described at registration time, either through the
//! fluent [`ColumnBuilder`] or by parsing the compact
//! `name,type=...,primary,...` option-string form.

use crate::dialect::Dialect;

/// SQL function name for the current timestamp.
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

const DATETIME_TYPE: &str = "DATETIME";

/// Literal a text column falls back to when no usable value was given.
const EMPTY_TEXT_LITERAL: &str = "''";

/// Kind of value a record field holds, driving option-value parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Text values, including date-time text.
    Text,
    /// Integer values.
    Integer,
    /// Floating-point values.
    Float,
    /// Boolean values.
    Bool,
    /// Raw byte sequences.
    Bytes,
    /// Composite values stored as serialized blobs.
    Composite,
}

/// One table column derived from one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Storage identifier.
    pub name: String,
    /// External/serialization name.
    pub display_name: String,
    /// Free-form SQL type text, e.g. `VARCHAR(32)`.
    pub sql_type: String,
    /// Resolved DEFAULT expression text, when the option was present.
    pub default_expr: Option<String>,
    /// Resolved ON UPDATE expression text, when the option was present.
    pub on_update_expr: Option<String>,
    /// Column rejects NULL.
    pub not_null: bool,
    /// Column is part of the primary key.
    pub primary: bool,
    /// Column carries a unique constraint.
    pub unique: bool,
    /// Column carries a secondary index.
    pub key: bool,
    /// Column is an identity column.
    pub auto_increment: bool,
    /// Column is skipped on insert.
    pub not_insert: bool,
    /// Column is skipped on update.
    pub not_update: bool,
    /// Column holds a serialized blob, excluded from abbreviated listings.
    pub complex: bool,
    /// Column value selects the physical shard.
    pub split: bool,
}

impl ColumnSchema {
    /// Key attribute precedence: primary key > unique key > key.
    pub(crate) fn normalize_key_attrs(&mut self) {
        if self.primary {
            self.unique = false;
            self.key = false;

            // a primary key column cannot accept NULL values
            self.not_null = true;
            return;
        }

        if self.unique {
            self.key = false;
        }
    }

    /// Renders the column's DDL line for the given dialect.
    ///
    /// `inline_primary` is set when the table has exactly one primary
    /// column; composite primary keys render as a table-level constraint
    /// instead.
    pub(crate) fn ddl_line(&self, dialect: Dialect, inline_primary: bool) -> String {
        let mut line = format!("{} {}", self.name, self.sql_type);
        if self.not_null {
            line.push_str(" NOT NULL");
        }
        if let Some(expr) = &self.default_expr {
            if !expr.is_empty() {
                line.push_str(" DEFAULT ");
                line.push_str(expr);
            }
        }
        if dialect.supports_on_update() {
            if let Some(expr) = &self.on_update_expr {
                if !expr.is_empty() {
                    line.push_str(" ON UPDATE ");
                    line.push_str(expr);
                }
            }
        }
        if inline_primary && self.primary {
            line.push_str(" PRIMARY KEY");
        }
        if self.unique {
            line.push(' ');
            line.push_str(dialect.unique_keyword());
        }
        if dialect == Dialect::MySql && self.auto_increment {
            line.push(' ');
            line.push_str(dialect.auto_increment_keyword());
        }

        line
    }
}

/// Fluent builder for a [`ColumnSchema`].
///
/// Raw `default`/`on_update` option values are kept as given and resolved
/// into expression text by [`ColumnBuilder::build`], following the field's
/// [`ValueKind`].
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: String,
    display_name: Option<String>,
    sql_type: String,
    kind: ValueKind,
    default_raw: Option<String>,
    on_update_raw: Option<String>,
    not_null: bool,
    primary: bool,
    unique: bool,
    key: bool,
    auto_increment: bool,
    not_insert: bool,
    not_update: bool,
    complex: bool,
    split: bool,
}

impl ColumnBuilder {
    /// Creates a builder with a storage name, SQL type text and value kind.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            sql_type: sql_type.into(),
            kind,
            default_raw: None,
            on_update_raw: None,
            not_null: false,
            primary: false,
            unique: false,
            key: false,
            auto_increment: false,
            not_insert: false,
            not_update: false,
            complex: false,
            split: false,
        }
    }

    /// Parses the compact option-string form of a field description.
    ///
    /// The first comma-separated segment is the storage name (empty falls
    /// back to `field_name`, `-` excludes the field and yields `None`).
    /// Remaining segments are `key=value` options or bare flags; a bare
    /// flag, `=true` or an empty value switches the flag on. Unknown
    /// options are ignored.
    #[must_use]
    pub fn from_tag(field_name: &str, display_name: &str, kind: ValueKind, tag: &str) -> Option<Self> {
        let mut parts = tag.split(',');
        let name_part = parts.next().unwrap_or("");
        if name_part == "-" {
            return None;
        }
        let name = if name_part.is_empty() { field_name } else { name_part };
        let mut builder = Self::new(name, "", kind).display_name(display_name);

        for option in parts {
            let (option_key, value) = match option.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (option, None),
            };
            let on = matches!(value, None | Some("true") | Some(""));
            match option_key {
                "type" => builder.sql_type = value.unwrap_or("").to_string(),
                "default" => builder.default_raw = Some(value.unwrap_or("").to_string()),
                "on_update" => builder.on_update_raw = Some(value.unwrap_or("").to_string()),
                "primary" => builder.primary = on,
                "unique" => builder.unique = on,
                "key" => builder.key = on,
                "auto_increment" => builder.auto_increment = on,
                "not_null" => builder.not_null = on,
                "not_insert" => builder.not_insert = on,
                "not_update" => builder.not_update = on,
                "complex" => builder.complex = on,
                "split" => builder.split = on,
                _ => {}
            }
        }

        Some(builder)
    }

    /// Sets the external/serialization name.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Marks the column UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column as a secondary index.
    #[must_use]
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Marks the column as an identity column.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Excludes the column from insert statements.
    #[must_use]
    pub fn not_insert(mut self) -> Self {
        self.not_insert = true;
        self
    }

    /// Excludes the column from update statements.
    #[must_use]
    pub fn not_update(mut self) -> Self {
        self.not_update = true;
        self
    }

    /// Marks the column as a serialized blob column.
    #[must_use]
    pub fn complex(mut self) -> Self {
        self.complex = true;
        self
    }

    /// Marks the column as a shard selector.
    #[must_use]
    pub fn split(mut self) -> Self {
        self.split = true;
        self
    }

    /// Sets the raw `default` option value.
    #[must_use]
    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default_raw = Some(raw.into());
        self
    }

    /// Sets the raw `on_update` option value.
    #[must_use]
    pub fn on_update(mut self, raw: impl Into<String>) -> Self {
        self.on_update_raw = Some(raw.into());
        self
    }

    /// Resolves option values and builds the column.
    #[must_use]
    pub fn build(self) -> ColumnSchema {
        let default_expr = self
            .default_raw
            .as_deref()
            .map(|raw| resolve_value_expr(self.kind, &self.sql_type, raw));

        let mut on_update_expr = self
            .on_update_raw
            .as_deref()
            .map(|raw| resolve_value_expr(self.kind, &self.sql_type, raw));
        // an absent on-update expression falls back to the column default
        let needs_fallback = matches!(
            &on_update_expr,
            Some(expr) if expr.is_empty() || expr == EMPTY_TEXT_LITERAL
        );
        if needs_fallback {
            if let Some(default) = &default_expr {
                on_update_expr = Some(default.clone());
            }
        }

        let display_name = self.display_name.unwrap_or_else(|| self.name.clone());
        let mut column = ColumnSchema {
            name: self.name,
            display_name,
            sql_type: self.sql_type,
            default_expr,
            on_update_expr,
            not_null: self.not_null,
            primary: self.primary,
            unique: self.unique,
            key: self.key,
            auto_increment: self.auto_increment,
            not_insert: self.not_insert,
            not_update: self.not_update,
            complex: self.complex,
            split: self.split,
        };
        column.normalize_key_attrs();
        column
    }
}

/// Resolves a raw option value into SQL expression text.
fn resolve_value_expr(kind: ValueKind, sql_type: &str, raw: &str) -> String {
    match kind {
        ValueKind::Integer | ValueKind::Float | ValueKind::Bool => {
            if raw.is_empty() {
                String::from("0")
            } else {
                raw.to_string()
            }
        }
        ValueKind::Text => {
            if sql_type.eq_ignore_ascii_case(DATETIME_TYPE) {
                if raw.eq_ignore_ascii_case(CURRENT_TIMESTAMP) {
                    String::from(CURRENT_TIMESTAMP)
                } else {
                    String::from(EMPTY_TEXT_LITERAL)
                }
            } else if raw.is_empty() {
                String::from(EMPTY_TEXT_LITERAL)
            } else {
                format!("'{raw}'")
            }
        }
        ValueKind::Bytes | ValueKind::Composite => String::new(),
    }
}

// =============================================================================
// Shorthand constructors for common column types
// =============================================================================

/// Creates an INT column builder.
#[must_use]
pub fn integer(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "INT", ValueKind::Integer)
}

/// Creates a BIGINT column builder.
#[must_use]
pub fn bigint(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "BIGINT", ValueKind::Integer)
}

/// Creates a DOUBLE column builder.
#[must_use]
pub fn double(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "DOUBLE", ValueKind::Float)
}

/// Creates a BOOLEAN column builder.
#[must_use]
pub fn boolean(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "BOOLEAN", ValueKind::Bool)
}

/// Creates a VARCHAR column builder.
#[must_use]
pub fn varchar(name: impl Into<String>, len: u32) -> ColumnBuilder {
    ColumnBuilder::new(name, format!("VARCHAR({len})"), ValueKind::Text)
}

/// Creates a TEXT column builder.
#[must_use]
pub fn text(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "TEXT", ValueKind::Text)
}

/// Creates a DATETIME column builder.
#[must_use]
pub fn datetime(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "DATETIME", ValueKind::Text)
}

/// Creates a BLOB column builder.
#[must_use]
pub fn blob(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "BLOB", ValueKind::Bytes)
}

/// Creates a TEXT column builder for a serialized composite value.
#[must_use]
pub fn json(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, "TEXT", ValueKind::Composite)
}
