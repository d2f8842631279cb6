//! Predicate algebra for WHERE clauses.
//!
//! A [`Filter`] is a plain value that renders itself into a [`SqlWhere`]
//! (format text with named placeholders plus bindings) or fails. The
//! variant set is closed; each variant has exactly one render arm, so a
//! new variant cannot be added without extending the match.

use crate::error::{ComposeError, Result};
use crate::record::Record;
use crate::value::{Bindings, SqlValue, ToSqlValue};

/// Placeholder pair for the caller-supplied join rewrite.
///
/// Purely textual: the statement composer substitutes the origin
/// placeholder with the base table name and the temp placeholder with the
/// query alias. The engine never interprets the join itself; this is a
/// deliberate, narrow side-channel rather than relational join support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRewrite {
    /// Placeholder standing in for the original table name.
    pub origin_placeholder: String,
    /// Placeholder standing in for the temporary table alias.
    pub temp_placeholder: String,
}

/// Render target of one predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlWhere {
    /// Boolean expression text with named `:placeholder` parameters.
    pub format: String,
    /// Placeholder name to bound value.
    pub bindings: Bindings,
    /// Optional join rewrite side-channel.
    pub join: Option<JoinRewrite>,
}

/// A composable row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Equality per entry, entries joined by AND.
    Selector(Bindings),
    /// Substring match: `key LIKE :key`.
    Like {
        /// Column to match.
        key: String,
        /// LIKE pattern.
        value: String,
    },
    /// Range check: `col BETWEEN :colS AND :colE`.
    Between {
        /// Column to range over.
        col: String,
        /// Lower bound; must not be NULL.
        from: SqlValue,
        /// Upper bound; must not be NULL.
        to: SqlValue,
    },
    /// Disjunction over inline-rendered values: `col=v1 OR col=v2 ...`.
    ValueList {
        /// Column to compare.
        col: String,
        /// Values, rendered inline rather than bound.
        values: Vec<SqlValue>,
    },
    /// JSON sub-key equality over a serialized column.
    JsonProbe {
        /// JSON-valued column.
        col: String,
        /// Sub-key to expected value; empty probes for a null/empty object.
        entries: Bindings,
    },
    /// Raw escape hatch, optionally carrying join placeholders.
    Raw {
        /// Pre-rendered boolean expression text.
        format: String,
        /// Bindings referenced by the format.
        bindings: Bindings,
        /// Join rewrite side-channel.
        join: Option<JoinRewrite>,
    },
    /// Conjunction, folded left-to-right.
    And(Vec<Filter>),
}

impl Filter {
    /// Creates a single-column equality filter.
    #[must_use]
    pub fn eq(column: &str, value: impl ToSqlValue) -> Self {
        let mut entries = Bindings::new();
        entries.insert(column.to_string(), value.to_sql_value());
        Self::Selector(entries)
    }

    /// Creates an equality-set filter from prepared bindings.
    #[must_use]
    pub fn selector(entries: Bindings) -> Self {
        Self::Selector(entries)
    }

    /// Creates a LIKE filter.
    #[must_use]
    pub fn like(key: &str, value: &str) -> Self {
        Self::Like {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Creates a BETWEEN filter.
    #[must_use]
    pub fn between(col: &str, from: impl ToSqlValue, to: impl ToSqlValue) -> Self {
        Self::Between {
            col: col.to_string(),
            from: from.to_sql_value(),
            to: to.to_sql_value(),
        }
    }

    /// Creates a value-list filter.
    #[must_use]
    pub fn value_list<T: ToSqlValue>(col: &str, values: Vec<T>) -> Self {
        Self::ValueList {
            col: col.to_string(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
        }
    }

    /// Creates a JSON sub-key equality filter.
    #[must_use]
    pub fn json_probe(col: &str, entries: Bindings) -> Self {
        Self::JsonProbe {
            col: col.to_string(),
            entries,
        }
    }

    /// Creates a raw filter from pre-rendered format text.
    #[must_use]
    pub fn raw(format: &str, bindings: Bindings) -> Self {
        Self::Raw {
            format: format.to_string(),
            bindings,
            join: None,
        }
    }

    /// Creates a raw filter carrying join placeholders.
    #[must_use]
    pub fn raw_join(
        format: &str,
        bindings: Bindings,
        origin_placeholder: &str,
        temp_placeholder: &str,
    ) -> Self {
        Self::Raw {
            format: format.to_string(),
            bindings,
            join: Some(JoinRewrite {
                origin_placeholder: origin_placeholder.to_string(),
                temp_placeholder: temp_placeholder.to_string(),
            }),
        }
    }

    /// Combines this filter with another by AND.
    #[must_use]
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Self::And(mut filters) => {
                filters.push(other);
                Self::And(filters)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Folds a list of filters into one conjunction.
    #[must_use]
    pub fn all(filters: Vec<Filter>) -> Filter {
        Self::And(filters)
    }

    /// Derives an equality-set filter from a record's current values.
    ///
    /// Values are taken per column storage name; fields the record does not
    /// expose are skipped. Composite fields arrive as their canonical JSON
    /// text (see [`crate::record::json_field`]); serialization failures
    /// surface here.
    pub fn from_record<R: Record>(record: &R, columns: &[String]) -> Result<Self> {
        let mut entries = Bindings::new();
        for column in columns {
            if let Some(value) = record.field_value(column)? {
                entries.insert(column.clone(), value);
            }
        }
        Ok(Self::Selector(entries))
    }

    /// Renders the filter. `Ok(None)` means "no constraint".
    pub fn render(&self) -> Result<Option<SqlWhere>> {
        match self {
            Self::Selector(entries) => render_selector(entries),
            Self::Like { key, value } => render_like(key, value),
            Self::Between { col, from, to } => render_between(col, from, to),
            Self::ValueList { col, values } => render_value_list(col, values),
            Self::JsonProbe { col, entries } => render_json_probe(col, entries),
            Self::Raw {
                format,
                bindings,
                join,
            } => Ok(Some(SqlWhere {
                format: format.clone(),
                bindings: bindings.clone(),
                join: join.clone(),
            })),
            Self::And(filters) => render_and(filters),
        }
    }
}

fn render_selector(entries: &Bindings) -> Result<Option<SqlWhere>> {
    if entries.is_empty() {
        return Ok(None);
    }
    let format = entries
        .keys()
        .map(|k| format!("{k}=:{k}"))
        .collect::<Vec<_>>()
        .join(" AND ");
    Ok(Some(SqlWhere {
        format,
        bindings: entries.clone(),
        join: None,
    }))
}

fn render_like(key: &str, value: &str) -> Result<Option<SqlWhere>> {
    if key.is_empty() || value.is_empty() {
        return Err(ComposeError::LikeFilterIncomplete);
    }
    let mut bindings = Bindings::new();
    bindings.insert(key.to_string(), SqlValue::Text(value.to_string()));
    Ok(Some(SqlWhere {
        format: format!("{key} LIKE :{key}"),
        bindings,
        join: None,
    }))
}

fn render_between(col: &str, from: &SqlValue, to: &SqlValue) -> Result<Option<SqlWhere>> {
    if col.is_empty() {
        return Err(ComposeError::RangeFilterMissingColumn);
    }
    if *from == SqlValue::Null || *to == SqlValue::Null {
        return Err(ComposeError::RangeFilterMissingBound {
            column: col.to_string(),
        });
    }

    let from_key = format!("{col}S");
    let to_key = format!("{col}E");
    let format = format!("{col} BETWEEN :{from_key} AND :{to_key}");
    let mut bindings = Bindings::new();
    bindings.insert(from_key, from.clone());
    bindings.insert(to_key, to.clone());
    Ok(Some(SqlWhere {
        format,
        bindings,
        join: None,
    }))
}

fn render_value_list(col: &str, values: &[SqlValue]) -> Result<Option<SqlWhere>> {
    if col.is_empty() {
        return Err(ComposeError::ListFilterMissingColumn);
    }
    if values.is_empty() {
        return Err(ComposeError::ListFilterEmpty {
            column: col.to_string(),
        });
    }

    let format = values
        .iter()
        .map(|v| format!("{col}={}", v.list_text()))
        .collect::<Vec<_>>()
        .join(" OR ");
    Ok(Some(SqlWhere {
        format,
        bindings: Bindings::new(),
        join: None,
    }))
}

fn render_json_probe(col: &str, entries: &Bindings) -> Result<Option<SqlWhere>> {
    if col.is_empty() {
        return Err(ComposeError::JsonFilterMissingColumn);
    }
    if entries.is_empty() {
        return Ok(Some(SqlWhere {
            format: format!("({col}='{{}}' OR {col}=NULL)"),
            bindings: Bindings::new(),
            join: None,
        }));
    }

    let mut parts = Vec::with_capacity(entries.len());
    let mut bindings = Bindings::new();
    for (sub_key, value) in entries {
        let pattern = format!("{col}_{sub_key}");
        parts.push(format!("JSON_EXTRACT({col}, \"$.{sub_key}\")=:{pattern}"));
        bindings.insert(pattern, value.clone());
    }
    Ok(Some(SqlWhere {
        format: parts.join(" AND "),
        bindings,
        join: None,
    }))
}

fn render_and(filters: &[Filter]) -> Result<Option<SqlWhere>> {
    let mut combined: Option<SqlWhere> = None;
    for filter in filters {
        let Some(part) = filter.render()? else {
            continue;
        };
        match combined.as_mut() {
            None => combined = Some(part),
            Some(acc) => {
                if part.join.is_some() && acc.join.is_some() {
                    return Err(ComposeError::JoinNotCombinable);
                }
                if acc.format.is_empty() {
                    acc.format = part.format;
                } else if !part.format.is_empty() {
                    acc.format.push_str(" AND (");
                    acc.format.push_str(&part.format);
                    acc.format.push(')');
                }
                acc.bindings.extend(part.bindings);
                if part.join.is_some() {
                    acc.join = part.join;
                }
            }
        }
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(filter: &Filter) -> SqlWhere {
        filter.render().unwrap().unwrap()
    }

    #[test]
    fn test_selector_empty_is_no_filter() {
        assert_eq!(Filter::Selector(Bindings::new()).render().unwrap(), None);
    }

    #[test]
    fn test_selector_single() {
        let where_ = rendered(&Filter::eq("a", 123));
        assert_eq!(where_.format, "a=:a");
        assert_eq!(where_.bindings.get("a"), Some(&SqlValue::Int(123)));
        assert!(where_.join.is_none());
    }

    #[test]
    fn test_selector_order_is_deterministic() {
        let mut entries = Bindings::new();
        entries.insert("b".into(), SqlValue::Int(2));
        entries.insert("a".into(), SqlValue::Int(1));
        let where_ = rendered(&Filter::selector(entries));
        assert_eq!(where_.format, "a=:a AND b=:b");
    }

    #[test]
    fn test_like() {
        let where_ = rendered(&Filter::like("a", "%abcd_"));
        assert_eq!(where_.format, "a LIKE :a");
        assert_eq!(
            where_.bindings.get("a"),
            Some(&SqlValue::Text(String::from("%abcd_")))
        );
    }

    #[test]
    fn test_like_contract() {
        assert!(Filter::like("", "%x").render().is_err());
        assert!(Filter::like("a", "").render().is_err());
    }

    #[test]
    fn test_between() {
        let where_ = rendered(&Filter::between("a", 123, 456));
        assert_eq!(where_.format, "a BETWEEN :aS AND :aE");
        assert_eq!(where_.bindings.get("aS"), Some(&SqlValue::Int(123)));
        assert_eq!(where_.bindings.get("aE"), Some(&SqlValue::Int(456)));
    }

    #[test]
    fn test_between_contract() {
        assert!(Filter::between("", 1, 2).render().is_err());
        assert!(Filter::between("a", SqlValue::Null, SqlValue::Int(2)).render().is_err());
        assert!(Filter::between("a", SqlValue::Int(1), SqlValue::Null).render().is_err());
    }

    #[test]
    fn test_value_list_strings() {
        let where_ = rendered(&Filter::value_list("abc", vec!["abc", "def"]));
        assert_eq!(where_.format, "abc='abc' OR abc='def'");
        assert!(where_.bindings.is_empty());
    }

    #[test]
    fn test_value_list_numbers() {
        let filter = Filter::ValueList {
            col: String::from("abc"),
            values: vec![SqlValue::Int(123), SqlValue::Float(456.123)],
        };
        assert_eq!(rendered(&filter).format, "abc=123 OR abc=456.123");
    }

    #[test]
    fn test_value_list_contract() {
        assert!(Filter::value_list::<i64>("", vec![]).render().is_err());
        assert!(Filter::value_list::<i64>("abc", vec![]).render().is_err());
    }

    #[test]
    fn test_json_probe_empty_is_existence_check() {
        let where_ = rendered(&Filter::json_probe("a", Bindings::new()));
        assert_eq!(where_.format, "(a='{}' OR a=NULL)");
        assert!(where_.bindings.is_empty());
    }

    #[test]
    fn test_json_probe_filled() {
        let mut entries = Bindings::new();
        entries.insert("a".into(), SqlValue::Int(123));
        let where_ = rendered(&Filter::json_probe("h", entries));
        assert_eq!(where_.format, "JSON_EXTRACT(h, \"$.a\")=:h_a");
        assert_eq!(where_.bindings.get("h_a"), Some(&SqlValue::Int(123)));
    }

    #[test]
    fn test_json_probe_contract() {
        assert!(Filter::json_probe("", Bindings::new()).render().is_err());
    }

    #[test]
    fn test_and_empty_is_no_filter() {
        assert_eq!(Filter::And(vec![]).render().unwrap(), None);
    }

    #[test]
    fn test_and_skips_empty_members() {
        let filter = Filter::all(vec![
            Filter::eq("a", 123),
            Filter::Selector(Bindings::new()),
        ]);
        let where_ = rendered(&filter);
        assert_eq!(where_.format, "a=:a");
        assert_eq!(where_.bindings.len(), 1);
    }

    #[test]
    fn test_and_two_members() {
        let filter = Filter::eq("a", 123).and(Filter::eq("b", 456));
        let where_ = rendered(&filter);
        assert_eq!(where_.format, "a=:a AND (b=:b)");
        assert_eq!(where_.bindings.len(), 2);
    }

    #[test]
    fn test_and_is_associative() {
        let left = Filter::eq("a", 1).and(Filter::eq("b", 2)).and(Filter::eq("c", 3));
        let right = Filter::all(vec![
            Filter::eq("a", 1),
            Filter::all(vec![Filter::eq("b", 2), Filter::eq("c", 3)]),
        ]);
        let left_where = rendered(&left);
        let right_where = rendered(&right);
        assert_eq!(left_where.bindings, right_where.bindings);
        assert_eq!(left_where.format, "a=:a AND (b=:b) AND (c=:c)");
        assert_eq!(right_where.format, "a=:a AND (b=:b AND (c=:c))");
    }

    #[test]
    fn test_and_propagates_single_join() {
        let filter = Filter::eq("a", 1).and(Filter::raw_join("j=:j", Bindings::new(), "oooo", "tttt"));
        let where_ = rendered(&filter);
        assert_eq!(where_.format, "a=:a AND (j=:j)");
        assert!(where_.join.is_some());
    }

    #[test]
    fn test_and_rejects_two_joins() {
        let filter = Filter::all(vec![
            Filter::raw_join("x=:x", Bindings::new(), "o1", "t1"),
            Filter::raw_join("y=:y", Bindings::new(), "o2", "t2"),
        ]);
        assert!(matches!(
            filter.render().unwrap_err(),
            ComposeError::JoinNotCombinable
        ));
    }

    #[test]
    fn test_and_propagates_member_error() {
        let filter = Filter::eq("a", 1).and(Filter::like("", ""));
        assert!(filter.render().is_err());
    }

    #[test]
    fn test_render_is_idempotent() {
        let filter = Filter::eq("a", 1)
            .and(Filter::between("b", 2, 3))
            .and(Filter::value_list("c", vec!["x", "y"]));
        assert_eq!(filter.render().unwrap(), filter.render().unwrap());
    }
}
