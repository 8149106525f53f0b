//! # Predicates
//!
//! Conditions a list or single-record query applies to a table. Each
//! predicate renders to a parameterized SQL fragment and can be evaluated
//! directly against an in-memory [`Row`].

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::Value;

use crate::schema::{is_zero_timestamp, zero_timestamp};
use crate::store::Row;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`
    Eq { column: String, value: Value },

    /// `column_1 LIKE pattern OR column_2 LIKE pattern ...`
    AnyLike { columns: Vec<String>, pattern: String },

    /// `column BETWEEN start AND end`, inclusive
    Between { column: String, start: u64, end: u64 },

    /// Soft-delete marker unset: zero timestamp or NULL
    NotDeleted { column: String },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Predicate::Eq {
            column: column.into(),
            value,
        }
    }

    /// Check whether a row satisfies this predicate
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::Eq { column, value } => row
                .get(column)
                .map(|v| values_equal(v, value))
                .unwrap_or(false),
            Predicate::AnyLike { columns, pattern } => columns.iter().any(|column| {
                row.get(column)
                    .and_then(like_subject)
                    .map(|subject| like_match(&subject, pattern))
                    .unwrap_or(false)
            }),
            Predicate::Between { column, start, end } => row
                .get(column)
                .and_then(Value::as_u64)
                .map(|v| (*start..=*end).contains(&v))
                .unwrap_or(false),
            Predicate::NotDeleted { column } => match row.get(column) {
                None | Some(Value::Null) => true,
                Some(v) => is_zero_timestamp(v),
            },
        }
    }

    /// Append this predicate's SQL to `sql`, pushing bound values onto `params`
    pub fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Predicate::Eq { column, value } => {
                sql.push_str(&format!("{} = ?", quote(column)));
                params.push(value.clone());
            }
            Predicate::AnyLike { columns, pattern } => {
                let clauses: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} LIKE ?", quote(c)))
                    .collect();
                sql.push_str(&format!("({})", clauses.join(" OR ")));
                params.extend(columns.iter().map(|_| Value::String(pattern.clone())));
            }
            Predicate::Between { column, start, end } => {
                sql.push_str(&format!("{} BETWEEN ? AND ?", quote(column)));
                params.push(Value::from(*start));
                params.push(Value::from(*end));
            }
            Predicate::NotDeleted { column } => {
                let column = quote(column);
                sql.push_str(&format!("({column} = ? OR {column} IS NULL)"));
                params.push(zero_timestamp());
            }
        }
    }
}

/// Quote an identifier for SQL
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Equality that treats numerically equal numbers and identical instants as equal
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => {
            x == y
                || matches!(
                    (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)),
                    (Ok(l), Ok(r)) if l == r
                )
        }
        _ => a == b,
    }
}

/// Total order used for sorting rows by a column
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(l), Ok(r)) => l.cmp(&r),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn like_subject(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Case-sensitive SQL LIKE: `%` matches any run, `_` matches one character
fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut v, mut p) = (0, 0);
    // pattern index after the last `%` and the value index it resumes from
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                backtrack = Some((p, v));
            }
            Some('_') => {
                p += 1;
                v += 1;
            }
            Some(c) if *c == value[v] => {
                p += 1;
                v += 1;
            }
            _ => match backtrack {
                Some((bp, bv)) => {
                    p = bp;
                    v = bv + 1;
                    backtrack = Some((bp, bv + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[test]
    fn test_eq_predicate() {
        let predicate = Predicate::eq("age", json!(30));
        assert!(predicate.matches(&row(json!({"age": 30}))));
        assert!(predicate.matches(&row(json!({"age": 30.0}))));
        assert!(!predicate.matches(&row(json!({"age": 31}))));
        assert!(!predicate.matches(&row(json!({"name": "x"}))));
    }

    #[test]
    fn test_eq_on_instants() {
        let predicate = Predicate::eq("at", json!("2024-01-01T08:00:00+08:00"));
        assert!(predicate.matches(&row(json!({"at": "2024-01-01T00:00:00Z"}))));
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("Johnson", "%son"));
        assert!(like_match("Johnson", "%hns%"));
        assert!(like_match("Johnson", "J_hn%"));
        assert!(like_match("abc", "%%abc%"));
        assert!(!like_match("Johnson", "%SON"));
        assert!(!like_match("Smith", "%son"));
        assert!(like_match("", "%"));
        assert!(!like_match("", "_"));
    }

    #[test]
    fn test_any_like_ors_columns() {
        let predicate = Predicate::AnyLike {
            columns: vec!["name".to_string(), "desc".to_string()],
            pattern: "%ada%".to_string(),
        };
        assert!(predicate.matches(&row(json!({"name": "x", "desc": "lovelace ada"}))));
        assert!(!predicate.matches(&row(json!({"name": "x", "desc": "y"}))));
    }

    #[test]
    fn test_not_deleted() {
        let predicate = Predicate::NotDeleted {
            column: "deleted_at".to_string(),
        };
        assert!(predicate.matches(&row(json!({"deleted_at": null}))));
        assert!(predicate.matches(&row(json!({"deleted_at": "1970-01-01T00:00:00Z"}))));
        assert!(!predicate.matches(&row(json!({"deleted_at": "2024-05-01T00:00:00Z"}))));
    }

    #[test]
    fn test_between_inclusive() {
        let predicate = Predicate::Between {
            column: "id".to_string(),
            start: 0,
            end: 40,
        };
        assert!(predicate.matches(&row(json!({"id": 40}))));
        assert!(!predicate.matches(&row(json!({"id": 41}))));
    }

    #[test]
    fn test_render() {
        let mut sql = String::new();
        let mut params = Vec::new();
        Predicate::AnyLike {
            columns: vec!["name".to_string(), "desc".to_string()],
            pattern: "%a%".to_string(),
        }
        .render(&mut sql, &mut params);
        assert_eq!(sql, "(\"name\" LIKE ? OR \"desc\" LIKE ?)");
        assert_eq!(params, vec![json!("%a%"), json!("%a%")]);
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
        assert_eq!(compare_values(None, Some(&json!(1))), Ordering::Less);
    }
}
