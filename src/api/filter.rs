//! Row filters for table reads and writes.
//!
//! Only equality and inequality on a single column are needed; the
//! backend encodes them as `column=eq.value` / `column=neq.value` query
//! pairs.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
}

impl Op {
    fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Neq => "neq",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: Op,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: impl fmt::Display) -> Self {
        Self {
            column: column.to_string(),
            op: Op::Eq,
            value: value.to_string(),
        }
    }

    pub fn neq(column: &str, value: impl fmt::Display) -> Self {
        Self {
            column: column.to_string(),
            op: Op::Neq,
            value: value.to_string(),
        }
    }

    /// Query-string pair in the backend's filter syntax.
    pub fn to_query_pair(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.op.as_str(), self.value),
        )
    }

    /// Whether a row satisfies this filter. Values are compared through
    /// their canonical text form so numeric and string ids line up.
    pub fn matches(&self, row: &crate::models::Row) -> bool {
        let cell = match row.get(&self.column) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return matches!(self.op, Op::Neq),
        };
        match self.op {
            Op::Eq => cell == self.value,
            Op::Neq => cell != self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filters_encode_as_backend_query_pairs() {
        assert_eq!(
            Filter::eq("id", 7).to_query_pair(),
            ("id".to_string(), "eq.7".to_string())
        );
        assert_eq!(
            Filter::neq("name", "Cotización").to_query_pair(),
            ("name".to_string(), "neq.Cotización".to_string())
        );
    }

    #[test]
    fn test_filter_matches_numeric_and_string_cells() {
        let row = json!({ "id": 7, "name": "Ana" });
        let row = row.as_object().unwrap();

        assert!(Filter::eq("id", 7).matches(row));
        assert!(!Filter::eq("id", 8).matches(row));
        assert!(Filter::eq("name", "Ana").matches(row));
        assert!(Filter::neq("name", "Luis").matches(row));
        // A missing column can only satisfy an inequality.
        assert!(!Filter::eq("missing", 1).matches(row));
        assert!(Filter::neq("missing", 1).matches(row));
    }
}
