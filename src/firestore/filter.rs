//! Filter expressions for structured queries

use serde::Serialize;

use super::types::Value;

/// Operator of a field filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOperator {
    Equal,
}

/// Reference to a document field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    pub field_path: String,
}

/// `field op value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFilter {
    pub field: FieldReference,
    pub op: FieldOperator,
    pub value: Value,
}

/// A query filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    FieldFilter(FieldFilter),
}

impl Filter {
    /// `field_path == value` on a string field
    pub fn equal(field_path: &str, value: &str) -> Self {
        Filter::FieldFilter(FieldFilter {
            field: FieldReference {
                field_path: field_path.to_string(),
            },
            op: FieldOperator::Equal,
            value: Value::from(value),
        })
    }
}
