// Id-keyed record trait shared by tasks and categories

use std::collections::HashMap;

/// Core trait for anything that lives in an id-keyed collection
pub trait Record: Clone {
    /// Unique identifier within its collection
    fn id(&self) -> i64;

    /// Collection name for this record type (e.g., "tasks", "categories")
    /// Used in log output
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Fields that export filters can match on
    /// Return empty HashMap if the record is not filterable
    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::new()
    }
}

/// Value types that filters can compare against
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexValue::String(s) => write!(f, "{}", s),
            IndexValue::Int(i) => write!(f, "{}", i),
            IndexValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl std::str::FromStr for IndexValue {
    type Err = std::convert::Infallible;

    /// Integers and booleans are recognised, anything else is a string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(IndexValue::Int(i));
        }
        match s {
            "true" => Ok(IndexValue::Bool(true)),
            "false" => Ok(IndexValue::Bool(false)),
            _ => Ok(IndexValue::String(s.to_string())),
        }
    }
}
