// Export selection filters for id-keyed records

use crate::record::{IndexValue, Record};
use eyre::{Result, eyre};
use std::cmp::Ordering;

/// Filter for selecting records
#[derive(Debug, Clone)]
pub struct Filter {
    /// Field name to filter on
    pub field: String,
    /// Comparison operator
    pub op: FilterOp,
    /// Value to compare against
    pub value: IndexValue,
}

/// Comparison operators for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,       // =
    Ne,       // !=
    Gt,       // >
    Lt,       // <
    Gte,      // >=
    Lte,      // <=
    Contains, // ~ (case-insensitive substring)
}

impl FilterOp {
    // Two-character operators first so `>=` never parses as `>`
    const TOKENS: [(&'static str, FilterOp); 7] = [
        (">=", FilterOp::Gte),
        ("<=", FilterOp::Lte),
        ("!=", FilterOp::Ne),
        ("~", FilterOp::Contains),
        ("=", FilterOp::Eq),
        (">", FilterOp::Gt),
        ("<", FilterOp::Lt),
    ];
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterOp::Eq => write!(f, "="),
            FilterOp::Ne => write!(f, "!="),
            FilterOp::Gt => write!(f, ">"),
            FilterOp::Lt => write!(f, "<"),
            FilterOp::Gte => write!(f, ">="),
            FilterOp::Lte => write!(f, "<="),
            FilterOp::Contains => write!(f, "~"),
        }
    }
}

impl Filter {
    /// Parse an expression such as `name~milk`, `id>=3` or `done=true`
    pub fn parse(expr: &str) -> Result<Self> {
        let (pos, token, op) = FilterOp::TOKENS
            .iter()
            .filter_map(|(token, op)| expr.find(token).map(|pos| (pos, *token, *op)))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())))
            .ok_or_else(|| eyre!("Invalid filter: {} (expected <field><op><value>)", expr))?;

        let field = expr[..pos].trim();
        let raw_value = expr[pos + token.len()..].trim();
        Self::validate_field_name(field)?;

        let value = match op {
            // Substring matches always compare text
            FilterOp::Contains => IndexValue::String(raw_value.to_string()),
            _ => raw_value.parse().unwrap_or(IndexValue::String(raw_value.to_string())),
        };

        Ok(Self {
            field: field.to_string(),
            op,
            value,
        })
    }

    /// Whether the record satisfies this filter
    ///
    /// A record without the field never matches, and neither does a value of a
    /// different type (except `~`, which compares the textual form).
    pub fn matches<T: Record>(&self, record: &T) -> bool {
        let fields = record.indexed_fields();
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };

        if self.op == FilterOp::Contains {
            let needle = self.value.to_string().to_lowercase();
            return actual.to_string().to_lowercase().contains(&needle);
        }

        let ordering = match (actual, &self.value) {
            (IndexValue::String(a), IndexValue::String(b)) => a.cmp(b),
            (IndexValue::Int(a), IndexValue::Int(b)) => a.cmp(b),
            (IndexValue::Bool(a), IndexValue::Bool(b)) => a.cmp(b),
            _ => return false,
        };

        match self.op {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Ne => ordering != Ordering::Equal,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
            FilterOp::Contains => unreachable!("handled above"),
        }
    }

    fn validate_field_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(eyre!("Field name cannot be empty"));
        }
        if name.len() > 64 {
            return Err(eyre!("Field name too long: {} (max 64 chars)", name));
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(eyre!("Invalid field name: {} (must be alphanumeric with _)", name));
        }
        Ok(())
    }
}

/// Keep records matching every filter, in collection order
pub fn apply<'a, T: Record>(records: &'a [T], filters: &[Filter]) -> Vec<&'a T> {
    records
        .iter()
        .filter(|record| filters.iter().all(|f| f.matches(*record)))
        .collect()
}
