// Task and category models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::record::{IndexValue, Record};

/// A user-created to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `datetime-local` value as entered, e.g. `2024-05-01T09:30`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    /// Unified emoji code, e.g. `1f4dd`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_save: Option<DateTime<Utc>>,
    /// Keys written by other versions of the app (`done`, `pinned`, `date`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            deadline: None,
            emoji: None,
            color: default_color(),
            category: None,
            last_save: None,
            extra: Map::new(),
        }
    }

    /// Categories attached to this task (empty when absent)
    pub fn categories(&self) -> &[Category] {
        self.category.as_deref().unwrap_or(&[])
    }
}

impl Record for Task {
    fn id(&self) -> i64 {
        self.id
    }

    fn collection_name() -> &'static str {
        "tasks"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), IndexValue::Int(self.id));
        fields.insert("name".to_string(), IndexValue::String(self.name.clone()));
        fields.insert("color".to_string(), IndexValue::String(self.color.clone()));
        fields.insert("has_deadline".to_string(), IndexValue::Bool(self.deadline.is_some()));
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), IndexValue::String(description.clone()));
        }
        if let Some(deadline) = &self.deadline {
            fields.insert("deadline".to_string(), IndexValue::String(deadline.clone()));
        }
        if let Some(emoji) = &self.emoji {
            fields.insert("emoji".to_string(), IndexValue::String(emoji.clone()));
        }
        if let Some(done) = self.extra.get("done").and_then(Value::as_bool) {
            fields.insert("done".to_string(), IndexValue::Bool(done));
        }
        fields
    }
}

/// A named, colored label attachable to tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            emoji: None,
        }
    }
}

impl Record for Category {
    fn id(&self) -> i64 {
        self.id
    }

    fn collection_name() -> &'static str {
        "categories"
    }
}

/// The user's task and category collections, as persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

fn default_color() -> String {
    "#b624ff".to_string()
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
