// Import error taxonomy
//
// Every variant is detected before any state is touched, so callers can
// report it and carry on with the previous collections.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The text is not well-formed JSON.
    #[error("Error parsing the imported file {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON is well-formed but is not an array of task objects.
    #[error("Imported file {source_name} has an invalid structure: {reason}")]
    Structure { source_name: String, reason: String },

    /// One or more tasks exceed the field-length limits. The whole batch is rejected.
    #[error(
        "Some tasks cannot be imported due to exceeding maximum character lengths: {}",
        task_names(.invalid)
    )]
    Validation { invalid: Vec<InvalidTask> },

    /// The shared link does not point at this application.
    #[error("Failed to import task from the provided link: {link}")]
    Clipboard { link: String },
}

/// A task rejected by validation, with every rule it broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTask {
    pub id: i64,
    pub name: String,
    pub violations: Vec<Violation>,
}

/// A single field-length rule broken by a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    EmptyName,
    NameTooLong { len: usize, max: usize },
    DescriptionTooLong { len: usize, max: usize },
    CategoryNameTooLong { category: String, len: usize, max: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::EmptyName => write!(f, "name is required"),
            Violation::NameTooLong { len, max } => {
                write!(f, "name is {} characters (max {})", len, max)
            }
            Violation::DescriptionTooLong { len, max } => {
                write!(f, "description is {} characters (max {})", len, max)
            }
            Violation::CategoryNameTooLong { category, len, max } => {
                write!(f, "category {:?} is {} characters (max {})", category, len, max)
            }
        }
    }
}

fn task_names(invalid: &[InvalidTask]) -> String {
    invalid
        .iter()
        .map(|task| task.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_names() {
        let err = ImportError::Validation {
            invalid: vec![
                InvalidTask {
                    id: 1,
                    name: "first".to_string(),
                    violations: vec![Violation::NameTooLong { len: 50, max: 40 }],
                },
                InvalidTask {
                    id: 2,
                    name: "second".to_string(),
                    violations: vec![Violation::DescriptionTooLong { len: 400, max: 350 }],
                },
            ],
        };

        assert!(err.to_string().ends_with(": first, second"));
    }

    #[test]
    fn test_parse_message_names_file() {
        let source = serde_json::from_str::<serde_json::Value>("{not valid json").unwrap_err();
        let err = ImportError::Parse {
            source_name: "tasks.json".to_string(),
            source,
        };
        assert!(err.to_string().contains("tasks.json"));
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::CategoryNameTooLong {
            category: "Very long category".to_string(),
            len: 25,
            max: 20,
        };
        assert_eq!(v.to_string(), "category \"Very long category\" is 25 characters (max 20)");
    }
}
