// Bundle parsing and field-length validation

use crate::config::Limits;
use crate::error::{ImportError, InvalidTask, Violation};
use crate::models::{Category, Task};
use serde_json::Value;
use tracing::{debug, error};

/// Parse and validate an import bundle
///
/// The batch is all-or-nothing: if any task breaks a limit, no task is
/// returned and the error lists every offender.
pub fn parse_bundle(text: &str, source_name: &str, limits: &Limits) -> Result<Vec<Task>, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(|source| {
        error!(file = source_name, error = %source, "Error parsing the imported file");
        ImportError::Parse {
            source_name: source_name.to_string(),
            source,
        }
    })?;

    let Value::Array(items) = value else {
        return Err(structure_error(source_name, "expected an array of tasks"));
    };

    let mut tasks = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let task: Task = serde_json::from_value(item)
            .map_err(|e| structure_error(source_name, &format!("element {} is not a task: {}", index, e)))?;
        tasks.push(task);
    }

    let invalid: Vec<InvalidTask> = tasks
        .iter()
        .filter_map(|task| {
            let violations = check_lengths(task, limits);
            (!violations.is_empty()).then(|| InvalidTask {
                id: task.id,
                name: task.name.clone(),
                violations,
            })
        })
        .collect();

    if !invalid.is_empty() {
        for task in &invalid {
            for violation in &task.violations {
                error!(file = source_name, id = task.id, name = %task.name, %violation, "Task exceeds maximum length");
            }
        }
        return Err(ImportError::Validation { invalid });
    }

    debug!(file = source_name, count = tasks.len(), "Bundle validated");
    Ok(tasks)
}

/// Field-length checks shared by import and editing
///
/// An absent description or category list is always valid.
pub fn check_lengths(task: &Task, limits: &Limits) -> Vec<Violation> {
    let mut violations = Vec::new();

    let len = utf16_len(&task.name);
    if len > limits.task_name_max {
        violations.push(Violation::NameTooLong {
            len,
            max: limits.task_name_max,
        });
    }

    if let Some(description) = &task.description {
        let len = utf16_len(description);
        if len > limits.description_max {
            violations.push(Violation::DescriptionTooLong {
                len,
                max: limits.description_max,
            });
        }
    }

    for category in task.categories() {
        if let Some(violation) = check_category(category, limits) {
            violations.push(violation);
        }
    }

    violations
}

/// Checks for a task being saved from the editor: lengths, plus a non-empty name
pub fn check_edit(task: &Task, limits: &Limits) -> Vec<Violation> {
    let mut violations = Vec::new();
    if task.name.trim().is_empty() {
        violations.push(Violation::EmptyName);
    }
    violations.extend(check_lengths(task, limits));
    violations
}

pub fn check_category(category: &Category, limits: &Limits) -> Option<Violation> {
    let len = utf16_len(&category.name);
    (len > limits.category_name_max).then(|| Violation::CategoryNameTooLong {
        category: category.name.clone(),
        len,
        max: limits.category_name_max,
    })
}

// Same unit the web app's `.length` uses
fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn structure_error(source_name: &str, reason: &str) -> ImportError {
    error!(file = source_name, reason, "Imported file has an invalid structure");
    ImportError::Structure {
        source_name: source_name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_bundle("{not valid json", "bad.json", &limits()).unwrap_err();
        match err {
            ImportError::Parse { source_name, .. } => assert_eq!(source_name, "bad.json"),
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_object_is_structure_error() {
        let err = parse_bundle(r#"{"a":1}"#, "obj.json", &limits()).unwrap_err();
        assert!(matches!(err, ImportError::Structure { .. }));
    }

    #[test]
    fn test_scalar_is_structure_error() {
        let err = parse_bundle("42", "n.json", &limits()).unwrap_err();
        assert!(matches!(err, ImportError::Structure { .. }));
    }

    #[test]
    fn test_non_task_element_is_structure_error() {
        let err = parse_bundle(r#"[{"id":1,"name":"ok"},{"name":"no id"}]"#, "t.json", &limits()).unwrap_err();
        match err {
            ImportError::Structure { reason, .. } => assert!(reason.contains("element 1")),
            other => panic!("expected Structure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_array_is_ok() {
        let tasks = parse_bundle("[]", "empty.json", &limits()).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_valid_bundle() {
        let text = r##"[
            {"id":1,"name":"Buy milk","color":"#ff3131"},
            {"id":2,"name":"Write report","description":"Q3","category":[{"id":1,"name":"Work","color":"#0f0"}]}
        ]"##;
        let tasks = parse_bundle(text, "ok.json", &limits()).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].categories()[0].name, "Work");
    }

    #[test]
    fn test_one_invalid_task_rejects_whole_batch() {
        let long_name = "x".repeat(41);
        let text = format!(
            r#"[{{"id":1,"name":"a"}},{{"id":2,"name":"{}"}},{{"id":3,"name":"c"}}]"#,
            long_name
        );

        let err = parse_bundle(&text, "batch.json", &limits()).unwrap_err();
        match err {
            ImportError::Validation { invalid } => {
                assert_eq!(invalid.len(), 1);
                assert_eq!(invalid[0].id, 2);
                assert_eq!(invalid[0].name, long_name);
                assert_eq!(invalid[0].violations, vec![Violation::NameTooLong { len: 41, max: 40 }]);
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_limits_are_inclusive() {
        let mut task = Task::new(1, "x".repeat(40));
        task.description = Some("d".repeat(350));
        task.category = Some(vec![Category::new(1, "c".repeat(20), "#fff")]);
        assert!(check_lengths(&task, &limits()).is_empty());
    }

    #[test]
    fn test_lengths_count_utf16_units() {
        // 40 BMP characters are within the limit even when multi-byte in UTF-8
        let task = Task::new(1, "é".repeat(40));
        assert!(check_lengths(&task, &limits()).is_empty());

        // Astral-plane characters take two units each
        let task = Task::new(1, "\u{1F600}".repeat(20));
        assert!(check_lengths(&task, &limits()).is_empty());
        let task = Task::new(1, "\u{1F600}".repeat(21));
        assert_eq!(
            check_lengths(&task, &limits()),
            vec![Violation::NameTooLong { len: 42, max: 40 }]
        );
    }

    #[test]
    fn test_astral_name_rejects_bundle() {
        let text = format!(r#"[{{"id":1,"name":"{}"}}]"#, "\u{1F600}".repeat(21));
        let err = parse_bundle(&text, "emoji.json", &limits()).unwrap_err();
        assert!(matches!(err, ImportError::Validation { .. }));
    }

    #[test]
    fn test_every_violation_reported() {
        let mut task = Task::new(1, "n".repeat(41));
        task.description = Some("d".repeat(351));
        task.category = Some(vec![
            Category::new(1, "fine", "#fff"),
            Category::new(2, "c".repeat(21), "#000"),
        ]);

        let violations = check_lengths(&task, &limits());
        assert_eq!(violations.len(), 3);
        assert!(matches!(violations[2], Violation::CategoryNameTooLong { len: 21, .. }));
    }

    #[test]
    fn test_check_edit_rejects_empty_name() {
        let task = Task::new(1, "   ");
        assert_eq!(check_edit(&task, &limits()), vec![Violation::EmptyName]);
        // Import does not require a name
        assert!(check_lengths(&task, &limits()).is_empty());
    }
}
