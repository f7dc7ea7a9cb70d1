// Import pipeline: validate, reconcile categories, merge tasks

use crate::config::Limits;
use crate::error::ImportError;
use crate::merge::{merge_tasks, reconcile_categories};
use crate::models::UserState;
use crate::validate::parse_bundle;
use tracing::info;

/// What an import changed, for the confirmation shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub source_name: String,
    /// Names of the imported tasks, in bundle order
    pub task_names: Vec<String>,
    pub tasks_added: usize,
    pub tasks_replaced: usize,
    pub categories_added: usize,
    pub categories_replaced: usize,
}

/// Run a bundle through the pipeline against `state`
///
/// Returns the new state for the caller to apply; `state` itself is never
/// modified, so an error leaves the caller exactly where it was.
pub fn import_bundle(
    state: &UserState,
    text: &str,
    source_name: &str,
    limits: &Limits,
) -> Result<(UserState, ImportReport), ImportError> {
    let imported = parse_bundle(text, source_name, limits)?;
    let task_names: Vec<String> = imported.iter().map(|task| task.name.clone()).collect();

    let categories = reconcile_categories(&state.categories, &imported);
    let tasks = merge_tasks(&state.tasks, imported);

    let report = ImportReport {
        source_name: source_name.to_string(),
        task_names,
        tasks_added: tasks.added,
        tasks_replaced: tasks.replaced,
        categories_added: categories.added,
        categories_replaced: categories.replaced,
    };

    info!(
        file = source_name,
        tasks = %report.task_names.join(", "),
        added = report.tasks_added,
        replaced = report.tasks_replaced,
        "Imported tasks"
    );

    let next = UserState {
        tasks: tasks.records,
        categories: categories.records,
    };
    Ok((next, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Task};

    fn state() -> UserState {
        UserState {
            tasks: vec![Task::new(1, "A"), Task::new(2, "B")],
            categories: vec![Category::new(1, "Work", "#111")],
        }
    }

    #[test]
    fn test_import_updates_tasks_and_categories() {
        let text = r##"[
            {"id":2,"name":"B2","category":[{"id":1,"name":"Work2","color":"#222"}]},
            {"id":3,"name":"D","category":[{"id":2,"name":"Home","color":"#333"}]}
        ]"##;

        let (next, report) = import_bundle(&state(), text, "in.json", &Limits::default()).unwrap();

        let tasks: Vec<(i64, &str)> = next.tasks.iter().map(|t| (t.id, t.name.as_str())).collect();
        assert_eq!(tasks, vec![(1, "A"), (2, "B2"), (3, "D")]);

        let categories: Vec<(i64, &str)> = next.categories.iter().map(|c| (c.id, c.name.as_str())).collect();
        assert_eq!(categories, vec![(1, "Work2"), (2, "Home")]);

        assert_eq!(report.task_names, vec!["B2", "D"]);
        assert_eq!(report.tasks_added, 1);
        assert_eq!(report.tasks_replaced, 1);
        assert_eq!(report.categories_added, 1);
        assert_eq!(report.categories_replaced, 1);
    }

    #[test]
    fn test_failed_import_yields_no_state() {
        let before = state();
        let long = "x".repeat(41);
        let text = format!(r#"[{{"id":7,"name":"ok"}},{{"id":8,"name":"{}"}}]"#, long);

        let err = import_bundle(&before, &text, "in.json", &Limits::default()).unwrap_err();
        assert!(matches!(err, ImportError::Validation { .. }));
        assert_eq!(before, state());
    }

    #[test]
    fn test_categories_not_added_when_validation_fails() {
        let text = format!(
            r##"[{{"id":9,"name":"t","category":[{{"id":5,"name":"{}","color":"#000"}}]}}]"##,
            "c".repeat(21)
        );
        assert!(import_bundle(&state(), &text, "in.json", &Limits::default()).is_err());
    }
}
