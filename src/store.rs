// File-backed user state: tasks and categories in a single JSON file

use crate::bundle;
use crate::config::Limits;
use crate::error::Violation;
use crate::filter::{self, Filter};
use crate::import::{ImportReport, import_bundle};
use crate::models::{Category, Task, UserState};
use crate::validate;
use chrono::Utc;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;
const STORE_DIR: &str = ".taskport";
const STATE_FILE: &str = "user.json";
const LOCK_FILE: &str = "user.json.lock";
const TEMP_FILE: &str = "user.json.tmp";

/// Persistent user state with atomic whole-file writes
pub struct Store {
    base_path: PathBuf,
    limits: Limits,
    state: UserState,
}

impl Store {
    /// Open or create a store at the given path
    ///
    /// The store will be created in a `.taskport` subdirectory of the given path.
    pub fn open<P: AsRef<Path>>(path: P, limits: Limits) -> Result<Self> {
        let base_path = path.as_ref().join(STORE_DIR);

        // Create directory if it doesn't exist
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let mut store = Self {
            base_path,
            limits,
            state: UserState::default(),
        };

        store.create_gitignore()?;
        store.write_version()?;
        store.state = store.load()?;

        info!(
            path = ?store.base_path,
            tasks = store.state.tasks.len(),
            categories = store.state.categories.len(),
            "Opened store"
        );
        Ok(store)
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn state(&self) -> &UserState {
        &self.state
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn state_path(&self) -> PathBuf {
        self.base_path.join(STATE_FILE)
    }

    fn create_gitignore(&self) -> Result<()> {
        let gitignore_path = self.base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, format!("{}\n{}\n", LOCK_FILE, TEMP_FILE))?;
        }
        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    /// Read the state file; a missing file is an empty state
    fn load(&self) -> Result<UserState> {
        let path = self.state_path();
        if !path.exists() {
            debug!(path = ?path, "No state file yet");
            return Ok(UserState::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read state file")?;
        let state: UserState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", path.display()))?;
        Ok(state)
    }

    /// Replace the persisted state in one step
    ///
    /// Writes a temp file under an exclusive lock, then renames it over the
    /// state file. The in-memory state only changes once the rename succeeded.
    fn commit(&mut self, next: UserState) -> Result<()> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(LOCK_FILE))
            .context("Failed to open lock file")?;

        // Acquire exclusive lock before writing
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let temp_path = self.base_path.join(TEMP_FILE);
        let json = serde_json::to_string_pretty(&next).context("Failed to serialize state")?;
        {
            let mut file = File::create(&temp_path).context("Failed to create temp state file")?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, self.state_path()).context("Failed to replace state file")?;

        // Lock is released when `lock` is dropped
        debug!(tasks = next.tasks.len(), categories = next.categories.len(), "Committed state");
        self.state = next;
        Ok(())
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    /// Import a bundle and persist the merged result
    ///
    /// Parse, structure and validation failures come back as an `eyre::Report`
    /// wrapping an [`ImportError`](crate::ImportError) (use `downcast_ref`),
    /// and leave both the file and the in-memory state untouched.
    pub fn import(&mut self, text: &str, source_name: &str) -> Result<ImportReport> {
        let (next, report) = import_bundle(&self.state, text, source_name, &self.limits)?;
        self.commit(next)?;
        Ok(report)
    }

    /// Import a bundle file from disk
    pub fn import_file(&mut self, path: &Path) -> Result<ImportReport> {
        let (text, source_name) = bundle::read_import_file(path)?;
        self.import(&text, &source_name)
    }

    pub fn export_all(&self) -> Vec<Task> {
        self.state.tasks.clone()
    }

    /// Tasks with the given ids, in collection order
    pub fn export_selected(&self, ids: &[i64]) -> Vec<Task> {
        bundle::select_by_ids(&self.state.tasks, ids).into_iter().cloned().collect()
    }

    /// Tasks matching every filter, in collection order
    pub fn export_filtered(&self, filters: &[Filter]) -> Vec<Task> {
        filter::apply(&self.state.tasks, filters).into_iter().cloned().collect()
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Add a new task, stamping its last-save time
    pub fn add_task(&mut self, mut task: Task) -> Result<()> {
        self.check_task(&task)?;
        if self.state.tasks.iter().any(|t| t.id == task.id) {
            return Err(eyre!("Task {} already exists", task.id));
        }

        task.last_save = Some(Utc::now());
        let mut next = self.state.clone();
        next.tasks.push(task);
        self.commit(next)
    }

    /// Save an edited task in place, stamping its last-save time
    pub fn update_task(&mut self, mut task: Task) -> Result<()> {
        self.check_task(&task)?;
        let pos = self
            .state
            .tasks
            .iter()
            .position(|t| t.id == task.id)
            .ok_or_else(|| eyre!("Task {} not found", task.id))?;

        task.last_save = Some(Utc::now());
        let mut next = self.state.clone();
        next.tasks[pos] = task;
        info!(id = next.tasks[pos].id, name = %next.tasks[pos].name, "Task updated");
        self.commit(next)
    }

    pub fn delete_task(&mut self, id: i64) -> Result<Task> {
        let pos = self
            .state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| eyre!("Task {} not found", id))?;

        let mut next = self.state.clone();
        let removed = next.tasks.remove(pos);
        self.commit(next)?;
        Ok(removed)
    }

    pub fn add_category(&mut self, category: Category) -> Result<()> {
        if let Some(violation) = validate::check_category(&category, &self.limits) {
            return Err(eyre!("Invalid category {:?}: {}", category.name, violation));
        }
        if self.state.categories.iter().any(|c| c.id == category.id) {
            return Err(eyre!("Category {} already exists", category.id));
        }

        let mut next = self.state.clone();
        next.categories.push(category);
        self.commit(next)
    }

    fn check_task(&self, task: &Task) -> Result<()> {
        let violations = validate::check_edit(task, &self.limits);
        if violations.is_empty() {
            return Ok(());
        }
        let reasons: Vec<String> = violations.iter().map(Violation::to_string).collect();
        Err(eyre!("Invalid task {:?}: {}", task.name, reasons.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> Store {
        Store::open(temp.path(), Limits::default()).unwrap()
    }

    fn seeded(temp: &TempDir) -> Store {
        let mut store = open(temp);
        store.add_task(Task::new(1, "A")).unwrap();
        store.add_task(Task::new(2, "B")).unwrap();
        store
    }

    #[test]
    fn test_store_open_creates_directory() {
        let temp = TempDir::new().unwrap();

        let store = open(&temp);
        let store_path = temp.path().join(".taskport");
        assert!(store_path.exists());
        assert!(store_path.join(".gitignore").exists());
        assert!(store_path.join(".version").exists());
        assert!(store.state().tasks.is_empty());
    }

    #[test]
    fn test_state_persists_across_open() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = seeded(&temp);
            store.add_category(Category::new(1, "Work", "#111")).unwrap();
        }

        let store = open(&temp);
        assert_eq!(store.state().tasks.len(), 2);
        assert_eq!(store.state().categories[0].name, "Work");
        assert!(store.state().tasks[0].last_save.is_some());
    }

    #[test]
    fn test_import_merges_and_persists() {
        let temp = TempDir::new().unwrap();
        let mut store = seeded(&temp);

        let report = store
            .import(r#"[{"id":2,"name":"B2"},{"id":3,"name":"D"}]"#, "in.json")
            .unwrap();
        assert_eq!(report.tasks_added, 1);
        assert_eq!(report.tasks_replaced, 1);

        let reopened = open(&temp);
        let names: Vec<&str> = reopened.state().tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B2", "D"]);
    }

    #[test]
    fn test_failed_import_leaves_state_file_unchanged() {
        let temp = TempDir::new().unwrap();
        let mut store = seeded(&temp);
        let state_file = temp.path().join(".taskport/user.json");
        let before = fs::read(&state_file).unwrap();

        let long = "x".repeat(41);
        let text = format!(r#"[{{"id":3,"name":"a"}},{{"id":4,"name":"{}"}},{{"id":5,"name":"c"}}]"#, long);
        let err = store.import(&text, "bad.json").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ImportError>(),
            Some(ImportError::Validation { .. })
        ));

        for bad in ["{not valid json", r#"{"a":1}"#] {
            assert!(store.import(bad, "bad.json").is_err());
        }

        assert_eq!(fs::read(&state_file).unwrap(), before);
        assert_eq!(store.state().tasks.len(), 2);
    }

    #[test]
    fn test_export_import_round_trip() {
        let source_dir = TempDir::new().unwrap();
        let mut source = seeded(&source_dir);
        let mut task = Task::new(3, "With category");
        task.category = Some(vec![Category::new(9, "Home", "#333")]);
        source.add_task(task).unwrap();

        let out = TempDir::new().unwrap();
        let path = bundle::write_export(out.path(), &source.export_all()).unwrap();

        let target_dir = TempDir::new().unwrap();
        let mut target = open(&target_dir);
        target.import_file(&path).unwrap();

        assert_eq!(target.state().tasks, source.state().tasks);
        assert_eq!(target.state().categories, vec![Category::new(9, "Home", "#333")]);
    }

    #[test]
    fn test_export_selected_and_filtered() {
        let temp = TempDir::new().unwrap();
        let store = seeded(&temp);

        let picked: Vec<i64> = store.export_selected(&[2]).iter().map(|t| t.id).collect();
        assert_eq!(picked, vec![2]);

        let filters = vec![Filter::parse("name=A").unwrap()];
        let picked: Vec<i64> = store.export_filtered(&filters).iter().map(|t| t.id).collect();
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn test_add_task_rejects_invalid_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let mut store = seeded(&temp);

        assert!(store.add_task(Task::new(1, "dup")).is_err());
        assert!(store.add_task(Task::new(3, "")).is_err());
        assert!(store.add_task(Task::new(3, "x".repeat(41))).is_err());
        assert_eq!(store.state().tasks.len(), 2);
    }

    #[test]
    fn test_update_task_in_place() {
        let temp = TempDir::new().unwrap();
        let mut store = seeded(&temp);

        let mut edited = store.state().tasks[0].clone();
        edited.name = "A edited".to_string();
        edited.description = Some("more detail".to_string());
        store.update_task(edited).unwrap();

        assert_eq!(store.state().tasks[0].name, "A edited");
        assert_eq!(store.state().tasks[1].name, "B");
        assert!(store.update_task(Task::new(42, "missing")).is_err());

        let mut too_long = store.state().tasks[0].clone();
        too_long.description = Some("d".repeat(351));
        assert!(store.update_task(too_long).is_err());
        assert_eq!(store.state().tasks[0].description.as_deref(), Some("more detail"));
    }

    #[test]
    fn test_delete_task() {
        let temp = TempDir::new().unwrap();
        let mut store = seeded(&temp);

        let removed = store.delete_task(1).unwrap();
        assert_eq!(removed.name, "A");
        assert!(store.delete_task(1).is_err());
        assert_eq!(open(&temp).state().tasks.len(), 1);
    }

    #[test]
    fn test_add_category_validation() {
        let temp = TempDir::new().unwrap();
        let mut store = open(&temp);

        store.add_category(Category::new(1, "Work", "#111")).unwrap();
        assert!(store.add_category(Category::new(1, "Again", "#111")).is_err());
        assert!(store.add_category(Category::new(2, "c".repeat(21), "#111")).is_err());
    }
}
