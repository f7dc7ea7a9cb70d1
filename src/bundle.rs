// Export bundle file operations

use crate::models::Task;
use chrono::{DateTime, Local};
use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialize tasks as a pretty-printed JSON array
///
/// Nothing is validated on the way out: whatever is in memory is trusted.
pub fn to_json(tasks: &[Task]) -> Result<String> {
    serde_json::to_string_pretty(tasks).context("Failed to serialize tasks")
}

/// Timestamped bundle name, e.g. `Tasks_2024-05-01_09-30-00.json`
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("Tasks_{}.json", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write a bundle into `dir` and return its path
pub fn write_export(dir: &Path, tasks: &[Task]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let path = dir.join(export_file_name(Local::now()));
    let json = to_json(tasks)?;
    fs::write(&path, json).with_context(|| format!("Failed to write export file {}", path.display()))?;

    info!(file = ?path, count = tasks.len(), "Exported tasks");
    Ok(path)
}

/// Read an import file, returning its text and the name to report it by
pub fn read_import_file(path: &Path) -> Result<(String, String)> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read import file {}", path.display()))?;
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((text, source_name))
}

/// Tasks whose id is in `ids`, in collection order
///
/// Ids with no matching task are ignored.
pub fn select_by_ids<'a>(tasks: &'a [Task], ids: &[i64]) -> Vec<&'a Task> {
    tasks.iter().filter(|task| ids.contains(&task.id)).collect()
}
