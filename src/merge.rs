// Id-based merging of task and category collections
//
// Both merges follow the same rule: walk existing records then incoming ones;
// a record whose id is already in the output replaces that entry in place,
// otherwise it is appended. Output order is first-seen, content is last-seen.

use crate::models::{Category, Task};
use crate::record::Record;
use std::collections::HashMap;
use tracing::debug;

/// Result of merging incoming records into an existing collection
#[derive(Debug, Clone, PartialEq)]
pub struct Merged<T> {
    pub records: Vec<T>,
    /// Incoming records whose id was not present yet
    pub added: usize,
    /// Incoming records that overwrote an earlier one
    pub replaced: usize,
}

/// Merge `incoming` into a copy of `existing`, deduplicating by id
pub fn merge_by_id<T, I>(existing: &[T], incoming: I) -> Merged<T>
where
    T: Record,
    I: IntoIterator<Item = T>,
{
    let mut records: Vec<T> = Vec::with_capacity(existing.len());
    let mut positions: HashMap<i64, usize> = HashMap::with_capacity(existing.len());

    // Existing collections are expected to be unique already, but run them
    // through the same rule so the output invariant holds regardless
    for record in existing.iter().cloned() {
        upsert(&mut records, &mut positions, record);
    }

    let mut added = 0;
    let mut replaced = 0;
    for record in incoming {
        if upsert(&mut records, &mut positions, record) {
            replaced += 1;
        } else {
            added += 1;
        }
    }

    debug!(
        collection = T::collection_name(),
        total = records.len(),
        added,
        replaced,
        "Merged records by id"
    );

    Merged {
        records,
        added,
        replaced,
    }
}

/// Returns true when an existing entry was replaced
fn upsert<T: Record>(records: &mut Vec<T>, positions: &mut HashMap<i64, usize>, record: T) -> bool {
    match positions.get(&record.id()) {
        Some(&pos) => {
            records[pos] = record;
            true
        }
        None => {
            positions.insert(record.id(), records.len());
            records.push(record);
            false
        }
    }
}

/// Fold the categories referenced by imported tasks into the existing set
///
/// References are visited in task order, then in order within each task. A
/// matching id is replaced as a whole record, an unknown id is appended.
pub fn reconcile_categories(existing: &[Category], imported: &[Task]) -> Merged<Category> {
    let referenced = imported.iter().flat_map(|task| task.categories().iter().cloned());
    merge_by_id(existing, referenced)
}

/// Combine imported tasks with existing ones, last write wins per id
pub fn merge_tasks(existing: &[Task], imported: Vec<Task>) -> Merged<Task> {
    merge_by_id(existing, imported)
}
