// Taskport - Task import/export with validated, id-based merging

pub mod bundle;
pub mod config;
pub mod error;
pub mod filter;
pub mod import;
pub mod link;
pub mod merge;
pub mod models;
pub mod record;
pub mod store;
pub mod validate;

// Re-export main types for convenience
pub use config::{Config, Limits};
pub use error::{ImportError, InvalidTask, Violation};
pub use filter::{Filter, FilterOp};
pub use import::{ImportReport, import_bundle};
pub use merge::{Merged, merge_tasks, reconcile_categories};
pub use models::{Category, Task, UserState, now_ms};
pub use record::{IndexValue, Record};
pub use store::Store;
pub use validate::parse_bundle;
