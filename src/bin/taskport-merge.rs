// Merge an incoming task bundle into an existing one
//
// Usage: taskport-merge <existing> <incoming> [<output>]
// The incoming bundle is validated as an import; the merged bundle is
// written to <output>, or back into <existing> when no output is given.
//
// Exit codes:
//   0 = merge successful
//   1 = incoming bundle rejected (parse, structure or length limits)
//   2 = error

use eyre::{Context, Result, eyre};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use taskport::{Config, ImportError, Limits, UserState, bundle, import_bundle, parse_bundle};

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        let code = if e.downcast_ref::<ImportError>().is_some() { 1 } else { 2 };
        process::exit(code);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 && args.len() != 4 {
        eprintln!("Usage: taskport-merge <existing> <incoming> [<output>]");
        eprintln!("Example: taskport-merge tasks.json Tasks_2024-05-01_09-30-00.json merged.json");
        return Ok(());
    }

    let existing_path = PathBuf::from(&args[1]);
    let incoming_path = PathBuf::from(&args[2]);
    let output_path = args.get(3).map(PathBuf::from).unwrap_or_else(|| existing_path.clone());

    let config = Config::load(None)?;
    let result = merge_bundle_files(&existing_path, &incoming_path, &config.limits)?;

    fs::write(&output_path, result.content)
        .with_context(|| format!("Failed to write merged bundle {}", output_path.display()))?;

    eprintln!(
        "Merged {} task(s) from {}: {} added, {} replaced",
        result.added + result.replaced,
        incoming_path.display(),
        result.added,
        result.replaced
    );
    Ok(())
}

#[derive(Debug)]
struct MergeResult {
    content: String,
    added: usize,
    replaced: usize,
}

/// Merge two bundle files with the import rules
///
/// The existing bundle is trusted (it was exported by us); only the incoming
/// one goes through validation. A missing existing file counts as empty.
fn merge_bundle_files(existing_path: &Path, incoming_path: &Path, limits: &Limits) -> Result<MergeResult> {
    let existing = if existing_path.exists() {
        let (text, name) = bundle::read_import_file(existing_path)?;
        // Exit code 1 is reserved for the incoming bundle
        parse_bundle(&text, &name, &Limits::unbounded())
            .map_err(|e| eyre!("Existing bundle {} is invalid: {}", name, e))?
    } else {
        Vec::new()
    };

    let (text, name) = bundle::read_import_file(incoming_path)?;
    let state = UserState {
        tasks: existing,
        categories: Vec::new(),
    };
    let (merged, report) = import_bundle(&state, &text, &name, limits)?;

    Ok(MergeResult {
        content: bundle::to_json(&merged.tasks)?,
        added: report.tasks_added,
        replaced: report.tasks_replaced,
    })
}
