use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use eyre::{Result, eyre};
use std::path::PathBuf;
use taskport::{Category, Config, Filter, ImportReport, Store, Task, bundle, link, now_ms};

#[derive(Parser)]
#[command(name = "taskport")]
#[command(about = "Taskport CLI - Import, export and merge task bundles")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the store directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    store_path: PathBuf,

    /// Config file (default: <config dir>/taskport/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks
    List,

    /// List categories
    Categories,

    /// Export tasks to a JSON bundle
    Export {
        /// Task ids to export (repeatable)
        #[arg(long = "id")]
        ids: Vec<i64>,

        /// Filter expression, e.g. `name~milk` or `done=false` (repeatable)
        #[arg(long = "filter", conflicts_with = "ids")]
        filters: Vec<String>,

        /// Export every task
        #[arg(long, conflicts_with_all = ["ids", "filters"])]
        all: bool,

        /// Output directory (default: config `app.export_dir`)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Import tasks from a JSON bundle
    Import {
        file: PathBuf,
    },

    /// Check a shared link before opening it
    Link {
        url: String,
    },

    /// Add a task
    Add {
        name: String,
        #[arg(long)]
        id: Option<i64>,
        #[command(flatten)]
        fields: TaskFields,
    },

    /// Edit a task
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
    },

    /// Delete a task
    Delete {
        id: i64,
    },

    /// Add a category
    AddCategory {
        name: String,
        #[arg(long)]
        id: Option<i64>,
        #[arg(long, default_value = "#b624ff")]
        color: String,
    },
}

#[derive(clap::Args)]
struct TaskFields {
    #[arg(long)]
    description: Option<String>,
    /// Local date and time, e.g. 2024-05-01T09:30
    #[arg(long)]
    deadline: Option<String>,
    #[arg(long)]
    emoji: Option<String>,
    #[arg(long)]
    color: Option<String>,
    /// Category ids to attach (repeatable)
    #[arg(long = "category")]
    categories: Vec<i64>,
}

impl TaskFields {
    fn apply(self, task: &mut Task, categories: &[Category]) -> Result<()> {
        if let Some(description) = self.description {
            task.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(deadline) = self.deadline {
            task.deadline = Some(deadline).filter(|d| !d.is_empty());
        }
        if let Some(emoji) = self.emoji {
            task.emoji = Some(emoji).filter(|e| !e.is_empty());
        }
        if let Some(color) = self.color {
            task.color = color;
        }
        if !self.categories.is_empty() {
            let attached = self
                .categories
                .iter()
                .map(|id| {
                    categories
                        .iter()
                        .find(|c| c.id == *id)
                        .cloned()
                        .ok_or_else(|| eyre!("Category {} not found", id))
                })
                .collect::<Result<Vec<_>>>()?;
            task.category = Some(attached);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Open store
    let mut store = Store::open(&cli.store_path, config.limits)?;

    match cli.command {
        Commands::List => {
            if store.state().tasks.is_empty() {
                println!("{}", "You don't have any tasks".italic());
            }
            for task in &store.state().tasks {
                println!("{}", task_line(task));
            }
        }
        Commands::Categories => {
            for category in &store.state().categories {
                println!("{:>6}  {}", category.id, tint(&category.name, &category.color));
            }
        }
        Commands::Export {
            ids,
            filters,
            all,
            out,
        } => {
            let tasks = if all {
                store.export_all()
            } else if !filters.is_empty() {
                let filters = filters.iter().map(|f| Filter::parse(f)).collect::<Result<Vec<_>>>()?;
                store.export_filtered(&filters)
            } else {
                store.export_selected(&ids)
            };

            if tasks.is_empty() {
                return Err(eyre!("No tasks selected for export"));
            }

            let dir = out.unwrap_or(config.app.export_dir);
            let path = bundle::write_export(&dir, &tasks)?;
            println!("Exported tasks to {}:", path.display());
            for task in &tasks {
                println!("  {}", task_line(task));
            }
        }
        Commands::Import { file } => {
            let report = store.import_file(&file)?;
            print_report(&report);
        }
        Commands::Link { url } => {
            let link = link::check_share_link(&url, &config.app.origin)?;
            println!("Open {}", link);
        }
        Commands::Add { name, id, fields } => {
            let mut task = Task::new(id.unwrap_or_else(now_ms), name);
            fields.apply(&mut task, &store.state().categories)?;
            let line = task_line(&task);
            store.add_task(task)?;
            println!("Task added: {}", line);
        }
        Commands::Edit { id, name, fields } => {
            let mut task = store
                .state()
                .tasks
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .ok_or_else(|| eyre!("Task {} not found", id))?;
            if let Some(name) = name {
                task.name = name;
            }
            fields.apply(&mut task, &store.state().categories)?;
            let line = task_line(&task);
            store.update_task(task)?;
            println!("Task updated: {}", line);
        }
        Commands::Delete { id } => {
            let task = store.delete_task(id)?;
            println!("Task deleted: {}", task_line(&task));
        }
        Commands::AddCategory { name, id, color } => {
            let category = Category::new(id.unwrap_or_else(now_ms), name, color);
            let line = tint(&category.name, &category.color);
            store.add_category(category)?;
            println!("Category added: {}", line);
        }
    }

    Ok(())
}

fn print_report(report: &ImportReport) {
    println!("Tasks successfully imported from {}", report.source_name.italic());
    for name in &report.task_names {
        println!("  {}", name);
    }
    println!(
        "{} added, {} replaced; categories: {} added, {} replaced",
        report.tasks_added, report.tasks_replaced, report.categories_added, report.categories_replaced
    );
}

fn task_line(task: &Task) -> String {
    let mut line = format!("{:>14}  {}", task.id, tint(&task.name, &task.color));
    if let Some(deadline) = &task.deadline {
        line.push_str(&format!("  (due {})", deadline));
    }
    let categories: Vec<String> = task
        .categories()
        .iter()
        .map(|c| tint(&c.name, &c.color).to_string())
        .collect();
    if !categories.is_empty() {
        line.push_str(&format!("  [{}]", categories.join(", ")));
    }
    line
}

/// Color text with a `#rrggbb` (or `#rgb`) code; other values leave it plain
fn tint(text: &str, color: &str) -> ColoredString {
    match parse_hex(color) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#').filter(|h| h.is_ascii())?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}
