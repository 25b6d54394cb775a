//! # stride
//!
//! Command-line front end for the stride task store: parses arguments,
//! renders tasks, and maps store errors to exit codes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stride_store::{Database, StoreError, Task, TaskRepo};

/// Local task list manager.
#[derive(Parser, Debug)]
#[command(name = "stride", about = "Local task list manager")]
struct Cli {
    /// Path to the SQLite task database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a new task
    Add {
        /// Task title
        title: String,
        /// Optional longer description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List all tasks, pending first
    List,
    /// Search tasks by keyword in title or description
    Search {
        /// Case-insensitive substring to match
        keyword: String,
    },
    /// Mark a task complete
    Complete {
        /// Id of the task to mark complete
        id: i64,
    },
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".stride").join("tasks.db")
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = cli.db_path.unwrap_or_else(default_db_path);

    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("could not open the task database: {e}");
            return ExitCode::from(2);
        }
    };

    let repo = TaskRepo::new(db);
    match run(&repo, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_user_error() => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(repo: &TaskRepo, command: Command) -> Result<(), StoreError> {
    match command {
        Command::Add { title, description } => {
            let id = repo.add(&title, &description)?;
            println!("Added task {id}: {}", title.trim());
        }
        Command::List => {
            let tasks = repo.list()?;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in &tasks {
                println!("{}", render(task));
            }
        }
        Command::Search { keyword } => {
            let tasks = repo.search(&keyword)?;
            if tasks.is_empty() {
                println!("No matches.");
            }
            for task in &tasks {
                println!("{}", render(task));
            }
        }
        Command::Complete { id } => {
            let task = repo.complete(id)?;
            println!("Task {} marked complete.", task.id);
        }
    }
    Ok(())
}

fn render(task: &Task) -> String {
    let glyph = if task.completed { "✓" } else { "○" };
    if task.description.is_empty() {
        format!("[{glyph}] {}: {}", task.id, task.title)
    } else {
        format!("[{glyph}] {}: {} - {}", task.id, task.title, task.description)
    }
}
