use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use todolist::{DEFAULT_DB_NAME, Shell, TaskStore, parse_date};
use tracing::{Level, debug};

#[derive(Parser)]
#[command(name = "todolist")]
#[command(about = "Single-user to-do manager backed by a local SQLite file")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the database file
    #[arg(long, env = "TODO_DB", default_value = DEFAULT_DB_NAME)]
    db: PathBuf,

    /// Reference date for today/week/missed views (default: local date)
    #[arg(long, value_parser = parse_today)]
    today: Option<NaiveDate>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,

    /// Tasks due today
    Today {
        #[arg(long)]
        json: bool,
    },

    /// Tasks due in the next seven days, starting today
    Week {
        #[arg(long)]
        json: bool,
    },

    /// All tasks ordered by deadline
    All {
        #[arg(long)]
        json: bool,
    },

    /// Tasks whose deadline has passed
    Missed {
        #[arg(long)]
        json: bool,
    },

    /// Add a task
    Add {
        description: String,

        /// Deadline as YYYY-MM-DD
        #[arg(short, long)]
        deadline: String,
    },

    /// Delete the task at NUMBER in the `all` listing
    Delete { number: usize },
}

fn parse_today(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with menu output
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    let mut store =
        TaskStore::open(&cli.db).wrap_err_with(|| format!("Failed to open database {}", cli.db.display()))?;
    debug!(db = ?cli.db, %today, "Store opened");

    let result = dispatch(&mut store, today, cli.command.unwrap_or(Commands::Menu));

    // Close even when the command failed, but report the command's error first
    let closed = store.close().wrap_err("Failed to close database");
    result.and(closed)
}

fn dispatch(store: &mut TaskStore, today: NaiveDate, command: Commands) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    match command {
        Commands::Menu => Shell::new(store, today, stdin.lock(), stdout.lock()).run(),
        Commands::Today { json: true } => print_json(&store.get_by_exact_date(today)?),
        Commands::Today { json: false } => Shell::new(store, today, stdin.lock(), stdout.lock()).today_tasks(),
        Commands::Week { json: true } => {
            let mut days = Vec::new();
            for offset in 0..7 {
                let Some(day) = today.checked_add_days(chrono::Days::new(offset)) else {
                    break;
                };
                days.push(serde_json::json!({
                    "date": day,
                    "tasks": store.get_by_exact_date(day)?,
                }));
            }
            print_json(&days)
        }
        Commands::Week { json: false } => Shell::new(store, today, stdin.lock(), stdout.lock()).week_tasks(),
        Commands::All { json: true } => print_json(&store.get_all_ordered_by_deadline()?),
        Commands::All { json: false } => Shell::new(store, today, stdin.lock(), stdout.lock()).all_tasks(),
        Commands::Missed { json: true } => print_json(&store.get_overdue(today)?),
        Commands::Missed { json: false } => Shell::new(store, today, stdin.lock(), stdout.lock()).missed_tasks(),
        Commands::Add { description, deadline } => {
            let deadline = parse_date(&deadline)?;
            Shell::new(store, today, stdin.lock(), stdout.lock()).add(&description, deadline)
        }
        Commands::Delete { number } => {
            let listed = store.get_all_ordered_by_deadline()?;
            Shell::new(store, today, stdin.lock(), stdout.lock()).delete_nth(&listed, number)
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to serialize output")?;
    writeln!(out)?;
    Ok(())
}
