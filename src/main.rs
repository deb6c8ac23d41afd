//! # Zenith
//!
//! A personal productivity dashboard for the terminal: a task list with
//! priorities, tags and reminders, a countdown / Pomodoro timer, a clock and
//! daily statistics. A CLI handles quick entry; running without arguments
//! opens the interactive dashboard.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive dashboard
//! zenith
//!
//! # Tasks
//! zenith add "Write report" --priority A --tags "work, q3" --remind "2025-12-01 14:00"
//! zenith list --tag work --sort due-date
//! zenith toggle <ID>
//! zenith move <ID> --before <OTHER_ID>
//!
//! # Focus
//! zenith timer --pomodoro
//! zenith stats
//! ```
//!
//! ## Data Storage
//!
//! Data is kept as JSON files (`tasks.json`, `timerSessions.json`,
//! `allTags.json`) in your local data directory, e.g.
//! `~/.local/share/zenith/` on Linux. Override it with `ZENITH_DATA_DIR`.
//! An optional `config.toml` in the same directory adjusts the weekly goal,
//! reminder interval and timer lengths.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use zenith::commands::*;
use zenith::config::{data_dir, Config};
use zenith::storage::Store;
use zenith::tui::run_tui;

#[derive(Parser)]
#[command(name = "zenith", version)]
#[command(about = "Terminal productivity dashboard: tasks, focus timer and stats", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task text (quoted if it has spaces)
        text: String,
        /// Priority: A (high), B (medium), C (low)
        #[arg(short, long)]
        priority: Option<String>,
        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
        /// Reminder as YYYY-MM-DD [HH:MM]
        #[arg(short, long)]
        remind: Option<String>,
    },
    /// List tasks
    List {
        /// Only this priority
        #[arg(short, long)]
        priority: Option<String>,
        /// Only tasks with this tag
        #[arg(long)]
        tag: Option<String>,
        /// Search text and tags
        #[arg(short, long)]
        search: Option<String>,
        /// Sort by: manual, due-date, priority, created
        #[arg(long)]
        sort: Option<String>,
        /// Reverse the order within open and completed tasks
        #[arg(long)]
        desc: bool,
    },
    /// Mark a task complete, or reopen it
    Toggle {
        id: i64,
    },
    /// Edit a task
    Edit {
        id: i64,
        /// New text
        #[arg(long)]
        text: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
        /// Replace tags (comma-separated, empty clears)
        #[arg(short, long)]
        tags: Option<String>,
        /// New reminder as YYYY-MM-DD [HH:MM]
        #[arg(short, long, conflicts_with = "clear_reminder")]
        remind: Option<String>,
        /// Remove the reminder
        #[arg(long)]
        clear_reminder: bool,
    },
    /// Remove a task
    Remove {
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Move a task before another one in manual order
    Move {
        id: i64,
        /// Task to insert before
        #[arg(long)]
        before: i64,
    },
    /// List all tags in use
    Tags,
    /// Show due reminders once
    Remind,
    /// Show today's focus, tasks done, streak and weekly goal
    Stats,
    /// List logged timer sessions
    Sessions,
    /// Run one timer interval in the foreground
    Timer {
        /// Countdown length in minutes
        #[arg(short, long, conflicts_with = "pomodoro")]
        minutes: Option<u64>,
        /// Run a Pomodoro focus interval
        #[arg(long)]
        pomodoro: bool,
        /// What you are working on
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive dashboard
    Ui,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    install_tracing();

    let dir = data_dir();
    let config = match Config::load(&dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = Store::open(dir);

    match cli.command {
        Some(Commands::Add { text, priority, tags, remind }) => cmd_add(&store, text, priority, tags, remind, false),
        Some(Commands::List { priority, tag, search, sort, desc }) => {
            cmd_list(&store, ListArgs { priority, tag, search, sort, desc })
        }
        Some(Commands::Toggle { id }) => cmd_toggle(&store, id, false),
        Some(Commands::Edit { id, text, priority, tags, remind, clear_reminder }) => {
            cmd_edit(&store, id, text, priority, tags, remind, clear_reminder, false)
        }
        Some(Commands::Remove { id, force }) => cmd_remove(&store, id, force, false),
        Some(Commands::Move { id, before }) => cmd_move(&store, id, before, false),
        Some(Commands::Tags) => cmd_tags(&store),
        Some(Commands::Remind) => {
            cmd_remind(&store, false);
        }
        Some(Commands::Stats) => cmd_stats(&store, &config),
        Some(Commands::Sessions) => cmd_sessions(&store),
        Some(Commands::Timer { minutes, pomodoro, name }) => cmd_timer(&store, &config, minutes, pomodoro, name),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return ExitCode::FAILURE;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "zenith", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui(store, config) {
                eprintln!("Error running TUI: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn install_tracing() {
    // RUST_LOG overrides; warnings only by default.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
