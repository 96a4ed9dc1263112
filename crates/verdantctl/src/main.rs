//! Verdant Control - CLI for the Verdant progression engine
//!
//! Syncs activity exports into XP, achievements and badges, and shows progress.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use verdant_shared::engine::Action;
use verdantctl::commands::{self, Session};

// Version is embedded at build time
const VERSION: &str = env!("VERDANT_VERSION");

#[derive(Parser)]
#[command(name = "verdantctl")]
#[command(about = "Verdant - grow a garden from your daily habits", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// State file (defaults to the config's storage.state_path)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Config file (defaults to ~/.config/verdant/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show level, xp and garden stage
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate an activity export and present new rewards
    Sync {
        /// Activity export (JSON)
        #[arg(long)]
        activity: PathBuf,
    },

    /// Add xp by amount or for an action
    Award {
        /// XP to add
        #[arg(required_unless_present = "action", conflicts_with = "action")]
        amount: Option<u64>,

        /// Award the configured xp for an action
        #[arg(long, value_enum)]
        action: Option<ActionArg>,
    },

    /// List achievements
    Achievements {
        /// Include locked achievements
        #[arg(long)]
        all: bool,

        /// Activity export used to show progress on locked achievements
        #[arg(long)]
        activity: Option<PathBuf>,
    },

    /// List badge ladders
    Badges {
        /// Include locked badges
        #[arg(long)]
        all: bool,
    },

    /// Show current and best streaks
    Streaks {
        /// Activity export (JSON)
        #[arg(long)]
        activity: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Task,
    Habit,
    Journal,
    Book,
    Focus,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Task => Action::TaskCompleted,
            ActionArg::Habit => Action::HabitCheckIn,
            ActionArg::Journal => Action::JournalEntry,
            ActionArg::Book => Action::BookFinished,
            ActionArg::Focus => Action::FocusSession,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let session = Session::open(cli.config.as_deref(), cli.state)?;

    match cli.command {
        Commands::Status { json } => commands::status(&session, json, VERSION),
        Commands::Sync { activity } => commands::sync(&session, &activity),
        Commands::Award { amount, action } => commands::award(&session, amount, action.map(Action::from)),
        Commands::Achievements { all, activity } => commands::achievements(&session, all, activity.as_deref()),
        Commands::Badges { all } => commands::badges(&session, all),
        Commands::Streaks { activity } => commands::streaks(&activity),
    }
}
