use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use nudge_lib::actions::extract;
use nudge_lib::patterns::{aggregate, write_patterns_document, Scope};
use nudge_lib::settings::DATA_DIR_ENV;
use nudge_lib::{training, utils, AppState};

#[derive(Debug, Parser)]
#[command(name = "nudge", version, about = "Watches what you work on and suggests what to do next")]
struct Cli {
    /// Directory holding memory, feedback, models and settings.
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the suggestion loop until interrupted.
    Run,
    /// Run a single cycle and print what happened.
    Once,
    /// Replay the event log into memory and drop invalid entries.
    Compact,
    /// Aggregate memory and rewrite the patterns document.
    Patterns {
        /// Only the most recent N snapshots.
        #[arg(long)]
        last: Option<usize>,
        /// Condition co-occurrence and transitions on this app.
        #[arg(long)]
        app: Option<String>,
    },
    /// Feedback counters and follow rate.
    Stats,
    /// Print the effective settings, saving any `--set KEY=VALUE` first.
    Config {
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Fit the learned predictor on the stored memory.
    Train,
    /// Show the action a suggestion text maps to.
    Extract { text: String },
    /// Carry out the action a suggestion text maps to.
    Execute { text: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();
    let cli = Cli::parse();
    let state = AppState::open(cli.data_dir)?;

    match cli.command {
        Command::Run => nudge_lib::run(state).await,
        Command::Once => {
            let mut orchestrator = state.orchestrator(&CancellationToken::new())?;
            print_json(&orchestrator.run_cycle().await?)
        }
        Command::Compact => {
            let orchestrator = state.orchestrator(&CancellationToken::new())?;
            print_json(&orchestrator.maintain().await?)
        }
        Command::Patterns { last, app } => {
            let scope = last.map_or(Scope::All, Scope::LastN);
            let summary = aggregate(&state.memory.load(), scope, app.as_deref());
            write_patterns_document(&state.paths.patterns(), &summary)?;
            print_json(&summary)
        }
        Command::Stats => {
            let doc = state.feedback.load();
            print_json(&json!({
                "stats": doc.stats,
                "follow_rate": doc.stats.follow_rate(),
                "memory_entries": state.memory.load().len(),
            }))
        }
        Command::Config { set } => {
            if !set.is_empty() {
                let mut settings = state.agent();
                for assignment in &set {
                    settings = settings.with_override(assignment)?;
                }
                state.settings.update_agent(settings)?;
            }
            print_json(&state.agent())
        }
        Command::Train => {
            let report = training::train(&state.memory.load(), &state.paths.models())?;
            print_json(&report)
        }
        Command::Extract { text } => print_json(&extract(&text)),
        Command::Execute { text } => print_json(&state.executor().execute(&extract(&text))),
    }
}
