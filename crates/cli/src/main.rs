use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use watchpad_engine::{SimulatedDebuggee, WatchListStore, parse_var};
use watchpad_tui::RunOptions;
use watchpad_util::UserPreferences;

/// Watch expressions against a simulated debuggee.
#[derive(Debug, Parser)]
#[command(name = "watchpad", version, about)]
struct Cli {
    /// Initial debuggee variable (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    vars: Vec<(String, i64)>,

    /// Watch expression to add at startup (repeatable)
    #[arg(long = "watch", value_name = "EXPR")]
    watches: Vec<String>,

    /// Step the debuggee every N milliseconds; 0 disables auto-stepping
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    step_interval_ms: u64,

    /// Neither load nor save the watch list
    #[arg(long)]
    no_persist: bool,

    /// Write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            step_interval: (self.step_interval_ms > 0).then(|| Duration::from_millis(self.step_interval_ms)),
        }
    }

    fn debuggee(&self) -> SimulatedDebuggee {
        if self.vars.is_empty() {
            return SimulatedDebuggee::new([("i".to_string(), 0), ("n".to_string(), 10)]);
        }
        SimulatedDebuggee::new(self.vars.iter().cloned())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    let preferences = Arc::new(load_preferences(cli.no_persist));
    let mut store = WatchListStore::new(cli.debuggee(), Arc::clone(&preferences));
    for expression in &cli.watches {
        if !store.expressions().contains(expression) {
            store.add(expression);
        }
    }
    info!(
        persisted = preferences.persists_to_disk(),
        entries = store.len(),
        "watch list ready"
    );

    watchpad_tui::run(store, preferences, cli.run_options()).await
}

fn load_preferences(no_persist: bool) -> UserPreferences {
    if no_persist {
        return UserPreferences::ephemeral();
    }
    UserPreferences::new().unwrap_or_else(|error| {
        warn!(error = %error, "Failed to load preferences; continuing without persistence");
        UserPreferences::ephemeral()
    })
}

/// The alternate screen owns the terminal, so logs go to `--log-file` or nowhere.
fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let writer = match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::sink),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(())
}
