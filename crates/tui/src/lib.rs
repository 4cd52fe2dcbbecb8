//! # Watchpad TUI Library
//!
//! Terminal user interface for the watchpad debugger front end. The panel
//! shows a list of watch expressions with their live values, lets the user
//! edit a row in place, remove it, or add a new expression, and steps a
//! simulated debuggee so the values keep moving.
//!
//! ## Architecture
//!
//! Components handle input and messages, mutate their own state in
//! [`App`](app::App) and hand back `Effect`s. The runtime applies those
//! effects to the [`WatchListStore`] (see `cmd`) and routes fresh list
//! snapshots back into the UI.

mod app;
mod cmd;
mod host;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use watchpad_engine::WatchListStore;
use watchpad_util::UserPreferences;

/// Runtime knobs supplied by the binary.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Step the debuggee on this period; `None` disables auto-stepping
    pub step_interval: Option<Duration>,
}

/// Runs the TUI until the user quits.
///
/// # Errors
///
/// Terminal setup failures (raw mode, alternate screen) and draw errors.
pub async fn run(store: WatchListStore, preferences: Arc<UserPreferences>, options: RunOptions) -> Result<()> {
    ui::runtime::run_app(store, preferences, options).await
}
