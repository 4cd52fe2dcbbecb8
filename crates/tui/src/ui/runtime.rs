//! Runtime: event loop and input routing for the watchpad TUI.
//!
//! Responsibilities
//! - Own the terminal lifecycle (enter/leave alternate screen, raw mode).
//! - Drive a single event loop over terminal input, internal messages,
//!   store change notifications and the auto-step interval.
//! - Route input to the main view and apply returned `Effect`s to the store.
//! - Render only when something visible changed.
//!
//! Input comes from a dedicated OS thread that blocks on
//! `crossterm::event::read()` and forwards events over a channel, so the
//! blocking read never stalls the async loop.
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::*};
use tokio::{
    signal,
    sync::mpsc,
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use watchpad_engine::WatchListStore;
use watchpad_types::{Effect, Msg};
use watchpad_util::UserPreferences;

use crate::RunOptions;
use crate::app::{App, SharedCtx};
use crate::cmd;
use crate::ui::components::Component;
use crate::ui::deferred_focus::FocusScheduler;
use crate::ui::main_component::MainView;
use crate::ui::theme;

/// Spawn a dedicated input thread that blocks on terminal input and forwards
/// `crossterm` events over a Tokio channel.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        debug!("input channel closed; stopping input thread");
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read event: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    // Rebuild focus just before rendering so structure changes are reflected
    app.rebuild_focus();
    terminal.draw(|frame| {
        let area = frame.area();
        main_view.render(frame, area, app);
    })?;
    Ok(())
}

fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) => main_view.handle_key_events(app, key_event),
        Event::Mouse(mouse_event) => main_view.handle_mouse_events(app, mouse_event),
        Event::Resize(width, height) => main_view.handle_message(app, &Msg::Resize(width, height)),
        Event::FocusGained | Event::FocusLost | Event::Paste(_) => Vec::new(),
    }
}

fn is_ctrl_c(event: &Event) -> bool {
    matches!(event, Event::Key(key) if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Route a fresh snapshot of the store into the UI.
fn publish_snapshot(app: &mut App, main_view: &mut MainView, store: &WatchListStore) -> Vec<Effect> {
    app.debuggee_steps = store.debuggee().steps();
    main_view.handle_message(app, &Msg::WatchListChanged(store.snapshot()))
}

fn auto_step_interval(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_auto_step(stepper: &mut Option<Interval>) {
    match stepper.as_mut() {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Entry point for the TUI runtime: sets up the terminal, runs the event
/// loop, and restores the terminal on exit (including on error).
pub async fn run_app(store: WatchListStore, preferences: Arc<UserPreferences>, options: RunOptions) -> Result<()> {
    let mut input_receiver = spawn_input_thread();
    let (msg_sender, msg_receiver) = mpsc::unbounded_channel();

    let loaded = theme::load(preferences.preferred_theme().as_deref());
    info!(theme = loaded.id, entries = store.len(), "starting watchpad");
    let ctx = SharedCtx {
        theme: loaded.theme,
        theme_id: loaded.id,
        preferences: Arc::clone(&preferences),
    };
    let mut app = App::new(ctx, FocusScheduler::new(msg_sender, preferences.focus_delay()));
    app.remember_theme();
    let mut main_view = MainView::new();

    let mut terminal = setup_terminal()?;
    let result = event_loop(
        &mut terminal,
        &mut app,
        &mut main_view,
        store,
        &mut input_receiver,
        msg_receiver,
        options,
    )
    .await;
    cleanup_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    main_view: &mut MainView,
    mut store: WatchListStore,
    input_receiver: &mut mpsc::Receiver<Event>,
    mut msg_receiver: mpsc::UnboundedReceiver<Msg>,
    options: RunOptions,
) -> Result<()> {
    let mut generation = store.subscribe();
    let mut stepper = options.step_interval.map(auto_step_interval);

    let mut effects = publish_snapshot(app, main_view, &store);
    render(terminal, app, main_view)?;

    loop {
        let mut needs_render = false;
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    // Input channel closed; shut down cleanly.
                    break;
                };
                if is_ctrl_c(&event) {
                    break;
                }
                effects.extend(handle_input_event(app, main_view, event));
                needs_render = true;
            }

            Some(msg) = msg_receiver.recv() => {
                effects.extend(main_view.handle_message(app, &msg));
                needs_render = true;
            }

            // Any value stream (or the list) changed
            changed = generation.changed() => {
                if changed.is_ok() {
                    generation.borrow_and_update();
                    needs_render = true;
                }
            }

            _ = next_auto_step(&mut stepper) => {
                effects.push(Effect::StepDebuggee);
            }

            _ = signal::ctrl_c() => { break; }
        }

        if !effects.is_empty() {
            let outcome = cmd::run_from_effects(&mut store, std::mem::take(&mut effects));
            if outcome.quit {
                break;
            }
            if outcome.list_changed {
                effects.extend(publish_snapshot(app, main_view, &store));
            }
            if outcome.stepped {
                app.debuggee_steps = store.debuggee().steps();
            }
            needs_render = true;
        }

        if needs_render {
            render(terminal, app, main_view)?;
        }
    }

    info!(entries = store.len(), steps = store.debuggee().steps(), "watchpad exiting");
    Ok(())
}
