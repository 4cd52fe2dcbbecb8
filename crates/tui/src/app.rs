//! Application state for the watchpad TUI.
//!
//! `App` is the central state container handed to every component: shared
//! context (theme, preferences), the watch panel state, the host command
//! registry and the focus tree.

use std::sync::Arc;

use rat_focus::{Focus, FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tracing::warn;
use watchpad_util::UserPreferences;

use crate::host::HostCommandRegistry;
use crate::ui::components::watch_expressions::WatchExpressionsState;
use crate::ui::deferred_focus::FocusScheduler;
use crate::ui::theme::Theme;

/// Cross-cutting shared context owned by the App.
#[derive(Debug)]
pub struct SharedCtx {
    /// Active theme
    pub theme: Box<dyn Theme>,
    /// Canonical id of the active theme
    pub theme_id: &'static str,
    /// Persisted preferences
    pub preferences: Arc<UserPreferences>,
}

#[derive(Debug)]
pub struct App {
    pub ctx: SharedCtx,
    /// Watch expressions panel state
    pub watch: WatchExpressionsState,
    /// Global host commands (e.g. `core:cancel`)
    pub commands: HostCommandRegistry,
    /// Delivers deferred focus transfers back to the event loop
    pub focus_scheduler: FocusScheduler,
    pub focus: Focus,
    /// Number of times the debuggee has been stepped
    pub debuggee_steps: u64,
    container_focus: FocusFlag,
}

impl App {
    pub fn new(ctx: SharedCtx, focus_scheduler: FocusScheduler) -> Self {
        let mut app = Self {
            ctx,
            watch: WatchExpressionsState::new(),
            commands: HostCommandRegistry::new(),
            focus_scheduler,
            focus: Focus::default(),
            debuggee_steps: 0,
            container_focus: FocusFlag::named("app"),
        };
        app.rebuild_focus();
        app
    }

    /// Rebuild the focus tree so structure changes (the row editor
    /// appearing or disappearing) are reflected. Falls back to the first
    /// leaf when nothing is focused.
    pub fn rebuild_focus(&mut self) {
        let old_focus = std::mem::take(&mut self.focus);
        self.focus = FocusBuilder::rebuild_for(&*self, Some(old_focus));
        if self.focus.focused().is_none() {
            self.focus.first();
        }
    }

    /// Persist the active theme so the next launch starts with it.
    pub fn remember_theme(&self) {
        let preferences = &self.ctx.preferences;
        if preferences.preferred_theme().as_deref() == Some(self.ctx.theme_id) {
            return;
        }
        if let Err(error) = preferences.set_preferred_theme(Some(self.ctx.theme_id.to_string())) {
            warn!(
                path = %preferences.path().display(),
                error = %error,
                "Failed to persist theme preference"
            );
        }
    }
}

impl HasFocus for App {
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        builder.widget(&self.watch);
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}
