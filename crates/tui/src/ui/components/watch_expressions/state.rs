//! State for the watch expressions panel.
//!
//! Holds the latest watch list published by the store, the keyboard
//! selection, the new-expression composer and the row edit-mode state
//! machine:
//!
//! ```text
//!   Idle ──press row i──▶ Editing(i) ──confirm / cancel / blur / core:cancel──▶ Idle
//! ```
//!
//! An [`EditSession`] owns the `core:cancel` subscription and the deferred
//! focus timer for as long as the row is in edit mode, so every way out of
//! edit mode (including being superseded by another press) releases both.

use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use tracing::debug;
use watchpad_types::{EditSessionId, Effect, HostCommand, Msg, WatchExpression, WatchId};

use crate::host::{CommandDisposable, HostCommandRegistry};
use crate::ui::components::common::TextInputState;
use crate::ui::deferred_focus::{DeferredFocus, FocusScheduler};

/// Why a row left edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditExit {
    Confirmed,
    Cancelled,
    Blurred,
}

/// One row in edit mode.
#[derive(Debug)]
pub struct EditSession {
    id: EditSessionId,
    index: usize,
    watch_id: WatchId,
    input: TextInputState,
    /// Set once the deferred focus transfer has landed
    focused: bool,
    cancel_subscription: CommandDisposable,
    focus_timer: DeferredFocus,
}

impl EditSession {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn input(&self) -> &TextInputState {
        &self.input
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    fn release(mut self) {
        self.cancel_subscription.dispose();
        self.focus_timer.cancel();
    }
}

#[derive(Debug, Default)]
pub enum EditMode {
    #[default]
    Idle,
    Editing(EditSession),
}

#[derive(Debug)]
pub struct WatchExpressionsState {
    entries: Vec<WatchExpression>,
    mode: EditMode,
    last_session: EditSessionId,
    selected: usize,
    composer: TextInputState,

    pub container_focus: FocusFlag,
    pub f_list: FocusFlag,
    pub f_edit: FocusFlag,
    pub f_composer: FocusFlag,
}

impl Default for WatchExpressionsState {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchExpressionsState {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            mode: EditMode::Idle,
            last_session: EditSessionId::default(),
            selected: 0,
            composer: TextInputState::new(),
            container_focus: FocusFlag::named("watch"),
            f_list: FocusFlag::named("watch.list"),
            f_edit: FocusFlag::named("watch.edit"),
            f_composer: FocusFlag::named("watch.composer"),
        }
    }

    // ===== SELECTORS =====

    pub fn entries(&self) -> &[WatchExpression] {
        &self.entries
    }

    pub fn selected(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.selected)
    }

    pub fn session(&self) -> Option<&EditSession> {
        match &self.mode {
            EditMode::Editing(session) => Some(session),
            EditMode::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.session().is_some()
    }

    /// Index of the row in edit mode, if any.
    pub fn editing_index(&self) -> Option<usize> {
        self.session().map(EditSession::index)
    }

    /// True once the row editor has received focus and owns keyboard input.
    pub fn edit_field_focused(&self) -> bool {
        self.session().is_some_and(EditSession::is_focused)
    }

    pub fn composer(&self) -> &TextInputState {
        &self.composer
    }

    // ===== REDUCERS =====

    /// Replace the list with a fresh snapshot from the store.
    ///
    /// A row in edit mode follows its entry to the entry's new position.
    /// When the entry is gone the session is cancelled; returns `true` in
    /// that case so the caller can move focus back to the list.
    pub fn set_entries(&mut self, entries: Vec<WatchExpression>) -> bool {
        self.entries = entries;
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
        let EditMode::Editing(session) = &mut self.mode else {
            return false;
        };
        match self.entries.iter().position(|entry| entry.id == session.watch_id) {
            Some(position) => {
                session.index = position;
                false
            }
            None => {
                debug!(watch_id = %session.watch_id, "edited entry was removed");
                self.exit_edit(EditExit::Cancelled)
            }
        }
    }

    pub fn select_next(&mut self) {
        if !self.entries.is_empty() {
            self.selected = (self.selected + 1).min(self.entries.len() - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// `Idle → Editing(index)`.
    ///
    /// Any live session is released before the new `core:cancel`
    /// subscription is registered. Returns `false` when `index` is out of
    /// range.
    pub fn begin_edit(&mut self, index: usize, commands: &HostCommandRegistry, scheduler: &FocusScheduler) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        let watch_id = entry.id;
        let input = TextInputState::with_text(entry.expression.as_str());
        if let EditMode::Editing(previous) = std::mem::take(&mut self.mode) {
            debug!(index = previous.index, "superseding edit session");
            previous.release();
        }

        self.last_session = self.last_session.next();
        let id = self.last_session;
        let cancel_subscription = commands.add(HostCommand::Cancel, Msg::CancelEdit);
        let focus_timer = scheduler.schedule(id);
        self.selected = index;
        self.mode = EditMode::Editing(EditSession {
            id,
            index,
            watch_id,
            input,
            focused: false,
            cancel_subscription,
            focus_timer,
        });
        debug!(index, %watch_id, ?id, "row entered edit mode");
        true
    }

    /// The deferred focus transfer for `session` arrived. Returns `false` for
    /// stale sessions.
    pub fn accept_focus(&mut self, session: EditSessionId) -> bool {
        match &mut self.mode {
            EditMode::Editing(current) if current.id == session => {
                current.focused = true;
                true
            }
            _ => {
                debug!(?session, "ignoring focus request for a stale edit session");
                false
            }
        }
    }

    pub fn edit_input_mut(&mut self) -> Option<&mut TextInputState> {
        match &mut self.mode {
            EditMode::Editing(session) => Some(&mut session.input),
            EditMode::Idle => None,
        }
    }

    /// Commit the editor text and leave edit mode.
    ///
    /// The target index is resolved from the entry's id; if the entry is
    /// gone the edit is dropped without an update.
    pub fn confirm_edit(&mut self) -> Option<Effect> {
        let EditMode::Editing(session) = std::mem::take(&mut self.mode) else {
            return None;
        };
        let index = self.entries.iter().position(|entry| entry.id == session.watch_id);
        let expression = session.input.input().to_string();
        let watch_id = session.watch_id;
        session.release();
        debug!(?index, %watch_id, exit = ?EditExit::Confirmed, "row left edit mode");
        match index {
            Some(index) => Some(Effect::UpdateWatchExpression { index, expression }),
            None => {
                debug!(%watch_id, "edited entry no longer exists; dropping edit");
                None
            }
        }
    }

    /// Leave edit mode without committing. Returns `false` when idle.
    pub fn exit_edit(&mut self, reason: EditExit) -> bool {
        let EditMode::Editing(session) = std::mem::take(&mut self.mode) else {
            return false;
        };
        debug!(index = session.index, exit = ?reason, "row left edit mode");
        session.release();
        true
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.exit_edit(EditExit::Cancelled)
    }

    pub fn blur_edit(&mut self) -> bool {
        self.exit_edit(EditExit::Blurred)
    }

    /// Remove affordance for `index`.
    pub fn remove(&self, index: usize) -> Option<Effect> {
        (index < self.entries.len()).then_some(Effect::RemoveWatchExpression(index))
    }

    pub fn composer_mut(&mut self) -> &mut TextInputState {
        &mut self.composer
    }

    /// Forward the composer text and clear it. Empty text is forwarded as is.
    pub fn submit_composer(&mut self) -> Effect {
        let text = self.composer.input().to_string();
        self.composer.clear();
        Effect::AddWatchExpression(text)
    }
}

impl HasFocus for WatchExpressionsState {
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        builder.leaf_widget(&self.f_list);
        if self.is_editing() {
            builder.leaf_widget(&self.f_edit);
        }
        builder.leaf_widget(&self.f_composer);
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use watchpad_types::{EvaluationResult, ValueStream};

    use super::*;

    fn entry(id: u64, expression: &str) -> WatchExpression {
        let (_, value) = ValueStream::channel(EvaluationResult::Pending);
        WatchExpression {
            id: WatchId::new(id),
            expression: expression.to_string(),
            value,
        }
    }

    fn state_with(expressions: &[&str]) -> WatchExpressionsState {
        let mut state = WatchExpressionsState::new();
        state.set_entries(
            expressions
                .iter()
                .enumerate()
                .map(|(i, e)| entry(i as u64 + 1, e))
                .collect(),
        );
        state
    }

    fn scheduler() -> (FocusScheduler, mpsc::UnboundedReceiver<Msg>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (FocusScheduler::new(sender, Duration::from_millis(1)), receiver)
    }

    #[tokio::test]
    async fn pressing_a_row_enters_edit_mode_for_that_row_only() {
        let commands = HostCommandRegistry::new();
        let (scheduler, _rx) = scheduler();
        for i in 0..3 {
            let mut state = state_with(&["a", "b", "c"]);
            assert!(state.begin_edit(i, &commands, &scheduler));
            assert_eq!(state.editing_index(), Some(i));
            assert_eq!(state.session().unwrap().input().input(), ["a", "b", "c"][i]);
        }
        let mut state = state_with(&["a"]);
        assert!(!state.begin_edit(1, &commands, &scheduler));
        assert!(!state.is_editing());
    }

    #[tokio::test]
    async fn confirm_updates_once_and_returns_to_idle() {
        let commands = HostCommandRegistry::new();
        let (scheduler, _rx) = scheduler();
        let mut state = state_with(&["x+1"]);
        state.begin_edit(0, &commands, &scheduler);

        let input = state.edit_input_mut().unwrap();
        input.backspace();
        input.insert_char('2');

        assert_eq!(
            state.confirm_edit(),
            Some(Effect::UpdateWatchExpression {
                index: 0,
                expression: "x+2".into()
            })
        );
        assert!(!state.is_editing());
        assert_eq!(state.confirm_edit(), None);
        assert_eq!(commands.live_count(HostCommand::Cancel), 0);
    }

    #[tokio::test]
    async fn cancel_and_blur_release_without_update() {
        let commands = HostCommandRegistry::new();
        let (scheduler, _rx) = scheduler();
        let mut state = state_with(&["a", "b"]);

        state.begin_edit(1, &commands, &scheduler);
        assert!(state.cancel_edit());
        assert!(!state.is_editing());
        assert_eq!(commands.live_count(HostCommand::Cancel), 0);

        state.begin_edit(0, &commands, &scheduler);
        assert!(state.blur_edit());
        assert!(!state.is_editing());
        assert_eq!(commands.live_count(HostCommand::Cancel), 0);

        assert!(!state.cancel_edit());
    }

    #[tokio::test]
    async fn re_entry_replaces_the_cancel_subscription() {
        let commands = HostCommandRegistry::new();
        let (scheduler, _rx) = scheduler();
        let mut state = state_with(&["a", "b"]);

        state.begin_edit(0, &commands, &scheduler);
        assert_eq!(commands.live_count(HostCommand::Cancel), 1);
        state.begin_edit(1, &commands, &scheduler);
        assert_eq!(commands.live_count(HostCommand::Cancel), 1);
        assert_eq!(state.editing_index(), Some(1));

        let messages = commands.dispatch(HostCommand::Cancel);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], Msg::CancelEdit));
    }

    #[tokio::test]
    async fn stale_focus_requests_are_ignored() {
        let commands = HostCommandRegistry::new();
        let (scheduler, mut rx) = scheduler();
        let mut state = state_with(&["a", "b"]);

        state.begin_edit(0, &commands, &scheduler);
        let first = state.session().unwrap().id;
        state.begin_edit(1, &commands, &scheduler);
        let second = state.session().unwrap().id;

        assert!(!state.accept_focus(first));
        assert!(!state.edit_field_focused());

        let Some(Msg::FocusEditField { session }) = rx.recv().await else {
            panic!("expected a focus request");
        };
        assert_eq!(session, second);
        assert!(state.accept_focus(session));
        assert!(state.edit_field_focused());
    }

    #[tokio::test]
    async fn edit_follows_its_entry_and_drops_when_entry_vanishes() {
        let commands = HostCommandRegistry::new();
        let (scheduler, _rx) = scheduler();
        let mut state = state_with(&["a", "b", "c"]);
        state.begin_edit(2, &commands, &scheduler);

        // "a" removed elsewhere: "c" is now at index 1.
        state.set_entries(vec![entry(2, "b"), entry(3, "c")]);
        assert_eq!(state.editing_index(), Some(1));
        assert_eq!(
            state.confirm_edit(),
            Some(Effect::UpdateWatchExpression {
                index: 1,
                expression: "c".into()
            })
        );

        state.begin_edit(0, &commands, &scheduler);
        assert_eq!(commands.live_count(HostCommand::Cancel), 1);
        assert!(state.set_entries(vec![entry(3, "c")]));
        assert!(!state.is_editing());
        assert_eq!(state.editing_index(), None);
        assert_eq!(commands.live_count(HostCommand::Cancel), 0);
        assert_eq!(state.confirm_edit(), None);
    }

    #[test]
    fn remove_does_not_enter_edit_mode() {
        let state = state_with(&["a", "b"]);
        assert_eq!(state.remove(1), Some(Effect::RemoveWatchExpression(1)));
        assert_eq!(state.remove(2), None);
        assert!(!state.is_editing());
    }

    #[test]
    fn composer_submits_raw_text_and_clears() {
        let mut state = state_with(&[]);
        for c in "y * 2".chars() {
            state.composer_mut().insert_char(c);
        }
        assert_eq!(state.submit_composer(), Effect::AddWatchExpression("y * 2".into()));
        assert!(state.composer().is_empty());

        state.composer_mut().insert_char(' ');
        assert_eq!(state.submit_composer(), Effect::AddWatchExpression(" ".into()));
    }

    #[test]
    fn selection_is_clamped_to_list() {
        let mut state = state_with(&["a", "b"]);
        state.select_next();
        state.select_next();
        assert_eq!(state.selected(), Some(1));
        state.set_entries(vec![entry(1, "a")]);
        assert_eq!(state.selected(), Some(0));
        state.set_entries(Vec::new());
        assert_eq!(state.selected(), None);
    }
}
