//! # Effect Execution Layer
//!
//! Components never touch the watch list directly: they return [`Effect`]s
//! and this module applies them to the [`WatchListStore`]. The runtime then
//! uses the returned [`CommandOutcome`] to decide whether a fresh list
//! snapshot must be routed back into the UI and whether to shut down.
//!
//! State updates in components stay pure; the store mutation (and the
//! preference write it triggers) lives here.

use tracing::debug;
use watchpad_engine::WatchListStore;
use watchpad_types::Effect;

/// What applying a batch of effects did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The shape or text of the list changed; observers need a new snapshot
    pub list_changed: bool,
    /// The debuggee advanced at least once
    pub stepped: bool,
    /// The user asked to leave
    pub quit: bool,
}

/// Apply `effects` to `store` in order.
pub fn run_from_effects(store: &mut WatchListStore, effects: Vec<Effect>) -> CommandOutcome {
    let mut outcome = CommandOutcome::default();
    for effect in effects {
        debug!(?effect, "applying effect");
        match effect {
            Effect::AddWatchExpression(expression) => {
                store.add(&expression);
                outcome.list_changed = true;
            }
            Effect::RemoveWatchExpression(index) => {
                outcome.list_changed |= store.remove(index).is_some();
            }
            Effect::UpdateWatchExpression { index, expression } => {
                outcome.list_changed |= store.update(index, &expression);
            }
            Effect::StepDebuggee => {
                store.step();
                outcome.stepped = true;
            }
            Effect::Quit => outcome.quit = true,
        }
    }
    outcome
}
