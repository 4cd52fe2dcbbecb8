//! The authoritative watch expression list.
//!
//! The store keeps entries in display order, evaluates each expression
//! against the debuggee and pushes results into one `watch` channel per
//! entry. Observers hold [`ValueStream`]s; they keep working across edits
//! because an update replaces the text but reuses the channel. A generation
//! counter is bumped whenever any value or the list shape changes so the
//! runtime can schedule a redraw.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::{debug, warn};
use watchpad_types::{EvaluationResult, ValueStream, WatchExpression, WatchId};
use watchpad_util::UserPreferences;

use crate::debuggee::SimulatedDebuggee;
use crate::eval::evaluate;

#[derive(Debug)]
struct Entry {
    expression: String,
    source: watch::Sender<EvaluationResult>,
    stream: ValueStream,
}

#[derive(Debug)]
pub struct WatchListStore {
    entries: IndexMap<WatchId, Entry>,
    next_id: u64,
    debuggee: SimulatedDebuggee,
    preferences: Arc<UserPreferences>,
    generation: watch::Sender<u64>,
}

impl WatchListStore {
    /// Build a store seeded with the persisted watch list.
    pub fn new(debuggee: SimulatedDebuggee, preferences: Arc<UserPreferences>) -> Self {
        let (generation, _) = watch::channel(0);
        let mut store = Self {
            entries: IndexMap::new(),
            next_id: 1,
            debuggee,
            preferences,
            generation,
        };
        for expression in store.preferences.watch_expressions() {
            store.insert(expression);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn debuggee(&self) -> &SimulatedDebuggee {
        &self.debuggee
    }

    /// Receiver that changes whenever the list or any value changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Current list, in display order.
    pub fn snapshot(&self) -> Vec<WatchExpression> {
        self.entries
            .iter()
            .map(|(id, entry)| WatchExpression {
                id: *id,
                expression: entry.expression.clone(),
                value: entry.stream.clone(),
            })
            .collect()
    }

    pub fn expressions(&self) -> Vec<String> {
        self.entries.values().map(|entry| entry.expression.clone()).collect()
    }

    /// Append an expression. Empty text is accepted and evaluates to an error.
    pub fn add(&mut self, expression: &str) -> WatchId {
        let id = self.insert(expression.to_string());
        debug!(%id, expression, "watch expression added");
        self.persist();
        self.bump();
        id
    }

    /// Remove the entry at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<WatchId> {
        let Some((id, _)) = self.entries.shift_remove_index(index) else {
            warn!(index, len = self.entries.len(), "remove ignored: index out of range");
            return None;
        };
        debug!(%id, index, "watch expression removed");
        self.persist();
        self.bump();
        Some(id)
    }

    /// Replace the expression text at `index` and re-evaluate it.
    pub fn update(&mut self, index: usize, expression: &str) -> bool {
        let result = self.evaluate(expression);
        let Some((id, entry)) = self.entries.get_index_mut(index) else {
            warn!(index, len = self.entries.len(), "update ignored: index out of range");
            return false;
        };
        entry.expression = expression.to_string();
        publish(&entry.source, result);
        debug!(%id, index, expression, "watch expression updated");
        self.persist();
        self.bump();
        true
    }

    /// Advance the debuggee and re-evaluate every expression.
    pub fn step(&mut self) {
        self.debuggee.step();
        self.reevaluate();
    }

    pub fn reevaluate(&mut self) {
        let mut changed = false;
        for entry in self.entries.values() {
            let result = evaluate_with(&self.debuggee, &entry.expression);
            changed |= publish(&entry.source, result);
        }
        if changed {
            self.bump();
        }
    }

    fn insert(&mut self, expression: String) -> WatchId {
        let id = WatchId::new(self.next_id);
        self.next_id += 1;
        let (source, stream) = ValueStream::channel(self.evaluate(&expression));
        self.entries.insert(
            id,
            Entry {
                expression,
                source,
                stream,
            },
        );
        id
    }

    fn evaluate(&self, expression: &str) -> EvaluationResult {
        evaluate_with(&self.debuggee, expression)
    }

    fn persist(&self) {
        if let Err(error) = self.preferences.set_watch_expressions(self.expressions()) {
            warn!(
                path = %self.preferences.path().display(),
                error = %error,
                "Failed to persist watch expressions"
            );
        }
    }

    fn bump(&self) {
        self.generation.send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}

fn evaluate_with(debuggee: &SimulatedDebuggee, expression: &str) -> EvaluationResult {
    match evaluate(expression, debuggee) {
        Ok(value) => EvaluationResult::value(value.to_string(), value.type_name()),
        Err(error) => EvaluationResult::error(error.to_string()),
    }
}

/// Send `result` only when it differs from the current value.
fn publish(source: &watch::Sender<EvaluationResult>, result: EvaluationResult) -> bool {
    source.send_if_modified(|current| {
        if *current == result {
            return false;
        }
        *current = result;
        true
    })
}
