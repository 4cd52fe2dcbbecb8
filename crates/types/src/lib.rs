//! Shared type definitions for the watchpad workspace.
//!
//! The TUI, the engine and the binary all speak in terms of the types in
//! this crate: watch expression entries and their live value streams, the
//! messages routed into components, and the effects components hand back to
//! the runtime.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Stable identity of a watch expression, minted by the list store.
///
/// Rows are addressed by index at the callback boundary; the id lets the UI
/// re-resolve the index of an entry after the list has changed underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WatchId(u64);

impl WatchId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// The debugger's current evaluation result for one expression.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationResult {
    /// No result yet (no debuggee paused, or evaluation still in flight).
    #[default]
    Pending,
    /// A rendered value along with a short type label (e.g. `int`, `bool`).
    Value { display: String, type_name: String },
    /// Evaluation failed; the message is shown in place of the value.
    Error(String),
}

impl EvaluationResult {
    pub fn value(display: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::Value {
            display: display.into(),
            type_name: type_name.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// A continuously-updating observable holding the latest [`EvaluationResult`].
///
/// Cloning a stream yields another observer of the same source.
#[derive(Debug, Clone)]
pub struct ValueStream {
    receiver: watch::Receiver<EvaluationResult>,
}

impl ValueStream {
    pub fn new(receiver: watch::Receiver<EvaluationResult>) -> Self {
        Self { receiver }
    }

    /// Create a source/stream pair seeded with `initial`.
    pub fn channel(initial: EvaluationResult) -> (watch::Sender<EvaluationResult>, Self) {
        let (sender, receiver) = watch::channel(initial);
        (sender, Self::new(receiver))
    }

    /// Snapshot of the latest value.
    pub fn current(&self) -> EvaluationResult {
        self.receiver.borrow().clone()
    }

    /// Wait for the next value. Returns `false` once the source is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

/// One row of the watch list: the expression text and its live value.
#[derive(Debug, Clone)]
pub struct WatchExpression {
    pub id: WatchId,
    pub expression: String,
    pub value: ValueStream,
}

/// Identifies a single edit-mode session of the watch panel.
///
/// A new id is issued every time a row enters edit mode so late deliveries
/// addressed to an earlier session can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EditSessionId(u64);

impl EditSessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Commands owned by the host application that components may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    /// Global "dismiss whatever is in progress" signal.
    Cancel,
}

impl HostCommand {
    pub const fn name(self) -> &'static str {
        match self {
            HostCommand::Cancel => "core:cancel",
        }
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Messages that can be sent to update the application state.
#[derive(Debug, Clone)]
pub enum Msg {
    /// Terminal resized
    Resize(u16, u16),
    /// The store published a new watch list
    WatchListChanged(Vec<WatchExpression>),
    /// Deferred focus transfer into the row editor of `session`
    FocusEditField { session: EditSessionId },
    /// Leave row edit mode without committing (host cancel command)
    CancelEdit,
}

/// Side effects that components hand back to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a new watch expression
    AddWatchExpression(String),
    /// Remove the watch expression at this position
    RemoveWatchExpression(usize),
    /// Replace the expression text at `index`
    UpdateWatchExpression { index: usize, expression: String },
    /// Advance the debuggee by one step and re-evaluate all expressions
    StepDebuggee,
    /// Leave the application
    Quit,
}
