//! Host command registry.
//!
//! The host owns a small set of global commands (see [`HostCommand`]).
//! Components subscribe for the duration of some transient state by adding a
//! handler and holding on to the returned [`CommandDisposable`]; dropping the
//! disposable unregisters the handler. Handlers are plain messages: when a
//! command is dispatched, the registry hands back the messages of every live
//! handler and the caller routes them like any other `Msg`.
//!
//! Everything runs on the UI task, so the registry is `Rc<RefCell<..>>`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;
use watchpad_types::{HostCommand, Msg};

#[derive(Debug, Default)]
struct Handlers {
    next_id: u64,
    entries: Vec<Handler>,
}

#[derive(Debug)]
struct Handler {
    id: u64,
    command: HostCommand,
    msg: Msg,
}

#[derive(Debug, Clone, Default)]
pub struct HostCommandRegistry {
    handlers: Rc<RefCell<Handlers>>,
}

impl HostCommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `msg` to be produced whenever `command` is dispatched.
    pub fn add(&self, command: HostCommand, msg: Msg) -> CommandDisposable {
        let mut handlers = self.handlers.borrow_mut();
        handlers.next_id += 1;
        let id = handlers.next_id;
        handlers.entries.push(Handler { id, command, msg });
        debug!(%command, id, "host command handler added");
        CommandDisposable {
            handlers: Rc::downgrade(&self.handlers),
            id,
            command,
            disposed: false,
        }
    }

    /// Messages of every live handler for `command`, in registration order.
    pub fn dispatch(&self, command: HostCommand) -> Vec<Msg> {
        let messages: Vec<Msg> = self
            .handlers
            .borrow()
            .entries
            .iter()
            .filter(|handler| handler.command == command)
            .map(|handler| handler.msg.clone())
            .collect();
        debug!(%command, handlers = messages.len(), "host command dispatched");
        messages
    }

    pub fn live_count(&self, command: HostCommand) -> usize {
        self.handlers
            .borrow()
            .entries
            .iter()
            .filter(|handler| handler.command == command)
            .count()
    }
}

/// Guard for a registered handler; unregisters on [`dispose`](Self::dispose) or drop.
#[derive(Debug)]
pub struct CommandDisposable {
    handlers: Weak<RefCell<Handlers>>,
    id: u64,
    command: HostCommand,
    disposed: bool,
}

impl CommandDisposable {
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(handlers) = self.handlers.upgrade() {
            handlers.borrow_mut().entries.retain(|handler| handler.id != self.id);
            debug!(command = %self.command, id = self.id, "host command handler disposed");
        }
    }
}

impl Drop for CommandDisposable {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_reaches_live_handlers_only() {
        let registry = HostCommandRegistry::new();
        let mut first = registry.add(HostCommand::Cancel, Msg::CancelEdit);
        let second = registry.add(HostCommand::Cancel, Msg::Resize(80, 24));
        assert_eq!(registry.live_count(HostCommand::Cancel), 2);

        first.dispose();
        let messages = registry.dispatch(HostCommand::Cancel);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], Msg::Resize(80, 24)));

        drop(second);
        assert_eq!(registry.live_count(HostCommand::Cancel), 0);
        assert!(registry.dispatch(HostCommand::Cancel).is_empty());
    }

    #[test]
    fn disposing_twice_is_harmless() {
        let registry = HostCommandRegistry::new();
        let mut disposable = registry.add(HostCommand::Cancel, Msg::CancelEdit);
        let _other = registry.add(HostCommand::Cancel, Msg::CancelEdit);
        disposable.dispose();
        disposable.dispose();
        drop(disposable);
        assert_eq!(registry.live_count(HostCommand::Cancel), 1);
    }

    #[test]
    fn disposable_outliving_registry_is_inert() {
        let registry = HostCommandRegistry::new();
        let disposable = registry.add(HostCommand::Cancel, Msg::CancelEdit);
        drop(registry);
        drop(disposable);
    }
}
