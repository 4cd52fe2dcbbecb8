//! UI components.

pub mod common;
pub mod component;
pub mod watch_expressions;

pub(crate) use component::Component;
pub use watch_expressions::WatchExpressionsComponent;
