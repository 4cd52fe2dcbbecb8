mod state;
pub mod value_view;
mod watch_expressions_component;

pub use state::WatchExpressionsState;
pub use watch_expressions_component::WatchExpressionsComponent;
