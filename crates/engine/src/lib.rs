//! Host-side collaborators of the watch panel.
//!
//! - [`WatchListStore`] owns the authoritative watch list, mints ids,
//!   publishes one [`watchpad_types::ValueStream`] per entry and persists
//!   the list through [`watchpad_util::UserPreferences`].
//! - [`eval`] evaluates expression text against a [`eval::Scope`].
//! - [`SimulatedDebuggee`] stands in for a paused debuggee whose variables
//!   change every time it is stepped.

pub mod debuggee;
pub mod eval;
pub mod store;

pub use debuggee::{ParseVarError, SimulatedDebuggee, parse_var};
pub use eval::{EvalError, Scope, Value, evaluate};
pub use store::WatchListStore;
