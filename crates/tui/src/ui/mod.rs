//! UI rendering module for the watchpad TUI.
//!
//! Components, the main view, theming, the deferred focus timer and the
//! runtime event loop.

pub mod components;
pub mod deferred_focus;
pub mod main_component;
pub mod runtime;
pub mod theme;
