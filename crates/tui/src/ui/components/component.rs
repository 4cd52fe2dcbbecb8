//! Component system for the watchpad TUI.
//!
//! Components are self-contained UI elements that handle their own events
//! and render themselves into a provided `Rect`, reporting side effects back
//! to the runtime as [`Effect`]s instead of mutating the outside world.

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Span;
use watchpad_types::{Effect, Msg};

use crate::app::App;

/// A UI component with its own state and behavior.
///
/// # Component Lifecycle
///
/// 1. **Messages**: `handle_message()` receives application messages
///    (store updates, host commands, timers)
/// 2. **Input**: `handle_key_events()` / `handle_mouse_events()` receive
///    terminal input routed by the main view
/// 3. **Rendering**: `render()` draws the component; it may record hit
///    areas for later mouse handling but must not change application state
pub(crate) trait Component {
    /// Handle an application-level message the component cares about.
    fn handle_message(&mut self, _app: &mut App, _msg: &Msg) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle key events when this component has focus.
    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle mouse events inside the component.
    fn handle_mouse_events(&mut self, _app: &mut App, _mouse: MouseEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);

    /// Contextual key hints for the hint bar.
    fn get_hint_spans(&self, _app: &App) -> Vec<Span<'_>> {
        Vec::new()
    }
}
