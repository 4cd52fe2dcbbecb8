use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::{
    prelude::*,
    style::Style,
    widgets::Paragraph,
};
use watchpad_types::{Effect, HostCommand, Msg};

use super::components::{Component, WatchExpressionsComponent};
use super::theme::theme_helpers as th;
use crate::app::App;

/// Root view: a status header, the watch panel and the hint bar.
#[derive(Debug, Default)]
pub struct MainView {
    pub watch_view: WatchExpressionsComponent,
}

impl MainView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch the host `core:cancel` command and route whatever its
    /// subscribers hand back.
    fn dispatch_cancel(&mut self, app: &mut App) -> Vec<Effect> {
        let mut effects = Vec::new();
        for msg in app.commands.dispatch(HostCommand::Cancel) {
            effects.extend(self.handle_message(app, &msg));
        }
        app.focus.focus(&app.watch.f_list);
        effects
    }

    fn header_line(&self, app: &App) -> Line<'_> {
        let theme = &*app.ctx.theme;
        Line::from(vec![
            Span::styled(" watchpad", theme.accent_emphasis_style()),
            Span::styled("  step ", theme.text_muted_style()),
            Span::styled(app.debuggee_steps.to_string(), theme.accent_secondary_style()),
            Span::styled("  theme ", theme.text_muted_style()),
            Span::styled(app.ctx.theme_id, theme.text_secondary_style()),
        ])
    }

    fn get_preferred_layout(&self, area: Rect) -> Vec<Rect> {
        Layout::vertical([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Watch panel
            Constraint::Length(1), // Hints bar
        ])
        .split(area)
        .to_vec()
    }
}

impl Component for MainView {
    fn handle_message(&mut self, app: &mut App, msg: &Msg) -> Vec<Effect> {
        self.watch_view.handle_message(app, msg)
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        // The row editor owns Esc while it has focus; everywhere else Esc is
        // the host's cancel command.
        if key.code == KeyCode::Esc && !app.watch.edit_field_focused() {
            return self.dispatch_cancel(app);
        }
        self.watch_view.handle_key_events(app, key)
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        self.watch_view.handle_mouse_events(app, mouse)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        let bg_fill = Paragraph::new("").style(Style::default().bg(app.ctx.theme.roles().background));
        frame.render_widget(bg_fill, area);

        let layout = self.get_preferred_layout(area);
        frame.render_widget(Paragraph::new(self.header_line(app)), layout[0]);
        self.watch_view.render(frame, layout[1], app);

        let hint_spans: Vec<Span> = self.get_hint_spans(app);
        let hints_widget = Paragraph::new(Line::from(hint_spans)).style(app.ctx.theme.text_muted_style());
        frame.render_widget(hints_widget, layout[2]);
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        let mut hint_spans: Vec<Span> = vec![Span::styled("Hints: ", app.ctx.theme.text_muted_style())];
        hint_spans.extend(self.watch_view.get_hint_spans(app));
        hint_spans.extend(th::build_hint_spans(&*app.ctx.theme, &[(" Ctrl+C", " Exit ")]));
        hint_spans
    }
}
