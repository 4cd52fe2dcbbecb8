use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use watchpad_types::{Effect, Msg};

use super::value_view::value_spans;
use crate::app::App;
use crate::ui::components::Component;
use crate::ui::components::common::{TextInputState, render_text_input};
use crate::ui::theme::theme_helpers as th;

const TITLE: &str = "Watch Expressions";
const COMPOSER_PLACEHOLDER: &str = "add new watch expression";
const REMOVE_GLYPH: &str = " ✕";

/// Screen areas of one static row, recorded at render time.
#[derive(Debug, Clone, Copy)]
struct RowHitArea {
    index: usize,
    row: Rect,
    remove: Rect,
}

/// Watch expressions panel: rows of `expression: value`, an inline row
/// editor, and the new-expression composer below the list.
#[derive(Debug, Default)]
pub struct WatchExpressionsComponent {
    rows: Vec<RowHitArea>,
    edit_area: Option<Rect>,
    composer_area: Rect,
    /// First list index shown when the list is taller than the panel
    offset: usize,
}

impl WatchExpressionsComponent {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_edit(app: &mut App, index: usize) {
        if app.watch.begin_edit(index, &app.commands, &app.focus_scheduler) {
            app.rebuild_focus();
        }
    }

    /// Return focus to the list after the row editor went away.
    fn after_edit_exit(app: &mut App) {
        app.rebuild_focus();
        app.focus.focus(&app.watch.f_list);
    }

    fn handle_edit_keys(app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter => {
                let effect = app.watch.confirm_edit();
                Self::after_edit_exit(app);
                effect.into_iter().collect()
            }
            KeyCode::Esc => {
                app.watch.cancel_edit();
                Self::after_edit_exit(app);
                Vec::new()
            }
            KeyCode::Tab | KeyCode::BackTab => {
                app.watch.blur_edit();
                Self::after_edit_exit(app);
                if key.code == KeyCode::Tab {
                    app.focus.focus(&app.watch.f_composer);
                }
                Vec::new()
            }
            _ => {
                if let Some(input) = app.watch.edit_input_mut() {
                    edit_text(input, key);
                }
                Vec::new()
            }
        }
    }

    fn handle_composer_keys(app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Enter => vec![app.watch.submit_composer()],
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up => {
                app.focus.focus(&app.watch.f_list);
                Vec::new()
            }
            _ => {
                edit_text(app.watch.composer_mut(), key);
                Vec::new()
            }
        }
    }

    fn handle_list_keys(app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.watch.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.watch.select_next(),
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(index) = app.watch.selected() {
                    Self::begin_edit(app, index);
                }
            }
            KeyCode::Delete | KeyCode::Char('d') => {
                return app.watch.selected().and_then(|index| app.watch.remove(index)).into_iter().collect();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('a') | KeyCode::Char('i') => {
                app.focus.focus(&app.watch.f_composer);
            }
            KeyCode::F(10) | KeyCode::Char('s') => return vec![Effect::StepDebuggee],
            KeyCode::Char('q') => return vec![Effect::Quit],
            _ => {}
        }
        Vec::new()
    }

    /// Keep the row that matters (editing, else selected) inside the window.
    fn scroll_into_view(&mut self, focus_row: Option<usize>, len: usize, visible: usize) {
        if visible == 0 {
            return;
        }
        if let Some(row) = focus_row {
            if row < self.offset {
                self.offset = row;
            } else if row >= self.offset + visible {
                self.offset = row + 1 - visible;
            }
        }
        self.offset = self.offset.min(len.saturating_sub(visible));
    }
}

/// Apply a line-editing key to `input`. Returns `true` when consumed.
fn edit_text(input: &mut TextInputState, key: KeyEvent) -> bool {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('a') if control => input.move_home(),
        KeyCode::Char('e') if control => input.move_end(),
        KeyCode::Char('u') if control => input.clear(),
        KeyCode::Char(c) if !control => input.insert_char(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => return false,
    }
    true
}

impl Component for WatchExpressionsComponent {
    fn handle_message(&mut self, app: &mut App, msg: &Msg) -> Vec<Effect> {
        match msg {
            Msg::WatchListChanged(entries) => {
                if app.watch.set_entries(entries.clone()) {
                    Self::after_edit_exit(app);
                }
            }
            Msg::FocusEditField { session } => {
                if app.watch.accept_focus(*session) {
                    app.rebuild_focus();
                    app.focus.focus(&app.watch.f_edit);
                }
            }
            Msg::CancelEdit => {
                if app.watch.cancel_edit() {
                    Self::after_edit_exit(app);
                }
            }
            Msg::Resize(..) => {}
        }
        Vec::new()
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        // Keys typed before the deferred focus lands still belong to the editor.
        if app.watch.is_editing() {
            return Self::handle_edit_keys(app, key);
        }
        if app.watch.f_composer.get() {
            return Self::handle_composer_keys(app, key);
        }
        Self::handle_list_keys(app, key)
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        let MouseEvent { kind, column, row, .. } = mouse;
        match kind {
            MouseEventKind::ScrollUp => {
                app.watch.select_previous();
                return Vec::new();
            }
            MouseEventKind::ScrollDown => {
                app.watch.select_next();
                return Vec::new();
            }
            MouseEventKind::Down(MouseButton::Left) => {}
            _ => return Vec::new(),
        }

        let position = Position::new(column, row);
        if app.watch.is_editing() {
            // Presses inside the editor stay with the editor.
            if self.edit_area.is_some_and(|area| area.contains(position)) {
                return Vec::new();
            }
            app.watch.blur_edit();
            Self::after_edit_exit(app);
        }

        if let Some(hit) = self.rows.iter().copied().find(|hit| hit.row.contains(position)) {
            // The remove affordance swallows the press; the row never sees it.
            if hit.remove.contains(position) {
                return app.watch.remove(hit.index).into_iter().collect();
            }
            Self::begin_edit(app, hit.index);
            return Vec::new();
        }

        if self.composer_area.contains(position) {
            app.focus.focus(&app.watch.f_composer);
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let theme = &*app.ctx.theme;
        let state = &app.watch;
        let focused = state.f_list.get() || state.f_edit.get() || state.f_composer.get();
        let block = th::block(theme, Some(TITLE), focused);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        self.rows.clear();
        self.edit_area = None;
        self.composer_area = Rect::default();
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let list_height = usize::from(inner.height - 1);
        let entries = state.entries();
        let editing = state.editing_index();
        self.scroll_into_view(editing.or(state.selected()), entries.len(), list_height);

        if entries.is_empty() && list_height > 0 {
            let empty = Paragraph::new(Span::styled("No watch expressions", theme.text_muted_style()));
            frame.render_widget(empty, Rect::new(inner.x, inner.y, inner.width, 1));
        }

        for (slot, (index, entry)) in entries.iter().enumerate().skip(self.offset).take(list_height).enumerate() {
            let row = Rect::new(inner.x, inner.y + slot as u16, inner.width, 1);

            if editing == Some(index)
                && let Some(session) = state.session()
            {
                render_text_input(
                    frame,
                    row,
                    session.input(),
                    Span::styled("› ", theme.accent_emphasis_style()),
                    None,
                    session.is_focused(),
                    theme,
                );
                self.edit_area = Some(row);
                continue;
            }

            let remove_width = REMOVE_GLYPH.chars().count() as u16;
            let remove = if row.width > remove_width * 2 {
                Rect::new(row.right() - remove_width, row.y, remove_width, 1)
            } else {
                Rect::default()
            };
            let text_area = Rect::new(row.x, row.y, row.width - remove.width, 1);

            let mut spans = vec![
                Span::styled(entry.expression.clone(), theme.text_primary_style()),
                Span::styled(": ", theme.text_muted_style()),
            ];
            spans.extend(value_spans(&entry.value, theme));
            let mut line = Paragraph::new(Line::from(spans));
            let mut remove_style = theme.text_muted_style();
            if state.f_list.get() && state.selected() == Some(index) {
                line = line.style(theme.selection_style());
                remove_style = theme.status_error().bg(theme.roles().selection_bg);
            }
            frame.render_widget(line, text_area);
            if remove.width > 0 {
                frame.render_widget(Paragraph::new(Span::styled(REMOVE_GLYPH, remove_style)), remove);
            }
            self.rows.push(RowHitArea { index, row, remove });
        }

        let composer_area = Rect::new(inner.x, inner.bottom() - 1, inner.width, 1);
        render_text_input(
            frame,
            composer_area,
            state.composer(),
            Span::styled("+ ", theme.accent_primary_style()),
            Some(COMPOSER_PLACEHOLDER),
            state.f_composer.get(),
            theme,
        );
        self.composer_area = composer_area;
    }

    fn get_hint_spans(&self, app: &App) -> Vec<Span<'_>> {
        let theme = &*app.ctx.theme;
        if app.watch.is_editing() {
            return th::build_hint_spans(theme, &[(" Enter", " Save  "), (" Esc", " Cancel  "), (" Tab", " Leave ")]);
        }
        if app.watch.f_composer.get() {
            return th::build_hint_spans(theme, &[(" Enter", " Add  "), (" Tab", " List  "), (" Esc", " Back ")]);
        }
        th::build_hint_spans(
            theme,
            &[
                (" ↑/↓", " Select  "),
                (" Enter", " Edit  "),
                (" d", " Remove  "),
                (" a", " Add  "),
                (" s", " Step  "),
                (" q", " Quit "),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc;
    use watchpad_types::{EvaluationResult, HostCommand, ValueStream, WatchExpression, WatchId};
    use watchpad_util::UserPreferences;

    use super::*;
    use crate::app::SharedCtx;
    use crate::ui::deferred_focus::FocusScheduler;
    use crate::ui::theme::DraculaTheme;

    fn app_with(expressions: &[(&str, EvaluationResult)]) -> (App, mpsc::UnboundedReceiver<Msg>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let ctx = SharedCtx {
            theme: Box::new(DraculaTheme::new()),
            theme_id: "dracula",
            preferences: Arc::new(UserPreferences::ephemeral()),
        };
        let mut app = App::new(ctx, FocusScheduler::new(sender, Duration::from_millis(1)));
        let entries = expressions
            .iter()
            .enumerate()
            .map(|(i, (expression, value))| WatchExpression {
                id: WatchId::new(i as u64 + 1),
                expression: expression.to_string(),
                value: ValueStream::channel(value.clone()).1,
            })
            .collect();
        app.watch.set_entries(entries);
        (app, receiver)
    }

    fn draw(component: &mut WatchExpressionsComponent, app: &mut App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(40, 8)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                component.render(frame, area, app);
            })
            .unwrap();
        terminal
    }

    fn press(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn renders_rows_values_and_composer() {
        let (mut app, _rx) = app_with(&[("x+1", EvaluationResult::value("2", "int"))]);
        let mut component = WatchExpressionsComponent::new();
        let terminal = draw(&mut component, &mut app);
        let text = screen_text(&terminal);
        assert!(text.contains("Watch Expressions"));
        assert!(text.contains("x+1: 2"));
        assert!(text.contains("✕"));
        assert!(text.contains(COMPOSER_PLACEHOLDER));
    }

    #[tokio::test]
    async fn pressing_a_row_enters_edit_mode_for_that_row() {
        let (mut app, _rx) = app_with(&[("a", EvaluationResult::Pending), ("b", EvaluationResult::Pending)]);
        let mut component = WatchExpressionsComponent::new();
        draw(&mut component, &mut app);

        let effects = component.handle_mouse_events(&mut app, press(5, 2));
        assert!(effects.is_empty());
        assert_eq!(app.watch.editing_index(), Some(1));
        assert_eq!(app.commands.live_count(HostCommand::Cancel), 1);
    }

    #[tokio::test]
    async fn pressing_remove_removes_without_editing() {
        let (mut app, _rx) = app_with(&[("a", EvaluationResult::Pending), ("b", EvaluationResult::Pending)]);
        let mut component = WatchExpressionsComponent::new();
        draw(&mut component, &mut app);

        let effects = component.handle_mouse_events(&mut app, press(38, 2));
        assert_eq!(effects, vec![Effect::RemoveWatchExpression(1)]);
        assert!(!app.watch.is_editing());
        assert_eq!(app.commands.live_count(HostCommand::Cancel), 0);
    }

    #[tokio::test]
    async fn edit_then_confirm_updates_once() {
        let (mut app, mut rx) = app_with(&[("x+1", EvaluationResult::Pending)]);
        let mut component = WatchExpressionsComponent::new();
        draw(&mut component, &mut app);

        component.handle_mouse_events(&mut app, press(3, 1));
        assert_eq!(app.watch.editing_index(), Some(0));
        draw(&mut component, &mut app);

        let focus_msg = rx.recv().await.unwrap();
        component.handle_message(&mut app, &focus_msg);
        assert!(app.watch.edit_field_focused());

        assert!(component.handle_key_events(&mut app, key(KeyCode::Backspace)).is_empty());
        assert!(component.handle_key_events(&mut app, key(KeyCode::Char('2'))).is_empty());
        let effects = component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert_eq!(
            effects,
            vec![Effect::UpdateWatchExpression {
                index: 0,
                expression: "x+2".into()
            }]
        );
        assert!(!app.watch.is_editing());
        assert_eq!(app.commands.live_count(HostCommand::Cancel), 0);
    }

    #[tokio::test]
    async fn escape_in_editor_and_host_cancel_never_update() {
        let (mut app, mut rx) = app_with(&[("a", EvaluationResult::Pending)]);
        let mut component = WatchExpressionsComponent::new();
        draw(&mut component, &mut app);

        component.handle_mouse_events(&mut app, press(3, 1));
        let focus_msg = rx.recv().await.unwrap();
        component.handle_message(&mut app, &focus_msg);
        assert!(component.handle_key_events(&mut app, key(KeyCode::Esc)).is_empty());
        assert!(!app.watch.is_editing());

        draw(&mut component, &mut app);
        component.handle_mouse_events(&mut app, press(3, 1));
        for msg in app.commands.dispatch(HostCommand::Cancel) {
            assert!(component.handle_message(&mut app, &msg).is_empty());
        }
        assert!(!app.watch.is_editing());
        assert_eq!(app.commands.live_count(HostCommand::Cancel), 0);
    }

    #[tokio::test]
    async fn pressing_outside_the_editor_blurs_it() {
        let (mut app, _rx) = app_with(&[("a", EvaluationResult::Pending), ("b", EvaluationResult::Pending)]);
        let mut component = WatchExpressionsComponent::new();
        draw(&mut component, &mut app);

        component.handle_mouse_events(&mut app, press(3, 1));
        draw(&mut component, &mut app);
        // Press on the composer line.
        let effects = component.handle_mouse_events(&mut app, press(3, 6));
        assert!(effects.is_empty());
        assert!(!app.watch.is_editing());
        assert_eq!(app.commands.live_count(HostCommand::Cancel), 0);
    }

    #[tokio::test]
    async fn list_keys_edit_and_remove_selected_row() {
        let (mut app, _rx) = app_with(&[("a", EvaluationResult::Pending), ("b", EvaluationResult::Pending)]);
        let mut component = WatchExpressionsComponent::new();

        component.handle_key_events(&mut app, key(KeyCode::Down));
        assert_eq!(
            component.handle_key_events(&mut app, key(KeyCode::Char('d'))),
            vec![Effect::RemoveWatchExpression(1)]
        );
        assert!(component.handle_key_events(&mut app, key(KeyCode::Backspace)).is_empty());
        assert_eq!(
            component.handle_key_events(&mut app, key(KeyCode::Char('s'))),
            vec![Effect::StepDebuggee]
        );
        component.handle_key_events(&mut app, key(KeyCode::Enter));
        assert_eq!(app.watch.editing_index(), Some(1));
    }

    #[tokio::test]
    async fn keys_before_focus_lands_go_to_the_editor() {
        let (mut app, _rx) = app_with(&[("ab", EvaluationResult::Pending), ("c", EvaluationResult::Pending)]);
        let mut component = WatchExpressionsComponent::new();
        draw(&mut component, &mut app);

        component.handle_mouse_events(&mut app, press(3, 1));
        assert!(!app.watch.edit_field_focused());

        assert!(component.handle_key_events(&mut app, key(KeyCode::Backspace)).is_empty());
        assert!(component.handle_key_events(&mut app, key(KeyCode::Char('d'))).is_empty());
        assert_eq!(app.watch.session().unwrap().input().input(), "ad");
        assert_eq!(app.watch.editing_index(), Some(0));
    }

    #[tokio::test]
    async fn removing_the_edited_entry_ends_the_edit() {
        let (mut app, _rx) = app_with(&[
            ("aaa", EvaluationResult::Pending),
            ("bbb", EvaluationResult::Pending),
            ("ccc", EvaluationResult::Pending),
        ]);
        let mut component = WatchExpressionsComponent::new();
        draw(&mut component, &mut app);

        component.handle_mouse_events(&mut app, press(3, 1));
        assert_eq!(app.watch.editing_index(), Some(0));

        let remaining: Vec<WatchExpression> = app.watch.entries()[1..].to_vec();
        component.handle_message(&mut app, &Msg::WatchListChanged(remaining));
        assert!(!app.watch.is_editing());
        assert_eq!(app.commands.live_count(HostCommand::Cancel), 0);

        let terminal = draw(&mut component, &mut app);
        let text = screen_text(&terminal);
        assert!(text.contains("bbb: "));
        assert!(!text.contains("aaa"));

        // The first row is bbb again, remove glyph included.
        let effects = component.handle_mouse_events(&mut app, press(38, 1));
        assert_eq!(effects, vec![Effect::RemoveWatchExpression(0)]);
    }
}
