//! Reusable UTF-8 safe single-line text input with cursor management.
//!
//! Used for both the new-expression composer and the in-place row editor.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::theme::Theme;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextInputState {
    /// The underlying text buffer
    input: String,
    /// Cursor byte index into `input` (always on a UTF-8 boundary)
    cursor: usize,
}

impl TextInputState {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            cursor: 0,
        }
    }

    /// Seeded input with the cursor placed at the end.
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        let input = text.into();
        let cursor = input.len();
        Self { input, cursor }
    }

    // ----- Getters -----
    pub fn input(&self) -> &str {
        &self.input
    }
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Display column of the cursor.
    pub fn cursor_column(&self) -> usize {
        self.input[..self.cursor].width()
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    // ----- Editing primitives (UTF-8 safe) -----

    /// Move cursor one Unicode scalar to the left.
    pub fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev_len = self.input[..self.cursor].chars().last().map(|c| c.len_utf8()).unwrap_or(1);
        self.cursor = self.cursor.saturating_sub(prev_len);
    }

    /// Move cursor one Unicode scalar to the right.
    pub fn move_right(&mut self) {
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    /// Insert a char at the cursor.
    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Backspace the char immediately before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = self.input[..self.cursor].chars().last().map(|c| c.len_utf8()).unwrap_or(1);
        let start = self.cursor - prev;
        self.input.drain(start..self.cursor);
        self.cursor = start;
    }

    /// Delete the char under the cursor.
    pub fn delete(&mut self) {
        if let Some(next) = self.input[self.cursor..].chars().next() {
            let end = self.cursor + next.len_utf8();
            self.input.drain(self.cursor..end);
        }
    }
}

/// Draw a one-line input into `area`, showing `placeholder` when empty and
/// placing the terminal cursor when `focused`.
pub fn render_text_input(
    frame: &mut Frame,
    area: Rect,
    state: &TextInputState,
    prompt: Span<'_>,
    placeholder: Option<&str>,
    focused: bool,
    theme: &dyn Theme,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let prompt_width = prompt.content.width();
    let available = usize::from(area.width).saturating_sub(prompt_width + 1);

    // Scroll horizontally so the cursor stays visible.
    let cursor_column = state.cursor_column();
    let overflow = cursor_column.saturating_sub(available);
    let mut skipped = 0usize;
    let mut visible = String::new();
    for ch in state.input().chars() {
        if skipped < overflow {
            skipped += ch.width().unwrap_or(0);
            continue;
        }
        visible.push(ch);
    }

    let body = if state.is_empty() {
        Span::styled(placeholder.unwrap_or_default().to_string(), theme.text_muted_style())
    } else {
        let style = if focused {
            theme.text_primary_style()
        } else {
            theme.text_secondary_style()
        };
        Span::styled(visible, style)
    };
    let line = Line::from(vec![prompt, body]);
    frame.render_widget(Paragraph::new(line).style(Style::default()), area);

    if focused {
        let column = prompt_width + cursor_column.saturating_sub(skipped);
        let x = area.x.saturating_add(u16::try_from(column).unwrap_or(u16::MAX)).min(area.right().saturating_sub(1));
        frame.set_cursor_position((x, area.y));
    }
}
