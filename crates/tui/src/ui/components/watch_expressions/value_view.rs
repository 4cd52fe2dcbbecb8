//! Rendering of live evaluation results.

use ratatui::style::Modifier;
use ratatui::text::Span;
use watchpad_types::{EvaluationResult, ValueStream};

use crate::ui::theme::Theme;

/// Spans for the latest value of `stream`.
pub fn value_spans(stream: &ValueStream, theme: &dyn Theme) -> Vec<Span<'static>> {
    result_spans(&stream.current(), theme)
}

pub fn result_spans(result: &EvaluationResult, theme: &dyn Theme) -> Vec<Span<'static>> {
    match result {
        EvaluationResult::Pending => vec![Span::styled("…", theme.text_muted_style())],
        EvaluationResult::Value { display, type_name } => {
            let style = match type_name.as_str() {
                "int" | "float" | "number" => theme.accent_secondary_style(),
                "bool" => theme.accent_primary_style(),
                "string" => theme.status_success(),
                _ => theme.text_primary_style(),
            };
            vec![Span::styled(display.clone(), style)]
        }
        EvaluationResult::Error(message) => vec![Span::styled(
            message.clone(),
            theme.status_error().add_modifier(Modifier::ITALIC),
        )],
    }
}
