pub mod text_input;

pub use text_input::{TextInputState, render_text_input};
