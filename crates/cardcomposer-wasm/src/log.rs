//! Session log shown to the user.
//!
//! Every line is forwarded to the browser console and kept so the host page
//! can render a log panel.

use std::collections::VecDeque;

/// Accumulated, user-facing log lines.
#[derive(Debug, Default)]
pub struct SessionLog {
    lines: VecDeque<String>,
}

impl SessionLog {
    /// Oldest lines are dropped beyond this many.
    pub const MAX_LINES: usize = 500;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let line = format!("[{}] {}", timestamp(), message.into());
        write_console(&line);

        if self.lines.len() == Self::MAX_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> &VecDeque<String> {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(target_arch = "wasm32")]
fn timestamp() -> String {
    String::from(js_sys::Date::new_0().to_locale_time_string("default"))
}

#[cfg(not(target_arch = "wasm32"))]
fn timestamp() -> String {
    "--:--:--".to_string()
}

#[cfg(target_arch = "wasm32")]
fn write_console(line: &str) {
    web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(line));
}

#[cfg(not(target_arch = "wasm32"))]
fn write_console(_line: &str) {}
