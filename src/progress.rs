//! Spinner for the slow file-tree copies
//!
//! Backups and restores copy the whole project directory, which can take a
//! while on checkouts with a virtualenv or build artifacts inside.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const TEMPLATE: &str = "{spinner:.cyan} {msg} {elapsed:.dim}";

/// Shows a spinner while a copy is in flight; inert when disabled
pub struct Progress {
    /// Disabled in quiet and JSON mode
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `work` with a spinner labelled `message`, clearing it afterwards
    pub fn while_running<T>(&mut self, message: &str, work: impl FnOnce() -> T) -> T {
        self.start(message);
        let result = work();
        self.clear();
        result
    }

    fn start(&mut self, message: &str) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.tick_chars(TICK_CHARS));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(bar);
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.clear();
    }
}
