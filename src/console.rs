//! Output sink used by every user-visible message.
//!
//! [`Console`] renders to the terminal, with an `indicatif` spinner for
//! "working" indicators; [`MemoryOutput`] records everything for tests.
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub trait Output: Send + Sync {
    /// Print one line.
    fn print(&self, text: &str);

    /// Print text without a trailing newline and flush it immediately.
    fn print_inline(&self, text: &str);

    /// Print a failure, fatal or recoverable, on the same channel as
    /// everything else.
    fn error(&self, text: &str) {
        self.print(&format!("Error: {text}"));
    }

    /// Show a "working" indicator until [`Output::stop_status`].
    fn start_status(&self, message: &str);

    fn stop_status(&self);
}

/// Clears the status indicator when dropped.
pub struct StatusGuard<'a> {
    output: &'a dyn Output,
}

/// Show `message` as the working indicator for the guard's lifetime.
pub fn status<'a>(output: &'a dyn Output, message: &str) -> StatusGuard<'a> {
    output.start_status(message);
    StatusGuard { output }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        self.output.stop_status();
    }
}

// ── Terminal ─────────────────────────────────────────────────────────

/// Writes to stdout; the spinner draws on stderr.
#[derive(Default)]
pub struct Console {
    spinner: Mutex<Option<ProgressBar>>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Output for Console {
    fn print(&self, text: &str) {
        let spinner = self.spinner.lock().ok();
        match spinner.as_ref().and_then(|s| s.as_ref()) {
            Some(pb) => pb.suspend(|| println!("{text}")),
            None => println!("{text}"),
        }
    }

    fn print_inline(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{text}");
        let _ = stdout.flush();
    }

    fn start_status(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg:.green.bold}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(previous) = spinner.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn stop_status(&self) {
        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
            }
        }
    }
}

// ── Recording sink ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Line(String),
    Inline(String),
    Status(String),
    StatusCleared,
}

/// Records every event in order.
#[derive(Default)]
pub struct MemoryOutput {
    events: Mutex<Vec<OutputEvent>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Printed lines only, without inline chunks or status events.
    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Line(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Everything printed, as it would appear on a terminal.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for event in self.events() {
            match event {
                OutputEvent::Line(line) => {
                    out.push_str(&line);
                    out.push('\n');
                }
                OutputEvent::Inline(text) => out.push_str(&text),
                _ => {}
            }
        }
        out
    }

    fn push(&self, event: OutputEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Output for MemoryOutput {
    fn print(&self, text: &str) {
        self.push(OutputEvent::Line(text.to_string()));
    }

    fn print_inline(&self, text: &str) {
        self.push(OutputEvent::Inline(text.to_string()));
    }

    fn start_status(&self, message: &str) {
        self.push(OutputEvent::Status(message.to_string()));
    }

    fn stop_status(&self) {
        self.push(OutputEvent::StatusCleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prefix() {
        let output = MemoryOutput::new();
        output.error("no documents found");
        assert_eq!(output.lines(), vec!["Error: no documents found"]);
    }

    #[test]
    fn test_status_guard_clears_on_drop() {
        let output = MemoryOutput::new();
        {
            let _working = status(&output, "Working...");
            output.print("inside");
        }
        assert_eq!(
            output.events(),
            vec![
                OutputEvent::Status("Working...".to_string()),
                OutputEvent::Line("inside".to_string()),
                OutputEvent::StatusCleared,
            ]
        );
    }

    #[test]
    fn test_text_joins_lines_and_chunks() {
        let output = MemoryOutput::new();
        output.print("a");
        output.print_inline("b");
        output.print_inline("c");
        assert_eq!(output.text(), "a\nbc");
    }

    #[test]
    fn test_console_status_lifecycle() {
        let console = Console::new();
        console.start_status("one");
        console.start_status("two");
        console.stop_status();
        console.stop_status();
        assert!(console.spinner.lock().unwrap().is_none());
    }
}
