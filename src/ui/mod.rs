//! Rendering contract and default terminal renderer.
//!
//! `RenderSink` is the UI contract consumed by the mode dispatchers. Tests
//! substitute a mock sink; the default `Renderer` writes assistant output to
//! stdout and everything else to stderr.

use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use std::io::{self, Write};

/// Injectable rendering interface used by orchestration code.
pub trait RenderSink: Send + Sync {
    /// Render one assistant message destined for stdout.
    fn assistant_message(&self, content: &str);
    /// Render a warning line.
    fn warn(&self, msg: &str);
    /// Render a titled section divider.
    fn section(&self, title: &str);
    /// Render one key/value field row.
    fn field(&self, key: &str, value: &str);
    /// Render an error line.
    fn error(&self, msg: &str);
}

/// Default terminal renderer.
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_tty(),
        }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self { color: false }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for Renderer {
    fn assistant_message(&self, content: &str) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{content}");
        let _ = stdout.flush();
    }

    fn warn(&self, msg: &str) {
        let mut stderr = io::stderr();
        if self.color {
            let _ = writeln!(stderr, "{} {msg}", "warning:".yellow().bold());
        } else {
            let _ = writeln!(stderr, "warning: {msg}");
        }
    }

    fn section(&self, title: &str) {
        let mut stderr = io::stderr();
        if self.color {
            let _ = writeln!(stderr, "\n{}", title.bold());
        } else {
            let _ = writeln!(stderr, "\n{title}");
        }
    }

    fn field(&self, key: &str, value: &str) {
        let mut stderr = io::stderr();
        if self.color {
            let _ = writeln!(stderr, "  {} {value}", format!("{key}:").dim());
        } else {
            let _ = writeln!(stderr, "  {key}: {value}");
        }
    }

    fn error(&self, msg: &str) {
        let mut stderr = io::stderr();
        if self.color {
            let _ = writeln!(stderr, "{} {msg}", "error:".red().bold());
        } else {
            let _ = writeln!(stderr, "error: {msg}");
        }
    }
}
