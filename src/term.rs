//! Terminal state management and minimal raw-mode line input.
//!
//! The raw-mode guard owns the prior terminal mode and guarantees restoration
//! on every exit path: normal return, thrown error, or an interrupt arriving
//! while the editor is active.

use crossterm::event::{read, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{self, Write};

/// Raw mode lifetime guard so terminal state is restored on any return path.
///
/// Captures whether raw mode was already active at acquisition and only
/// restores when this guard was the one to enable it.
pub struct RawModeGuard {
    was_raw: bool,
}

impl RawModeGuard {
    /// Enable terminal raw mode and return a guard that restores the prior
    /// mode on drop.
    pub fn acquire() -> io::Result<Self> {
        let was_raw = terminal::is_raw_mode_enabled().unwrap_or(false);
        if !was_raw {
            terminal::enable_raw_mode()?;
        }
        Ok(Self { was_raw })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if !self.was_raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Whether the terminal is currently in raw-input mode.
pub fn raw_mode_active() -> bool {
    terminal::is_raw_mode_enabled().unwrap_or(false)
}

/// Outcome of one interactive line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-D on an empty line.
    Eof,
    /// Ctrl-C.
    Cancelled,
}

/// Read one line in raw mode with minimal editing (backspace only).
///
/// Blocking; callers on an async runtime should wrap this in
/// `spawn_blocking`. The raw-mode guard restores the terminal before any
/// return, including cancellation.
pub fn read_line(prompt: &str) -> io::Result<ReadOutcome> {
    let _guard = RawModeGuard::acquire()?;
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;

    let mut buffer = String::new();
    loop {
        let Event::Key(key) = read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    write!(stderr, "\r\n")?;
                    stderr.flush()?;
                    return Ok(ReadOutcome::Cancelled);
                }
                KeyCode::Char('d') if buffer.is_empty() => {
                    write!(stderr, "\r\n")?;
                    stderr.flush()?;
                    return Ok(ReadOutcome::Eof);
                }
                _ => continue,
            }
        }

        match key.code {
            KeyCode::Enter => {
                write!(stderr, "\r\n")?;
                stderr.flush()?;
                return Ok(ReadOutcome::Line(buffer));
            }
            KeyCode::Backspace => {
                if buffer.pop().is_some() {
                    write!(stderr, "\u{8} \u{8}")?;
                    stderr.flush()?;
                }
            }
            KeyCode::Char(ch) => {
                buffer.push(ch);
                write!(stderr, "{ch}")?;
                stderr.flush()?;
            }
            _ => {}
        }
    }
}
