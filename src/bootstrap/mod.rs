//! Bootstrap orchestration: relaunch decisions, process hand-off, and
//! execution-mode selection.
//!
//! Everything here runs before expensive or side-effecting startup work. The
//! flow is: compute memory flags and the sandbox decision once, hand off to a
//! child when required, and otherwise select the terminal execution path.

pub mod memory;
pub mod relaunch;
pub mod sandbox;
pub mod stdin;

pub use relaunch::{ChildOutcome, MAX_RELAUNCH_ATTEMPTS, RELAUNCH_EXIT_CODE};
pub use sandbox::{decide_relaunch, RelaunchDecision, SandboxConfig};

/// The terminal execution path for a proceeding process. Decided at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Interactive,
    NonInteractive,
}

/// Select the execution mode from the CLI surface and terminal attachment.
///
/// A run is interactive when explicitly forced, or when no one-shot question
/// was supplied and a terminal is attached to standard input.
pub fn execution_mode(
    has_question: bool,
    forced_interactive: bool,
    stdin_is_tty: bool,
) -> ExecutionMode {
    if forced_interactive {
        return ExecutionMode::Interactive;
    }
    if !has_question && stdin_is_tty {
        ExecutionMode::Interactive
    } else {
        ExecutionMode::NonInteractive
    }
}
