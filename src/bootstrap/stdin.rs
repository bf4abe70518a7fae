//! Stdin capture and argument-vector injection.
//!
//! Piped input is read to completion exactly once, before any spawn decision
//! is finalized, and folded into a child's argument vector so it survives the
//! process hand-off. Standard input is never read twice in one process.

use crossterm::tty::IsTty;
use std::io::Read;

/// Long spelling of the prompt-carrying flag.
pub const PROMPT_FLAG_LONG: &str = "--prompt";

/// Short spelling of the prompt-carrying flag.
pub const PROMPT_FLAG_SHORT: &str = "-p";

/// Whether standard input is attached to an interactive terminal.
pub fn stdin_is_tty() -> bool {
    std::io::stdin().is_tty()
}

/// Read piped standard input to completion.
///
/// Returns `None` when stdin is a terminal or the read is empty.
pub fn capture_stdin() -> std::io::Result<Option<String>> {
    let mut stdin = std::io::stdin();
    if stdin.is_tty() {
        return Ok(None);
    }
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer)?;
    if buffer.is_empty() {
        Ok(None)
    } else {
        Ok(Some(buffer))
    }
}

/// Fold captured stdin text into an argument vector.
///
/// When a prompt flag with a following value is present, the value becomes
/// `captured + "\n\n" + original`; otherwise `--prompt captured` is appended
/// as a trailing pair. All other arguments pass through unchanged and in
/// order. Pure: reads nothing from the environment.
pub fn inject_captured_stdin(mut args: Vec<String>, captured: &str) -> Vec<String> {
    if captured.is_empty() {
        return args;
    }

    let mut index = 0;
    while index + 1 < args.len() {
        if args[index] == PROMPT_FLAG_LONG || args[index] == PROMPT_FLAG_SHORT {
            args[index + 1] = format!("{captured}\n\n{}", args[index + 1]);
            return args;
        }
        index += 1;
    }

    args.push(PROMPT_FLAG_LONG.to_string());
    args.push(captured.to_string());
    args
}

/// Merge piped stdin ahead of the CLI prompt for non-interactive runs.
///
/// Returns `None` when the merged input is effectively empty.
pub fn resolve_one_shot_input(prompt: Option<&str>, captured: Option<&str>) -> Option<String> {
    let prompt = prompt.unwrap_or("");
    let merged = match captured {
        Some(stdin_text) if !stdin_text.is_empty() => {
            if prompt.is_empty() {
                stdin_text.to_string()
            } else {
                format!("{stdin_text}\n\n{prompt}")
            }
        }
        _ => prompt.to_string(),
    };
    if merged.trim().is_empty() {
        None
    } else {
        Some(merged)
    }
}
