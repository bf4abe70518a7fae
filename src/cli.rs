//! CLI argument parsing via clap.

use clap::Parser;

/// An AI assistant for the terminal. Works with any OpenAI-compatible API.
#[derive(Debug, Parser)]
#[command(name = "quill", version)]
pub struct Args {
    /// Prompt to send. If provided, runs in one-shot mode and exits.
    #[arg(short = 'p', long = "prompt")]
    pub prompt: Option<String>,

    /// Initial prompt to seed an interactive session with. Requires a terminal
    /// on stdin.
    #[arg(short = 'i', long = "prompt-interactive", conflicts_with = "prompt")]
    pub prompt_interactive: Option<String>,

    /// Path to config file (default: ./quill.toml or ~/.config/quill/quill.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Run inside the configured sandbox even when settings leave it off.
    #[arg(long = "sandbox")]
    pub sandbox: bool,

    /// Enable debug diagnostics.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Heap ceiling in megabytes, set by the bootstrap relaunch.
    #[arg(long = "heap-limit-mb", hide = true)]
    pub heap_limit_mb: Option<u64>,
}
