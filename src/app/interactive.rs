//! Interactive session loop.
//!
//! The keyboard-capability probe resolves here, before any UI is drawn. Input
//! is read on the blocking pool so Ctrl-C can cancel an in-flight request
//! without tearing down the loop.

use quill::auth::validate_auth;
use quill::bootstrap::RELAUNCH_EXIT_CODE;
use quill::build_info;
use quill::cleanup::CleanupRegistry;
use quill::config::Settings;
use quill::diagnostics::DiagnosticSink;
use quill::pipeline::{new_correlation_id, HttpPipeline, Pipeline};
use quill::startup::StartupTasks;
use quill::term::{self, ReadOutcome};
use quill::ui::RenderSink;
use std::sync::Arc;

/// Recognized slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    Quit,
    Restart,
}

/// Parse a slash command from one input line. Returns `None` for plain input.
fn parse_command(line: &str) -> Option<Result<Command, String>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    Some(match trimmed {
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        "/restart" => Ok(Command::Restart),
        other => Err(format!("unknown command `{other}`; try /help")),
    })
}

/// Run the interactive session. Returns the process exit code.
pub(crate) async fn run_interactive(
    renderer: Arc<dyn RenderSink>,
    settings: Settings,
    cleanup: Arc<CleanupRegistry>,
    diagnostics: Arc<DiagnosticSink>,
    pipeline: HttpPipeline,
    tasks: StartupTasks,
    initial_prompt: Option<String>,
) -> i32 {
    if let Err(msg) = validate_auth(&settings) {
        renderer.error(&msg);
        cleanup.run_all();
        return 1;
    }

    // Mandatory join point: the probe result gates UI construction.
    let enhanced_keyboard = tasks.keyboard.resolve().await;

    renderer.section("quill");
    renderer.field("version", &build_info::startup_metadata_line());
    renderer.field("model", &settings.network.model);
    renderer.field(
        "input",
        if enhanced_keyboard {
            "enhanced keyboard"
        } else {
            "basic keyboard"
        },
    );
    if let Some(link) = &tasks.login_link {
        renderer.section("Login");
        renderer.field("url", &link.verification_url);
        renderer.field("code", &link.user_code);
    }

    // A panic mid-read must not leave the terminal in raw mode.
    cleanup.register(|| {
        let _ = crossterm::terminal::disable_raw_mode();
    });

    spawn_update_check(
        settings.network.update_check_url.clone(),
        Arc::clone(&renderer),
        Arc::clone(&diagnostics),
    );

    if let Some(seed) = initial_prompt.as_deref() {
        submit(renderer.as_ref(), &pipeline, seed).await;
    }

    loop {
        let read = tokio::task::spawn_blocking(|| term::read_line("> ")).await;
        let outcome = match read {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                renderer.error(&format!("input error: {e}"));
                break;
            }
            Err(_) => break,
        };

        let line = match outcome {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Eof => break,
            ReadOutcome::Cancelled => continue,
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Some(Ok(Command::Help)) => {
                renderer.section("Commands");
                renderer.field("/help", "show this help");
                renderer.field("/restart", "restart the session process");
                renderer.field("/quit", "exit");
            }
            Some(Ok(Command::Quit)) => break,
            Some(Ok(Command::Restart)) => {
                // The supervising parent respawns us when it sees this code.
                cleanup.run_all();
                return RELAUNCH_EXIT_CODE;
            }
            Some(Err(msg)) => renderer.warn(&msg),
            None => submit(renderer.as_ref(), &pipeline, &line).await,
        }
    }

    cleanup.run_all();
    0
}

/// Send one input through the pipeline; Ctrl-C abandons the in-flight request
/// without ending the session.
async fn submit(renderer: &dyn RenderSink, pipeline: &HttpPipeline, input: &str) {
    let correlation_id = new_correlation_id();
    tokio::select! {
        result = pipeline.execute(input, &correlation_id) => match result {
            Ok(response) => renderer.assistant_message(&response),
            Err(e) => renderer.error(&e.to_string()),
        },
        _ = tokio::signal::ctrl_c() => renderer.warn("request cancelled"),
    }
}

/// Fire-and-forget version check. Failures go to the diagnostic sink and
/// never disturb the session.
fn spawn_update_check(url: String, renderer: Arc<dyn RenderSink>, diagnostics: Arc<DiagnosticSink>) {
    tokio::spawn(async move {
        match fetch_latest_version(&url).await {
            Ok(latest) => {
                if latest != build_info::VERSION {
                    renderer.warn(&format!(
                        "version {latest} is available (running {})",
                        build_info::VERSION
                    ));
                }
            }
            Err(msg) => {
                report_background_failure(renderer.as_ref(), &diagnostics, "update-check", &msg);
            }
        }
    });
}

/// Route one background failure; the first failure in a session also
/// surfaces a visible notice.
fn report_background_failure(
    renderer: &dyn RenderSink,
    diagnostics: &DiagnosticSink,
    source: &str,
    message: &str,
) {
    if diagnostics.report(source, message) {
        renderer.warn("a background task failed; rerun with --debug for details");
    }
}

async fn fetch_latest_version(url: &str) -> Result<String, String> {
    let response = reqwest::get(url).await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("status {}", response.status().as_u16()));
    }
    let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
    body.get("version")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| "missing version field".to_string())
}
