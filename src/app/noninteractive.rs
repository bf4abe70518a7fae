//! One-shot execution path: single request, single response, exit.

use quill::auth::validate_auth;
use quill::bootstrap::stdin::resolve_one_shot_input;
use quill::cleanup::CleanupRegistry;
use quill::config::Settings;
use quill::pipeline::{new_correlation_id, Pipeline};
use quill::ui::RenderSink;

/// Run a single request/response exchange and return the exit code.
///
/// Cleanup callbacks run on every exit path, success and failure alike.
pub(crate) async fn run_non_interactive(
    renderer: &dyn RenderSink,
    settings: &Settings,
    cleanup: &CleanupRegistry,
    pipeline: &dyn Pipeline,
    prompt: Option<&str>,
    captured_stdin: Option<&str>,
) -> i32 {
    let Some(input) = resolve_one_shot_input(prompt, captured_stdin) else {
        renderer.error("No input provided. Pass a prompt with -p or pipe text on stdin.");
        cleanup.run_all();
        return 1;
    };

    if let Err(msg) = validate_auth(settings) {
        renderer.error(&msg);
        cleanup.run_all();
        return 1;
    }

    let correlation_id = new_correlation_id();
    let code = match pipeline.execute(&input, &correlation_id).await {
        Ok(response) => {
            renderer.assistant_message(&response);
            0
        }
        Err(e) => {
            renderer.error(&e.to_string());
            1
        }
    };
    cleanup.run_all();
    code
}
