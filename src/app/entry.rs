//! Application entry orchestration for the quill CLI.
//!
//! Entrypoint walkthrough:
//! 1) guard flag combinations that need a terminal,
//! 2) load settings and apply CLI overrides,
//! 3) compute the relaunch decision exactly once and hand off if required,
//! 4) otherwise coordinate startup tasks and dispatch into interactive or
//!    non-interactive mode.

use crate::app::{interactive, noninteractive};
use crate::cli;
use quill::auth::validate_auth;
use quill::bootstrap::memory::{current_heap_limit_bytes, detect_total_memory_bytes, memory_args};
use quill::bootstrap::sandbox::{
    run_plain_handoff, run_sandbox_handoff, sandbox_config_from_settings,
};
use quill::bootstrap::stdin::{capture_stdin, stdin_is_tty};
use quill::bootstrap::{decide_relaunch, ExecutionMode, RelaunchDecision};
use quill::cleanup::CleanupRegistry;
use quill::config::{load_settings, EnvMarkers, Settings};
use quill::diagnostics::DiagnosticSink;
use quill::pipeline::HttpPipeline;
use quill::startup::begin_startup_tasks;
use quill::term;
use quill::ui::{RenderSink, Renderer};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Reject flag combinations before any settings-dependent work happens.
///
/// An interactive seed prompt is meaningless without a terminal on stdin.
fn guard_flags(forced_interactive: bool, stdin_is_tty: bool) -> Result<(), String> {
    if forced_interactive && !stdin_is_tty {
        return Err("--prompt-interactive requires a terminal on stdin".to_string());
    }
    Ok(())
}

/// Top-level CLI entrypoint. Returns the process exit code.
pub(crate) async fn run(args: cli::Args) -> i32 {
    let renderer: Arc<dyn RenderSink> = Arc::new(Renderer::new());

    let tty = stdin_is_tty();
    if let Err(msg) = guard_flags(args.prompt_interactive.is_some(), tty) {
        renderer.error(&msg);
        return 1;
    }

    init_tracing(args.debug);

    let loaded = match load_settings(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            renderer.error(&e.to_string());
            return 1;
        }
    };
    let mut settings = loaded.settings;
    if args.debug {
        settings.debug = true;
    }
    if args.sandbox {
        settings.sandbox.enabled = true;
    }

    let markers = EnvMarkers::from_process_env();

    // The relaunch decision is computed exactly once, before anything
    // expensive or side-effecting happens.
    let relaunch_suppressed = markers.relaunch_disabled || !settings.memory.auto_configure;
    let mem_args = memory_args(
        detect_total_memory_bytes(),
        current_heap_limit_bytes(args.heap_limit_mb, markers.heap_limit_mb),
        settings.debug,
        relaunch_suppressed,
    );
    let sandbox_config = match sandbox_config_from_settings(&settings) {
        Ok(config) => config,
        Err(msg) => {
            renderer.error(&msg);
            return 1;
        }
    };
    let decision = decide_relaunch(&markers, sandbox_config, mem_args);

    match decision {
        RelaunchDecision::Sandbox {
            config,
            memory_args,
        } => {
            // Auth is validated before isolation: login flows that bounce
            // through a browser cannot complete inside the sandbox.
            if let Err(msg) = validate_auth(&settings) {
                renderer.error(&msg);
                return 1;
            }
            match run_sandbox_handoff(&config, &memory_args).await {
                Ok(code) => code,
                Err(e) => {
                    renderer.error(&e.to_string());
                    1
                }
            }
        }
        RelaunchDecision::Memory { memory_args } => {
            match run_plain_handoff(&memory_args).await {
                Ok(code) => code,
                Err(e) => {
                    renderer.error(&e.to_string());
                    1
                }
            }
        }
        RelaunchDecision::Proceed => {
            for warning in &loaded.warnings {
                renderer.warn(warning);
            }
            dispatch(args, settings, markers, renderer, tty).await
        }
    }
}

/// Dispatch a proceeding process into its terminal execution path.
async fn dispatch(
    args: cli::Args,
    settings: Settings,
    markers: EnvMarkers,
    renderer: Arc<dyn RenderSink>,
    tty: bool,
) -> i32 {
    let cleanup = Arc::new(CleanupRegistry::new());
    let diagnostics = Arc::new(DiagnosticSink::new(settings.debug || markers.dev_checks));
    let pipeline = HttpPipeline::from_settings(&settings);

    let mode = quill::bootstrap::execution_mode(
        args.prompt.is_some(),
        args.prompt_interactive.is_some(),
        tty,
    );
    match mode {
        ExecutionMode::NonInteractive => {
            // The only stdin read in this process.
            let captured = match capture_stdin() {
                Ok(captured) => captured,
                Err(e) => {
                    renderer.error(&format!("failed to read stdin: {e}"));
                    cleanup.run_all();
                    return 1;
                }
            };
            noninteractive::run_non_interactive(
                renderer.as_ref(),
                &settings,
                &cleanup,
                &pipeline,
                args.prompt.as_deref(),
                captured.as_deref(),
            )
            .await
        }
        ExecutionMode::Interactive => {
            let tasks = match begin_startup_tasks(&settings, tty, term::raw_mode_active()).await {
                Ok(tasks) => tasks,
                Err(e) => {
                    renderer.error(&format!("login pre-fetch failed: {e}"));
                    cleanup.run_all();
                    return 1;
                }
            };
            interactive::run_interactive(
                renderer,
                settings,
                cleanup,
                diagnostics,
                pipeline,
                tasks,
                args.prompt_interactive,
            )
            .await
        }
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
