//! Sandbox decision and child hand-off.
//!
//! The relaunch decision is computed exactly once per process start, before
//! extensions load, and is never revisited. A process that decides to relaunch
//! becomes a thin supervisor: it captures stdin when needed, spawns the child
//! through the relaunch protocol, and terminates with the child's status.

use crate::bootstrap::relaunch::{relaunch_loop, spawn_and_wait};
use crate::bootstrap::stdin::{capture_stdin, inject_captured_stdin};
use crate::config::env::{EnvMarkers, BOOTSTRAPPED_MARKER, HEAP_LIMIT_ENV};
use crate::config::{SandboxKind, Settings};
use crate::error::BootstrapError;

/// Binary name used for the re-exec inside a container image.
const SANDBOX_BINARY: &str = "quill";

/// How the relaunched child should be isolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxConfig {
    /// Run the child inside a container image.
    Container { engine: String, image: String },
    /// Re-exec the current binary under a named OS sandbox profile.
    Profile { name: String },
}

/// The once-computed choice among proceeding normally, relaunching for
/// memory, or relaunching into a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaunchDecision {
    /// Already inside the target execution context; fall through to dispatch.
    Proceed,
    /// Spawn a plain child copy so deeper components can request a restart.
    Memory { memory_args: Vec<String> },
    /// Hand off into an isolated child.
    Sandbox {
        config: SandboxConfig,
        memory_args: Vec<String>,
    },
}

/// Derive the optional sandbox configuration from settings.
pub fn sandbox_config_from_settings(settings: &Settings) -> Result<Option<SandboxConfig>, String> {
    if !settings.sandbox.enabled {
        return Ok(None);
    }
    match settings.sandbox.kind {
        SandboxKind::Container => {
            let image = settings.sandbox.image.trim();
            if image.is_empty() {
                return Err(
                    "sandbox.enabled is set with kind `container` but sandbox.image is empty"
                        .to_string(),
                );
            }
            Ok(Some(SandboxConfig::Container {
                engine: settings.sandbox.engine.clone(),
                image: image.to_string(),
            }))
        }
        SandboxKind::Profile => {
            let name = settings.sandbox.profile.trim();
            if name.is_empty() {
                return Err(
                    "sandbox.enabled is set with kind `profile` but sandbox.profile is empty"
                        .to_string(),
                );
            }
            Ok(Some(SandboxConfig::Profile {
                name: name.to_string(),
            }))
        }
    }
}

/// Compute the relaunch decision. Called exactly once per process start.
pub fn decide_relaunch(
    markers: &EnvMarkers,
    sandbox: Option<SandboxConfig>,
    memory_args: Vec<String>,
) -> RelaunchDecision {
    if markers.bootstrapped {
        return RelaunchDecision::Proceed;
    }
    match sandbox {
        Some(config) => RelaunchDecision::Sandbox {
            config,
            memory_args,
        },
        None => RelaunchDecision::Memory { memory_args },
    }
}

/// Build the program and argument vector launching `argv` under the sandbox.
///
/// `argv` is this process's own program plus arguments, with stdin already
/// injected. The isolation technology itself is outside this module's remit;
/// only the command shape is decided here.
pub fn sandbox_command(config: &SandboxConfig, argv: &[String]) -> (String, Vec<String>) {
    match config {
        SandboxConfig::Container { engine, image } => {
            let mut args = vec![
                "run".to_string(),
                "--rm".to_string(),
                "-i".to_string(),
                "--env".to_string(),
                format!("{BOOTSTRAPPED_MARKER}=1"),
            ];
            // The env mirror must cross the container boundary; variables set
            // on the engine process itself do not.
            if let Some(mb) = heap_limit_from_args(argv) {
                args.push("--env".to_string());
                args.push(format!("{HEAP_LIMIT_ENV}={mb}"));
            }
            args.push(image.clone());
            args.push(SANDBOX_BINARY.to_string());
            args.extend(argv.iter().skip(1).cloned());
            (engine.clone(), args)
        }
        // Profile sandboxes re-exec the same binary; the profile is applied
        // through the child environment by the launcher below.
        SandboxConfig::Profile { .. } => (argv[0].clone(), argv[1..].to_vec()),
    }
}

/// Environment passed to every relaunched child.
fn child_env(heap_limit_mb: Option<u64>, profile: Option<&str>) -> Vec<(String, String)> {
    let mut env = vec![(BOOTSTRAPPED_MARKER.to_string(), "1".to_string())];
    if let Some(mb) = heap_limit_mb {
        env.push((HEAP_LIMIT_ENV.to_string(), mb.to_string()));
    }
    if let Some(name) = profile {
        env.push(("QUILL_SANDBOX_PROFILE".to_string(), name.to_string()));
    }
    env
}

/// Extract the megabyte value encoded in a `--heap-limit-mb=<n>` flag list.
fn heap_limit_from_args(memory_args: &[String]) -> Option<u64> {
    memory_args.iter().find_map(|arg| {
        arg.strip_prefix("--heap-limit-mb=")
            .and_then(|value| value.parse().ok())
    })
}

/// This process's argument vector: resolved executable plus raw arguments.
fn current_argv() -> std::io::Result<Vec<String>> {
    let exe = std::env::current_exe()?;
    let mut argv = vec![exe.to_string_lossy().into_owned()];
    argv.extend(std::env::args().skip(1));
    Ok(argv)
}

/// Drive the full sandbox hand-off and return the child's final exit code.
///
/// Captures piped stdin before the spawn is finalized and folds it into the
/// outgoing argument vector, since the sandboxed child may not inherit the
/// same stream semantics.
pub async fn run_sandbox_handoff(
    config: &SandboxConfig,
    memory_args: &[String],
) -> Result<i32, BootstrapError> {
    let captured = capture_stdin()?;
    let mut argv = current_argv()?;
    if let Some(text) = captured.as_deref() {
        argv = inject_captured_stdin(argv, text);
    }
    argv.extend(memory_args.iter().cloned());

    let (program, args) = sandbox_command(config, &argv);
    let profile = match config {
        SandboxConfig::Profile { name } => Some(name.as_str()),
        SandboxConfig::Container { .. } => None,
    };
    let env = child_env(heap_limit_from_args(memory_args), profile);

    let code = relaunch_loop(move || {
        let program = program.clone();
        let args = args.clone();
        let env = env.clone();
        async move { spawn_and_wait(&program, &args, &env).await }
    })
    .await?;
    Ok(code)
}

/// Spawn a plain child copy of the current process and supervise it.
///
/// Stdin is inherited rather than captured, and auth is not pre-validated;
/// the child performs its own validation once inside the target context.
pub async fn run_plain_handoff(memory_args: &[String]) -> Result<i32, BootstrapError> {
    let mut argv = current_argv()?;
    argv.extend(memory_args.iter().cloned());

    let program = argv[0].clone();
    let args = argv[1..].to_vec();
    let env = child_env(heap_limit_from_args(memory_args), None);

    let code = relaunch_loop(move || {
        let program = program.clone();
        let args = args.clone();
        let env = env.clone();
        async move { spawn_and_wait(&program, &args, &env).await }
    })
    .await?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn container_config() -> SandboxConfig {
        SandboxConfig::Container {
            engine: "docker".to_string(),
            image: "quill-sandbox:latest".to_string(),
        }
    }

    #[test]
    fn bootstrapped_marker_forces_proceed() {
        let markers = EnvMarkers {
            bootstrapped: true,
            ..EnvMarkers::default()
        };
        let decision = decide_relaunch(
            &markers,
            Some(container_config()),
            vec!["--heap-limit-mb=8192".to_string()],
        );
        assert_eq!(decision, RelaunchDecision::Proceed);
    }

    #[test]
    fn sandbox_config_wins_over_plain_relaunch() {
        let decision = decide_relaunch(&EnvMarkers::default(), Some(container_config()), vec![]);
        assert!(matches!(decision, RelaunchDecision::Sandbox { .. }));
    }

    #[test]
    fn absent_sandbox_yields_plain_relaunch_with_memory_args() {
        let decision = decide_relaunch(
            &EnvMarkers::default(),
            None,
            vec!["--heap-limit-mb=8192".to_string()],
        );
        match decision {
            RelaunchDecision::Memory { memory_args } => {
                assert_eq!(memory_args, vec!["--heap-limit-mb=8192".to_string()]);
            }
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn settings_without_sandbox_resolve_to_none() {
        let settings = Settings::default();
        assert_eq!(sandbox_config_from_settings(&settings), Ok(None));
    }

    #[test]
    fn container_sandbox_requires_image() {
        let mut settings = Settings::default();
        settings.sandbox.enabled = true;
        let err = sandbox_config_from_settings(&settings).expect_err("image missing");
        assert!(err.contains("sandbox.image"), "err: {err}");
    }

    #[test]
    fn profile_sandbox_requires_profile_name() {
        let mut settings = Settings::default();
        settings.sandbox.enabled = true;
        settings.sandbox.kind = SandboxKind::Profile;
        let err = sandbox_config_from_settings(&settings).expect_err("profile missing");
        assert!(err.contains("sandbox.profile"), "err: {err}");
    }

    #[test]
    fn container_command_wraps_argv_behind_image() {
        let argv = vec![
            "/usr/local/bin/quill".to_string(),
            "--prompt".to_string(),
            "hi".to_string(),
        ];
        let (program, args) = sandbox_command(&container_config(), &argv);
        assert_eq!(program, "docker");
        let image_at = args
            .iter()
            .position(|arg| arg == "quill-sandbox:latest")
            .expect("image present");
        assert_eq!(&args[image_at + 1..], &["quill", "--prompt", "hi"]);
    }

    #[test]
    fn container_command_crosses_heap_limit_env_into_container() {
        let argv = vec![
            "/usr/local/bin/quill".to_string(),
            "--heap-limit-mb=8192".to_string(),
        ];
        let (_, args) = sandbox_command(&container_config(), &argv);
        let image_at = args
            .iter()
            .position(|arg| arg == "quill-sandbox:latest")
            .expect("image present");
        // Both env pairs must appear before the image so the engine applies
        // them inside the container.
        let engine_args = &args[..image_at];
        assert!(engine_args.contains(&format!("{BOOTSTRAPPED_MARKER}=1")));
        assert!(engine_args.contains(&format!("{HEAP_LIMIT_ENV}=8192")));
    }

    #[test]
    fn profile_command_reexecs_current_binary() {
        let argv = vec!["/usr/local/bin/quill".to_string(), "--debug".to_string()];
        let config = SandboxConfig::Profile {
            name: "restricted".to_string(),
        };
        let (program, args) = sandbox_command(&config, &argv);
        assert_eq!(program, "/usr/local/bin/quill");
        assert_eq!(args, vec!["--debug".to_string()]);
    }

    #[test]
    fn heap_limit_parses_from_memory_flag() {
        assert_eq!(
            heap_limit_from_args(&["--heap-limit-mb=8192".to_string()]),
            Some(8192)
        );
        assert_eq!(heap_limit_from_args(&[]), None);
    }

    #[test]
    fn child_env_always_marks_bootstrapped() {
        let env = child_env(None, None);
        assert_eq!(env, vec![(BOOTSTRAPPED_MARKER.to_string(), "1".to_string())]);
    }
}
