//! Exit-code driven relaunch protocol.
//!
//! A spawned child can request that its parent respawn it by exiting with the
//! reserved [`RELAUNCH_EXIT_CODE`]; any other exit code is adopted verbatim as
//! the parent's own exit status. This is the only sanctioned way to achieve a
//! full process restart without re-running top-level initialization twice in
//! the same process.
//!
//! Known limitation: a child that legitimately wants to exit with the sentinel
//! value is indistinguishable from a relaunch request. The attempt bound keeps
//! that aliasing from turning into an unbounded respawn loop.

use crate::error::RelaunchError;
use std::future::Future;
use std::process::ExitStatus;

/// Reserved exit code meaning "please relaunch me".
pub const RELAUNCH_EXIT_CODE: i32 = 75;

/// Upper bound on consecutive relaunch requests honored per process instance.
pub const MAX_RELAUNCH_ATTEMPTS: u32 = 50;

/// Decoded outcome of one child run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOutcome {
    /// The child asked to be respawned with the same arguments.
    Relaunch,
    /// The child exited; the code must be propagated verbatim.
    Exit(i32),
}

/// Decode a child's exit status at the protocol boundary.
pub fn decode_exit_status(status: ExitStatus) -> ChildOutcome {
    match status.code() {
        Some(RELAUNCH_EXIT_CODE) => ChildOutcome::Relaunch,
        Some(code) => ChildOutcome::Exit(code),
        // Terminated by signal: report failure, never a relaunch request.
        None => ChildOutcome::Exit(1),
    }
}

/// Spawn a child with inherited stdio and wait for it to finish.
pub async fn spawn_and_wait(
    program: &str,
    args: &[String],
    env: &[(String, String)],
) -> std::io::Result<ChildOutcome> {
    let mut command = tokio::process::Command::new(program);
    command.args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    let status = command.status().await?;
    Ok(decode_exit_status(status))
}

/// Drive the spawn/wait/maybe-repeat loop.
///
/// The launcher is invoked once per attempt and must produce an equivalent
/// child each time. Returns the first non-sentinel exit code. Spawn failures
/// are not retried.
pub async fn relaunch_loop<FLaunch, Fut>(mut launcher: FLaunch) -> Result<i32, RelaunchError>
where
    FLaunch: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<ChildOutcome>>,
{
    for attempt in 0..MAX_RELAUNCH_ATTEMPTS {
        let outcome = launcher().await.map_err(RelaunchError::Spawn)?;
        match outcome {
            ChildOutcome::Relaunch => {
                tracing::debug!(attempt, "child requested relaunch");
            }
            ChildOutcome::Exit(code) => return Ok(code),
        }
    }
    Err(RelaunchError::AttemptsExhausted(MAX_RELAUNCH_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[cfg(unix)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn sentinel_exit_code_decodes_as_relaunch() {
        assert_eq!(
            decode_exit_status(exit_status(RELAUNCH_EXIT_CODE)),
            ChildOutcome::Relaunch
        );
    }

    #[test]
    fn ordinary_exit_codes_decode_verbatim() {
        assert_eq!(decode_exit_status(exit_status(0)), ChildOutcome::Exit(0));
        assert_eq!(decode_exit_status(exit_status(5)), ChildOutcome::Exit(5));
    }

    #[test]
    fn signal_termination_decodes_as_failure() {
        use std::os::unix::process::ExitStatusExt;
        // Raw wait status 9 = killed by SIGKILL, no exit code.
        let status = ExitStatus::from_raw(9);
        assert_eq!(decode_exit_status(status), ChildOutcome::Exit(1));
    }

    #[tokio::test]
    async fn loop_respawns_on_sentinel_and_propagates_final_code() {
        // sentinel, sentinel, then 5: exactly three spawns, final status 5.
        let spawns = AtomicU32::new(0);
        let code = relaunch_loop(|| {
            let attempt = spawns.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(match attempt {
                    0 | 1 => ChildOutcome::Relaunch,
                    _ => ChildOutcome::Exit(5),
                })
            }
        })
        .await
        .expect("loop should finish");
        assert_eq!(code, 5);
        assert_eq!(spawns.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn loop_stops_after_attempt_bound() {
        let spawns = AtomicU32::new(0);
        let err = relaunch_loop(|| {
            spawns.fetch_add(1, Ordering::SeqCst);
            async { Ok(ChildOutcome::Relaunch) }
        })
        .await
        .expect_err("loop should give up");
        assert!(matches!(err, RelaunchError::AttemptsExhausted(_)));
        assert_eq!(spawns.load(Ordering::SeqCst), MAX_RELAUNCH_ATTEMPTS);
    }

    #[tokio::test]
    async fn spawn_failure_is_not_retried() {
        let spawns = AtomicU32::new(0);
        let err = relaunch_loop(|| {
            spawns.fetch_add(1, Ordering::SeqCst);
            async { Err(std::io::Error::from(std::io::ErrorKind::NotFound)) }
        })
        .await
        .expect_err("spawn failure should abort");
        assert!(matches!(err, RelaunchError::Spawn(_)));
        assert_eq!(spawns.load(Ordering::SeqCst), 1);
    }
}
