//! Startup task coordination.
//!
//! Independent startup costs overlap: the keyboard-capability probe is issued
//! as soon as "proceed" mode is entered and runs concurrently with settings
//! and extension loading. Its result has a single mandatory join point, right
//! before interactive UI construction. Credential pre-fetch for browserless
//! logins is the other startup task and completes before any interactive UI
//! so the login link can be displayed without a live browser window.

use crate::auth::{self, LoginLink};
use crate::config::{AuthMethod, Settings};
use crate::error::AuthError;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Upper bound for keyboard-capability detection. A probe that has not
/// resolved by then reads as "not supported".
pub const KEYBOARD_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Deferred keyboard-capability detection with one mandatory join point.
///
/// The handle is awaited exactly once via [`KeyboardProbe::resolve`]; it is
/// never polled repeatedly.
pub struct KeyboardProbe {
    handle: JoinHandle<bool>,
}

impl KeyboardProbe {
    /// Issue the detection call in the background.
    ///
    /// The query talks to the terminal and can stall on unusual emulators, so
    /// it runs on the blocking pool under a timeout and always produces a
    /// definite answer.
    pub fn spawn() -> Self {
        let handle = tokio::spawn(async {
            let probe = tokio::task::spawn_blocking(|| {
                crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false)
            });
            match tokio::time::timeout(KEYBOARD_PROBE_TIMEOUT, probe).await {
                Ok(Ok(supported)) => supported,
                // Timeout or probe panic counts as unsupported.
                _ => false,
            }
        });
        Self { handle }
    }

    /// A probe that resolves immediately to "not supported"; used when no
    /// terminal is attached or raw mode is already active.
    pub fn unsupported() -> Self {
        Self {
            handle: tokio::spawn(async { false }),
        }
    }

    /// Join point: await the probe result. Must be called before interactive
    /// UI construction begins.
    pub async fn resolve(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

/// Results of the coordinated startup tasks, handed to the mode dispatcher.
pub struct StartupTasks {
    pub keyboard: KeyboardProbe,
    /// Pre-fetched login link for browserless login flows.
    pub login_link: Option<LoginLink>,
}

/// Launch startup background work with the required ordering guarantees.
///
/// The keyboard probe is issued first so it overlaps the credential
/// pre-fetch network round trip (and any loading the caller continues with).
pub async fn begin_startup_tasks(
    settings: &Settings,
    stdin_is_tty: bool,
    raw_mode_active: bool,
) -> Result<StartupTasks, AuthError> {
    let keyboard = if stdin_is_tty && !raw_mode_active {
        KeyboardProbe::spawn()
    } else {
        KeyboardProbe::unsupported()
    };

    let login_link = if settings.auth.method == AuthMethod::Login && settings.auth.no_browser {
        Some(auth::prefetch_login_link(&settings.network.base_url).await?)
    } else {
        None
    };

    Ok(StartupTasks {
        keyboard,
        login_link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_probe_resolves_false_immediately() {
        assert!(!KeyboardProbe::unsupported().resolve().await);
    }

    #[tokio::test]
    async fn startup_without_tty_skips_keyboard_probe() {
        let settings = Settings::default();
        let tasks = begin_startup_tasks(&settings, false, false)
            .await
            .expect("startup tasks");
        assert!(tasks.login_link.is_none());
        assert!(!tasks.keyboard.resolve().await);
    }

    #[tokio::test]
    async fn startup_with_raw_mode_active_skips_keyboard_probe() {
        let settings = Settings::default();
        let tasks = begin_startup_tasks(&settings, true, true)
            .await
            .expect("startup tasks");
        assert!(!tasks.keyboard.resolve().await);
    }
}
