//! Unified error types for the bootstrap orchestrator.

use std::fmt;

// ---------------------------------------------------------------------------
// SettingsError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing settings.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// RelaunchError
// ---------------------------------------------------------------------------

/// Errors from the child-process relaunch protocol.
#[derive(Debug)]
pub enum RelaunchError {
    /// Spawning or waiting on the child failed at the OS level.
    Spawn(std::io::Error),
    /// The child kept requesting relaunch past the attempt bound.
    AttemptsExhausted(u32),
}

impl fmt::Display for RelaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to spawn child process: {e}"),
            Self::AttemptsExhausted(bound) => {
                write!(
                    f,
                    "child requested relaunch more than {bound} times; giving up"
                )
            }
        }
    }
}

impl std::error::Error for RelaunchError {}

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

/// Errors from credential validation and pre-fetch.
#[derive(Debug)]
pub enum AuthError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status from the auth endpoint.
    Status(u16, String),
    /// The response body did not carry the expected fields.
    Malformed(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::Malformed(msg) => write!(f, "malformed auth response: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors from the one-shot request/response pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status from the API.
    Status(u16, String),
    /// Model returned no usable message.
    EmptyResponse,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::EmptyResponse => write!(f, "model returned empty response"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// BootstrapError — top-level
// ---------------------------------------------------------------------------

/// Top-level error type for bootstrap orchestration.
#[derive(Debug)]
pub enum BootstrapError {
    Settings(SettingsError),
    Relaunch(RelaunchError),
    Auth(AuthError),
    /// Stdin capture or other process-local I/O failed.
    Io(std::io::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(e) => write!(f, "settings: {e}"),
            Self::Relaunch(e) => write!(f, "relaunch: {e}"),
            Self::Auth(e) => write!(f, "auth: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<SettingsError> for BootstrapError {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

impl From<RelaunchError> for BootstrapError {
    fn from(e: RelaunchError) -> Self {
        Self::Relaunch(e)
    }
}

impl From<AuthError> for BootstrapError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
