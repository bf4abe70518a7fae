//! Environment marker handling for bootstrap decisions.
//!
//! Markers are read once at startup into an [`EnvMarkers`] snapshot so the
//! relaunch decision never observes a half-updated environment. Lookups are
//! closure-injected so tests can exercise marker combinations without mutating
//! process state.

/// Set in a child's environment to mark it as already inside the target
/// execution context. Presence suppresses relaunch/sandbox logic entirely.
pub const BOOTSTRAPPED_MARKER: &str = "QUILL_BOOTSTRAPPED";

/// Disables memory-based relaunch unconditionally.
pub const NO_RELAUNCH_MARKER: &str = "QUILL_NO_RELAUNCH";

/// Enables extra developer-facing checks and diagnostics surfacing.
pub const DEV_MARKER: &str = "QUILL_DEV";

/// Heap ceiling (in megabytes) the current process was relaunched with.
pub const HEAP_LIMIT_ENV: &str = "QUILL_HEAP_LIMIT_MB";

/// Runtime API key override.
pub const API_KEY_ENV: &str = "QUILL_API_KEY";

/// Runtime base URL override.
pub const BASE_URL_ENV: &str = "QUILL_BASE_URL";

/// Snapshot of the environment markers consumed by bootstrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvMarkers {
    /// This process is already inside the target execution context.
    pub bootstrapped: bool,
    /// Memory-based relaunch is disabled unconditionally.
    pub relaunch_disabled: bool,
    /// Developer-facing checks are enabled.
    pub dev_checks: bool,
    /// Heap ceiling applied by a previous memory relaunch, in megabytes.
    pub heap_limit_mb: Option<u64>,
}

impl EnvMarkers {
    /// Read markers from the process environment.
    pub fn from_process_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read markers through an injected lookup.
    pub fn from_lookup<FEnv>(env_lookup: FEnv) -> Self
    where
        FEnv: Fn(&str) -> Option<String>,
    {
        Self {
            bootstrapped: marker_set(env_lookup(BOOTSTRAPPED_MARKER)),
            relaunch_disabled: marker_set(env_lookup(NO_RELAUNCH_MARKER)),
            dev_checks: marker_set(env_lookup(DEV_MARKER)),
            heap_limit_mb: env_lookup(HEAP_LIMIT_ENV).and_then(|raw| raw.trim().parse().ok()),
        }
    }
}

/// A marker counts as set when present, non-empty, and not literally "0".
fn marker_set(value: Option<String>) -> bool {
    match value {
        Some(raw) => {
            let trimmed = raw.trim();
            !trimmed.is_empty() && trimmed != "0"
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn empty_environment_yields_default_markers() {
        let markers = EnvMarkers::from_lookup(|_| None);
        assert_eq!(markers, EnvMarkers::default());
    }

    #[test]
    fn bootstrapped_marker_is_detected() {
        let markers = EnvMarkers::from_lookup(lookup_from(&[(BOOTSTRAPPED_MARKER, "1")]));
        assert!(markers.bootstrapped);
        assert!(!markers.relaunch_disabled);
    }

    #[test]
    fn zero_and_empty_values_do_not_count_as_set() {
        let markers = EnvMarkers::from_lookup(lookup_from(&[
            (NO_RELAUNCH_MARKER, "0"),
            (DEV_MARKER, "  "),
        ]));
        assert!(!markers.relaunch_disabled);
        assert!(!markers.dev_checks);
    }

    #[test]
    fn heap_limit_parses_as_megabytes() {
        let markers = EnvMarkers::from_lookup(lookup_from(&[(HEAP_LIMIT_ENV, "4096")]));
        assert_eq!(markers.heap_limit_mb, Some(4096));
    }

    #[test]
    fn malformed_heap_limit_is_ignored() {
        let markers = EnvMarkers::from_lookup(lookup_from(&[(HEAP_LIMIT_ENV, "lots")]));
        assert_eq!(markers.heap_limit_mb, None);
    }
}
