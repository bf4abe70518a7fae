//! Memory budget calculation for relaunch decisions.
//!
//! The budget targets half of total system memory. When the current heap
//! ceiling is below that target, the relaunched child receives a single flag
//! raising its ceiling; otherwise no flags are produced.

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Heap ceiling assumed when no relaunch has applied one yet, in megabytes.
pub const DEFAULT_HEAP_LIMIT_MB: u64 = 2048;

/// Compute the runtime flags a relaunched child needs to pick up the memory
/// budget. Pure: no side effects beyond optional debug logging.
pub fn memory_args(
    total_memory_bytes: u64,
    current_max_bytes: u64,
    debug: bool,
    relaunch_disabled: bool,
) -> Vec<String> {
    if relaunch_disabled {
        return Vec::new();
    }

    let target_bytes = total_memory_bytes / 2;
    if target_bytes <= current_max_bytes {
        return Vec::new();
    }

    let target_mb = target_bytes / BYTES_PER_MB;
    if debug {
        tracing::debug!(target_mb, "requesting larger heap ceiling for relaunch");
    }
    vec![format!("--heap-limit-mb={target_mb}")]
}

/// Total system memory in bytes, from the OS.
pub fn detect_total_memory_bytes() -> u64 {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    system.total_memory()
}

/// Resolve the heap ceiling currently applied to this process, in bytes.
///
/// A memory relaunch passes the ceiling back via the hidden `--heap-limit-mb`
/// flag (mirrored into [`crate::config::env::HEAP_LIMIT_ENV`] for sandboxed
/// children); absent both, the built-in baseline applies.
pub fn current_heap_limit_bytes(flag_mb: Option<u64>, env_mb: Option<u64>) -> u64 {
    flag_mb.or(env_mb).unwrap_or(DEFAULT_HEAP_LIMIT_MB) * BYTES_PER_MB
}
