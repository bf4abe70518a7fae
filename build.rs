//! Embeds the commit hash and build time shown in the startup banner.
//!
//! Release pipelines can pin both values through the `QUILL_BUILD_*` env
//! vars; otherwise the hash comes from git and the time from the clock.

use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    println!("cargo:rerun-if-env-changed=QUILL_BUILD_GIT_HASH");
    println!("cargo:rerun-if-env-changed=QUILL_BUILD_TIMESTAMP");

    let commit = env::var("QUILL_BUILD_GIT_HASH")
        .ok()
        .or_else(git_short_hash)
        .unwrap_or_else(|| "unknown".to_string());
    let built = env::var("QUILL_BUILD_TIMESTAMP")
        .ok()
        .unwrap_or_else(epoch_timestamp);

    println!("cargo:rustc-env=QUILL_BUILD_GIT_HASH={commit}");
    println!("cargo:rustc-env=QUILL_BUILD_TIMESTAMP={built}");
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn epoch_timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|delta| delta.as_secs())
        .unwrap_or(0);
    format!("unix:{secs}")
}
