//! Sink for non-fatal background failures.
//!
//! Background work (update checks, detached tasks) must never crash or block
//! the foreground. Failures land here instead: they are logged only in debug
//! mode to avoid noise, and the first occurrence also requests the
//! diagnostics view so the user can inspect what went wrong.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared sink for background failures.
pub struct DiagnosticSink {
    debug: bool,
    view_requested: AtomicBool,
}

impl DiagnosticSink {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            view_requested: AtomicBool::new(false),
        }
    }

    /// Report one background failure.
    ///
    /// Returns true when this failure should open the diagnostics view, which
    /// happens for the first occurrence only.
    pub fn report(&self, source: &str, message: &str) -> bool {
        if self.debug {
            tracing::warn!(source, message, "background failure");
        }
        !self.view_requested.swap(true, Ordering::SeqCst)
    }

    /// Whether any failure has requested the diagnostics view.
    pub fn view_requested(&self) -> bool {
        self.view_requested.load(Ordering::SeqCst)
    }
}
