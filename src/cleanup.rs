//! Process-wide cleanup callback registry.
//!
//! Modeled as an explicitly constructed service passed by handle into the
//! components that need it, rather than ambient global state. Callbacks are
//! appended during startup and drained exactly once, in registration order,
//! before the process is allowed to terminate.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

type Callback = Box<dyn FnOnce() + Send>;

/// Append-only registry of shutdown callbacks.
#[derive(Default)]
pub struct CleanupRegistry {
    callbacks: Mutex<Vec<Callback>>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback. Registration order is the invocation order.
    pub fn register<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.push(Box::new(callback));
        }
    }

    /// Number of callbacks still pending.
    pub fn pending(&self) -> usize {
        self.callbacks.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Run all registered callbacks exactly once, in registration order.
    ///
    /// A panicking callback does not prevent later callbacks from running.
    /// Subsequent calls are no-ops.
    pub fn run_all(&self) {
        let callbacks = match self.callbacks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return,
        };
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(callback)).is_err() {
                tracing::warn!("cleanup callback panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn callbacks_run_in_registration_order() {
        let registry = CleanupRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            registry.register(move || order.lock().unwrap().push(label));
        }
        registry.run_all();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn callbacks_run_exactly_once() {
        let registry = CleanupRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        registry.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.run_all();
        registry.run_all();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending(), 0);
    }

    #[test]
    fn panicking_callback_does_not_skip_later_ones() {
        let registry = CleanupRegistry::new();
        let ran = Arc::new(AtomicUsize::new(0));
        registry.register(|| panic!("cleanup boom"));
        let counter = Arc::clone(&ran);
        registry.register(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.run_all();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
