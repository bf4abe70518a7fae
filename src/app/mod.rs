//! Binary-local application orchestration.
//!
//! The main binary keeps wiring in `main.rs`; this module hosts the bootstrap
//! entry flow and the two execution-mode dispatchers.

pub(crate) mod entry;
pub(crate) mod interactive;
pub(crate) mod noninteractive;
