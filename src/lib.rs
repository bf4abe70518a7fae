//! Quill — bootstrap orchestrator for a terminal AI assistant.
//!
//! This crate owns everything that happens before the assistant proper runs:
//! deciding whether the process must relaunch itself (for a larger heap
//! ceiling or into a sandbox), supervising relaunched children through a
//! restart protocol, capturing piped stdin exactly once, coordinating startup
//! tasks, and dispatching into the interactive or non-interactive execution
//! path.
//!
//! # Quick start
//!
//! ```no_run
//! use quill::bootstrap::{decide_relaunch, RelaunchDecision};
//! use quill::config::{load_settings, EnvMarkers};
//!
//! # fn example() {
//! let loaded = load_settings(None).unwrap();
//! let markers = EnvMarkers::from_process_env();
//! let decision = decide_relaunch(&markers, None, vec![]);
//! assert!(matches!(decision, RelaunchDecision::Memory { .. }));
//! # let _ = loaded;
//! # }
//! ```

pub mod auth;
pub mod bootstrap;
pub mod build_info;
pub mod cleanup;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod startup;
pub mod term;
pub mod ui;
