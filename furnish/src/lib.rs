//! Scaffold runner for freshly generated Rails applications.
//!
//! This crate customizes the skeleton a project generator leaves behind: it
//! installs and uninstalls gems, rewrites configuration files, runs the code
//! formatter, and records each step as a git commit. The architecture
//! enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (step/guard types, version
//!   ordering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (file mutation, git, processes,
//!   network, prompts). Trait seams enable scripting in tests.
//!
//! [`plan`] declares the ordered step list and [`run`] executes it.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod plan;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
