//! Stable exit codes for furnish CLI commands.

/// Command succeeded; for `furnish run`, every step either ran or was skipped.
pub const OK: i32 = 0;
/// Command failed before any step ran: bad usage, config, or project layout.
pub const INVALID: i32 = 1;
/// A step failed mid-run. Commits checkpointed before the failure are intact.
pub const ABORTED: i32 = 2;
