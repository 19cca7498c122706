//! Stable exit codes for engine CLI commands.

/// Command succeeded, or `decide` selected a survey.
pub const OK: i32 = 0;
/// Command failed due to invalid config, snapshot, arguments or other errors.
pub const INVALID: i32 = 1;
/// `decide` evaluated the event but no survey should be shown.
pub const NO_SURVEY: i32 = 2;
