//! Survey display-eligibility engine.
//!
//! Decides, for a visitor on a host page, which survey (if any) to show given
//! the environment's targeting rules, the visitor's display history, recontact
//! windows, percentage rollouts and page events. The architecture enforces a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (eligibility, URL and element
//!   matching, rollout gate, styling). No I/O; host calls go through the
//!   safe-call wrappers in [`core::wrap`].
//! - **[`io`]**: Side-effecting operations (config and snapshot files).
//!
//! [`decide`] coordinates core logic with I/O to implement CLI commands.

pub mod core;
pub mod decide;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
