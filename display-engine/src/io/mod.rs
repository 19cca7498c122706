//! I/O helpers for engine commands.

pub mod config;
pub mod snapshot_store;
