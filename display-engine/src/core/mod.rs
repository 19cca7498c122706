//! Deterministic, pure logic for survey display decisions.
//!
//! Core modules must be free of I/O side effects. They read snapshots and
//! return decisions; host-page calls go through [`wrap`].

pub mod action_match;
pub mod clock;
pub mod element;
pub mod eligibility;
pub mod error;
pub mod hidden_fields;
pub mod language;
pub mod percentage;
pub mod styling;
pub mod trigger;
pub mod url_match;
pub mod wrap;
