//! Time helpers shared by snapshot freshness and the recontact gate.

use chrono::{DateTime, Utc};

/// Whole days between two instants, absolute and truncated.
pub fn diff_in_days(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (a - b).num_days().abs()
}

/// True when `expires_at` is at or before `now`.
pub fn is_expired_at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}

pub fn is_now_expired(expires_at: DateTime<Utc>) -> bool {
    is_expired_at(expires_at, Utc::now())
}
