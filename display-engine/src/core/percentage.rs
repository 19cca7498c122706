//! Percentage rollout gate backed by a cryptographic random source.
//!
//! Production draws come from the operating system CSPRNG (`OsRng`). The
//! `*_with` variants accept any `RngCore + CryptoRng` so tests can supply a
//! fixed draw.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::core::wrap::wrap_throws;

const U32_RANGE: f64 = 4_294_967_296.0;

/// Uniform sample in `[0, 1)` from one 32-bit draw of `rng`.
pub fn secure_random_with<R>(rng: &mut R) -> f64
where
    R: RngCore + CryptoRng + ?Sized,
{
    f64::from(rng.next_u32()) / U32_RANGE
}

/// Uniform sample in `[0, 1)` from the operating system CSPRNG.
pub fn get_secure_random() -> f64 {
    secure_random_with(&mut OsRng)
}

/// Percentage gate with an injected random source.
///
/// The draw is scaled to `[0, 100)` and the survey shows when it is at or
/// below `display_percentage`. NaN or non-positive percentages never show;
/// values above 100 are clamped to 100. A failing random source never shows.
pub fn should_display_based_on_percentage_with<R>(display_percentage: f64, rng: &mut R) -> bool
where
    R: RngCore + CryptoRng + ?Sized,
{
    if display_percentage.is_nan() || display_percentage <= 0.0 {
        tracing::warn!(display_percentage, "display percentage out of range, not showing");
        return false;
    }
    let threshold = if display_percentage > 100.0 {
        tracing::warn!(display_percentage, "display percentage above 100, clamping");
        100.0
    } else {
        display_percentage
    };

    let mut draw = wrap_throws(|()| secure_random_with(&mut *rng));
    match draw(()) {
        Ok(sample) => {
            let sample = sample * 100.0;
            let show = sample <= threshold;
            tracing::debug!(sample, threshold, show, "percentage gate");
            show
        }
        Err(err) => {
            tracing::warn!(error = %err, "random source failed, not showing");
            false
        }
    }
}

/// Percentage gate drawing from the operating system CSPRNG.
pub fn should_display_based_on_percentage(display_percentage: f64) -> bool {
    should_display_based_on_percentage_with(display_percentage, &mut OsRng)
}
