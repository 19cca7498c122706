//! Maps fired action classes to the surveys they trigger.

use rand::{CryptoRng, RngCore};

use crate::core::percentage::should_display_based_on_percentage_with;
use crate::state::Survey;

/// Eligible surveys with a trigger on `action_name`, in order.
pub fn surveys_for_action<'a>(eligible: &[&'a Survey], action_name: &str) -> Vec<&'a Survey> {
    eligible
        .iter()
        .copied()
        .filter(|survey| {
            survey
                .triggers
                .iter()
                .any(|trigger| trigger.action_class.name == action_name)
        })
        .collect()
}

/// First candidate that passes its rollout percentage.
///
/// Only one survey is shown per event. Surveys without a percentage always
/// pass; each percentage survey consumes one draw from `rng`.
pub fn select_survey<'a, R>(candidates: &[&'a Survey], rng: &mut R) -> Option<&'a Survey>
where
    R: RngCore + CryptoRng + ?Sized,
{
    candidates.iter().copied().find(|survey| match survey.display_percentage {
        None => true,
        Some(percentage) => {
            let show = should_display_based_on_percentage_with(percentage, &mut *rng);
            if !show {
                tracing::debug!(survey = %survey.id, percentage, "held back by rollout");
            }
            show
        }
    })
}
