//! Survey eligibility filter.
//!
//! Applies, per survey and in order: segment targeting, the display-option
//! policy, and the recontact cooldown. Surveys that pass every gate are
//! returned in their original relative order.

use chrono::{DateTime, Utc};

use crate::core::clock::diff_in_days;
use crate::state::{DisplayOption, EnvironmentState, Project, Survey, UserData, UserState};

/// Surveys the visitor may be shown right now.
pub fn filter_surveys<'a>(environment: &'a EnvironmentState, user: &UserState) -> Vec<&'a Survey> {
    filter_surveys_at(environment, user, Utc::now())
}

/// [`filter_surveys`] evaluated at an explicit instant.
pub fn filter_surveys_at<'a>(
    environment: &'a EnvironmentState,
    user: &UserState,
    now: DateTime<Utc>,
) -> Vec<&'a Survey> {
    let project = &environment.data.project;
    let eligible: Vec<&Survey> = environment
        .data
        .surveys
        .iter()
        .filter(|survey| passes_segment_gate(survey, &user.data))
        .filter(|survey| passes_display_option_gate(survey, &user.data))
        .filter(|survey| passes_recontact_gate(survey, project, &user.data, now))
        .collect();
    tracing::debug!(
        total = environment.data.surveys.len(),
        eligible = eligible.len(),
        "filtered surveys"
    );
    eligible
}

/// Identified visitors must belong to the survey's segment; anonymous
/// visitors skip segment targeting.
fn passes_segment_gate(survey: &Survey, user: &UserData) -> bool {
    if user.user_id.is_none() {
        return true;
    }
    match &survey.segment {
        Some(segment) => user.in_segment(&segment.id),
        None => true,
    }
}

fn passes_display_option_gate(survey: &Survey, user: &UserData) -> bool {
    match survey.display_option {
        DisplayOption::DisplayOnce => user.display_count(&survey.id) == 0,
        DisplayOption::DisplayMultiple => !user.has_responded(&survey.id),
        DisplayOption::RespondMultiple => true,
        DisplayOption::DisplaySome => {
            if user.has_responded(&survey.id) {
                return false;
            }
            match survey.display_limit {
                Some(limit) => user.display_count(&survey.id) < limit as usize,
                None => true,
            }
        }
    }
}

/// Survey-level `recontact_days` wins over the project default. Without a
/// previous display there is nothing to cool down from.
fn passes_recontact_gate(
    survey: &Survey,
    project: &Project,
    user: &UserData,
    now: DateTime<Utc>,
) -> bool {
    let Some(last_display_at) = user.last_display_at else {
        return true;
    };
    let cooldown = survey.recontact_days.unwrap_or(project.recontact_days);
    diff_in_days(now, last_display_at) >= i64::from(cooldown)
}
