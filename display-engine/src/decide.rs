//! Display decision for `display-engine decide`.
//!
//! Combines the core gates in the order the widget applies them: action
//! matching, eligibility filtering, trigger lookup, percentage rollout, then
//! language and styling resolution for the survey that wins.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::{CryptoRng, RngCore};
use serde::Serialize;

use crate::core::action_match::{RuntimeEvent, matching_actions};
use crate::core::eligibility::filter_surveys_at;
use crate::core::hidden_fields::{HiddenFields, handle_hidden_fields};
use crate::core::language::{LanguageSelection, get_language_code};
use crate::core::styling::get_styling;
use crate::core::trigger::{select_survey, surveys_for_action};
use crate::io::config::EngineConfig;
use crate::io::snapshot_store::{ensure_fresh, load_environment, load_user};
use crate::state::{BaseStyling, EnvironmentState, Placement, Survey, UserState};

/// Inputs describing the event being evaluated.
pub struct DecideRequest<'a> {
    pub event: RuntimeEvent<'a>,
    pub page_url: &'a str,
    /// Language requested by the host (`code` or alias).
    pub language: Option<&'a str>,
    pub hidden_fields: Option<&'a HiddenFields>,
    pub now: DateTime<Utc>,
}

/// Structured decision outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Decision {
    Show(SelectedSurvey),
    NoSurvey { reason: NoSurveyReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoSurveyReason {
    /// The event fired no configured action class.
    NoActionMatched,
    /// Actions fired, but no eligible survey is triggered by them.
    NoEligibleSurvey,
    /// Triggered surveys were all held back by their rollout percentage.
    RolloutHeldBack,
    /// The selected survey is not available in the requested language.
    LanguageUnavailable,
}

/// Everything the rendering layer needs to show the chosen survey.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedSurvey {
    pub survey_id: String,
    pub action: String,
    pub language: LanguageSelection,
    pub placement: Placement,
    pub click_outside_close: bool,
    pub dark_overlay: bool,
    pub survey_styling: bool,
    pub styling: BaseStyling,
    pub hidden_fields: HiddenFields,
}

/// Decide which survey, if any, to show for `request`.
pub fn decide<R>(
    environment: &EnvironmentState,
    user: &UserState,
    request: &DecideRequest<'_>,
    cfg: &EngineConfig,
    rng: &mut R,
) -> Decision
where
    R: RngCore + CryptoRng + ?Sized,
{
    let actions = matching_actions(
        &environment.data.action_classes,
        request.event,
        request.page_url,
    );
    if actions.is_empty() {
        return Decision::NoSurvey {
            reason: NoSurveyReason::NoActionMatched,
        };
    }

    let eligible = filter_surveys_at(environment, user, request.now);
    let mut any_triggered = false;
    for action in actions {
        let candidates = surveys_for_action(&eligible, &action.name);
        if candidates.is_empty() {
            continue;
        }
        any_triggered = true;
        let chosen = if cfg.percentage_gate {
            select_survey(&candidates, &mut *rng)
        } else {
            candidates.first().copied()
        };
        if let Some(survey) = chosen {
            return show(environment, survey, &action.name, request);
        }
    }

    let reason = if any_triggered {
        NoSurveyReason::RolloutHeldBack
    } else {
        NoSurveyReason::NoEligibleSurvey
    };
    Decision::NoSurvey { reason }
}

fn show(
    environment: &EnvironmentState,
    survey: &Survey,
    action: &str,
    request: &DecideRequest<'_>,
) -> Decision {
    let Some(language) = get_language_code(survey, request.language) else {
        tracing::warn!(
            survey = %survey.id,
            language = request.language.unwrap_or_default(),
            "survey not available in requested language"
        );
        return Decision::NoSurvey {
            reason: NoSurveyReason::LanguageUnavailable,
        };
    };
    let project = &environment.data.project;
    let styling = get_styling(project, survey);
    tracing::debug!(survey = %survey.id, action, "survey selected");
    Decision::Show(SelectedSurvey {
        survey_id: survey.id.clone(),
        action: action.to_string(),
        language,
        placement: project.placement,
        click_outside_close: project.click_outside_close,
        dark_overlay: project.dark_overlay,
        survey_styling: styling.is_survey_override(),
        styling: styling.base().clone(),
        hidden_fields: handle_hidden_fields(&survey.hidden_fields, request.hidden_fields),
    })
}

/// Ids of the surveys currently eligible for the visitor.
pub fn eligible_survey_ids(
    environment: &EnvironmentState,
    user: &UserState,
    now: DateTime<Utc>,
) -> Vec<String> {
    filter_surveys_at(environment, user, now)
        .into_iter()
        .map(|survey| survey.id.clone())
        .collect()
}

/// Load both snapshots from disk and check their freshness.
pub fn load_snapshots(
    environment_path: &Path,
    user_path: &Path,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<(EnvironmentState, UserState)> {
    let environment = load_environment(environment_path).context("load environment snapshot")?;
    let user = load_user(user_path).context("load user snapshot")?;
    ensure_fresh(&environment, &user, cfg, now)?;
    Ok((environment, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hidden_fields::HiddenFieldValue;
    use crate::state::{
        DisplayOption, ElementSelector, HiddenFieldsConfig, Language, NoCodeConfig,
        SurveyLanguage, SurveyStyling,
    };
    use crate::test_support::{
        FixedDraw, anonymous_user, click_action, code_action, element, environment_with,
        no_code_action, survey, triggered_by,
    };

    const URL: &str = "https://example.com/pricing";

    fn request<'a>(event: RuntimeEvent<'a>) -> DecideRequest<'a> {
        DecideRequest {
            event,
            page_url: URL,
            language: None,
            hidden_fields: None,
            now: Utc::now(),
        }
    }

    fn page_view_env(surveys: Vec<Survey>) -> EnvironmentState {
        let mut env = environment_with(surveys);
        let mut page_view = no_code_action(NoCodeConfig::PageView {
            url_filters: Vec::new(),
        });
        page_view.name = "page-view".to_string();
        env.data.action_classes = vec![page_view];
        env
    }

    fn shown_id(decision: &Decision) -> Option<&str> {
        match decision {
            Decision::Show(selected) => Some(selected.survey_id.as_str()),
            Decision::NoSurvey { .. } => None,
        }
    }

    #[test]
    fn unmatched_event_shows_nothing() {
        let env = page_view_env(vec![triggered_by(
            survey("s1", DisplayOption::RespondMultiple),
            &["page-view"],
        )]);
        let decision = decide(
            &env,
            &anonymous_user(),
            &request(RuntimeEvent::ExitIntent),
            &EngineConfig::default(),
            &mut FixedDraw::new(0),
        );
        assert_eq!(
            decision,
            Decision::NoSurvey {
                reason: NoSurveyReason::NoActionMatched
            }
        );
    }

    #[test]
    fn page_view_shows_first_triggered_survey() {
        let env = page_view_env(vec![
            survey("untriggered", DisplayOption::RespondMultiple),
            triggered_by(survey("s1", DisplayOption::RespondMultiple), &["page-view"]),
            triggered_by(survey("s2", DisplayOption::RespondMultiple), &["page-view"]),
        ]);
        let decision = decide(
            &env,
            &anonymous_user(),
            &request(RuntimeEvent::PageView),
            &EngineConfig::default(),
            &mut FixedDraw::new(0),
        );
        assert_eq!(shown_id(&decision), Some("s1"));
        let Decision::Show(selected) = decision else {
            unreachable!()
        };
        assert_eq!(selected.action, "page-view");
        assert_eq!(selected.language, LanguageSelection::Default);
        assert!(!selected.survey_styling);
    }

    #[test]
    fn ineligible_surveys_are_not_triggered() {
        let env = page_view_env(vec![triggered_by(
            survey("s1", DisplayOption::DisplayMultiple),
            &["page-view"],
        )]);
        let mut user = anonymous_user();
        user.data.responses = vec!["s1".to_string()];
        let decision = decide(
            &env,
            &user,
            &request(RuntimeEvent::PageView),
            &EngineConfig::default(),
            &mut FixedDraw::new(0),
        );
        assert_eq!(
            decision,
            Decision::NoSurvey {
                reason: NoSurveyReason::NoEligibleSurvey
            }
        );
    }

    #[test]
    fn rollout_can_hold_back_every_candidate() {
        let mut rollout = triggered_by(survey("s1", DisplayOption::RespondMultiple), &["page-view"]);
        rollout.display_percentage = Some(25.0);
        let env = page_view_env(vec![rollout]);

        let held = decide(
            &env,
            &anonymous_user(),
            &request(RuntimeEvent::PageView),
            &EngineConfig::default(),
            &mut FixedDraw::new(u32::MAX),
        );
        assert_eq!(
            held,
            Decision::NoSurvey {
                reason: NoSurveyReason::RolloutHeldBack
            }
        );

        let ungated = EngineConfig {
            percentage_gate: false,
            ..EngineConfig::default()
        };
        let shown = decide(
            &env,
            &anonymous_user(),
            &request(RuntimeEvent::PageView),
            &ungated,
            &mut FixedDraw::new(u32::MAX),
        );
        assert_eq!(shown_id(&shown), Some("s1"));
    }

    #[test]
    fn click_and_code_events_resolve_their_actions() {
        let mut env = environment_with(vec![
            triggered_by(survey("clicked", DisplayOption::RespondMultiple), &["cta"]),
            triggered_by(survey("coded", DisplayOption::RespondMultiple), &["upgrade"]),
        ]);
        let mut cta = click_action(
            ElementSelector {
                css_selector: Some(".cta".to_string()),
                inner_html: None,
            },
            Vec::new(),
        );
        cta.name = "cta".to_string();
        env.data.action_classes = vec![cta, code_action("upgrade", "upgraded")];

        let target = element("button", &["cta"], "Buy");
        let clicked = decide(
            &env,
            &anonymous_user(),
            &request(RuntimeEvent::Click { target: &target }),
            &EngineConfig::default(),
            &mut FixedDraw::new(0),
        );
        assert_eq!(shown_id(&clicked), Some("clicked"));

        let coded = decide(
            &env,
            &anonymous_user(),
            &request(RuntimeEvent::Code { key: "upgraded" }),
            &EngineConfig::default(),
            &mut FixedDraw::new(0),
        );
        assert_eq!(shown_id(&coded), Some("coded"));
    }

    #[test]
    fn unavailable_language_suppresses_display() {
        let mut localized = triggered_by(survey("s1", DisplayOption::RespondMultiple), &["page-view"]);
        localized.languages = vec![SurveyLanguage {
            language: Language {
                code: "en".to_string(),
                alias: None,
            },
            default: true,
            enabled: true,
        }];
        let env = page_view_env(vec![localized]);
        let mut req = request(RuntimeEvent::PageView);
        req.language = Some("de");

        let decision = decide(
            &env,
            &anonymous_user(),
            &req,
            &EngineConfig::default(),
            &mut FixedDraw::new(0),
        );
        assert_eq!(
            decision,
            Decision::NoSurvey {
                reason: NoSurveyReason::LanguageUnavailable
            }
        );
    }

    #[test]
    fn selected_survey_carries_styling_and_hidden_fields() {
        let mut themed = triggered_by(survey("s1", DisplayOption::RespondMultiple), &["page-view"]);
        themed.styling = Some(SurveyStyling {
            overwrite_theme_styling: true,
            base: BaseStyling {
                rounded_corners: Some(12.0),
                ..BaseStyling::default()
            },
        });
        themed.hidden_fields = HiddenFieldsConfig {
            enabled: true,
            field_ids: Some(vec!["plan".to_string()]),
        };
        let mut env = page_view_env(vec![themed]);
        env.data.project.styling.allow_style_overwrite = true;

        let provided = HiddenFields::from([
            ("plan".to_string(), HiddenFieldValue::Text("pro".to_string())),
            ("email".to_string(), HiddenFieldValue::Text("a@b.c".to_string())),
        ]);
        let mut req = request(RuntimeEvent::PageView);
        req.hidden_fields = Some(&provided);

        let Decision::Show(selected) = decide(
            &env,
            &anonymous_user(),
            &req,
            &EngineConfig::default(),
            &mut FixedDraw::new(0),
        ) else {
            panic!("expected a survey");
        };
        assert!(selected.survey_styling);
        assert_eq!(selected.styling.rounded_corners, Some(12.0));
        assert_eq!(
            selected.hidden_fields.keys().collect::<Vec<_>>(),
            vec!["plan"]
        );
    }

    #[test]
    fn eligible_ids_follow_filter_order() {
        let env = environment_with(vec![
            survey("a", DisplayOption::RespondMultiple),
            survey("b", DisplayOption::DisplayOnce),
        ]);
        assert_eq!(
            eligible_survey_ids(&env, &anonymous_user(), Utc::now()),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
