//! Snapshot data model consumed by the engine.
//!
//! Both snapshots arrive as JSON from external collaborators (the environment
//! endpoint and the visitor's local storage). They are read-only once
//! deserialized; callers replace a snapshot instead of mutating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::clock::is_expired_at;

/// Server-provided configuration for one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentState {
    pub expires_at: DateTime<Utc>,
    pub data: EnvironmentData,
}

impl EnvironmentState {
    /// True once `expires_at` has elapsed and the snapshot must be refetched.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        is_expired_at(self.expires_at, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentData {
    pub project: Project,
    #[serde(default)]
    pub surveys: Vec<Survey>,
    #[serde(default)]
    pub action_classes: Vec<ActionClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub recontact_days: u32,
    #[serde(default)]
    pub click_outside_close: bool,
    #[serde(default)]
    pub dark_overlay: bool,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub in_app_survey_branding: bool,
    #[serde(default)]
    pub styling: ProjectStyling,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    BottomLeft,
    #[default]
    BottomRight,
    TopLeft,
    TopRight,
    Center,
}

/// A survey as delivered in the environment snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub survey_type: SurveyType,
    #[serde(default)]
    pub status: SurveyStatus,
    pub display_option: DisplayOption,
    #[serde(default)]
    pub display_limit: Option<u32>,
    /// Overrides `Project::recontact_days` when present.
    #[serde(default)]
    pub recontact_days: Option<u32>,
    /// Rollout percentage in `(0, 100]`; absent means always.
    #[serde(default)]
    pub display_percentage: Option<f64>,
    #[serde(default)]
    pub segment: Option<SegmentRef>,
    #[serde(default)]
    pub languages: Vec<SurveyLanguage>,
    #[serde(default)]
    pub styling: Option<SurveyStyling>,
    #[serde(default)]
    pub triggers: Vec<SurveyTrigger>,
    #[serde(default)]
    pub hidden_fields: HiddenFieldsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurveyType {
    Link,
    #[default]
    App,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurveyStatus {
    Draft,
    #[default]
    InProgress,
    Paused,
    Completed,
}

/// How often a survey may reappear to the same visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayOption {
    DisplayOnce,
    DisplayMultiple,
    RespondMultiple,
    DisplaySome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyLanguage {
    pub language: Language,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyTrigger {
    pub action_class: TriggerActionRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerActionRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenFieldsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub field_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylingColor {
    pub light: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark: Option<String>,
}

/// Theme fields shared by project and survey styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseStyling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_color: Option<StylingColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_color: Option<StylingColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_color: Option<StylingColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_border_color: Option<StylingColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_background_color: Option<StylingColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_border_color: Option<StylingColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_border_color: Option<StylingColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dark_mode_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounded_corners: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_progress_bar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_logo_hidden: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStyling {
    #[serde(default)]
    pub allow_style_overwrite: bool,
    #[serde(flatten)]
    pub base: BaseStyling,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStyling {
    #[serde(default)]
    pub overwrite_theme_styling: bool,
    #[serde(flatten)]
    pub base: BaseStyling,
}

/// Named trigger definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionClass {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// Developer-invoked (`code`) or point-and-click (`noCode`) trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionKind {
    Code {
        key: String,
    },
    NoCode {
        #[serde(rename = "noCodeConfig")]
        config: NoCodeConfig,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NoCodeConfig {
    Click {
        #[serde(default)]
        url_filters: Vec<UrlFilter>,
        #[serde(default)]
        element_selector: ElementSelector,
    },
    PageView {
        #[serde(default)]
        url_filters: Vec<UrlFilter>,
    },
    ExitIntent {
        #[serde(default)]
        url_filters: Vec<UrlFilter>,
    },
    FiftyPercentScroll {
        #[serde(default)]
        url_filters: Vec<UrlFilter>,
    },
}

impl NoCodeConfig {
    pub fn url_filters(&self) -> &[UrlFilter] {
        match self {
            NoCodeConfig::Click { url_filters, .. }
            | NoCodeConfig::PageView { url_filters }
            | NoCodeConfig::ExitIntent { url_filters }
            | NoCodeConfig::FiftyPercentScroll { url_filters } => url_filters,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFilter {
    pub value: String,
    pub rule: UrlRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UrlRule {
    ExactMatch,
    Contains,
    StartsWith,
    EndsWith,
    NotMatch,
    NotContains,
    MatchesRegex,
}

/// Local display/response history for one visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    /// `None` means the local snapshot never expires.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub data: UserData,
}

impl UserState {
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| is_expired_at(expires_at, now))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub displays: Vec<Display>,
    #[serde(default)]
    pub responses: Vec<String>,
    #[serde(default)]
    pub last_display_at: Option<DateTime<Utc>>,
}

impl UserData {
    /// Number of recorded displays of `survey_id`.
    pub fn display_count(&self, survey_id: &str) -> usize {
        self.displays
            .iter()
            .filter(|display| display.survey_id == survey_id)
            .count()
    }

    pub fn has_responded(&self, survey_id: &str) -> bool {
        self.responses.iter().any(|id| id == survey_id)
    }

    pub fn in_segment(&self, segment_id: &str) -> bool {
        self.segments.iter().any(|id| id == segment_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    pub survey_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn action_class_deserializes_no_code_click() {
        let raw = r#"{
            "id": "clabc123abc",
            "name": "Clicked CTA",
            "type": "noCode",
            "key": null,
            "noCodeConfig": {
                "type": "click",
                "urlFilters": [{ "value": "pricing", "rule": "contains" }],
                "elementSelector": { "cssSelector": ".cta" }
            }
        }"#;
        let action: ActionClass = serde_json::from_str(raw).expect("parse");
        let ActionKind::NoCode { config } = &action.kind else {
            panic!("expected noCode action");
        };
        let NoCodeConfig::Click {
            url_filters,
            element_selector,
        } = config
        else {
            panic!("expected click config");
        };
        assert_eq!(url_filters[0].rule, UrlRule::Contains);
        assert_eq!(element_selector.css_selector.as_deref(), Some(".cta"));
        assert_eq!(element_selector.inner_html, None);
    }

    #[test]
    fn action_class_deserializes_code_action_with_null_config() {
        let raw = r#"{
            "id": "a1",
            "name": "Upgraded",
            "type": "code",
            "key": "upgraded",
            "noCodeConfig": null
        }"#;
        let action: ActionClass = serde_json::from_str(raw).expect("parse");
        assert_eq!(
            action.kind,
            ActionKind::Code {
                key: "upgraded".to_string()
            }
        );
    }

    #[test]
    fn page_view_config_without_selector_parses() {
        let raw = r#"{ "type": "pageView", "urlFilters": [] }"#;
        let config: NoCodeConfig = serde_json::from_str(raw).expect("parse");
        assert!(matches!(config, NoCodeConfig::PageView { .. }));
        assert!(config.url_filters().is_empty());
    }

    #[test]
    fn user_state_without_expiry_is_never_stale() {
        let user = UserState {
            expires_at: None,
            data: UserData::default(),
        };
        assert!(!user.is_stale(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn environment_is_stale_once_expiry_elapsed() {
        let raw = r#"{
            "expiresAt": "2024-03-01T12:00:00.000Z",
            "data": { "project": { "id": "p1", "recontactDays": 7 } }
        }"#;
        let env: EnvironmentState = serde_json::from_str(raw).expect("parse");
        let before = "2024-03-01T11:59:59Z".parse().expect("ts");
        let after = "2024-03-01T12:00:00Z".parse().expect("ts");
        assert!(!env.is_stale(before));
        assert!(env.is_stale(after));
        assert_eq!(env.data.project.placement, Placement::BottomRight);
    }

    #[test]
    fn styling_flattens_base_fields() {
        let raw = r##"{ "allowStyleOverwrite": true, "brandColor": { "light": "#fff" } }"##;
        let styling: ProjectStyling = serde_json::from_str(raw).expect("parse");
        assert!(styling.allow_style_overwrite);
        assert_eq!(
            styling.base.brand_color.map(|color| color.light),
            Some("#fff".to_string())
        );
    }
}
