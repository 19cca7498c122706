//! Resolution between project theme and per-survey style overrides.

use serde::Serialize;

use crate::state::{BaseStyling, Project, ProjectStyling, Survey, SurveyStyling};

/// Styling chosen for a survey, borrowed from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedStyling<'a> {
    Project(&'a ProjectStyling),
    Survey(&'a SurveyStyling),
}

impl ResolvedStyling<'_> {
    pub fn base(&self) -> &BaseStyling {
        match self {
            ResolvedStyling::Project(styling) => &styling.base,
            ResolvedStyling::Survey(styling) => &styling.base,
        }
    }

    pub fn is_survey_override(&self) -> bool {
        matches!(self, ResolvedStyling::Survey(_))
    }
}

/// Survey styling applies only when the project allows overwrites and the
/// survey asks for one; otherwise the project theme is used.
pub fn get_styling<'a>(project: &'a Project, survey: &'a Survey) -> ResolvedStyling<'a> {
    if !project.styling.allow_style_overwrite {
        return ResolvedStyling::Project(&project.styling);
    }
    match &survey.styling {
        Some(styling) if styling.overwrite_theme_styling => ResolvedStyling::Survey(styling),
        _ => ResolvedStyling::Project(&project.styling),
    }
}
