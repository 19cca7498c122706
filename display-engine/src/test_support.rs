//! Test-only helpers for constructing snapshots, elements and random sources.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rand::{CryptoRng, RngCore};
use serde::Serialize;

use crate::core::element::ElementSnapshot;
use crate::state::{
    ActionClass, ActionKind, DisplayOption, ElementSelector, EnvironmentData, EnvironmentState,
    HiddenFieldsConfig, NoCodeConfig, Placement, Project, ProjectStyling, Survey, SurveyStatus,
    SurveyTrigger, SurveyType, TriggerActionRef, UrlFilter, UserData, UserState,
};

static NEXT_ACTION_ID: AtomicU32 = AtomicU32::new(0);

/// App survey in progress with no targeting, limits or triggers.
pub fn survey(id: &str, display_option: DisplayOption) -> Survey {
    Survey {
        id: id.to_string(),
        name: format!("{} survey", id),
        survey_type: SurveyType::App,
        status: SurveyStatus::InProgress,
        display_option,
        display_limit: None,
        recontact_days: None,
        display_percentage: None,
        segment: None,
        languages: Vec::new(),
        styling: None,
        triggers: Vec::new(),
        hidden_fields: HiddenFieldsConfig::default(),
    }
}

/// Add triggers on the named action classes.
pub fn triggered_by(mut survey: Survey, action_names: &[&str]) -> Survey {
    survey.triggers = action_names
        .iter()
        .map(|name| SurveyTrigger {
            action_class: TriggerActionRef {
                name: name.to_string(),
            },
        })
        .collect();
    survey
}

/// Fresh environment (expires in one hour) with a 7-day project cooldown.
pub fn environment_with(surveys: Vec<Survey>) -> EnvironmentState {
    EnvironmentState {
        expires_at: Utc::now() + Duration::hours(1),
        data: EnvironmentData {
            project: Project {
                id: "project-1".to_string(),
                recontact_days: 7,
                click_outside_close: false,
                dark_overlay: false,
                placement: Placement::BottomRight,
                in_app_survey_branding: true,
                styling: ProjectStyling::default(),
            },
            surveys,
            action_classes: Vec::new(),
        },
    }
}

/// Visitor with no identity and no history; never expires.
pub fn anonymous_user() -> UserState {
    UserState {
        expires_at: None,
        data: UserData::default(),
    }
}

fn next_action_id() -> String {
    format!("action-{}", NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed))
}

pub fn code_action(name: &str, key: &str) -> ActionClass {
    ActionClass {
        id: next_action_id(),
        name: name.to_string(),
        kind: ActionKind::Code {
            key: key.to_string(),
        },
    }
}

pub fn no_code_action(config: NoCodeConfig) -> ActionClass {
    ActionClass {
        id: next_action_id(),
        name: "no-code action".to_string(),
        kind: ActionKind::NoCode { config },
    }
}

pub fn click_action(element_selector: ElementSelector, url_filters: Vec<UrlFilter>) -> ActionClass {
    no_code_action(NoCodeConfig::Click {
        url_filters,
        element_selector,
    })
}

pub fn element(tag: &str, classes: &[&str], inner_html: &str) -> ElementSnapshot {
    ElementSnapshot {
        tag: tag.to_string(),
        classes: classes.iter().map(|class| class.to_string()).collect(),
        inner_html: inner_html.to_string(),
        ..ElementSnapshot::default()
    }
}

/// Random source that replays scripted 32-bit draws.
#[derive(Debug, Clone)]
pub struct FixedDraw {
    draws: Vec<u32>,
    next: usize,
}

impl FixedDraw {
    pub fn new(draw: u32) -> Self {
        Self::sequence(vec![draw])
    }

    /// Replays `draws` in order, cycling when exhausted.
    pub fn sequence(draws: Vec<u32>) -> Self {
        assert!(!draws.is_empty(), "FixedDraw needs at least one draw");
        Self { draws, next: 0 }
    }
}

impl RngCore for FixedDraw {
    fn next_u32(&mut self) -> u32 {
        let draw = self.draws[self.next % self.draws.len()];
        self.next += 1;
        draw
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for FixedDraw {}

/// Temporary directory holding snapshot files for io and CLI tests.
pub struct TestWorkspace {
    dir: tempfile::TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Serialize `value` as pretty JSON to `name` inside the workspace.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
        payload.push('\n');
        fs::write(&path, payload).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn write_raw(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
