//! Snapshot load helpers with schema validation and freshness checks.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use jsonschema::validator_for;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::element::ElementSnapshot;
use crate::io::config::EngineConfig;
use crate::state::{EnvironmentState, UserState};

/// Embedded schema for environment snapshots.
pub const ENVIRONMENT_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/environment_state/v1.schema.json"
));

/// Load an environment snapshot, validating it against [`ENVIRONMENT_SCHEMA`].
pub fn load_environment(path: &Path) -> Result<EnvironmentState> {
    let value = read_value(path)?;
    validate_environment_value(&value)
        .with_context(|| format!("validate environment {}", path.display()))?;
    serde_json::from_value(value)
        .with_context(|| format!("deserialize environment {}", path.display()))
}

/// Load a visitor snapshot from local-storage JSON.
pub fn load_user(path: &Path) -> Result<UserState> {
    read_typed(path, "user")
}

/// Load a clicked-element description.
pub fn load_element(path: &Path) -> Result<ElementSnapshot> {
    read_typed(path, "element")
}

/// Validate a parsed environment snapshot against the embedded schema.
pub fn validate_environment_value(value: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(ENVIRONMENT_SCHEMA).context("parse environment schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "environment schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

/// Refuse stale snapshots unless the config allows them.
pub fn ensure_fresh(
    environment: &EnvironmentState,
    user: &UserState,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<()> {
    if environment.is_stale(now) {
        if !cfg.allow_stale_environment {
            bail!(
                "environment snapshot expired at {}; refetch before evaluating",
                environment.expires_at
            );
        }
        tracing::warn!(expires_at = %environment.expires_at, "evaluating stale environment snapshot");
    }
    if user.is_stale(now) {
        if !cfg.allow_stale_user {
            bail!("user snapshot expired; reload before evaluating");
        }
        tracing::warn!("evaluating stale user snapshot");
    }
    Ok(())
}

fn read_value(path: &Path) -> Result<Value> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

fn read_typed<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read {} {}", what, path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {} {}", what, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DisplayOption;
    use crate::test_support::{TestWorkspace, anonymous_user, environment_with, survey};
    use chrono::Duration;

    /// Serialized snapshots pass schema validation and load back unchanged.
    #[test]
    fn serialized_environment_loads_back() {
        let workspace = TestWorkspace::new().expect("workspace");
        let env = environment_with(vec![survey("s1", DisplayOption::DisplayOnce)]);
        let path = workspace.write_json("environment.json", &env).expect("write");

        let loaded = load_environment(&path).expect("load");
        assert_eq!(loaded, env);
    }

    #[test]
    fn schema_rejects_unknown_display_option() {
        let workspace = TestWorkspace::new().expect("workspace");
        let path = workspace
            .write_raw(
                "environment.json",
                r#"{
                    "expiresAt": "2030-01-01T00:00:00Z",
                    "data": {
                        "project": { "id": "p1", "recontactDays": 7 },
                        "surveys": [{ "id": "s1", "displayOption": "displayForever" }]
                    }
                }"#,
            )
            .expect("write");

        let err = load_environment(&path).expect_err("invalid snapshot");
        assert!(format!("{:#}", err).contains("schema validation failed"));
    }

    #[test]
    fn schema_rejects_negative_recontact_days() {
        let value = serde_json::json!({
            "expiresAt": "2030-01-01T00:00:00Z",
            "data": { "project": { "id": "p1", "recontactDays": -1 } }
        });
        assert!(validate_environment_value(&value).is_err());
    }

    #[test]
    fn load_user_reads_local_storage_shape() {
        let workspace = TestWorkspace::new().expect("workspace");
        let path = workspace
            .write_raw(
                "user.json",
                r#"{
                    "expiresAt": null,
                    "data": {
                        "userId": "user_abc",
                        "contactId": null,
                        "segments": ["seg"],
                        "displays": [{ "surveyId": "s1", "createdAt": "2024-01-01T00:00:00.000Z" }],
                        "responses": ["s1"],
                        "lastDisplayAt": "2024-01-01T00:00:00.000Z"
                    }
                }"#,
            )
            .expect("write");

        let user = load_user(&path).expect("load");
        assert_eq!(user.data.user_id.as_deref(), Some("user_abc"));
        assert_eq!(user.data.display_count("s1"), 1);
        assert!(user.data.has_responded("s1"));
    }

    #[test]
    fn ensure_fresh_rejects_stale_environment_by_default() {
        let mut env = environment_with(Vec::new());
        env.expires_at = Utc::now() - Duration::minutes(1);
        let user = anonymous_user();
        let cfg = EngineConfig::default();

        let err = ensure_fresh(&env, &user, &cfg, Utc::now()).expect_err("stale");
        assert!(err.to_string().contains("refetch"));

        let lenient = EngineConfig {
            allow_stale_environment: true,
            ..EngineConfig::default()
        };
        ensure_fresh(&env, &user, &lenient, Utc::now()).expect("allowed");
    }

    #[test]
    fn ensure_fresh_honors_user_expiry_setting() {
        let env = environment_with(Vec::new());
        let mut user = anonymous_user();
        user.expires_at = Some(Utc::now() - Duration::minutes(1));

        ensure_fresh(&env, &user, &EngineConfig::default(), Utc::now()).expect("allowed");

        let strict = EngineConfig {
            allow_stale_user: false,
            ..EngineConfig::default()
        };
        assert!(ensure_fresh(&env, &user, &strict, Utc::now()).is_err());
    }
}
