//! Hidden-field passthrough filtering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::HiddenFieldsConfig;

/// Value a host page may attach to a hidden field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HiddenFieldValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

pub type HiddenFields = BTreeMap<String, HiddenFieldValue>;

/// Keep only the provided fields the survey declares, when enabled.
pub fn handle_hidden_fields(
    config: &HiddenFieldsConfig,
    provided: Option<&HiddenFields>,
) -> HiddenFields {
    let (true, Some(provided), Some(field_ids)) = (config.enabled, provided, &config.field_ids)
    else {
        return HiddenFields::new();
    };
    provided
        .iter()
        .filter(|(id, _)| field_ids.contains(*id))
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect()
}
