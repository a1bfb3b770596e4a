//! # Attributes processor module.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::ConfigResult;

/// Attribute mutations applied to every span.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AttributesConfig {
    #[serde(default)]
    pub actions: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Mapping>,
}

impl AttributesConfig {
    pub fn processor_settings(&self) -> ConfigResult<Value> {
        Ok(serde_yaml::to_value(self)?)
    }
}
