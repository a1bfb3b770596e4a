//! # Batch processor module.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{ConfigError, ConfigResult};

/// Batching settings, passed to the `batch` processor as given.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_batch_max_size: Option<u32>,
}

impl BatchConfig {
    pub fn processor_settings(&self) -> ConfigResult<Value> {
        Ok(serde_yaml::to_value(self)?)
    }
}

/// Picks the batch block in effect. Batching may be configured at the top
/// level or under `push_config`, but not in both places.
pub fn effective_batch<'a>(
    top_level: Option<&'a BatchConfig>,
    push: Option<&'a BatchConfig>,
) -> ConfigResult<Option<&'a BatchConfig>> {
    match (top_level, push) {
        (Some(_), Some(_)) => Err(ConfigError::DuplicateBatchConfig),
        (top_level, push) => Ok(top_level.or(push)),
    }
}
