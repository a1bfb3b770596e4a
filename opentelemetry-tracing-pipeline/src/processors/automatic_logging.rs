//! # Automatic logging processor module.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigResult;
use crate::processors::ProcessorKind;

/// Settings of the automatic logging processor. The processor reads them
/// from a key named after itself, so they are nested one level down.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AutomaticLoggingConfig {
    pub settings: Mapping,
}

impl AutomaticLoggingConfig {
    pub fn processor_settings(&self) -> ConfigResult<Value> {
        let mut nested = Mapping::new();
        nested.insert(
            Value::from(ProcessorKind::AutomaticLogging.as_str()),
            Value::Mapping(self.settings.clone()),
        );
        Ok(Value::Mapping(nested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_nested_under_processor_name() {
        let config: AutomaticLoggingConfig = serde_yaml::from_str("spans: true").unwrap();
        let expected: Value =
            serde_yaml::from_str("automatic_logging:\n  spans: true").unwrap();
        assert_eq!(config.processor_settings().unwrap(), expected);
    }
}
