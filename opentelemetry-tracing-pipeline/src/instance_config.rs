//! # Instance Configuration module
//!
//! This module defines the tracing configuration of a single agent
//! instance, as written by users.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};

use crate::component_id::ComponentId;
use crate::error::ConfigResult;
use crate::exporters::loadbalancing::LoadBalancingConfig;
use crate::exporters::otlp::{PushConfig, RemoteWriteConfig};
use crate::exporters::ExportTarget;
use crate::processors::{
    attributes::AttributesConfig, automatic_logging::AutomaticLoggingConfig, batch::BatchConfig,
    spanmetrics::SpanMetricsConfig, tail_sampling::TailSamplingConfig,
};

/// Tracing configuration of one instance
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    /// Receivers by id. Ids and settings are handed to the collector
    /// unchanged.
    #[serde(default, deserialize_with = "receivers_by_id")]
    pub receivers: BTreeMap<ComponentId, Value>,

    /// Single export target
    pub push_config: Option<PushConfig>,

    /// Ordered export targets
    #[serde(default, deserialize_with = "null_as_default")]
    pub remote_write: Vec<RemoteWriteConfig>,

    pub attributes: Option<AttributesConfig>,

    pub batch: Option<BatchConfig>,

    pub spanmetrics: Option<SpanMetricsConfig>,

    pub automatic_logging: Option<AutomaticLoggingConfig>,

    pub tail_sampling: Option<TailSamplingConfig>,
}

/// Deserializes an explicit null, as left by a key with no value, as the
/// default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keys receivers by their id as written. Two keys naming the same id are
/// rejected.
fn receivers_by_id<'de, D>(deserializer: D) -> Result<BTreeMap<ComponentId, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let mapping: Mapping = null_as_default(deserializer)?;
    let mut receivers = BTreeMap::new();
    for (key, settings) in mapping {
        let Value::String(key) = key else {
            return Err(D::Error::custom("receiver ids must be strings"));
        };
        let id = ComponentId::verbatim(&key).map_err(D::Error::custom)?;
        if receivers.insert(id, settings).is_some() {
            return Err(D::Error::custom(format!("duplicate receiver id '{key}'")));
        }
    }
    Ok(receivers)
}

impl InstanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an InstanceConfig from a YAML string
    pub fn from_yaml(yaml_str: &str) -> ConfigResult<Self> {
        // An empty document is an empty configuration.
        if yaml_str.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: InstanceConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    /// Creates an InstanceConfig from a YAML file
    pub fn from_yaml_file(file_path: impl AsRef<Path>) -> ConfigResult<Self> {
        let yaml_str = std::fs::read_to_string(file_path)?;
        Self::from_yaml(&yaml_str)
    }

    /// The configured export target, if exactly one kind is configured.
    pub fn export_target(&self) -> Option<ExportTarget<'_>> {
        match (&self.push_config, self.remote_write.as_slice()) {
            (Some(push), []) => Some(ExportTarget::Push(push)),
            (None, targets) if !targets.is_empty() => Some(ExportTarget::RemoteWrite(targets)),
            _ => None,
        }
    }

    /// Load balancing settings, when spans are routed between instances
    /// before tail sampling.
    pub fn load_balancing(&self) -> Option<&LoadBalancingConfig> {
        self.tail_sampling
            .as_ref()
            .and_then(|tail_sampling| tail_sampling.load_balancing.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_config_from_yaml() {
        let yaml_str = r#"
        receivers:
          jaeger:
            protocols:
              grpc:
        push_config:
          endpoint: example.com:12345
        "#;
        let config = InstanceConfig::from_yaml(yaml_str).unwrap();
        assert!(config.receivers.contains_key(&ComponentId::new("jaeger")));
        assert!(matches!(config.export_target(), Some(ExportTarget::Push(_))));
        assert!(config.load_balancing().is_none());
    }

    #[test]
    fn test_instance_config_default() {
        let config = InstanceConfig::default();
        assert!(config.receivers.is_empty());
        assert!(config.push_config.is_none());
        assert!(config.remote_write.is_empty());
        assert!(config.export_target().is_none());
    }

    #[test]
    fn test_instance_config_empty_document() {
        assert_eq!(InstanceConfig::from_yaml("").unwrap(), InstanceConfig::new());
        assert_eq!(
            InstanceConfig::from_yaml("receivers:").unwrap(),
            InstanceConfig::new()
        );
    }

    #[test]
    fn test_instance_config_unknown_field() {
        let result = InstanceConfig::from_yaml("receivers:\n  jaeger:\nbogus: true");
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn test_receiver_ids_kept_as_written() {
        let config = InstanceConfig::from_yaml(
            r#"
            receivers:
              jaeger/01:
                protocols:
                  grpc:
              jaeger/1:
                protocols:
                  thrift_http:
            "#,
        )
        .unwrap();
        let ids: Vec<String> = config.receivers.keys().map(ToString::to_string).collect();
        assert_eq!(ids, ["jaeger/01", "jaeger/1"]);
        assert!(config.receivers[&ComponentId::verbatim("jaeger/01").unwrap()]["protocols"]
            .get("grpc")
            .is_some());
    }

    #[test]
    fn test_duplicate_receiver_id() {
        let result = InstanceConfig::from_yaml("receivers:\n  jaeger:\n  jaeger:\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_receiver_id() {
        assert!(InstanceConfig::from_yaml("receivers:\n  jaeger/:\n").is_err());
        assert!(InstanceConfig::from_yaml("receivers:\n  1234:\n").is_err());
    }

    #[test]
    fn test_export_target_requires_exactly_one() {
        let both = InstanceConfig::from_yaml(
            r#"
            push_config:
              endpoint: example:12345
            remote_write:
              - endpoint: anotherexample.com:12345
            "#,
        )
        .unwrap();
        assert!(both.export_target().is_none());

        let empty_list = InstanceConfig::from_yaml("remote_write: []").unwrap();
        assert!(empty_list.export_target().is_none());
    }

    #[test]
    fn test_load_balancing() {
        let config = InstanceConfig::from_yaml(
            r#"
            tail_sampling:
              policies:
                - always_sample:
              load_balancing:
                resolver:
                  dns:
                    hostname: agent
            "#,
        )
        .unwrap();
        let load_balancing = config.load_balancing().unwrap();
        assert!(load_balancing.resolver.as_ref().unwrap().contains_key("dns"));
    }
}
