//! # Tail sampling processor module.
//!
//! Tail sampling keeps or drops a trace once all of its spans have been
//! seen. Policies are written as single-key mappings, `kind: parameters`,
//! and rendered in the collector's `{name, type, <kind>: parameters}` form.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::component_id::ComponentId;
use crate::error::{ConfigError, ConfigResult};
use crate::exporters::loadbalancing::LoadBalancingConfig;

/// Time to wait after the first span of a trace before deciding.
pub const DEFAULT_DECISION_WAIT: &str = "5s";

/// `tail_sampling` block.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TailSamplingConfig {
    #[serde(default)]
    pub policies: Vec<Value>,
    pub decision_wait: Option<String>,
    pub num_traces: Option<u64>,
    pub expected_new_traces_per_sec: Option<u64>,
    /// Routes spans between instances before sampling when set.
    pub load_balancing: Option<LoadBalancingConfig>,
}

/// Kinds of sampling policy understood by the processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    AlwaysSample,
    Latency,
    NumericAttribute,
    Probabilistic,
    StatusCode,
    StringAttribute,
    RateLimiting,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::AlwaysSample => "always_sample",
            PolicyKind::Latency => "latency",
            PolicyKind::NumericAttribute => "numeric_attribute",
            PolicyKind::Probabilistic => "probabilistic",
            PolicyKind::StatusCode => "status_code",
            PolicyKind::StringAttribute => "string_attribute",
            PolicyKind::RateLimiting => "rate_limiting",
        }
    }

    /// Parameters that must be present for this kind.
    pub fn required_parameters(self) -> &'static [&'static str] {
        match self {
            PolicyKind::AlwaysSample => &[],
            PolicyKind::Latency => &["threshold_ms"],
            PolicyKind::NumericAttribute => &["key", "min_value", "max_value"],
            PolicyKind::Probabilistic => &["sampling_percentage"],
            PolicyKind::StatusCode => &["status_codes"],
            PolicyKind::StringAttribute => &["key", "values"],
            PolicyKind::RateLimiting => &["spans_per_second"],
        }
    }
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always_sample" => Ok(PolicyKind::AlwaysSample),
            "latency" => Ok(PolicyKind::Latency),
            "numeric_attribute" => Ok(PolicyKind::NumericAttribute),
            "probabilistic" => Ok(PolicyKind::Probabilistic),
            "status_code" => Ok(PolicyKind::StatusCode),
            "string_attribute" => Ok(PolicyKind::StringAttribute),
            "rate_limiting" => Ok(PolicyKind::RateLimiting),
            _ => Err(format!("unknown policy type '{s}'")),
        }
    }
}

/// A validated sampling policy.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingPolicy {
    pub kind: PolicyKind,
    /// Kind specific parameters; empty for kinds that take none.
    pub parameters: Mapping,
}

impl SamplingPolicy {
    /// Parses the policy at `index` of the configured list.
    pub fn parse(index: usize, entry: &Value) -> ConfigResult<Self> {
        let invalid = |reason: String| ConfigError::InvalidPolicyShape { index, reason };

        let (kind, parameters) = match entry {
            Value::Mapping(mapping) if mapping.len() == 1 => match mapping.iter().next() {
                Some((Value::String(kind), parameters)) => (kind.as_str(), parameters),
                _ => return Err(invalid("policy type must be a string".into())),
            },
            _ => {
                return Err(invalid(
                    "policy must be a mapping with exactly one policy type".into(),
                ))
            }
        };
        let kind: PolicyKind = kind.parse().map_err(invalid)?;

        let parameters = match parameters {
            Value::Null => Mapping::new(),
            Value::Mapping(parameters) => parameters.clone(),
            _ => return Err(invalid(format!("{kind} parameters must be a mapping"))),
        };
        if let Some(missing) = kind
            .required_parameters()
            .iter()
            .find(|key| !parameters.contains_key(**key))
        {
            return Err(invalid(format!("{kind} requires '{missing}'")));
        }

        Ok(SamplingPolicy { kind, parameters })
    }

    /// Renders the policy as the processor expects it. `index` names it.
    fn settings(&self, index: usize) -> Value {
        let mut policy = Mapping::new();
        policy.insert(
            Value::from("name"),
            Value::from(ComponentId::indexed(self.kind.as_str(), index).to_string()),
        );
        policy.insert(Value::from("type"), Value::from(self.kind.as_str()));
        if !self.parameters.is_empty() {
            policy.insert(
                Value::from(self.kind.as_str()),
                Value::Mapping(self.parameters.clone()),
            );
        }
        Value::Mapping(policy)
    }
}

#[derive(Serialize)]
struct TailSamplingSettings<'a> {
    decision_wait: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_traces: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_new_traces_per_sec: Option<u64>,
    policies: Vec<Value>,
}

impl TailSamplingConfig {
    /// Validates every configured policy, in order.
    pub fn policies(&self) -> ConfigResult<Vec<SamplingPolicy>> {
        if self.policies.is_empty() {
            return Err(ConfigError::InvalidPolicyShape {
                index: 0,
                reason: "at least one policy must be configured".into(),
            });
        }
        self.policies
            .iter()
            .enumerate()
            .map(|(index, entry)| SamplingPolicy::parse(index, entry))
            .collect()
    }

    pub fn processor_settings(&self) -> ConfigResult<Value> {
        let policies = self
            .policies()?
            .iter()
            .enumerate()
            .map(|(index, policy)| policy.settings(index))
            .collect();
        Ok(serde_yaml::to_value(TailSamplingSettings {
            decision_wait: self
                .decision_wait
                .as_deref()
                .unwrap_or(DEFAULT_DECISION_WAIT),
            num_traces: self.num_traces,
            expected_new_traces_per_sec: self.expected_new_traces_per_sec,
            policies,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> TailSamplingConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_policies_rendered() {
        let config = config(
            r#"
            policies:
              - always_sample:
              - string_attribute:
                  key: key
                  values:
                    - value1
                    - value2
            "#,
        );
        let expected: Value = serde_yaml::from_str(
            r#"
            decision_wait: 5s
            policies:
              - name: always_sample/0
                type: always_sample
              - name: string_attribute/1
                type: string_attribute
                string_attribute:
                  key: key
                  values:
                    - value1
                    - value2
            "#,
        )
        .unwrap();
        assert_eq!(config.processor_settings().unwrap(), expected);
    }

    #[test]
    fn test_decision_wait_override() {
        let config = config("decision_wait: 10s\npolicies:\n  - always_sample:");
        let value = config.processor_settings().unwrap();
        assert_eq!(value["decision_wait"], Value::from("10s"));
    }

    #[test]
    fn test_empty_policies() {
        let config = config("decision_wait: 10s");
        assert!(matches!(
            config.processor_settings(),
            Err(ConfigError::InvalidPolicyShape { index: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let config = config("policies:\n  - always_sample:\n  - sometimes_sample:");
        match config.processor_settings() {
            Err(ConfigError::InvalidPolicyShape { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("sometimes_sample"));
            }
            other => panic!("expected InvalidPolicyShape, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_parameter() {
        let config = config("policies:\n  - string_attribute:\n      key: key");
        match config.processor_settings() {
            Err(ConfigError::InvalidPolicyShape { index, reason }) => {
                assert_eq!(index, 0);
                assert!(reason.contains("values"));
            }
            other => panic!("expected InvalidPolicyShape, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_kinds_in_one_entry() {
        let config = config(
            "policies:\n  - always_sample:\n    latency:\n      threshold_ms: 100",
        );
        assert!(config.processor_settings().is_err());
    }

    #[test]
    fn test_non_mapping_entry() {
        let config = config("policies:\n  - always_sample");
        assert!(config.processor_settings().is_err());
    }
}
