//! # Load balancing exporter module.
//!
//! Routes spans by trace id to the instance owning that trace, so that tail
//! sampling sees every span of a trace on one instance. The exporter is
//! paired with an `otlp/lb` receiver listening on the port peers send to.

use opentelemetry::otel_debug;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::exporters::otlp::{fixed_endpoint_settings, Protocol, RemoteWriteConfig};
use crate::secret::SecretResolver;

/// Endpoint of the inner OTLP exporter. The resolver supplies the real
/// backends, so the configured endpoint is never dialled.
pub const PLACEHOLDER_ENDPOINT: &str = "noop";

/// Port the `otlp/lb` receiver listens on when neither `receiver_port` nor a
/// DNS resolver port is configured.
pub const DEFAULT_RECEIVER_PORT: u16 = 4318;

const RECEIVER_HOST: &str = "0.0.0.0";

/// `tail_sampling.load_balancing` block.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoadBalancingConfig {
    /// OTLP settings used to reach peer instances.
    #[serde(default)]
    pub exporter: RemoteWriteConfig,
    /// Resolver settings, passed to the exporter unchanged.
    pub resolver: Option<Mapping>,
    /// Overrides the port of the `otlp/lb` receiver.
    pub receiver_port: Option<Value>,
}

#[derive(Serialize)]
struct LoadBalancingProtocol {
    otlp: Value,
}

#[derive(Serialize)]
struct LoadBalancingExporterSettings<'a> {
    protocol: LoadBalancingProtocol,
    resolver: &'a Mapping,
}

impl LoadBalancingConfig {
    fn resolver(&self) -> ConfigResult<&Mapping> {
        match &self.resolver {
            Some(resolver) if !resolver.is_empty() => Ok(resolver),
            _ => Err(ConfigError::InvalidLoadBalancingConfig(
                "a resolver must be configured".into(),
            )),
        }
    }

    /// Builds the `loadbalancing` exporter settings.
    pub fn exporter_settings<R: SecretResolver>(&self, resolver: &R) -> ConfigResult<Value> {
        if self.exporter.protocol() != Protocol::Grpc {
            return Err(ConfigError::InvalidLoadBalancingConfig(
                "the exporter only supports the grpc protocol".into(),
            ));
        }
        if let Some(endpoint) = &self.exporter.endpoint {
            otel_debug!(
                name: "LoadBalancing.Exporter.EndpointIgnored",
                endpoint = endpoint.as_str(),
            );
        }
        let otlp = fixed_endpoint_settings(&self.exporter, PLACEHOLDER_ENDPOINT, resolver)?;
        let settings = LoadBalancingExporterSettings {
            protocol: LoadBalancingProtocol { otlp },
            resolver: self.resolver()?,
        };
        Ok(serde_yaml::to_value(settings)?)
    }

    /// Port peers use to reach this instance: `receiver_port`, then
    /// `resolver.dns.port`, then [`DEFAULT_RECEIVER_PORT`].
    pub fn receiver_port(&self) -> ConfigResult<u16> {
        let configured = self.receiver_port.as_ref().or_else(|| {
            self.resolver
                .as_ref()
                .and_then(|resolver| resolver.get("dns"))
                .and_then(|dns| dns.get("port"))
        });
        match configured {
            None => Ok(DEFAULT_RECEIVER_PORT),
            Some(value) => parse_port(value),
        }
    }

    /// Builds the settings of the `otlp/lb` receiver.
    pub fn receiver_settings(&self) -> ConfigResult<Value> {
        let endpoint = format!("{RECEIVER_HOST}:{}", self.receiver_port()?);
        let mut grpc = Mapping::new();
        grpc.insert(Value::from("endpoint"), Value::from(endpoint));
        let mut protocols = Mapping::new();
        protocols.insert(Value::from("grpc"), Value::Mapping(grpc));
        let mut receiver = Mapping::new();
        receiver.insert(Value::from("protocols"), Value::Mapping(protocols));
        Ok(Value::Mapping(receiver))
    }
}

fn parse_port(value: &Value) -> ConfigResult<u16> {
    let port = match value {
        Value::Number(number) => number.as_u64().and_then(|port| u16::try_from(port).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    match port {
        Some(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::InvalidLoadBalancingConfig(format!(
            "invalid receiver port {}",
            serde_yaml::to_string(value)?.trim()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::FileSecretResolver;

    fn config(yaml: &str) -> LoadBalancingConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_exporter_settings() {
        let lb = config(
            r#"
            exporter:
              insecure: true
            resolver:
              dns:
                hostname: agent
                port: 4318
            "#,
        );
        let value = lb.exporter_settings(&FileSecretResolver::new()).unwrap();
        let expected: Value = serde_yaml::from_str(
            r#"
            protocol:
              otlp:
                endpoint: noop
                insecure: true
                retry_on_failure:
                  max_elapsed_time: 60s
            resolver:
              dns:
                hostname: agent
                port: 4318
            "#,
        )
        .unwrap();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_endpoint_is_forced() {
        let lb = config(
            r#"
            exporter:
              endpoint: somewhere:4317
              compression: gzip
            resolver:
              static:
                hostnames: [a, b]
            "#,
        );
        let value = lb.exporter_settings(&FileSecretResolver::new()).unwrap();
        assert_eq!(value["protocol"]["otlp"]["endpoint"], Value::from("noop"));
        assert_eq!(value["protocol"]["otlp"]["compression"], Value::from("gzip"));
    }

    #[test]
    fn test_missing_resolver() {
        let lb = config("exporter:\n  insecure: true");
        assert!(matches!(
            lb.exporter_settings(&FileSecretResolver::new()),
            Err(ConfigError::InvalidLoadBalancingConfig(_))
        ));
    }

    #[test]
    fn test_http_protocol_rejected() {
        let lb = config("exporter:\n  protocol: http\nresolver:\n  dns:\n    hostname: agent");
        assert!(lb.exporter_settings(&FileSecretResolver::new()).is_err());
    }

    #[test]
    fn test_receiver_port_sources() {
        let lb = config("resolver:\n  dns:\n    hostname: agent\n    port: 4318");
        assert_eq!(lb.receiver_port().unwrap(), 4318);

        let lb = config("resolver:\n  dns:\n    hostname: agent\n    port: \"4319\"");
        assert_eq!(lb.receiver_port().unwrap(), 4319);

        let lb = config("receiver_port: 5000\nresolver:\n  dns:\n    port: 4318");
        assert_eq!(lb.receiver_port().unwrap(), 5000);

        let lb = config("resolver:\n  static:\n    hostnames: [a]");
        assert_eq!(lb.receiver_port().unwrap(), 4318);

        let lb = config("resolver:\n  dns:\n    port: 70000");
        assert!(lb.receiver_port().is_err());
    }

    #[test]
    fn test_receiver_settings() {
        let lb = config("resolver:\n  dns:\n    hostname: agent\n    port: 4318");
        let value = lb.receiver_settings().unwrap();
        assert_eq!(
            value["protocols"]["grpc"]["endpoint"],
            Value::from("0.0.0.0:4318")
        );
    }
}
