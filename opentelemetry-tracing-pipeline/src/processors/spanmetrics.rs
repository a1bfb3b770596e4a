//! # Span metrics processor module.
//!
//! The span metrics processor derives latency and call metrics from spans
//! and hands them to a metrics exporter, either a Prometheus scrape endpoint
//! or a remote write instance. That exporter is fed by its own metrics
//! pipeline, set up by the assembler.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::component_id::ComponentId;
use crate::error::{ConfigError, ConfigResult};

/// Namespace prefixed to every generated metric unless overridden.
pub const DEFAULT_NAMESPACE: &str = "tempo_spanmetrics";

const PROMETHEUS_EXPORTER: &str = "prometheus";
const REMOTE_WRITE_EXPORTER: &str = "remote_write";

/// An extra metric dimension taken from a span attribute.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Dimension {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// `spanmetrics` block.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SpanMetricsConfig {
    pub latency_histogram_buckets: Option<Vec<String>>,
    pub dimensions: Option<Vec<Dimension>>,
    pub namespace: Option<String>,
    /// Metrics instance receiving the metrics through remote write.
    pub prom_instance: Option<String>,
    /// Address of a Prometheus scrape endpoint serving the metrics.
    pub handler_endpoint: Option<String>,
}

/// Where span metrics are sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricsTarget<'a> {
    RemoteWrite { prom_instance: &'a str },
    Prometheus { handler_endpoint: &'a str },
}

#[derive(Serialize)]
struct SpanMetricsProcessorSettings<'a> {
    metrics_exporter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_histogram_buckets: Option<&'a Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<&'a Vec<Dimension>>,
}

#[derive(Serialize)]
struct RemoteWriteExporterSettings<'a> {
    namespace: &'a str,
    prom_instance: &'a str,
}

#[derive(Serialize)]
struct PrometheusExporterSettings<'a> {
    endpoint: &'a str,
    namespace: &'a str,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl SpanMetricsConfig {
    /// The single configured metrics target.
    pub fn target(&self) -> ConfigResult<MetricsTarget<'_>> {
        match (
            non_empty(&self.prom_instance),
            non_empty(&self.handler_endpoint),
        ) {
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousMetricsExporter),
            (None, None) => Err(ConfigError::MissingMetricsExporter),
            (Some(prom_instance), None) => Ok(MetricsTarget::RemoteWrite { prom_instance }),
            (None, Some(handler_endpoint)) => Ok(MetricsTarget::Prometheus { handler_endpoint }),
        }
    }

    fn namespace(&self) -> &str {
        non_empty(&self.namespace).unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Builds the side exporter the processor writes metrics to.
    pub fn metrics_exporter(&self) -> ConfigResult<(ComponentId, Value)> {
        let namespace = self.namespace();
        let exporter = match self.target()? {
            MetricsTarget::RemoteWrite { prom_instance } => (
                ComponentId::new(REMOTE_WRITE_EXPORTER),
                serde_yaml::to_value(RemoteWriteExporterSettings {
                    namespace,
                    prom_instance,
                })?,
            ),
            MetricsTarget::Prometheus { handler_endpoint } => (
                ComponentId::new(PROMETHEUS_EXPORTER),
                serde_yaml::to_value(PrometheusExporterSettings {
                    endpoint: handler_endpoint,
                    namespace,
                })?,
            ),
        };
        Ok(exporter)
    }

    /// Builds the processor settings, naming `exporter` as the metrics
    /// destination.
    pub fn processor_settings(&self, exporter: &ComponentId) -> ConfigResult<Value> {
        Ok(serde_yaml::to_value(SpanMetricsProcessorSettings {
            metrics_exporter: exporter.to_string(),
            latency_histogram_buckets: self.latency_histogram_buckets.as_ref(),
            dimensions: self.dimensions.as_ref(),
        })?)
    }
}
