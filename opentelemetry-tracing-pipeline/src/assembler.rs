//! # Pipeline assembler
//!
//! Compiles an [`InstanceConfig`] into a [`PipelineGraph`]. Every call is a
//! single deterministic pass; the first invalid setting aborts it.

use std::path::Path;

use opentelemetry::otel_debug;
use serde_yaml::Value;

use crate::component_id::ComponentId;
use crate::error::{ConfigError, ConfigResult};
use crate::exporters::{build_exporters, LOAD_BALANCING_EXPORTER};
use crate::instance_config::InstanceConfig;
use crate::pipeline::{Pipeline, PipelineGraph, TRACES_PIPELINE};
use crate::processors::batch::effective_batch;
use crate::processors::{order_processors, ProcessorBlocks, ProcessorKind, ProcessorOrder};
use crate::secret::{FileSecretResolver, SecretResolver};

/// Receiver peers send routed spans to.
pub const LOAD_BALANCING_RECEIVER: &str = "otlp";
/// Label of the load balancing receiver, see [`LOAD_BALANCING_RECEIVER`].
pub const LOAD_BALANCING_RECEIVER_LABEL: &str = "lb";
/// Receiver that never produces data, feeding the span metrics pipeline.
pub const NOOP_RECEIVER: &str = "noop";

const METRICS_PIPELINE: &str = "metrics";
const SPANMETRICS_PIPELINE_LABEL: &str = "spanmetrics";

/// Compiles instance configurations into collector pipeline graphs.
///
/// Secrets are resolved through `R`; the default reads secret files from
/// disk.
#[derive(Clone, Debug, Default)]
pub struct PipelineAssembler<R = FileSecretResolver> {
    secret_resolver: R,
}

impl PipelineAssembler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: SecretResolver> PipelineAssembler<R> {
    /// Creates an assembler resolving secrets through `secret_resolver`.
    pub fn with_secret_resolver(secret_resolver: R) -> Self {
        PipelineAssembler { secret_resolver }
    }

    pub fn assemble_from_yaml(&self, instance_config_str: &str) -> ConfigResult<PipelineGraph> {
        let config = InstanceConfig::from_yaml(instance_config_str)?;
        self.assemble(&config)
    }

    pub fn assemble_from_yaml_file(
        &self,
        file_path: impl AsRef<Path>,
    ) -> ConfigResult<PipelineGraph> {
        let config = InstanceConfig::from_yaml_file(file_path)?;
        self.assemble(&config)
    }

    /// Compiles `config` into a complete pipeline graph.
    pub fn assemble(&self, config: &InstanceConfig) -> ConfigResult<PipelineGraph> {
        if config.receivers.is_empty() {
            return Err(ConfigError::MissingReceivers);
        }
        let export_target = config
            .export_target()
            .ok_or(ConfigError::AmbiguousExportTarget)?;
        let batch = effective_batch(
            config.batch.as_ref(),
            config
                .push_config
                .as_ref()
                .and_then(|push| push.batch.as_ref()),
        )?;
        let load_balancing = config.load_balancing();
        for (reserved, synthesized) in [
            (
                ComponentId::labeled(LOAD_BALANCING_RECEIVER, LOAD_BALANCING_RECEIVER_LABEL),
                load_balancing.is_some(),
            ),
            (ComponentId::new(NOOP_RECEIVER), config.spanmetrics.is_some()),
        ] {
            if synthesized && config.receivers.contains_key(&reserved) {
                return Err(ConfigError::ReservedReceiver(reserved.to_string()));
            }
        }

        let exporters = build_exporters(export_target, &self.secret_resolver)?;
        let processors = ProcessorBlocks {
            attributes: config.attributes.as_ref(),
            spanmetrics: config.spanmetrics.as_ref(),
            tail_sampling: config.tail_sampling.as_ref(),
            automatic_logging: config.automatic_logging.as_ref(),
            batch,
        }
        .build()?;

        let order = order_processors(&processors.kinds(), load_balancing.is_some());

        let mut graph = PipelineGraph {
            receivers: config.receivers.clone(),
            ..Default::default()
        };
        let receiver_ids: Vec<ComponentId> = config.receivers.keys().cloned().collect();
        let exporter_ids: Vec<ComponentId> = exporters.iter().map(|(id, _)| id.clone()).collect();
        graph.exporters.extend(exporters);
        graph.processors.extend(
            processors
                .processors
                .into_iter()
                .map(|(kind, settings)| (kind.id(), settings)),
        );

        match (order, load_balancing) {
            (
                ProcessorOrder::Split {
                    before_routing,
                    after_routing,
                },
                Some(load_balancing),
            ) => {
                let receiver_id =
                    ComponentId::labeled(LOAD_BALANCING_RECEIVER, LOAD_BALANCING_RECEIVER_LABEL);
                let exporter_id = ComponentId::new(LOAD_BALANCING_EXPORTER);
                let port = load_balancing.receiver_port()?;
                graph
                    .receivers
                    .insert(receiver_id.clone(), load_balancing.receiver_settings()?);
                graph.exporters.insert(
                    exporter_id.clone(),
                    load_balancing.exporter_settings(&self.secret_resolver)?,
                );

                otel_debug!(
                    name: "PipelineAssembler.LoadBalancing.Split",
                    receiver = format!("{receiver_id}"),
                    port = port,
                );

                graph.service.pipelines.insert(
                    ComponentId::indexed(TRACES_PIPELINE, 0),
                    Pipeline {
                        receivers: receiver_ids,
                        processors: processor_ids(&before_routing),
                        exporters: vec![exporter_id],
                    },
                );
                graph.service.pipelines.insert(
                    ComponentId::indexed(TRACES_PIPELINE, 1),
                    Pipeline {
                        receivers: vec![receiver_id],
                        processors: processor_ids(&after_routing),
                        exporters: exporter_ids,
                    },
                );
            }
            (order, _) => {
                graph.service.pipelines.insert(
                    ComponentId::new(TRACES_PIPELINE),
                    Pipeline {
                        receivers: receiver_ids,
                        processors: processor_ids(&order.into_flat()),
                        exporters: exporter_ids,
                    },
                );
            }
        }

        if let Some((exporter_id, exporter)) = processors.metrics_exporter {
            let receiver_id = ComponentId::new(NOOP_RECEIVER);
            graph.receivers.insert(receiver_id.clone(), Value::Null);
            graph.service.pipelines.insert(
                ComponentId::labeled(METRICS_PIPELINE, SPANMETRICS_PIPELINE_LABEL),
                Pipeline {
                    receivers: vec![receiver_id],
                    processors: Vec::new(),
                    exporters: vec![exporter_id.clone()],
                },
            );
            graph.exporters.insert(exporter_id, exporter);
        }

        otel_debug!(
            name: "PipelineAssembler.Assembled",
            receivers = graph.receivers.len(),
            processors = graph.processors.len(),
            exporters = graph.exporters.len(),
            pipelines = graph.service.pipelines.len(),
        );
        Ok(graph)
    }
}

fn processor_ids(kinds: &[ProcessorKind]) -> Vec<ComponentId> {
    kinds.iter().map(|kind| kind.id()).collect()
}
