//! # Component registry
//!
//! The collector only loads components it has a factory for. A
//! [`ComponentRegistry`] lists the component types a collector build ships
//! and checks a [`PipelineGraph`] against them before it is handed over.

use std::collections::BTreeSet;

use crate::component_id::ComponentId;
use crate::error::{ConfigError, ConfigResult};
use crate::pipeline::PipelineGraph;

/// Known receiver, processor and exporter types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentRegistry {
    receivers: BTreeSet<String>,
    processors: BTreeSet<String>,
    exporters: BTreeSet<String>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The components available to a tracing collector.
    pub fn tracing() -> Self {
        Self::new()
            .with_receivers(["jaeger", "kafka", "opencensus", "otlp", "zipkin", "noop"])
            .with_processors([
                "attributes",
                "batch",
                "spanmetrics",
                "automatic_logging",
                "tail_sampling",
            ])
            .with_exporters([
                "otlp",
                "otlphttp",
                "loadbalancing",
                "prometheus",
                "remote_write",
            ])
    }

    pub fn with_receivers<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.receivers.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn with_processors<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.processors.extend(kinds.into_iter().map(Into::into));
        self
    }

    pub fn with_exporters<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exporters.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Checks that every defined component has a known type and that every
    /// pipeline only references defined components.
    pub fn validate(&self, graph: &PipelineGraph) -> ConfigResult<()> {
        check_known("receiver", &self.receivers, graph.receivers.keys())?;
        check_known("processor", &self.processors, graph.processors.keys())?;
        check_known("exporter", &self.exporters, graph.exporters.keys())?;

        for (pipeline_id, pipeline) in &graph.service.pipelines {
            let references = pipeline
                .receivers
                .iter()
                .map(|id| graph.receivers.contains_key(id).then_some(()).ok_or(id))
                .chain(
                    pipeline
                        .processors
                        .iter()
                        .map(|id| graph.processors.contains_key(id).then_some(()).ok_or(id)),
                )
                .chain(
                    pipeline
                        .exporters
                        .iter()
                        .map(|id| graph.exporters.contains_key(id).then_some(()).ok_or(id)),
                );
            for reference in references {
                reference.map_err(|id| ConfigError::UndefinedComponent {
                    pipeline: pipeline_id.to_string(),
                    id: id.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

fn check_known<'a>(
    class: &'static str,
    known: &BTreeSet<String>,
    ids: impl Iterator<Item = &'a ComponentId>,
) -> ConfigResult<()> {
    for id in ids {
        if !known.contains(id.kind()) {
            return Err(ConfigError::UnknownComponent {
                class,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
