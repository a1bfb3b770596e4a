//! # Processors module.
//!
//! Builds a processor definition for each configured processor block and
//! decides the order they run in.

pub mod attributes;
pub mod automatic_logging;
pub mod batch;
pub mod spanmetrics;
pub mod tail_sampling;

use std::fmt::{Display, Formatter};

use serde_yaml::Value;

use crate::component_id::ComponentId;
use crate::error::ConfigResult;
use crate::processors::{
    attributes::AttributesConfig, automatic_logging::AutomaticLoggingConfig, batch::BatchConfig,
    spanmetrics::SpanMetricsConfig, tail_sampling::TailSamplingConfig,
};

/// Processor types, declared in the order they run in a pipeline.
///
/// Attribute changes apply before span metrics are derived, and both see
/// every span before tail sampling drops any. Automatic logging only logs
/// sampled spans, and batching comes last, right before export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessorKind {
    Attributes,
    SpanMetrics,
    TailSampling,
    AutomaticLogging,
    Batch,
}

impl ProcessorKind {
    /// Every kind, in precedence order.
    pub const ALL: [ProcessorKind; 5] = [
        ProcessorKind::Attributes,
        ProcessorKind::SpanMetrics,
        ProcessorKind::TailSampling,
        ProcessorKind::AutomaticLogging,
        ProcessorKind::Batch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessorKind::Attributes => "attributes",
            ProcessorKind::SpanMetrics => "spanmetrics",
            ProcessorKind::TailSampling => "tail_sampling",
            ProcessorKind::AutomaticLogging => "automatic_logging",
            ProcessorKind::Batch => "batch",
        }
    }

    /// Component id of the processor.
    pub fn id(self) -> ComponentId {
        ComponentId::new(self.as_str())
    }

    /// Whether the processor runs before spans are routed by trace id when
    /// the pipeline is split for load balancing.
    fn runs_before_routing(self) -> bool {
        self < ProcessorKind::TailSampling
    }
}

impl Display for ProcessorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`order_processors`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessorOrder {
    /// One pipeline runs every processor.
    Single(Vec<ProcessorKind>),
    /// Processors running before and after routing by trace id.
    Split {
        before_routing: Vec<ProcessorKind>,
        after_routing: Vec<ProcessorKind>,
    },
}

impl ProcessorOrder {
    /// All processors in run order, ignoring any split.
    pub fn into_flat(self) -> Vec<ProcessorKind> {
        match self {
            ProcessorOrder::Single(ordered) => ordered,
            ProcessorOrder::Split {
                mut before_routing,
                after_routing,
            } => {
                before_routing.extend(after_routing);
                before_routing
            }
        }
    }
}

/// Orders the configured processors by [`ProcessorKind`] precedence.
///
/// With `split`, the result is cut right before `tail_sampling`: spans must
/// reach the instance owning their trace before any sampling decision.
pub fn order_processors(configured: &[ProcessorKind], split: bool) -> ProcessorOrder {
    let mut ordered = configured.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    if !split {
        return ProcessorOrder::Single(ordered);
    }
    let (before_routing, after_routing): (Vec<_>, Vec<_>) = ordered
        .into_iter()
        .partition(|kind| kind.runs_before_routing());
    ProcessorOrder::Split {
        before_routing,
        after_routing,
    }
}

/// The processor blocks present in a configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessorBlocks<'a> {
    pub attributes: Option<&'a AttributesConfig>,
    pub spanmetrics: Option<&'a SpanMetricsConfig>,
    pub tail_sampling: Option<&'a TailSamplingConfig>,
    pub automatic_logging: Option<&'a AutomaticLoggingConfig>,
    pub batch: Option<&'a BatchConfig>,
}

/// Processor definitions built from [`ProcessorBlocks`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessorSet {
    /// One entry per configured block, in precedence order.
    pub processors: Vec<(ProcessorKind, Value)>,
    /// Exporter receiving span metrics, when span metrics are configured.
    pub metrics_exporter: Option<(ComponentId, Value)>,
}

impl ProcessorSet {
    /// Kinds of the built processors.
    pub fn kinds(&self) -> Vec<ProcessorKind> {
        self.processors.iter().map(|(kind, _)| *kind).collect()
    }
}

impl ProcessorBlocks<'_> {
    /// Builds a processor for every present block.
    pub fn build(&self) -> ConfigResult<ProcessorSet> {
        let mut set = ProcessorSet::default();

        if let Some(attributes) = self.attributes {
            set.processors
                .push((ProcessorKind::Attributes, attributes.processor_settings()?));
        }
        if let Some(spanmetrics) = self.spanmetrics {
            let (exporter_id, exporter) = spanmetrics.metrics_exporter()?;
            set.processors.push((
                ProcessorKind::SpanMetrics,
                spanmetrics.processor_settings(&exporter_id)?,
            ));
            set.metrics_exporter = Some((exporter_id, exporter));
        }
        if let Some(tail_sampling) = self.tail_sampling {
            set.processors
                .push((ProcessorKind::TailSampling, tail_sampling.processor_settings()?));
        }
        if let Some(automatic_logging) = self.automatic_logging {
            set.processors.push((
                ProcessorKind::AutomaticLogging,
                automatic_logging.processor_settings()?,
            ));
        }
        if let Some(batch) = self.batch {
            set.processors
                .push((ProcessorKind::Batch, batch.processor_settings()?));
        }

        Ok(set)
    }
}
