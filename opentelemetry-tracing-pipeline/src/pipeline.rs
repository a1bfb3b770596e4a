//! # Pipeline graph module
//!
//! The compiled collector configuration: component definitions plus the
//! pipelines wiring them together, laid out the way the collector reads it.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::Value;

use crate::component_id::ComponentId;
use crate::error::ConfigResult;

/// Id of the pipeline carrying traces when it is not split.
pub const TRACES_PIPELINE: &str = "traces";

/// Receivers, processors and exporters wired in order for one signal.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Pipeline {
    pub receivers: Vec<ComponentId>,
    pub processors: Vec<ComponentId>,
    pub exporters: Vec<ComponentId>,
}

/// The `service` section of a collector configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Service {
    pub pipelines: BTreeMap<ComponentId, Pipeline>,
}

/// A complete collector configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PipelineGraph {
    pub receivers: BTreeMap<ComponentId, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub processors: BTreeMap<ComponentId, Value>,
    pub exporters: BTreeMap<ComponentId, Value>,
    pub service: Service,
}

impl PipelineGraph {
    /// Looks up a pipeline by id.
    pub fn pipeline(&self, id: &ComponentId) -> Option<&Pipeline> {
        self.service.pipelines.get(id)
    }

    /// Pipelines whose type is `traces`.
    pub fn traces_pipelines(&self) -> impl Iterator<Item = (&ComponentId, &Pipeline)> {
        self.service
            .pipelines
            .iter()
            .filter(|(id, _)| id.kind() == TRACES_PIPELINE)
    }

    /// Renders the graph as a collector YAML configuration.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
