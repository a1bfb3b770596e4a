//! # Exporters module.
//!
//! Builds the exporters a trace pipeline writes to, either from the single
//! `push_config` target or from the ordered `remote_write` list.

pub mod loadbalancing;
pub mod otlp;

use serde_yaml::Value;

use crate::component_id::ComponentId;
use crate::error::ConfigResult;
use crate::exporters::otlp::{PushConfig, RemoteWriteConfig};
use crate::secret::SecretResolver;

/// Id of the exporter routing spans to peer instances.
pub const LOAD_BALANCING_EXPORTER: &str = "loadbalancing";

/// Where traces are sent.
#[derive(Clone, Copy, Debug)]
pub enum ExportTarget<'a> {
    /// One target, exported to by an unindexed exporter.
    Push(&'a PushConfig),
    /// An ordered list of targets, exported to by indexed exporters.
    RemoteWrite(&'a [RemoteWriteConfig]),
}

/// Builds one exporter per target, in target order.
///
/// A push target yields `otlp` (or `otlphttp`). Remote write targets yield
/// `otlp/<i>` or `otlphttp/<i>` where `i` is the position in the list,
/// whatever the protocol of the other entries.
pub fn build_exporters<R: SecretResolver>(
    target: ExportTarget<'_>,
    resolver: &R,
) -> ConfigResult<Vec<(ComponentId, Value)>> {
    match target {
        ExportTarget::Push(push) => {
            let config = &push.remote_write;
            let id = ComponentId::new(config.protocol().exporter_kind());
            let settings = config.exporter_settings(&id.to_string(), resolver)?;
            Ok(vec![(id, settings)])
        }
        ExportTarget::RemoteWrite(targets) => targets
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let id = ComponentId::indexed(config.protocol().exporter_kind(), index);
                let settings = config.exporter_settings(&id.to_string(), resolver)?;
                Ok((id, settings))
            })
            .collect(),
    }
}
