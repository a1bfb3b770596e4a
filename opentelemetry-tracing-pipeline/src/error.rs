//! Errors raised while compiling an instance configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while turning an [`InstanceConfig`] into a
/// [`PipelineGraph`].
///
/// Every variant is terminal: compilation stops at the first error and no
/// partial graph is produced.
///
/// [`InstanceConfig`]: crate::instance_config::InstanceConfig
/// [`PipelineGraph`]: crate::pipeline::PipelineGraph
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// No receivers were configured.
    #[error("at least one receiver must be configured")]
    MissingReceivers,

    /// Both `push_config` and `remote_write` were configured, or neither was.
    #[error("must configure exactly one of push_config or remote_write")]
    AmbiguousExportTarget,

    /// Batching was configured both at the top level and under `push_config`.
    #[error("batch and push_config.batch can't be configured at the same time")]
    DuplicateBatchConfig,

    /// An exporter target could not be turned into exporter settings.
    #[error("{name}: {reason}")]
    InvalidExporterConfig {
        /// The exporter the configuration belongs to.
        name: String,
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// Span metrics were given both a prometheus and a remote write target.
    #[error("spanmetrics can't define both handler_endpoint and prom_instance")]
    AmbiguousMetricsExporter,

    /// Span metrics were configured without any metrics target.
    #[error("spanmetrics must define either handler_endpoint or prom_instance")]
    MissingMetricsExporter,

    /// A secret file referenced by the configuration could not be read.
    #[error("unable to load secret file {}: {source}", path.display())]
    SecretUnreadable {
        /// Path of the secret file.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A tail sampling policy entry is malformed.
    #[error("tail_sampling policy {index}: {reason}")]
    InvalidPolicyShape {
        /// Position of the policy in the configured list.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The tail sampling load balancing block is unusable.
    #[error("tail_sampling.load_balancing: {0}")]
    InvalidLoadBalancingConfig(String),

    /// A user receiver uses an id the compiled graph needs for a receiver
    /// of its own.
    #[error("receiver id '{0}' is reserved")]
    ReservedReceiver(String),

    /// A string could not be parsed as a component identifier.
    #[error("invalid component id '{0}'")]
    InvalidComponentId(String),

    /// A component kind is not known to the registry.
    #[error("unknown {class} type '{id}'")]
    UnknownComponent {
        /// One of `receiver`, `processor` or `exporter`.
        class: &'static str,
        /// Rendered component id.
        id: String,
    },

    /// A pipeline references a component the graph does not define.
    #[error("pipeline '{pipeline}' references undefined component '{id}'")]
    UndefinedComponent {
        /// Rendered pipeline id.
        pipeline: String,
        /// Rendered component id.
        id: String,
    },

    /// The configuration document could not be parsed or rendered.
    #[error(transparent)]
    Parse(#[from] serde_yaml::Error),

    /// The configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
