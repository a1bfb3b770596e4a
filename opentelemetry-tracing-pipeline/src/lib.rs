//! # OpenTelemetry tracing pipeline
//!
//! This crate compiles the compact tracing configuration of an agent
//! instance into a complete OpenTelemetry Collector configuration: receiver,
//! processor and exporter definitions plus the pipelines wiring them.
//!
//! ```no_run
//! use opentelemetry_tracing_pipeline::PipelineAssembler;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = PipelineAssembler::new().assemble_from_yaml(
//!     r#"
//!     receivers:
//!       jaeger:
//!         protocols:
//!           grpc:
//!     remote_write:
//!       - endpoint: tempo.example.com:4317
//!     "#,
//! )?;
//! println!("{}", graph.to_yaml()?);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod component_id;
pub mod error;
pub mod exporters;
pub mod instance_config;
pub mod pipeline;
pub mod processors;
pub mod registry;
pub mod secret;

pub use assembler::PipelineAssembler;
pub use component_id::ComponentId;
pub use error::{ConfigError, ConfigResult};
pub use instance_config::InstanceConfig;
pub use pipeline::{Pipeline, PipelineGraph};
pub use registry::ComponentRegistry;
pub use secret::{FileSecretResolver, Secret, SecretResolver};
