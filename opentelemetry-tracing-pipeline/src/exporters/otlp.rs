//! # OTLP exporter module.
//!
//! Configuration types for OTLP export targets and the conversion of a
//! target into collector `otlp`/`otlphttp` exporter settings.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use opentelemetry::otel_warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::processors::batch::BatchConfig;
use crate::secret::{Secret, SecretResolver};

/// Default upper bound on the retry period of an exporter.
///
/// The collector default of 300s keeps export failures out of the logs for
/// five minutes.
pub const DEFAULT_MAX_ELAPSED_TIME: &str = "60s";

const MAX_ELAPSED_TIME_KEY: &str = "max_elapsed_time";
const AUTHORIZATION_HEADER: &str = "authorization";

/// Transport used to reach an OTLP endpoint.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// OTLP over gRPC, served by the `otlp` exporter.
    #[default]
    Grpc,
    /// OTLP over HTTP, served by the `otlphttp` exporter.
    Http,
}

impl Protocol {
    /// Collector exporter type implementing this protocol.
    pub fn exporter_kind(self) -> &'static str {
        match self {
            Protocol::Grpc => "otlp",
            Protocol::Http => "otlphttp",
        }
    }
}

/// Compression applied to exported payloads.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Compresses data using gzip.
    Gzip,
    /// Sends data uncompressed.
    None,
}

impl Compression {
    /// Value of the exporter `compression` key, `None` when the key is
    /// left out.
    fn setting(self) -> Option<&'static str> {
        match self {
            Compression::Gzip => Some("gzip"),
            Compression::None => None,
        }
    }
}

/// TLS files used when the target is not insecure.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    pub ca_file: Option<String>,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
}

/// Basic authentication credentials.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthConfig {
    #[serde(default)]
    pub username: String,
    pub password: Option<String>,
    pub password_file: Option<PathBuf>,
}

impl BasicAuthConfig {
    /// The password source. A password file takes precedence over an inline
    /// password; with neither the password is empty.
    pub fn secret(&self) -> Secret {
        match (&self.password_file, &self.password) {
            (Some(path), _) => Secret::File(path.clone()),
            (None, Some(password)) => Secret::Literal(password.clone()),
            (None, None) => Secret::Literal(String::new()),
        }
    }

    /// Builds the `authorization` header value.
    pub fn header_value<R: SecretResolver>(&self, resolver: &R) -> ConfigResult<String> {
        let password = resolver.resolve(&self.secret())?;
        let mut credentials = Vec::with_capacity(self.username.len() + 1 + password.len());
        credentials.extend_from_slice(self.username.as_bytes());
        credentials.push(b':');
        credentials.extend_from_slice(&password);
        Ok(format!("Basic {}", STANDARD.encode(credentials)))
    }
}

impl Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_file", &self.password_file)
            .finish()
    }
}

/// One OTLP export target.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RemoteWriteConfig {
    pub endpoint: Option<String>,
    pub protocol: Option<Protocol>,
    pub compression: Option<Compression>,
    pub insecure: Option<bool>,
    pub insecure_skip_verify: Option<bool>,
    pub tls_config: Option<TlsConfig>,
    pub basic_auth: Option<BasicAuthConfig>,
    pub retry_on_failure: Option<Mapping>,
    pub sending_queue: Option<Mapping>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RemoteWriteConfig {
    /// Configured protocol, `grpc` when unset.
    pub fn protocol(&self) -> Protocol {
        self.protocol.unwrap_or_default()
    }

    /// Builds exporter settings for this target, defaulting compression to
    /// gzip.
    pub fn exporter_settings<R: SecretResolver>(
        &self,
        name: &str,
        resolver: &R,
    ) -> ConfigResult<Value> {
        let endpoint = match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => endpoint,
            _ => {
                return Err(ConfigError::InvalidExporterConfig {
                    name: name.to_string(),
                    reason: "must have a configured backend endpoint".into(),
                })
            }
        };
        let compression = self.compression.unwrap_or(Compression::Gzip);
        OtlpExporterSettings::build(self, endpoint, compression.setting(), resolver)
    }
}

/// The single push target, which may carry its own batch block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PushConfig {
    pub remote_write: RemoteWriteConfig,
    pub batch: Option<BatchConfig>,
}

impl<'de> Deserialize<'de> for PushConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut mapping = Option::<Mapping>::deserialize(deserializer)?.unwrap_or_default();
        let batch = mapping
            .remove("batch")
            .map(serde_yaml::from_value::<BatchConfig>)
            .transpose()
            .map_err(serde::de::Error::custom)?;
        let remote_write =
            serde_yaml::from_value(Value::Mapping(mapping)).map_err(serde::de::Error::custom)?;
        Ok(PushConfig {
            remote_write,
            batch,
        })
    }
}

/// Settings of a collector `otlp`/`otlphttp` exporter. Field order is the
/// rendered key order; absent values are left out.
#[derive(Serialize)]
struct OtlpExporterSettings<'a> {
    endpoint: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    insecure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    insecure_skip_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ca_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cert_file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_file: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sending_queue: Option<&'a Mapping>,
    retry_on_failure: Mapping,
}

impl<'a> OtlpExporterSettings<'a> {
    pub(crate) fn build<R: SecretResolver>(
        target: &'a RemoteWriteConfig,
        endpoint: &'a str,
        compression: Option<&'static str>,
        resolver: &R,
    ) -> ConfigResult<Value> {
        let mut headers = target.headers.clone();
        if let Some(basic_auth) = &target.basic_auth {
            headers.insert(
                AUTHORIZATION_HEADER.to_string(),
                basic_auth.header_value(resolver)?,
            );
        }

        // TLS files have no meaning on an insecure connection.
        let tls = match (&target.tls_config, target.insecure) {
            (Some(_), Some(true)) => {
                otel_warn!(
                    name: "OtlpExporter.TlsConfigIgnored",
                    endpoint = endpoint,
                    message = "tls_config is ignored because insecure is set"
                );
                None
            }
            (tls, _) => tls.as_ref(),
        };

        let mut retry_on_failure = target.retry_on_failure.clone().unwrap_or_default();
        if !retry_on_failure.contains_key(MAX_ELAPSED_TIME_KEY) {
            retry_on_failure.insert(
                Value::from(MAX_ELAPSED_TIME_KEY),
                Value::from(DEFAULT_MAX_ELAPSED_TIME),
            );
        }

        let settings = OtlpExporterSettings {
            endpoint,
            compression,
            insecure: target.insecure,
            insecure_skip_verify: target.insecure_skip_verify,
            ca_file: tls.and_then(|tls| tls.ca_file.as_deref()),
            cert_file: tls.and_then(|tls| tls.cert_file.as_deref()),
            key_file: tls.and_then(|tls| tls.key_file.as_deref()),
            headers,
            sending_queue: target.sending_queue.as_ref(),
            retry_on_failure,
        };
        Ok(serde_yaml::to_value(settings)?)
    }
}

/// Builds settings for an exporter whose endpoint is fixed by the caller and
/// whose compression has no default.
pub(crate) fn fixed_endpoint_settings<R: SecretResolver>(
    target: &RemoteWriteConfig,
    endpoint: &str,
    resolver: &R,
) -> ConfigResult<Value> {
    let compression = target.compression.and_then(Compression::setting);
    OtlpExporterSettings::build(target, endpoint, compression, resolver)
}
