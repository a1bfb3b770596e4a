//! # Component identifiers
//!
//! Receivers, processors, exporters and pipelines are all referenced by a
//! component id of the form `type` or `type/name`. Ids built by this crate
//! carry either a list index (`otlp/0`) or a fixed label (`otlp/lb`). Ids
//! written by users keep their name verbatim as a label.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};

const SEPARATOR: char = '/';

/// The optional part of a [`ComponentId`] following the separator.
///
/// Indices sort numerically and before labels.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentName {
    /// Position of the component in an ordered collection.
    Index(usize),
    /// A fixed label.
    Label(Cow<'static, str>),
}

impl Display for ComponentName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentName::Index(index) => write!(f, "{index}"),
            ComponentName::Label(label) => f.write_str(label),
        }
    }
}

/// Identifies a component within a pipeline graph.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId {
    kind: Cow<'static, str>,
    name: Option<ComponentName>,
}

impl ComponentId {
    /// Creates an unnamed id rendered as `kind`.
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        ComponentId {
            kind: kind.into(),
            name: None,
        }
    }

    /// Creates an id rendered as `kind/<index>`.
    pub fn indexed(kind: impl Into<Cow<'static, str>>, index: usize) -> Self {
        ComponentId {
            kind: kind.into(),
            name: Some(ComponentName::Index(index)),
        }
    }

    /// Creates an id rendered as `kind/<label>`.
    pub fn labeled(kind: impl Into<Cow<'static, str>>, label: impl Into<Cow<'static, str>>) -> Self {
        ComponentId {
            kind: kind.into(),
            name: Some(ComponentName::Label(label.into())),
        }
    }

    /// The component type, e.g. `otlp`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The part after the separator, if any.
    pub fn name(&self) -> Option<&ComponentName> {
        self.name.as_ref()
    }

    /// Parses an id written by a user. The name is kept as a label exactly
    /// as written, so the id renders back to `s` unchanged.
    pub fn verbatim(s: &str) -> ConfigResult<Self> {
        let (kind, name) = match s.split_once(SEPARATOR) {
            Some((kind, name)) => (kind, Some(name)),
            None => (s, None),
        };
        if kind.trim().is_empty() || name.is_some_and(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidComponentId(s.to_string()));
        }
        Ok(match name {
            Some(name) => ComponentId::labeled(kind.to_string(), name.to_string()),
            None => ComponentId::new(kind.to_string()),
        })
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{SEPARATOR}{name}", self.kind),
            None => f.write_str(&self.kind),
        }
    }
}

impl FromStr for ComponentId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = match s.split_once(SEPARATOR) {
            Some((kind, name)) => (kind.trim(), Some(name.trim())),
            None => (s.trim(), None),
        };
        if kind.is_empty() || kind.contains(SEPARATOR) {
            return Err(ConfigError::InvalidComponentId(s.to_string()));
        }
        match name {
            None => Ok(ComponentId::new(kind.to_string())),
            Some("") => Err(ConfigError::InvalidComponentId(s.to_string())),
            Some(name) if name.contains(SEPARATOR) => {
                Err(ConfigError::InvalidComponentId(s.to_string()))
            }
            Some(name) => match name.parse::<usize>() {
                Ok(index) => Ok(ComponentId::indexed(kind.to_string(), index)),
                Err(_) => Ok(ComponentId::labeled(kind.to_string(), name.to_string())),
            },
        }
    }
}

impl Serialize for ComponentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(ComponentId::new("otlp").to_string(), "otlp");
        assert_eq!(ComponentId::indexed("otlphttp", 3).to_string(), "otlphttp/3");
        assert_eq!(ComponentId::labeled("otlp", "lb").to_string(), "otlp/lb");
    }

    #[test]
    fn test_parse() {
        assert_eq!("jaeger".parse::<ComponentId>().unwrap(), ComponentId::new("jaeger"));
        assert_eq!(
            "otlp/1".parse::<ComponentId>().unwrap(),
            ComponentId::indexed("otlp", 1)
        );
        assert_eq!(
            "otlp/lb".parse::<ComponentId>().unwrap(),
            ComponentId::labeled("otlp", "lb")
        );
        assert!("".parse::<ComponentId>().is_err());
        assert!("otlp/".parse::<ComponentId>().is_err());
        assert!("/lb".parse::<ComponentId>().is_err());
        assert!("a/b/c".parse::<ComponentId>().is_err());
    }

    #[test]
    fn test_indices_order_numerically() {
        let mut ids = vec![
            ComponentId::indexed("otlp", 10),
            ComponentId::labeled("otlp", "lb"),
            ComponentId::indexed("otlp", 2),
            ComponentId::new("otlp"),
        ];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["otlp", "otlp/2", "otlp/10", "otlp/lb"]);
    }

    #[test]
    fn test_verbatim_keeps_the_name_as_written() {
        for written in ["jaeger", "jaeger/01", "jaeger/1", "otlp/lb", "zipkin/ with space"] {
            assert_eq!(ComponentId::verbatim(written).unwrap().to_string(), written);
        }
        assert_ne!(
            ComponentId::verbatim("jaeger/01").unwrap(),
            ComponentId::verbatim("jaeger/1").unwrap()
        );
        assert_eq!(
            ComponentId::verbatim("otlp/lb").unwrap(),
            ComponentId::labeled("otlp", "lb")
        );
        assert!(ComponentId::verbatim("").is_err());
        assert!(ComponentId::verbatim("jaeger/").is_err());
        assert!(ComponentId::verbatim("/lb").is_err());
    }

    #[test]
    fn test_equality_is_structural() {
        assert_ne!(
            ComponentId::indexed("otlp", 1),
            ComponentId::labeled("otlp", "1")
        );
    }
}
