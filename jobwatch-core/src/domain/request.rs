//! Job request parameters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Parameters of the work to perform, e.g. a report filter set
///
/// Opaque to the poller: the submission client serializes the parameters
/// as query pairs and never looks at their meaning. Keys are kept sorted so
/// the same request always produces the same query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    params: BTreeMap<String, String>,
}

impl JobRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any previous value for the key
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters as `(key, value)` pairs in key order
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for JobRequest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A single `key=value` parameter as typed on a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// Error returned when a `key=value` parameter cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamParseError(String);

impl fmt::Display for ParamParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected key=value, got '{}'", self.0)
    }
}

impl std::error::Error for ParamParseError {}

impl FromStr for Param {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(Param {
                key: key.trim().to_string(),
                value: value.to_string(),
            }),
            _ => Err(ParamParseError(s.to_string())),
        }
    }
}
