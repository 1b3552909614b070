//! The abstract, inheritance-based job description.
//!
//! An [`AbstractJobSpec`] is a set of shared [`JobProperties`] plus the structural
//! fields (`jobs`, `namespaces`, `namespaceOverrides`) that drive expansion.
//! Every property is optional here; presence is checked after merging.

pub mod merge;

pub use merge::{ADDITIVE_FIELDS, MergeOptions, merge, merge_with};

use crate::error::{KronjobError, Result};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Shared, overridable properties of a job.
///
/// Used for the top level of the document, every entry of `jobs`, and every
/// namespace override.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobProperties {
    pub name: Option<String>,
    pub image: Option<String>,
    pub namespace: Option<String>,
    /// `once` for a Job, anything else is a cron expression for a CronJob.
    pub schedule: Option<String>,

    /// Additive: concatenated down the inheritance chain.
    pub env: Option<Vec<EnvVar>>,
    pub command: Option<Vec<String>>,
    pub args: Option<Vec<String>>,
    pub container_name: Option<String>,
    pub image_pull_policy: Option<String>,
    pub cpu_limit: Option<Quantity>,
    pub cpu_request: Option<Quantity>,
    pub memory_limit: Option<Quantity>,
    pub memory_request: Option<Quantity>,
    pub volume_mounts: Option<Vec<VolumeMount>>,

    pub restart_policy: Option<String>,
    pub node_selector: Option<BTreeMap<String, String>>,
    /// Kubernetes volume objects, passed through untouched.
    pub volumes: Option<Vec<Value>>,

    pub label_key: Option<String>,
    pub labels: Option<BTreeMap<String, String>>,
    pub annotations: Option<BTreeMap<String, String>>,

    pub concurrency_policy: Option<String>,
    pub failed_jobs_history_limit: Option<i32>,
    pub successful_jobs_history_limit: Option<i32>,
    pub suspend: Option<bool>,
    pub starting_deadline_seconds: Option<i64>,
    pub backoff_limit: Option<i32>,
}

/// A container environment variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Secret/config-map/field references, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<Value>,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }
}

/// A container volume mount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_propagation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive_read_only: Option<String>,
}

/// A Kubernetes resource quantity such as `500m`, `1` or `256Mi`.
///
/// Accepts bare YAML numbers as well as strings and always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Quantity(pub String);

impl Quantity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct QuantityVisitor;

        impl de::Visitor<'_> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a resource quantity string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Quantity, E> {
                Ok(Quantity(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Quantity, E> {
                Ok(Quantity(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Quantity, E> {
                Ok(Quantity(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Quantity, E> {
                Ok(Quantity(v.to_string()))
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// The top-level job description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractJobSpec {
    /// Properties shared by every generated job.
    pub properties: JobProperties,
    /// Target namespaces, in output order.
    pub namespaces: Option<Vec<String>>,
    /// Per-namespace overrides, applied last.
    pub namespace_overrides: BTreeMap<String, JobProperties>,
    /// Leaves, in output order. Empty means the top level is the only leaf.
    pub jobs: Vec<JobProperties>,
}

impl AbstractJobSpec {
    /// Parse a job description from a YAML string.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(KronjobError::InvalidDocument(
                "the job description is empty".to_string(),
            ));
        }
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_value(value)
    }

    /// Build a job description from an already-parsed YAML value.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => {
                return Err(KronjobError::InvalidDocument(
                    "the job description is empty".to_string(),
                ));
            }
            other => {
                return Err(KronjobError::InvalidDocument(format!(
                    "expected a mapping at the top level, found {}",
                    value_kind(&other)
                )));
            }
        };

        let jobs: Option<Vec<JobProperties>> = take_key(&mut mapping, "jobs")?;
        let namespaces = take_key(&mut mapping, "namespaces")?;
        let namespace_overrides: Option<BTreeMap<String, JobProperties>> =
            take_key(&mut mapping, "namespaceOverrides")?;
        let properties = serde_yaml::from_value(Value::Mapping(mapping))?;

        Ok(Self {
            properties,
            namespaces,
            namespace_overrides: namespace_overrides.unwrap_or_default(),
            jobs: jobs.unwrap_or_default(),
        })
    }
}

impl From<JobProperties> for AbstractJobSpec {
    fn from(properties: JobProperties) -> Self {
        Self {
            properties,
            ..Default::default()
        }
    }
}

impl<'de> Deserialize<'de> for AbstractJobSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// Remove `key` from the mapping and deserialize it. A null value counts as absent.
fn take_key<T: DeserializeOwned>(mapping: &mut Mapping, key: &str) -> Result<Option<T>> {
    match mapping.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_yaml::from_value(value)?)),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
