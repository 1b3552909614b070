//! Error types for kronjob.
//!
//! Every error is fatal: the first one aborts expansion and no partial output is
//! produced.

use std::fmt;
use thiserror::Error;

/// Identifies the leaf an error was raised for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// Position within `jobs`, or `None` for the top-level job.
    pub index: Option<usize>,
    /// Resolved job name, when one is known.
    pub name: Option<String>,
}

impl JobContext {
    pub fn top_level(name: Option<String>) -> Self {
        Self { index: None, name }
    }

    pub fn entry(index: usize, name: Option<String>) -> Self {
        Self {
            index: Some(index),
            name,
        }
    }
}

impl fmt::Display for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.index, &self.name) {
            (None, None) => write!(f, "top-level job"),
            (None, Some(name)) => write!(f, "top-level job ({})", name),
            (Some(i), None) => write!(f, "jobs[{}]", i),
            (Some(i), Some(name)) => write!(f, "jobs[{}] ({})", i, name),
        }
    }
}

/// Main error type for all kronjob operations
#[derive(Debug, Error)]
pub enum KronjobError {
    /// No `namespaces`, `namespace`, or leaf namespace could be resolved.
    #[error("No namespace for {job}: set `namespace` or `namespaces`")]
    MissingNamespace { job: JobContext },

    /// A required field is absent or empty after the full merge chain.
    #[error("Missing required field `{field}` for {job} in namespace `{namespace}`")]
    MissingRequiredField {
        field: &'static str,
        namespace: String,
        job: JobContext,
    },

    #[error("Job name `{name}` in namespace `{namespace}` is longer than {max} characters")]
    NameTooLong {
        name: String,
        namespace: String,
        max: usize,
    },

    /// The input is well-formed YAML but not shaped like a job description.
    #[error("Invalid job description: {0}")]
    InvalidDocument(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported Kubernetes version `{0}` (expected 1.5 or later)")]
    UnsupportedKubernetesVersion(String),

    #[error("CronJob generation is disabled but `{name}` in namespace `{namespace}` has a cron schedule")]
    CronJobsDisabled { name: String, namespace: String },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    ParsingFailed { path: String, message: String },
}

/// Result type alias for kronjob operations
pub type Result<T> = std::result::Result<T, KronjobError>;
