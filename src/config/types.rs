use crate::manifest::OutputFormat;
use crate::spec::JobProperties;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub generation: GenerationConfig,
    pub output: OutputConfig,
    /// Lowest-precedence job properties, merged beneath every input document.
    pub defaults: Option<JobProperties>,
}

/// Manifest generation configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    /// Target Kubernetes version (`major.minor`); selects the CronJob apiVersion.
    pub kubernetes_version: Option<String>,
    /// Fail instead of generating CronJobs.
    pub disable_cronjobs: bool,
    /// Join parent and child job names with `-`.
    pub join_names: bool,
    /// Add the `app.kubernetes.io/*` recommended labels.
    pub recommended_labels: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}
