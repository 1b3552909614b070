//! # Kronjob
//!
//! Generate Kubernetes Job/CronJob manifests without the boilerplate.
//!
//! A kronjob description declares shared properties once at the top level, an
//! optional list of `jobs` that inherit and override them, the target
//! `namespace`/`namespaces`, and per-namespace `namespaceOverrides`. A `schedule` of
//! `once` produces a Job; anything else is used verbatim as a CronJob schedule.
//!
//! ## Pipeline
//!
//! - **Parse**: YAML into an [`AbstractJobSpec`]
//! - **Expand**: merge the inheritance chain into [`ResolvedJob`]s, namespace-major
//! - **Build**: map each resolved job onto a [`ManifestDocument`]
//! - **Assemble**: render the documents in order as a YAML stream
//!
//! ## Example
//!
//! ```rust
//! use kronjob::{generate, GenerateOptions};
//!
//! # fn main() -> kronjob::Result<()> {
//! let input = r#"
//! name: example
//! image: example.com/base
//! namespace: test
//! jobs:
//!   - schedule: "* * * * *"
//!   - schedule: once
//! "#;
//! let manifests = generate(input, &GenerateOptions::default())?;
//! assert!(manifests.contains("kind: CronJob"));
//! assert!(manifests.contains("kind: Job"));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod expand;
pub mod handlers;
pub mod manifest;
pub mod spec;

// Re-export commonly used types and functions
pub use error::{ConfigError, JobContext, KronjobError, Result};
pub use expand::{ExpandOptions, ResolvedJob, Schedule, expand, expand_with};
pub use manifest::{
    ApiVersions, KubernetesVersion, ManifestBuilder, ManifestDocument, OutputFormat, assemble,
    assemble_as, build,
};
pub use spec::{AbstractJobSpec, JobProperties, MergeOptions, merge, merge_with};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for the whole parse → expand → build → assemble pipeline.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Lowest-precedence properties merged beneath every document.
    pub defaults: Option<JobProperties>,
    pub join_names: bool,
    /// Selects the CronJob apiVersion; `None` keeps `batch/v2alpha1`.
    pub kubernetes_version: Option<KubernetesVersion>,
    /// Reject any job with a cron schedule.
    pub disable_cronjobs: bool,
    pub recommended_labels: bool,
    pub format: OutputFormat,
}

impl GenerateOptions {
    /// Derive pipeline options from a loaded configuration.
    pub fn from_config(config: &config::types::Config) -> Result<Self> {
        let kubernetes_version = config
            .generation
            .kubernetes_version
            .as_deref()
            .map(str::parse::<KubernetesVersion>)
            .transpose()?;

        Ok(Self {
            defaults: config.defaults.clone(),
            join_names: config.generation.join_names,
            kubernetes_version,
            disable_cronjobs: config.generation.disable_cronjobs,
            recommended_labels: config.generation.recommended_labels,
            format: config.output.format,
        })
    }

    fn expand_options(&self) -> ExpandOptions {
        ExpandOptions {
            defaults: self.defaults.clone(),
            merge: MergeOptions {
                join_names: self.join_names,
            },
        }
    }

    fn builder(&self) -> Result<ManifestBuilder> {
        let api_versions = match self.kubernetes_version {
            Some(version) => ApiVersions::for_version(version)?,
            None => ApiVersions::default(),
        };
        Ok(ManifestBuilder::new(api_versions).with_recommended_labels(self.recommended_labels))
    }
}

/// Expand a job description and build its manifests, in output order.
pub fn build_manifests(
    spec: &AbstractJobSpec,
    options: &GenerateOptions,
) -> Result<Vec<ManifestDocument>> {
    let builder = options.builder()?;
    let jobs = expand_with(spec, &options.expand_options())?;

    if let Some(job) = jobs
        .iter()
        .find(|job| options.disable_cronjobs && !job.schedule.is_once())
    {
        return Err(KronjobError::CronJobsDisabled {
            name: job.name.clone(),
            namespace: job.namespace.clone(),
        });
    }

    let docs: Vec<ManifestDocument> = jobs.iter().map(|job| builder.build(job)).collect();
    log::debug!("Built {} manifest(s)", docs.len());
    Ok(docs)
}

/// Turn a YAML job description into rendered Kubernetes manifests.
pub fn generate(input: &str, options: &GenerateOptions) -> Result<String> {
    let spec = AbstractJobSpec::from_yaml_str(input)?;
    let docs = build_manifests(&spec, options)?;
    assemble_as(&docs, options.format)
}
