//! Turns a [`ResolvedJob`] into a Job or CronJob manifest.

use super::{
    CRONJOB_API_VERSION_V1BETA1, CRONJOB_API_VERSION_V2ALPHA1, Container, CronJob, CronJobSpec,
    JOB_API_VERSION, Job, JobSpec, JobTemplateSpec, ManifestDocument, ObjectMeta, PodSpec,
    PodTemplateSpec, ResourceRequirements,
};
use crate::error::{KronjobError, Result};
use crate::expand::{ResolvedJob, Schedule};
use crate::spec::Quantity;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LABEL_KEY: &str = "kronjob/job";
pub const DEFAULT_CONTAINER_NAME: &str = "job";
pub const DEFAULT_RESTART_POLICY: &str = "Never";
pub const DEFAULT_CONCURRENCY_POLICY: &str = "Forbid";
pub const DEFAULT_FAILED_JOBS_HISTORY_LIMIT: i32 = 10;
pub const DEFAULT_SUCCESSFUL_JOBS_HISTORY_LIMIT: i32 = 1;

/// A `major.minor` Kubernetes version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KubernetesVersion {
    pub major: u32,
    pub minor: u32,
}

impl KubernetesVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for KubernetesVersion {
    type Err = KronjobError;

    /// Accepts `1.9`, `v1.9` and `1.9.3`; anything after the minor part is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let unsupported = || KronjobError::UnsupportedKubernetesVersion(s.to_string());
        let trimmed = s.trim().trim_start_matches('v');
        let mut parts = trimmed.split('.');

        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(unsupported)?;
        let minor = parts
            .next()
            .and_then(|p| p.trim_end_matches('+').parse::<u32>().ok())
            .ok_or_else(unsupported)?;

        Ok(Self { major, minor })
    }
}

impl fmt::Display for KubernetesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// apiVersion strings to stamp on generated objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersions {
    pub job: String,
    pub cron_job: String,
}

impl Default for ApiVersions {
    fn default() -> Self {
        Self {
            job: JOB_API_VERSION.to_string(),
            cron_job: CRONJOB_API_VERSION_V2ALPHA1.to_string(),
        }
    }
}

impl ApiVersions {
    /// CronJob moved from `batch/v2alpha1` to `batch/v1beta1` in Kubernetes 1.8.
    pub fn for_version(version: KubernetesVersion) -> Result<Self> {
        if version.major != 1 || version.minor < 5 {
            return Err(KronjobError::UnsupportedKubernetesVersion(
                version.to_string(),
            ));
        }

        let cron_job = if version.minor >= 8 {
            CRONJOB_API_VERSION_V1BETA1
        } else {
            CRONJOB_API_VERSION_V2ALPHA1
        };

        Ok(Self {
            job: JOB_API_VERSION.to_string(),
            cron_job: cron_job.to_string(),
        })
    }
}

/// Builds manifests for resolved jobs.
#[derive(Debug, Clone, Default)]
pub struct ManifestBuilder {
    api_versions: ApiVersions,
    recommended_labels: bool,
}

impl ManifestBuilder {
    pub fn new(api_versions: ApiVersions) -> Self {
        Self {
            api_versions,
            recommended_labels: false,
        }
    }

    /// Also stamp the `app.kubernetes.io/*` recommended labels.
    pub fn with_recommended_labels(mut self, enabled: bool) -> Self {
        self.recommended_labels = enabled;
        self
    }

    pub fn api_versions(&self) -> &ApiVersions {
        &self.api_versions
    }

    pub fn build(&self, job: &ResolvedJob) -> ManifestDocument {
        let labels = self.labels(job);
        let metadata = ObjectMeta {
            name: Some(job.name.clone()),
            namespace: Some(job.namespace.clone()),
            labels: labels.clone(),
            annotations: None,
        };
        let template = pod_template(job, labels.clone());

        match &job.schedule {
            Schedule::Once => {
                log::debug!("Building Job `{}` in `{}`", job.name, job.namespace);
                ManifestDocument::Job(Job {
                    api_version: self.api_versions.job.clone(),
                    kind: "Job".to_string(),
                    metadata,
                    spec: JobSpec {
                        backoff_limit: None,
                        template,
                    },
                })
            }
            Schedule::Cron(expr) => {
                log::debug!(
                    "Building CronJob `{}` in `{}` ({})",
                    job.name,
                    job.namespace,
                    expr
                );
                ManifestDocument::CronJob(CronJob {
                    api_version: self.api_versions.cron_job.clone(),
                    kind: "CronJob".to_string(),
                    metadata,
                    spec: CronJobSpec {
                        schedule: expr.clone(),
                        concurrency_policy: job
                            .concurrency_policy
                            .clone()
                            .unwrap_or_else(|| DEFAULT_CONCURRENCY_POLICY.to_string()),
                        failed_jobs_history_limit: job
                            .failed_jobs_history_limit
                            .unwrap_or(DEFAULT_FAILED_JOBS_HISTORY_LIMIT),
                        successful_jobs_history_limit: job
                            .successful_jobs_history_limit
                            .unwrap_or(DEFAULT_SUCCESSFUL_JOBS_HISTORY_LIMIT),
                        suspend: job.suspend,
                        starting_deadline_seconds: job.starting_deadline_seconds,
                        job_template: JobTemplateSpec {
                            metadata: ObjectMeta {
                                labels,
                                ..Default::default()
                            },
                            spec: JobSpec {
                                backoff_limit: job.backoff_limit,
                                template,
                            },
                        },
                    },
                })
            }
        }
    }

    fn labels(&self, job: &ResolvedJob) -> BTreeMap<String, String> {
        let mut labels = job.labels.clone().unwrap_or_default();
        let key = job.label_key.as_deref().unwrap_or(DEFAULT_LABEL_KEY);
        labels.insert(key.to_string(), job.name.clone());

        if self.recommended_labels {
            for (label, value) in [
                ("app.kubernetes.io/name", job.name.as_str()),
                ("app.kubernetes.io/environment", job.namespace.as_str()),
                ("app.kubernetes.io/component", "job"),
            ] {
                labels
                    .entry(label.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        labels
    }
}

/// Build a manifest with the default builder.
pub fn build(job: &ResolvedJob) -> ManifestDocument {
    ManifestBuilder::default().build(job)
}

fn pod_template(job: &ResolvedJob, labels: BTreeMap<String, String>) -> PodTemplateSpec {
    let container = Container {
        name: job
            .container_name
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTAINER_NAME.to_string()),
        image: job.image.clone(),
        command: job.command.clone(),
        args: job.args.clone(),
        env: job.env.clone(),
        image_pull_policy: job.image_pull_policy.clone(),
        resources: resources(job),
        volume_mounts: job.volume_mounts.clone(),
    };

    PodTemplateSpec {
        metadata: ObjectMeta {
            labels,
            annotations: job.annotations.clone(),
            ..Default::default()
        },
        spec: PodSpec {
            containers: vec![container],
            restart_policy: job
                .restart_policy
                .clone()
                .unwrap_or_else(|| DEFAULT_RESTART_POLICY.to_string()),
            node_selector: job.node_selector.clone(),
            volumes: job.volumes.clone(),
        },
    }
}

fn resources(job: &ResolvedJob) -> Option<ResourceRequirements> {
    let limits = quantities(&job.cpu_limit, &job.memory_limit);
    let requests = quantities(&job.cpu_request, &job.memory_request);

    if limits.is_none() && requests.is_none() {
        None
    } else {
        Some(ResourceRequirements { limits, requests })
    }
}

fn quantities(
    cpu: &Option<Quantity>,
    memory: &Option<Quantity>,
) -> Option<BTreeMap<String, Quantity>> {
    let map: BTreeMap<String, Quantity> = [("cpu", cpu), ("memory", memory)]
        .into_iter()
        .filter_map(|(resource, quantity)| {
            quantity
                .as_ref()
                .map(|q| (resource.to_string(), q.clone()))
        })
        .collect();

    if map.is_empty() { None } else { Some(map) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobContext;
    use crate::spec::{EnvVar, JobProperties};
    use pretty_assertions::assert_eq;

    fn resolved(schedule: &str) -> ResolvedJob {
        let properties = JobProperties {
            name: Some("example".into()),
            image: Some("example.com/base".into()),
            schedule: Some(schedule.into()),
            ..Default::default()
        };
        ResolvedJob::from_properties(properties, "test", JobContext::top_level(None)).unwrap()
    }

    #[test]
    fn test_once_builds_job() {
        let doc = build(&resolved("once"));
        let job = doc.as_job().expect("expected a Job");

        assert_eq!(job.api_version, "batch/v1");
        assert_eq!(job.kind, "Job");
        assert_eq!(job.metadata.name.as_deref(), Some("example"));
        assert_eq!(job.metadata.namespace.as_deref(), Some("test"));
        assert_eq!(job.spec.template.spec.containers[0].image, "example.com/base");
        assert_eq!(job.spec.template.spec.restart_policy, "Never");
    }

    #[test]
    fn test_cron_builds_cronjob_with_verbatim_schedule() {
        let doc = build(&resolved("*/15 * * * *"));
        let cron_job = doc.as_cron_job().expect("expected a CronJob");

        assert_eq!(cron_job.api_version, "batch/v2alpha1");
        assert_eq!(cron_job.kind, "CronJob");
        assert_eq!(cron_job.spec.schedule, "*/15 * * * *");
        assert_eq!(cron_job.spec.concurrency_policy, "Forbid");
        assert_eq!(cron_job.spec.failed_jobs_history_limit, 10);
        assert_eq!(cron_job.spec.successful_jobs_history_limit, 1);
        assert_eq!(cron_job.spec.suspend, None);
    }

    #[test]
    fn test_default_label_on_all_metadata() {
        for schedule in ["once", "* * * * *"] {
            let doc = build(&resolved(schedule));
            assert_eq!(doc.metadata().labels["kronjob/job"], "example");
            assert_eq!(doc.pod_template().metadata.labels["kronjob/job"], "example");
        }

        let doc = build(&resolved("* * * * *"));
        let cron_job = doc.as_cron_job().unwrap();
        assert_eq!(
            cron_job.spec.job_template.metadata.labels["kronjob/job"],
            "example"
        );
    }

    #[test]
    fn test_custom_label_key_and_extra_labels() {
        let mut job = resolved("once");
        job.label_key = Some("team/job".into());
        job.labels = Some(BTreeMap::from([
            ("team".to_string(), "data".to_string()),
            ("team/job".to_string(), "ignored".to_string()),
        ]));

        let doc = build(&job);
        let labels = &doc.metadata().labels;
        assert_eq!(labels["team/job"], "example");
        assert_eq!(labels["team"], "data");
        assert!(!labels.contains_key("kronjob/job"));
    }

    #[test]
    fn test_recommended_labels() {
        let builder = ManifestBuilder::default().with_recommended_labels(true);
        let doc = builder.build(&resolved("once"));
        let labels = &doc.metadata().labels;

        assert_eq!(labels["app.kubernetes.io/name"], "example");
        assert_eq!(labels["app.kubernetes.io/environment"], "test");
        assert_eq!(labels["app.kubernetes.io/component"], "job");
    }

    #[test]
    fn test_container_fields() {
        let mut job = resolved("once");
        job.container_name = Some("worker".into());
        job.command = Some(vec!["python".into()]);
        job.args = Some(vec!["run.py".into()]);
        job.env = vec![EnvVar::new("A", "1")];
        job.cpu_limit = Some(Quantity::from("1"));
        job.memory_request = Some(Quantity::from("256Mi"));
        job.image_pull_policy = Some("Always".into());

        let doc = build(&job);
        let container = &doc.pod_template().spec.containers[0];
        assert_eq!(container.name, "worker");
        assert_eq!(container.command, Some(vec!["python".to_string()]));
        assert_eq!(container.args, Some(vec!["run.py".to_string()]));
        assert_eq!(container.env, vec![EnvVar::new("A", "1")]);
        assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));

        let resources = container.resources.as_ref().unwrap();
        assert_eq!(resources.limits.as_ref().unwrap()["cpu"], Quantity::from("1"));
        assert!(!resources.limits.as_ref().unwrap().contains_key("memory"));
        assert_eq!(
            resources.requests.as_ref().unwrap()["memory"],
            Quantity::from("256Mi")
        );
    }

    #[test]
    fn test_sparse_defaults() {
        let doc = build(&resolved("once"));
        let template = doc.pod_template();
        let container = &template.spec.containers[0];

        assert_eq!(container.name, "job");
        assert!(container.resources.is_none());
        assert!(container.command.is_none());
        assert!(container.env.is_empty());
        assert!(template.spec.node_selector.is_none());
        assert!(template.metadata.annotations.is_none());
    }

    #[test]
    fn test_cron_only_fields_skip_job_variant() {
        let mut job = resolved("once");
        job.backoff_limit = Some(3);
        job.suspend = Some(true);
        let doc = build(&job);
        assert_eq!(doc.as_job().unwrap().spec.backoff_limit, None);

        job.schedule = Schedule::Cron("0 3 * * *".into());
        job.starting_deadline_seconds = Some(120);
        let doc = build(&job);
        let spec = &doc.as_cron_job().unwrap().spec;
        assert_eq!(spec.job_template.spec.backoff_limit, Some(3));
        assert_eq!(spec.suspend, Some(true));
        assert_eq!(spec.starting_deadline_seconds, Some(120));
    }

    #[test]
    fn test_kubernetes_version_parse() {
        assert_eq!(
            "1.9".parse::<KubernetesVersion>().unwrap(),
            KubernetesVersion::new(1, 9)
        );
        assert_eq!(
            "v1.7.3".parse::<KubernetesVersion>().unwrap(),
            KubernetesVersion::new(1, 7)
        );
        assert!("latest".parse::<KubernetesVersion>().is_err());
        assert!("1".parse::<KubernetesVersion>().is_err());
    }

    #[test]
    fn test_api_versions_for_version() {
        let v = ApiVersions::for_version(KubernetesVersion::new(1, 7)).unwrap();
        assert_eq!(v.cron_job, "batch/v2alpha1");
        let v = ApiVersions::for_version(KubernetesVersion::new(1, 8)).unwrap();
        assert_eq!(v.cron_job, "batch/v1beta1");
        assert_eq!(v.job, "batch/v1");

        assert!(ApiVersions::for_version(KubernetesVersion::new(1, 4)).is_err());
        assert!(ApiVersions::for_version(KubernetesVersion::new(2, 0)).is_err());
    }

    #[test]
    fn test_builder_uses_configured_api_versions() {
        let versions = ApiVersions::for_version(KubernetesVersion::new(1, 9)).unwrap();
        let doc = ManifestBuilder::new(versions).build(&resolved("* * * * *"));
        assert_eq!(doc.api_version(), "batch/v1beta1");
    }
}
