//! Expansion of an abstract job description into resolved jobs.
//!
//! The merge chain for every output is fixed: configured defaults, then the top
//! level, then the `jobs` entry, then the namespace override. Output order is
//! namespace-major and leaf-minor, following input order exactly.

use crate::error::{JobContext, KronjobError, Result};
use crate::spec::{
    AbstractJobSpec, EnvVar, JobProperties, MergeOptions, Quantity, VolumeMount, merge,
    merge_with,
};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Longest name Kubernetes accepts for a CronJob.
pub const MAX_NAME_LENGTH: usize = 52;

/// The schedule keyword that produces a one-off Job.
pub const ONCE: &str = "once";

/// When a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Schedule {
    /// Run a single time as a Job.
    Once,
    /// Run on a cron schedule as a CronJob. The expression is kept verbatim.
    Cron(String),
}

impl Schedule {
    pub fn parse(s: &str) -> Self {
        if s == ONCE {
            Self::Once
        } else {
            Self::Cron(s.to_string())
        }
    }

    pub fn is_once(&self) -> bool {
        matches!(self, Self::Once)
    }

    /// The cron expression, if this is a recurring schedule.
    pub fn cron_expression(&self) -> Option<&str> {
        match self {
            Self::Once => None,
            Self::Cron(expr) => Some(expr),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => write!(f, "{}", ONCE),
            Self::Cron(expr) => write!(f, "{}", expr),
        }
    }
}

/// A fully merged job, ready to be turned into a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedJob {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub schedule: Schedule,

    /// Ancestor entries first. Empty means no `env` was declared anywhere.
    pub env: Vec<EnvVar>,
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

impl ResolvedJob {
    /// Check the required fields of fully merged properties and flatten them.
    pub fn from_properties(
        properties: JobProperties,
        namespace: &str,
        context: JobContext,
    ) -> Result<Self> {
        let missing = |field: &'static str| KronjobError::MissingRequiredField {
            field,
            namespace: namespace.to_string(),
            job: context.clone(),
        };

        let name = non_empty(properties.name).ok_or_else(|| missing("name"))?;
        let image = non_empty(properties.image).ok_or_else(|| missing("image"))?;
        let schedule = non_empty(properties.schedule).ok_or_else(|| missing("schedule"))?;

        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(KronjobError::NameTooLong {
                name,
                namespace: namespace.to_string(),
                max: MAX_NAME_LENGTH,
            });
        }

        Ok(Self {
            name,
            namespace: namespace.to_string(),
            image,
            schedule: Schedule::parse(&schedule),
            env: properties.env.unwrap_or_default(),
            command: properties.command,
            args: properties.args,
            container_name: properties.container_name,
            image_pull_policy: properties.image_pull_policy,
            cpu_limit: properties.cpu_limit,
            cpu_request: properties.cpu_request,
            memory_limit: properties.memory_limit,
            memory_request: properties.memory_request,
            volume_mounts: properties.volume_mounts,
            restart_policy: properties.restart_policy,
            node_selector: properties.node_selector,
            volumes: properties.volumes,
            label_key: properties.label_key,
            labels: properties.labels,
            annotations: properties.annotations,
            concurrency_policy: properties.concurrency_policy,
            failed_jobs_history_limit: properties.failed_jobs_history_limit,
            successful_jobs_history_limit: properties.successful_jobs_history_limit,
            suspend: properties.suspend,
            starting_deadline_seconds: properties.starting_deadline_seconds,
            backoff_limit: properties.backoff_limit,
        })
    }
}

/// Options for [`expand_with`].
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    /// Lowest-precedence properties merged beneath the top level.
    pub defaults: Option<JobProperties>,
    pub merge: MergeOptions,
}

/// A job identity before namespace expansion.
struct Leaf {
    index: Option<usize>,
    properties: JobProperties,
}

impl Leaf {
    fn context(&self, properties: &JobProperties) -> JobContext {
        let name = properties.name.clone().filter(|n| !n.is_empty());
        match self.index {
            Some(i) => JobContext::entry(i, name),
            None => JobContext::top_level(name),
        }
    }
}

/// Expand a job description with default options.
pub fn expand(root: &AbstractJobSpec) -> Result<Vec<ResolvedJob>> {
    expand_with(root, &ExpandOptions::default())
}

/// Expand a job description into resolved jobs, namespace-major then leaf-minor.
pub fn expand_with(root: &AbstractJobSpec, options: &ExpandOptions) -> Result<Vec<ResolvedJob>> {
    let base = match &options.defaults {
        Some(defaults) => merge(defaults, &root.properties),
        None => root.properties.clone(),
    };

    let leaves: Vec<Leaf> = if root.jobs.is_empty() {
        vec![Leaf {
            index: None,
            properties: base,
        }]
    } else {
        root.jobs
            .iter()
            .enumerate()
            .map(|(i, job)| Leaf {
                index: Some(i),
                properties: merge_with(&base, job, options.merge),
            })
            .collect()
    };

    let mut resolved = Vec::new();
    match target_namespaces(root) {
        Some(namespaces) => {
            log::debug!(
                "Expanding {} job(s) across {} namespace(s)",
                leaves.len(),
                namespaces.len()
            );
            for namespace in &namespaces {
                for leaf in &leaves {
                    if namespace.is_empty() {
                        return Err(KronjobError::MissingNamespace {
                            job: leaf.context(&leaf.properties),
                        });
                    }
                    resolved.push(resolve(root, leaf, namespace, options)?);
                }
            }
        }
        None => {
            log::debug!(
                "No top-level namespace, using the namespace of each of {} job(s)",
                leaves.len()
            );
            for leaf in &leaves {
                let namespace = leaf
                    .properties
                    .namespace
                    .clone()
                    .filter(|ns| !ns.is_empty())
                    .ok_or_else(|| KronjobError::MissingNamespace {
                        job: leaf.context(&leaf.properties),
                    })?;
                resolved.push(resolve(root, leaf, &namespace, options)?);
            }
        }
    }

    Ok(resolved)
}

/// `namespaces` if non-empty, else the single top-level `namespace`.
fn target_namespaces(root: &AbstractJobSpec) -> Option<Vec<String>> {
    if let Some(namespaces) = root.namespaces.as_ref().filter(|ns| !ns.is_empty()) {
        return Some(namespaces.clone());
    }
    root.properties
        .namespace
        .clone()
        .filter(|ns| !ns.is_empty())
        .map(|ns| vec![ns])
}

fn resolve(
    root: &AbstractJobSpec,
    leaf: &Leaf,
    namespace: &str,
    options: &ExpandOptions,
) -> Result<ResolvedJob> {
    let mut properties = match root.namespace_overrides.get(namespace) {
        Some(overrides) => merge_with(&leaf.properties, overrides, options.merge),
        None => leaf.properties.clone(),
    };
    properties.namespace = Some(namespace.to_string());

    let context = leaf.context(&properties);
    let job = ResolvedJob::from_properties(properties, namespace, context)?;
    log::trace!("Resolved `{}` in `{}` ({})", job.name, job.namespace, job.schedule);
    Ok(job)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(name: Option<&str>, schedule: Option<&str>) -> JobProperties {
        JobProperties {
            name: name.map(str::to_string),
            schedule: schedule.map(str::to_string),
            ..Default::default()
        }
    }

    fn base() -> AbstractJobSpec {
        AbstractJobSpec::from(JobProperties {
            name: Some("example".into()),
            image: Some("example.com/base".into()),
            namespace: Some("test".into()),
            ..Default::default()
        })
    }

    fn pairs(jobs: &[ResolvedJob]) -> Vec<(String, String)> {
        jobs.iter()
            .map(|j| (j.namespace.clone(), j.name.clone()))
            .collect()
    }

    #[test]
    fn test_single_namespace_without_jobs() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());

        let jobs = expand(&spec).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].namespace, "test");
        assert_eq!(jobs[0].schedule, Schedule::Once);
    }

    #[test]
    fn test_jobs_inherit_from_root() {
        let mut spec = base();
        spec.jobs = vec![props(None, Some("* * * * *")), props(None, Some("once"))];

        let jobs = expand(&spec).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "example");
        assert_eq!(jobs[0].schedule, Schedule::Cron("* * * * *".into()));
        assert_eq!(jobs[1].schedule, Schedule::Once);
        assert!(jobs.iter().all(|j| j.image == "example.com/base"));
    }

    #[test]
    fn test_namespace_major_order() {
        let mut spec = base();
        spec.properties.name = None;
        spec.properties.schedule = Some("once".into());
        spec.namespaces = Some(vec!["testa".into(), "testb".into()]);
        spec.jobs = vec![props(Some("joba"), None), props(Some("jobb"), None)];

        let jobs = expand(&spec).unwrap();
        assert_eq!(
            pairs(&jobs),
            vec![
                ("testa".to_string(), "joba".to_string()),
                ("testa".to_string(), "jobb".to_string()),
                ("testb".to_string(), "joba".to_string()),
                ("testb".to_string(), "jobb".to_string()),
            ]
        );
    }

    #[test]
    fn test_namespaces_preferred_over_namespace() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());
        spec.namespaces = Some(vec!["prod".into()]);

        let jobs = expand(&spec).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].namespace, "prod");
    }

    #[test]
    fn test_namespace_override_applies_to_its_namespace_only() {
        let mut spec = base();
        spec.properties.schedule = Some("* * * * *".into());
        spec.properties.namespace = None;
        spec.namespaces = Some(vec!["staging".into(), "prod".into()]);
        spec.namespace_overrides
            .insert("prod".into(), props(None, Some("once")));

        let jobs = expand(&spec).unwrap();
        assert_eq!(jobs[0].schedule, Schedule::Cron("* * * * *".into()));
        assert_eq!(jobs[1].schedule, Schedule::Once);
    }

    #[test]
    fn test_namespace_override_beats_job_entry() {
        let mut spec = base();
        spec.jobs = vec![JobProperties {
            schedule: Some("0 * * * *".into()),
            image: Some("example.com/job".into()),
            ..Default::default()
        }];
        spec.namespace_overrides.insert(
            "test".into(),
            JobProperties {
                image: Some("example.com/override".into()),
                ..Default::default()
            },
        );

        let jobs = expand(&spec).unwrap();
        assert_eq!(jobs[0].image, "example.com/override");
        assert_eq!(jobs[0].schedule, Schedule::Cron("0 * * * *".into()));
    }

    #[test]
    fn test_env_accumulates_down_the_chain() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());
        spec.properties.env = Some(vec![EnvVar::new("ROOT", "1")]);
        spec.jobs = vec![JobProperties {
            env: Some(vec![EnvVar::new("JOB", "2")]),
            ..Default::default()
        }];
        spec.namespace_overrides.insert(
            "test".into(),
            JobProperties {
                env: Some(vec![EnvVar::new("NS", "3")]),
                ..Default::default()
            },
        );

        let jobs = expand(&spec).unwrap();
        let names: Vec<&str> = jobs[0].env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ROOT", "JOB", "NS"]);
    }

    #[test]
    fn test_leaf_namespace_is_overwritten_by_target() {
        let mut spec = base();
        spec.jobs = vec![JobProperties {
            namespace: Some("elsewhere".into()),
            schedule: Some("once".into()),
            ..Default::default()
        }];

        let jobs = expand(&spec).unwrap();
        assert_eq!(jobs[0].namespace, "test");
    }

    #[test]
    fn test_leaf_namespaces_used_without_top_level_namespace() {
        let mut spec = base();
        spec.properties.namespace = None;
        spec.properties.schedule = Some("once".into());
        spec.jobs = vec![
            JobProperties {
                namespace: Some("a".into()),
                ..Default::default()
            },
            JobProperties {
                namespace: Some("b".into()),
                ..Default::default()
            },
        ];

        let jobs = expand(&spec).unwrap();
        let namespaces: Vec<&str> = jobs.iter().map(|j| j.namespace.as_str()).collect();
        assert_eq!(namespaces, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_namespace() {
        let mut spec = base();
        spec.properties.namespace = None;
        spec.properties.schedule = Some("once".into());

        let err = expand(&spec).unwrap_err();
        assert!(matches!(
            err,
            KronjobError::MissingNamespace { job } if job == JobContext::top_level(Some("example".into()))
        ));
    }

    #[test]
    fn test_empty_namespaces_list_falls_back_to_namespace() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());
        spec.namespaces = Some(Vec::new());

        let jobs = expand(&spec).unwrap();
        assert_eq!(jobs[0].namespace, "test");
    }

    #[test]
    fn test_empty_entry_in_namespaces_list_is_rejected() {
        let yaml = "name: a\nimage: b\nschedule: once\nnamespaces: [\"\", x]\n";
        let spec = AbstractJobSpec::from_yaml_str(yaml).unwrap();

        match expand(&spec).unwrap_err() {
            KronjobError::MissingNamespace { job } => {
                assert_eq!(job, JobContext::top_level(Some("a".into())));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_schedule_reports_context() {
        let mut spec = base();
        spec.jobs = vec![props(None, Some("once")), props(Some("broken"), None)];

        match expand(&spec).unwrap_err() {
            KronjobError::MissingRequiredField {
                field,
                namespace,
                job,
            } => {
                assert_eq!(field, "schedule");
                assert_eq!(namespace, "test");
                assert_eq!(job, JobContext::entry(1, Some("broken".into())));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_required_field_is_missing() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());
        spec.properties.image = Some(String::new());

        assert!(matches!(
            expand(&spec).unwrap_err(),
            KronjobError::MissingRequiredField { field: "image", .. }
        ));
    }

    #[test]
    fn test_name_too_long() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());
        spec.properties.name = Some("x".repeat(MAX_NAME_LENGTH + 1));
        assert!(matches!(
            expand(&spec).unwrap_err(),
            KronjobError::NameTooLong { max: MAX_NAME_LENGTH, .. }
        ));

        spec.properties.name = Some("x".repeat(MAX_NAME_LENGTH));
        assert!(expand(&spec).is_ok());
    }

    #[test]
    fn test_defaults_have_lowest_precedence() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());
        let options = ExpandOptions {
            defaults: Some(JobProperties {
                image: Some("example.com/default".into()),
                label_key: Some("team/job".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let jobs = expand_with(&spec, &options).unwrap();
        assert_eq!(jobs[0].image, "example.com/base");
        assert_eq!(jobs[0].label_key.as_deref(), Some("team/job"));
    }

    #[test]
    fn test_default_name_is_not_joined() {
        let mut spec = base();
        spec.properties.schedule = Some("once".into());
        spec.jobs = vec![props(Some("child"), None)];
        let options = ExpandOptions {
            defaults: Some(props(Some("fallback"), None)),
            merge: MergeOptions { join_names: true },
        };

        let jobs = expand_with(&spec, &options).unwrap();
        assert_eq!(jobs[0].name, "example-child");

        spec.jobs.clear();
        let jobs = expand_with(&spec, &options).unwrap();
        assert_eq!(jobs[0].name, "example");
    }

    #[test]
    fn test_default_name_fills_in_missing_name() {
        let mut spec = base();
        spec.properties.name = None;
        spec.properties.schedule = Some("once".into());
        let options = ExpandOptions {
            defaults: Some(props(Some("fallback"), None)),
            merge: MergeOptions { join_names: true },
        };

        let jobs = expand_with(&spec, &options).unwrap();
        assert_eq!(jobs[0].name, "fallback");
    }

    #[test]
    fn test_joined_names() {
        let mut spec = base();
        spec.properties.name = Some("parent".into());
        spec.properties.schedule = Some("once".into());
        spec.jobs = vec![props(Some("child"), None)];
        let options = ExpandOptions {
            merge: MergeOptions { join_names: true },
            ..Default::default()
        };

        let jobs = expand_with(&spec, &options).unwrap();
        assert_eq!(jobs[0].name, "parent-child");
    }

    #[test]
    fn test_root_is_not_modified() {
        let mut spec = base();
        spec.properties.env = Some(vec![EnvVar::new("A", "1")]);
        spec.jobs = vec![JobProperties {
            schedule: Some("once".into()),
            env: Some(vec![EnvVar::new("B", "2")]),
            ..Default::default()
        }];
        let snapshot = spec.clone();

        expand(&spec).unwrap();
        assert_eq!(spec, snapshot);
    }

    #[test]
    fn test_schedule_parse() {
        assert_eq!(Schedule::parse("once"), Schedule::Once);
        assert_eq!(
            Schedule::parse("*/5 * * * *").cron_expression(),
            Some("*/5 * * * *")
        );
        assert!(!Schedule::parse("Once").is_once());
    }
}
