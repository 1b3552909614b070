//! Property merging along the inheritance chain.
//!
//! `merge(parent, child)` is pure: both operands are borrowed and a fresh
//! [`JobProperties`] is returned, so one parent can serve as the base for any
//! number of children.

use super::JobProperties;

/// Fields merged by concatenation (parent entries first) instead of replacement.
pub const ADDITIVE_FIELDS: &[&str] = &["env"];

/// Knobs for [`merge_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Join parent and child names with `-` instead of letting the child replace.
    pub join_names: bool,
}

/// Merge `child` on top of `parent` with the default rules.
pub fn merge(parent: &JobProperties, child: &JobProperties) -> JobProperties {
    merge_with(parent, child, MergeOptions::default())
}

/// Merge `child` on top of `parent`.
///
/// Fields set in `child` win; fields absent in `child` are inherited. Fields listed
/// in [`ADDITIVE_FIELDS`] are concatenated without de-duplication.
pub fn merge_with(
    parent: &JobProperties,
    child: &JobProperties,
    options: MergeOptions,
) -> JobProperties {
    let name = if options.join_names {
        join_names(parent.name.as_deref(), child.name.as_deref())
    } else {
        replace(&parent.name, &child.name)
    };

    JobProperties {
        name,
        image: replace(&parent.image, &child.image),
        namespace: replace(&parent.namespace, &child.namespace),
        schedule: replace(&parent.schedule, &child.schedule),

        env: concat(&parent.env, &child.env),
        command: replace(&parent.command, &child.command),
        args: replace(&parent.args, &child.args),
        container_name: replace(&parent.container_name, &child.container_name),
        image_pull_policy: replace(&parent.image_pull_policy, &child.image_pull_policy),
        cpu_limit: replace(&parent.cpu_limit, &child.cpu_limit),
        cpu_request: replace(&parent.cpu_request, &child.cpu_request),
        memory_limit: replace(&parent.memory_limit, &child.memory_limit),
        memory_request: replace(&parent.memory_request, &child.memory_request),
        volume_mounts: replace(&parent.volume_mounts, &child.volume_mounts),

        restart_policy: replace(&parent.restart_policy, &child.restart_policy),
        node_selector: replace(&parent.node_selector, &child.node_selector),
        volumes: replace(&parent.volumes, &child.volumes),

        label_key: replace(&parent.label_key, &child.label_key),
        labels: replace(&parent.labels, &child.labels),
        annotations: replace(&parent.annotations, &child.annotations),

        concurrency_policy: replace(&parent.concurrency_policy, &child.concurrency_policy),
        failed_jobs_history_limit: replace(
            &parent.failed_jobs_history_limit,
            &child.failed_jobs_history_limit,
        ),
        successful_jobs_history_limit: replace(
            &parent.successful_jobs_history_limit,
            &child.successful_jobs_history_limit,
        ),
        suspend: replace(&parent.suspend, &child.suspend),
        starting_deadline_seconds: replace(
            &parent.starting_deadline_seconds,
            &child.starting_deadline_seconds,
        ),
        backoff_limit: replace(&parent.backoff_limit, &child.backoff_limit),
    }
}

fn replace<T: Clone>(parent: &Option<T>, child: &Option<T>) -> Option<T> {
    child.as_ref().or(parent.as_ref()).cloned()
}

fn concat<T: Clone>(parent: &Option<Vec<T>>, child: &Option<Vec<T>>) -> Option<Vec<T>> {
    match (parent, child) {
        (None, None) => None,
        (Some(p), None) => Some(p.clone()),
        (None, Some(c)) => Some(c.clone()),
        (Some(p), Some(c)) => Some(p.iter().chain(c.iter()).cloned().collect()),
    }
}

fn join_names(parent: Option<&str>, child: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [parent, child]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        // Keep an explicit empty name so the required-field check can report it
        parent.or(child).map(str::to_string)
    } else {
        Some(parts.join("-"))
    }
}
