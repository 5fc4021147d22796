// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Pod Cleanup
//!
//! Removes terminated pods from a namespace. A pod is deleted when:
//!
//! - its phase is `Succeeded`, or
//! - its phase is `Failed` and its restart policy is `Never`, or
//! - its status reason is `Evicted`
//!
//! Comparisons ignore case. A failed deletion is logged and the batch moves
//! on to the next pod; nothing is retried within a run.

use std::path::PathBuf;

pub mod kube;

pub use kube::KubeClient;

const PHASE_SUCCEEDED: &str = "succeeded";
const PHASE_FAILED: &str = "failed";
const REASON_EVICTED: &str = "evicted";
const RESTART_POLICY_NEVER: &str = "never";

/// The fields of a pod the cleanup policy looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodSummary {
    pub name: String,
    pub phase: String,
    /// Empty when the pod has no status reason.
    pub reason: String,
    pub restart_policy: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("not running in a cluster: {0} is not set")]
    NotInCluster(&'static str),

    #[error("failed to read service account file {path}: {source}")]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build cluster client: {0}")]
    Client(String),

    #[error("cluster request failed: {0}")]
    Request(String),

    #[error("cluster API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("cluster response was invalid: {0}")]
    InvalidResponse(String),
}

/// Operations the cleanup needs from the cluster.
#[allow(async_fn_in_trait)]
pub trait PodApi {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, ClusterError>;

    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError>;
}

/// Counts from one cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub inspected: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Whether the cleanup policy selects `pod` for deletion.
pub fn should_delete(pod: &PodSummary) -> bool {
    let phase = pod.phase.to_ascii_lowercase();
    let reason = pod.reason.to_ascii_lowercase();
    let restart_policy = pod.restart_policy.to_ascii_lowercase();

    phase == PHASE_SUCCEEDED
        || (phase == PHASE_FAILED && restart_policy == RESTART_POLICY_NEVER)
        || reason == REASON_EVICTED
}

/// List the pods in `namespace` and delete the ones [`should_delete`] selects.
///
/// Only a failure to list is returned as an error.
pub async fn cleanup<A: PodApi>(api: &A, namespace: &str) -> Result<CleanupReport, ClusterError> {
    tracing::info!(namespace = %namespace, "Listing pods");
    let pods = api.list_pods(namespace).await?;

    let mut report = CleanupReport::default();
    for pod in &pods {
        report.inspected += 1;
        tracing::info!(pod = %pod.name, "Inspecting pod");

        if !should_delete(pod) {
            tracing::info!(pod = %pod.name, "No action taken on pod");
            continue;
        }

        tracing::warn!(
            pod = %pod.name,
            namespace = %namespace,
            phase = %pod.phase,
            reason = %pod.reason,
            restart_policy = %pod.restart_policy,
            "Deleting pod"
        );
        match api.delete_pod(&pod.name, namespace).await {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                tracing::error!(pod = %pod.name, error = %e, "Can't remove pod");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
