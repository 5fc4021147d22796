// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-cluster client for the Kubernetes core API.
//!
//! Authenticates with the pod's service account token and trusts the
//! cluster CA mounted next to it.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{Certificate, Client};
use serde::Deserialize;
use serde_json::json;

use super::{ClusterError, PodApi, PodSummary};

/// Where the service account credentials are mounted.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";
const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

#[derive(Debug, Clone)]
pub struct KubeClient {
    base_url: String,
    token: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    spec: PodSpec,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    restart_policy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl From<Pod> for PodSummary {
    fn from(pod: Pod) -> Self {
        Self {
            name: pod.metadata.name,
            phase: pod.status.phase.unwrap_or_default(),
            reason: pod.status.reason.unwrap_or_default(),
            restart_policy: pod.spec.restart_policy.unwrap_or_default(),
        }
    }
}

impl KubeClient {
    /// Client for the API server this pod runs under.
    pub fn in_cluster() -> Result<Self, ClusterError> {
        Self::in_cluster_with(|name| std::env::var(name).ok(), Path::new(SERVICE_ACCOUNT_DIR))
    }

    /// Same as [`in_cluster`](Self::in_cluster) with the environment and
    /// credential directory supplied by the caller.
    pub fn in_cluster_with<F>(lookup: F, account_dir: &Path) -> Result<Self, ClusterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(SERVICE_HOST_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ClusterError::NotInCluster(SERVICE_HOST_ENV))?;
        let port = lookup(SERVICE_PORT_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(ClusterError::NotInCluster(SERVICE_PORT_ENV))?;

        let token = read_credential(&account_dir.join("token"))?;
        let ca = read_credential(&account_dir.join("ca.crt"))?;
        let ca = Certificate::from_pem(ca.as_bytes())
            .map_err(|e| ClusterError::Client(format!("invalid cluster CA: {e}")))?;

        let http = Client::builder()
            .add_root_certificate(ca)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ClusterError::Client(format!("failed to build HTTP client: {e}")))?;

        let host = if host.contains(':') {
            format!("[{host}]")
        } else {
            host
        };

        tracing::info!(host = %host, port = %port, "Loaded in-cluster configuration");
        Ok(Self::new(format!("https://{host}:{port}"), token.trim(), http))
    }

    pub fn new(base_url: impl Into<String>, token: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http,
        }
    }

    fn pods_url(&self, namespace: &str) -> String {
        format!(
            "{}/api/v1/namespaces/{namespace}/pods",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl PodApi for KubeClient {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodSummary>, ClusterError> {
        let url = self.pods_url(namespace);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ClusterError::Request(format!("GET {url} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClusterError::Api { status, body });
        }

        let list: PodList = response
            .json()
            .await
            .map_err(|e| ClusterError::InvalidResponse(format!("GET {url} invalid JSON: {e}")))?;
        Ok(list.items.into_iter().map(PodSummary::from).collect())
    }

    async fn delete_pod(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        let url = format!("{}/{name}", self.pods_url(namespace));
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "kind": "DeleteOptions", "apiVersion": "v1" }))
            .send()
            .await
            .map_err(|e| ClusterError::Request(format!("DELETE {url} failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ClusterError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(pod = %name, response = %body, "Pod deleted");
        Ok(())
    }
}

fn read_credential(path: &Path) -> Result<String, ClusterError> {
    fs::read_to_string(path).map_err(|source| ClusterError::Credentials {
        path: PathBuf::from(path),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn pod_list_maps_to_summaries() {
        let raw = r#"{
            "kind": "PodList",
            "items": [
                {
                    "metadata": {"name": "job-1", "namespace": "default"},
                    "spec": {"restartPolicy": "Never", "containers": []},
                    "status": {"phase": "Failed", "reason": "Evicted"}
                },
                {
                    "metadata": {"name": "web-1"},
                    "spec": {"restartPolicy": "Always"},
                    "status": {"phase": "Running"}
                }
            ]
        }"#;

        let list: PodList = serde_json::from_str(raw).unwrap();
        let pods: Vec<PodSummary> = list.items.into_iter().map(PodSummary::from).collect();

        assert_eq!(
            pods[0],
            PodSummary {
                name: "job-1".to_string(),
                phase: "Failed".to_string(),
                reason: "Evicted".to_string(),
                restart_policy: "Never".to_string(),
            }
        );
        assert_eq!(pods[1].reason, "");
        assert_eq!(pods[1].restart_policy, "Always");
    }

    #[test]
    fn pods_url_is_namespaced() {
        let client = KubeClient::new("https://10.0.0.1:443/", "token", Client::new());
        assert_eq!(
            client.pods_url("awesome-namespace"),
            "https://10.0.0.1:443/api/v1/namespaces/awesome-namespace/pods"
        );
    }

    #[test]
    fn outside_cluster_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = KubeClient::in_cluster_with(env(&[]), dir.path()).unwrap_err();
        assert!(matches!(err, ClusterError::NotInCluster(SERVICE_HOST_ENV)));

        let err = KubeClient::in_cluster_with(env(&[(SERVICE_HOST_ENV, "10.0.0.1")]), dir.path())
            .unwrap_err();
        assert!(matches!(err, ClusterError::NotInCluster(SERVICE_PORT_ENV)));
    }

    #[test]
    fn missing_token_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = KubeClient::in_cluster_with(
            env(&[(SERVICE_HOST_ENV, "10.0.0.1"), (SERVICE_PORT_ENV, "443")]),
            dir.path(),
        )
        .unwrap_err();

        match err {
            ClusterError::Credentials { path, .. } => assert!(path.ends_with("token")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
