//! MKS v1 REST API client.

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::cluster::{Cluster, ClusterControl, ClusterStatus};
use crate::error::MkuError;

const RU1_CLUSTER_V1_ENDPOINT: &str = "https://ru-1.mks.selcloud.ru/v1";
const RU2_CLUSTER_V1_ENDPOINT: &str = "https://ru-2.mks.selcloud.ru/v1";
const RU3_CLUSTER_V1_ENDPOINT: &str = "https://ru-3.mks.selcloud.ru/v1";
const RU7_CLUSTER_V1_ENDPOINT: &str = "https://ru-7.mks.selcloud.ru/v1";
const RU8_CLUSTER_V1_ENDPOINT: &str = "https://ru-8.mks.selcloud.ru/v1";

/// Resolve the MKS cluster v1 API endpoint for a region.
pub fn cluster_v1_endpoint(region: &str) -> Result<&'static str, MkuError> {
    match region {
        "ru-1" => Ok(RU1_CLUSTER_V1_ENDPOINT),
        "ru-2" => Ok(RU2_CLUSTER_V1_ENDPOINT),
        "ru-3" => Ok(RU3_CLUSTER_V1_ENDPOINT),
        "ru-7" => Ok(RU7_CLUSTER_V1_ENDPOINT),
        "ru-8" => Ok(RU8_CLUSTER_V1_ENDPOINT),
        _ => Err(MkuError::UnknownRegion(region.to_string())),
    }
}

/// Supported kube version entry from the catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct KubeVersion {
    pub version: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize)]
struct KubeVersionsRoot {
    kube_versions: Vec<KubeVersion>,
}

#[derive(Debug, Deserialize)]
struct ClusterRoot {
    cluster: Cluster,
}

/// Client for the MKS cluster v1 API.
#[derive(Clone)]
pub struct MksClient {
    http: reqwest::Client,
    endpoint: String,
    token: SecretString,
}

impl MksClient {
    /// Create a client for one of the known MKS regions.
    pub fn new(region: &str, token: SecretString) -> Result<Self, MkuError> {
        Ok(Self::with_endpoint(cluster_v1_endpoint(region)?, token))
    }

    /// Create a client against an explicit endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>, token: SecretString) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }

    /// The base endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// List all kube versions the platform currently supports.
    pub async fn list_kube_versions(&self) -> Result<Vec<KubeVersion>> {
        debug!("listing supported kube versions");

        let root: KubeVersionsRoot = self.get("/kubeversions").await?;
        Ok(root.kube_versions)
    }

    /// Fetch a single cluster by id.
    pub async fn get_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        debug!(cluster_id, "fetching cluster");

        let result: Result<ClusterRoot> = self.get(&format!("/clusters/{cluster_id}")).await;
        match result {
            Ok(root) => Ok(root.cluster),
            Err(err) => match err.downcast_ref::<MkuError>() {
                Some(MkuError::Api { status: 404, .. }) => {
                    Err(MkuError::ClusterNotFound(cluster_id.to_string()).into())
                }
                _ => Err(err),
            },
        }
    }

    /// Ask the platform to move the cluster to the latest patch version of
    /// its current minor. The upgrade itself runs asynchronously; the
    /// returned view usually already reports a pending status.
    pub async fn upgrade_patch_version(&self, cluster_id: &str) -> Result<Cluster> {
        debug!(cluster_id, "requesting patch version upgrade");

        let url = format!(
            "{}/clusters/{cluster_id}/upgrade-patch-version",
            self.endpoint
        );
        let response = self
            .http
            .post(&url)
            .header("X-Auth-Token", self.token.expose_secret())
            .send()
            .await?;

        let root: ClusterRoot = Self::parse(response).await?;
        Ok(root.cluster)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", self.token.expose_secret())
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MkuError::Api {
                status: status.as_u16(),
                message: extract_api_message(&body),
            }
            .into());
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl ClusterControl for MksClient {
    async fn supported_versions(&self) -> Result<Vec<String>> {
        let versions = self.list_kube_versions().await?;
        Ok(versions.into_iter().map(|v| v.version).collect())
    }

    async fn trigger_patch_upgrade(&self, cluster_id: &str) -> Result<()> {
        self.upgrade_patch_version(cluster_id).await.map(|_| ())
    }

    async fn refresh_cluster(&self, cluster_id: &str) -> Result<(Cluster, ClusterStatus)> {
        let cluster = self.get_cluster(cluster_id).await?;
        let status = cluster.status.clone();
        Ok((cluster, status))
    }
}

/// Pull the message out of an MKS error body.
///
/// Error responses carry `{"error": {"message": "..."}}`; anything else
/// falls back to the raw body so nothing is silently discarded.
fn extract_api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get("error"))
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
        .map_or_else(
            || {
                let raw = body.trim();
                if raw.is_empty() {
                    "MKS API request failed".to_string()
                } else {
                    raw.to_string()
                }
            },
            ToString::to_string,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_v1_endpoint_known_regions() {
        assert_eq!(
            cluster_v1_endpoint("ru-1").unwrap(),
            "https://ru-1.mks.selcloud.ru/v1"
        );
        assert_eq!(
            cluster_v1_endpoint("ru-2").unwrap(),
            "https://ru-2.mks.selcloud.ru/v1"
        );
        assert_eq!(
            cluster_v1_endpoint("ru-3").unwrap(),
            "https://ru-3.mks.selcloud.ru/v1"
        );
        assert_eq!(
            cluster_v1_endpoint("ru-7").unwrap(),
            "https://ru-7.mks.selcloud.ru/v1"
        );
        assert_eq!(
            cluster_v1_endpoint("ru-8").unwrap(),
            "https://ru-8.mks.selcloud.ru/v1"
        );
    }

    #[test]
    fn test_cluster_v1_endpoint_unknown_region() {
        let err = cluster_v1_endpoint("nl-1").unwrap_err();
        assert!(matches!(err, MkuError::UnknownRegion(region) if region == "nl-1"));
    }

    #[test]
    fn test_client_new_uses_region_endpoint() {
        let client = MksClient::new("ru-3", SecretString::from("token")).unwrap();
        assert_eq!(client.endpoint(), "https://ru-3.mks.selcloud.ru/v1");
    }

    #[test]
    fn test_client_new_unknown_region() {
        assert!(MksClient::new("mars-1", SecretString::from("token")).is_err());
    }

    #[test]
    fn test_kube_versions_payload_shape() {
        let json = r#"{
            "kube_versions": [
                {"version": "1.26.9", "is_default": false},
                {"version": "1.27.6", "is_default": true}
            ]
        }"#;
        let root: KubeVersionsRoot = serde_json::from_str(json).unwrap();
        assert_eq!(root.kube_versions.len(), 2);
        assert_eq!(root.kube_versions[1].version, "1.27.6");
        assert!(root.kube_versions[1].is_default);
    }

    #[test]
    fn test_cluster_payload_shape() {
        let json = r#"{
            "cluster": {
                "id": "c-1",
                "name": "prod",
                "status": "ACTIVE",
                "project_id": "p-1",
                "network_id": "n-1",
                "subnet_id": "s-1",
                "kube_version": "1.27.6",
                "region": "ru-1",
                "created_at": "2023-04-12T09:58:22Z"
            }
        }"#;
        let root: ClusterRoot = serde_json::from_str(json).unwrap();
        assert_eq!(root.cluster.status, ClusterStatus::Active);
        assert_eq!(root.cluster.kube_version, "1.27.6");
    }

    #[test]
    fn test_extract_api_message_documented_shape() {
        let body = r#"{"error": {"message": "cluster is not in ACTIVE status"}}"#;
        assert_eq!(
            extract_api_message(body),
            "cluster is not in ACTIVE status"
        );
    }

    #[test]
    fn test_extract_api_message_fallback_raw_body() {
        assert_eq!(extract_api_message("bad gateway"), "bad gateway");
    }

    #[test]
    fn test_extract_api_message_empty_body() {
        assert_eq!(extract_api_message(""), "MKS API request failed");
        assert_eq!(extract_api_message("  \n"), "MKS API request failed");
    }
}
