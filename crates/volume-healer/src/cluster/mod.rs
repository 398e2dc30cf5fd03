//! Cluster API access.
//!
//! [`ClusterApi`] is the seam between the remediation logic and the
//! control plane: exactly the reads, updates, and deletes the operators
//! need, implemented by [`KubeCluster`] over typed `kube::Api` handles
//! and by an in-memory fake in tests. Updates go through `replace`, so
//! the API server's optimistic-concurrency check applies; a version
//! conflict surfaces as [`Error::Conflict`] for the retry loops to
//! recognize.

pub mod bounce;
pub mod owner;
pub mod restart;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Pod};
use kube::api::{Api, DeleteParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::stats::Summary;

/// Control-plane operations used by the remediation pass.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch the node's volume stats summary.
    async fn node_stats(&self) -> Result<Summary>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod>;
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()>;

    async fn get_pvc(&self, namespace: &str, name: &str) -> Result<PersistentVolumeClaim>;
    async fn get_pv(&self, name: &str) -> Result<PersistentVolume>;

    async fn get_replicaset(&self, namespace: &str, name: &str) -> Result<ReplicaSet>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment>;
    /// Replace the deployment; fails with [`Error::Conflict`] when the
    /// stored resource version moved underneath the caller.
    async fn update_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<()>;

    async fn get_statefulset(&self, namespace: &str, name: &str) -> Result<StatefulSet>;
    /// Replace the stateful set; conflict semantics as for deployments.
    async fn update_statefulset(&self, namespace: &str, statefulset: &StatefulSet) -> Result<()>;
}

/// [`ClusterApi`] backed by a real `kube::Client`.
pub struct KubeCluster {
    client: kube::Client,
    node_name: String,
}

impl KubeCluster {
    /// Build a client from the configured kubeconfig path, falling back
    /// to in-cluster credentials when no path is given.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client_config = match &config.kubeconfig {
            Some(path) => {
                debug!(path = %path.display(), "loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| Error::Config(format!("failed to read kubeconfig: {e}")))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| Error::Config(format!("invalid kubeconfig: {e}")))?
            }
            None => kube::Config::incluster()
                .map_err(|e| Error::Config(format!("no in-cluster configuration: {e}")))?,
        };

        Ok(Self {
            client: kube::Client::try_from(client_config)?,
            node_name: config.node_name.clone(),
        })
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn update_error(resource: String, err: kube::Error) -> Error {
        match err {
            kube::Error::Api(ref response) if response.code == 409 => {
                Error::Conflict { resource }
            }
            other => Error::ClusterApi(other),
        }
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn node_stats(&self) -> Result<Summary> {
        let path = format!("/api/v1/nodes/{}/proxy/stats/summary", self.node_name);
        let request = http::Request::get(path)
            .body(Vec::new())
            .map_err(kube::Error::HttpError)?;
        let body = self.client.request_text(request).await?;
        serde_json::from_str(&body).map_err(Error::StatsDecode)
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        Ok(self.pods(namespace).get(name).await?)
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        self.pods(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn get_pvc(&self, namespace: &str, name: &str) -> Result<PersistentVolumeClaim> {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn get_pv(&self, name: &str) -> Result<PersistentVolume> {
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        Ok(api.get(name).await?)
    }

    async fn get_replicaset(&self, namespace: &str, name: &str) -> Result<ReplicaSet> {
        let api: Api<ReplicaSet> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn update_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<()> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        api.replace(&name, &PostParams::default(), deployment)
            .await
            .map(|_| ())
            .map_err(|e| Self::update_error(format!("Deployment {namespace}/{name}"), e))
    }

    async fn get_statefulset(&self, namespace: &str, name: &str) -> Result<StatefulSet> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn update_statefulset(&self, namespace: &str, statefulset: &StatefulSet) -> Result<()> {
        let name = statefulset.metadata.name.clone().unwrap_or_default();
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        api.replace(&name, &PostParams::default(), statefulset)
            .await
            .map(|_| ())
            .map_err(|e| Self::update_error(format!("StatefulSet {namespace}/{name}"), e))
    }
}
