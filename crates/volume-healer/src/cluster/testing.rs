//! In-memory [`ClusterApi`] fake shared by the unit and scenario tests.
//!
//! Mutation behavior is scriptable: a number of leading updates can be
//! made to fail with version conflicts, updates to a specific replica
//! count can be made to always conflict, and status convergence can be
//! frozen to simulate a workload that never quiesces.

#![allow(dead_code)] // Test support - not every helper is used by every test build

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use kube::core::ErrorResponse;

use super::ClusterApi;
use crate::error::{Error, Result};
use crate::stats::Summary;

pub fn owner_ref(kind: &str, name: &str) -> OwnerReference {
    OwnerReference {
        api_version: "apps/v1".to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        uid: format!("{kind}-{name}-uid"),
        ..OwnerReference::default()
    }
}

pub fn pod(namespace: &str, name: &str, owners: Vec<OwnerReference>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            owner_references: if owners.is_empty() {
                None
            } else {
                Some(owners)
            },
            ..ObjectMeta::default()
        },
        ..Pod::default()
    }
}

pub fn deployment(namespace: &str, name: &str, replicas: i32) -> Deployment {
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            ..DeploymentSpec::default()
        }),
        status: Some(DeploymentStatus {
            replicas: Some(replicas),
            ..DeploymentStatus::default()
        }),
    }
}

pub fn statefulset(namespace: &str, name: &str, replicas: i32) -> StatefulSet {
    use k8s_openapi::api::apps::v1::{StatefulSetSpec, StatefulSetStatus};
    StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(replicas),
            ..StatefulSetSpec::default()
        }),
        status: Some(StatefulSetStatus {
            replicas,
            ..StatefulSetStatus::default()
        }),
    }
}

fn not_found(what: String) -> Error {
    Error::ClusterApi(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{what} not found"),
        reason: "NotFound".to_string(),
        code: 404,
    }))
}

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

#[derive(Default)]
struct State {
    pods: HashMap<(String, String), Pod>,
    pvcs: HashMap<(String, String), PersistentVolumeClaim>,
    pvs: HashMap<String, PersistentVolume>,
    replicasets: HashMap<(String, String), ReplicaSet>,
    deployments: HashMap<(String, String), Deployment>,
    statefulsets: HashMap<(String, String), StatefulSet>,
    deleted_pods: Vec<(String, String)>,
    deployment_updates: Vec<i32>,
    statefulset_updates: Vec<i32>,
    conflicts_remaining: u32,
    always_conflict_on: Option<i32>,
    freeze_status: bool,
    summary: Summary,
}

#[derive(Default)]
pub struct FakeCluster {
    state: Mutex<State>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_pod(&self, pod: Pod) {
        let mut state = self.state.lock().unwrap();
        let ns = pod.metadata.namespace.clone().unwrap_or_default();
        let name = pod.metadata.name.clone().unwrap_or_default();
        state.pods.insert((ns, name), pod);
    }

    pub fn put_pvc(&self, pvc: PersistentVolumeClaim) {
        let mut state = self.state.lock().unwrap();
        let ns = pvc.metadata.namespace.clone().unwrap_or_default();
        let name = pvc.metadata.name.clone().unwrap_or_default();
        state.pvcs.insert((ns, name), pvc);
    }

    pub fn put_pv(&self, pv: PersistentVolume) {
        let mut state = self.state.lock().unwrap();
        let name = pv.metadata.name.clone().unwrap_or_default();
        state.pvs.insert(name, pv);
    }

    pub fn put_replicaset(&self, rs: ReplicaSet) {
        let mut state = self.state.lock().unwrap();
        let ns = rs.metadata.namespace.clone().unwrap_or_default();
        let name = rs.metadata.name.clone().unwrap_or_default();
        state.replicasets.insert((ns, name), rs);
    }

    pub fn put_deployment(&self, deployment: Deployment) {
        let mut state = self.state.lock().unwrap();
        let ns = deployment.metadata.namespace.clone().unwrap_or_default();
        let name = deployment.metadata.name.clone().unwrap_or_default();
        state.deployments.insert((ns, name), deployment);
    }

    pub fn put_statefulset(&self, statefulset: StatefulSet) {
        let mut state = self.state.lock().unwrap();
        let ns = statefulset.metadata.namespace.clone().unwrap_or_default();
        let name = statefulset.metadata.name.clone().unwrap_or_default();
        state.statefulsets.insert((ns, name), statefulset);
    }

    pub fn set_summary(&self, summary: Summary) {
        self.state.lock().unwrap().summary = summary;
    }

    /// Make the next `n` updates fail with a version conflict.
    pub fn set_conflicts(&self, n: u32) {
        self.state.lock().unwrap().conflicts_remaining = n;
    }

    /// Make every update that sets this replica count conflict forever.
    pub fn always_conflict_on(&self, replicas: i32) {
        self.state.lock().unwrap().always_conflict_on = Some(replicas);
    }

    /// Stop observed replica counts from following desired counts.
    pub fn freeze_status(&self) {
        self.state.lock().unwrap().freeze_status = true;
    }

    pub fn deleted_pods(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().deleted_pods.clone()
    }

    /// Desired replica counts of the accepted deployment updates, in order.
    pub fn deployment_updates(&self) -> Vec<i32> {
        self.state.lock().unwrap().deployment_updates.clone()
    }

    pub fn statefulset_updates(&self) -> Vec<i32> {
        self.state.lock().unwrap().statefulset_updates.clone()
    }

    pub fn deployment_replicas(&self, namespace: &str, name: &str) -> Option<i32> {
        let state = self.state.lock().unwrap();
        state
            .deployments
            .get(&key(namespace, name))?
            .spec
            .as_ref()?
            .replicas
    }

    fn check_update(state: &mut State, resource: &str, desired: i32) -> Result<()> {
        if state.conflicts_remaining > 0 {
            state.conflicts_remaining -= 1;
            return Err(Error::Conflict {
                resource: resource.to_string(),
            });
        }
        if state.always_conflict_on == Some(desired) {
            return Err(Error::Conflict {
                resource: resource.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn node_stats(&self) -> Result<Summary> {
        Ok(self.state.lock().unwrap().summary.clone())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        self.state
            .lock()
            .unwrap()
            .pods
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found(format!("pod {namespace}/{name}")))
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let k = key(namespace, name);
        if state.pods.remove(&k).is_none() {
            return Err(not_found(format!("pod {namespace}/{name}")));
        }
        state.deleted_pods.push(k);
        Ok(())
    }

    async fn get_pvc(&self, namespace: &str, name: &str) -> Result<PersistentVolumeClaim> {
        self.state
            .lock()
            .unwrap()
            .pvcs
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found(format!("pvc {namespace}/{name}")))
    }

    async fn get_pv(&self, name: &str) -> Result<PersistentVolume> {
        self.state
            .lock()
            .unwrap()
            .pvs
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(format!("pv {name}")))
    }

    async fn get_replicaset(&self, namespace: &str, name: &str) -> Result<ReplicaSet> {
        self.state
            .lock()
            .unwrap()
            .replicasets
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found(format!("replicaset {namespace}/{name}")))
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment> {
        self.state
            .lock()
            .unwrap()
            .deployments
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found(format!("deployment {namespace}/{name}")))
    }

    async fn update_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<()> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        let desired = deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1);

        let mut state = self.state.lock().unwrap();
        Self::check_update(&mut state, &format!("Deployment {namespace}/{name}"), desired)?;

        let mut stored = deployment.clone();
        if !state.freeze_status {
            stored.status.get_or_insert_with(Default::default).replicas = Some(desired);
        } else if let Some(previous) = state.deployments.get(&key(namespace, &name)) {
            stored.status = previous.status.clone();
        }
        state.deployment_updates.push(desired);
        state.deployments.insert(key(namespace, &name), stored);
        Ok(())
    }

    async fn get_statefulset(&self, namespace: &str, name: &str) -> Result<StatefulSet> {
        self.state
            .lock()
            .unwrap()
            .statefulsets
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| not_found(format!("statefulset {namespace}/{name}")))
    }

    async fn update_statefulset(&self, namespace: &str, statefulset: &StatefulSet) -> Result<()> {
        let name = statefulset.metadata.name.clone().unwrap_or_default();
        let desired = statefulset
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1);

        let mut state = self.state.lock().unwrap();
        Self::check_update(
            &mut state,
            &format!("StatefulSet {namespace}/{name}"),
            desired,
        )?;

        let mut stored = statefulset.clone();
        if !state.freeze_status {
            stored.status.get_or_insert_with(Default::default).replicas = desired;
        } else if let Some(previous) = state.statefulsets.get(&key(namespace, &name)) {
            stored.status = previous.status.clone();
        }
        state.statefulset_updates.push(desired);
        state.statefulsets.insert(key(namespace, &name), stored);
        Ok(())
    }
}
