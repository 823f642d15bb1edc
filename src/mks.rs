//! Selectel MKS v1 API surface.

pub mod client;
pub mod cluster;

pub use client::{KubeVersion, MksClient, cluster_v1_endpoint};
pub use cluster::{Cluster, ClusterControl, ClusterStatus};
