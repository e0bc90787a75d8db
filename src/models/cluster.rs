use crate::utils::constants::L2_UNDEFINED;
use serde::{Deserialize, Serialize};

/// Cluster and location labels assigned to one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationAssignment {
    pub station_id: u32,
    pub cluster_id: u32,
    #[serde(rename = "L1")]
    pub l1: String,
    #[serde(rename = "L2")]
    pub l2: Option<String>,
}

impl StationAssignment {
    /// L2 as written to tables, with the placeholder for undefined labels.
    pub fn l2_label(&self) -> &str {
        self.l2.as_deref().unwrap_or(L2_UNDEFINED)
    }
}

/// One row of the cluster table. After reconciliation there is exactly one
/// row per `cluster_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: u32,
    #[serde(rename = "cluster_size")]
    pub size: u32,
    #[serde(rename = "L1")]
    pub l1: String,
    #[serde(rename = "L2")]
    pub l2: String,
}

impl Cluster {
    pub fn new(cluster_id: u32, size: u32, l1: impl Into<String>, l2: impl Into<String>) -> Self {
        Self {
            cluster_id,
            size,
            l1: l1.into(),
            l2: l2.into(),
        }
    }
}
