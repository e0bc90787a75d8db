use crate::error::{ProcessingError, Result};
use crate::processors::clusterer::ClusterTable;
use crate::processors::window_aggregator::AggregationSummary;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub total_stations: usize,
    pub total_clusters: usize,
    pub summed_cluster_size: u64,
    pub largest_cluster: u32,
    pub split_clusters: usize,
    pub violations: Vec<ClusterViolation>,
}

#[derive(Debug, Clone)]
pub struct ClusterViolation {
    pub cluster_id: u32,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationType {
    DuplicateCluster,
    ZeroSize,
    SizeMismatch,
    UnassignedCluster,
}

pub struct IntegrityChecker;

impl IntegrityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Check the invariants of a reconciled cluster table.
    pub fn check_clusters(&self, table: &ClusterTable) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_stations: table.station_count(),
            total_clusters: table.clusters.len(),
            summed_cluster_size: table.clusters.iter().map(|c| c.size as u64).sum(),
            largest_cluster: table.clusters.iter().map(|c| c.size).max().unwrap_or(0),
            split_clusters: 0,
            violations: Vec::new(),
        };

        let mut members: HashMap<u32, u32> = HashMap::new();
        let mut labels: HashMap<u32, Vec<(&str, &str)>> = HashMap::new();
        for a in &table.assignments {
            *members.entry(a.cluster_id).or_insert(0) += 1;
            let pair = (a.l1.as_str(), a.l2_label());
            let seen = labels.entry(a.cluster_id).or_default();
            if !seen.contains(&pair) {
                seen.push(pair);
            }
        }
        report.split_clusters = labels.values().filter(|pairs| pairs.len() > 1).count();

        let mut seen_ids: HashMap<u32, usize> = HashMap::new();
        for cluster in &table.clusters {
            *seen_ids.entry(cluster.cluster_id).or_insert(0) += 1;

            if cluster.size == 0 {
                report.violations.push(ClusterViolation {
                    cluster_id: cluster.cluster_id,
                    violation_type: ViolationType::ZeroSize,
                    details: "cluster has no stations".to_string(),
                });
            }

            let expected = members.get(&cluster.cluster_id).copied().unwrap_or(0);
            if expected != cluster.size {
                report.violations.push(ClusterViolation {
                    cluster_id: cluster.cluster_id,
                    violation_type: ViolationType::SizeMismatch,
                    details: format!(
                        "size {} but {} stations assigned",
                        cluster.size, expected
                    ),
                });
            }
        }

        for (cluster_id, count) in &seen_ids {
            if *count > 1 {
                report.violations.push(ClusterViolation {
                    cluster_id: *cluster_id,
                    violation_type: ViolationType::DuplicateCluster,
                    details: format!("{} rows for one cluster", count),
                });
            }
        }

        for cluster_id in members.keys() {
            if !seen_ids.contains_key(cluster_id) {
                report.violations.push(ClusterViolation {
                    cluster_id: *cluster_id,
                    violation_type: ViolationType::UnassignedCluster,
                    details: "stations assigned to a cluster missing from the table".to_string(),
                });
            }
        }

        report
            .violations
            .sort_by_key(|v| v.cluster_id);
        report
    }

    /// Fail on the first violation; a zero-size cluster reports as such.
    pub fn ensure_valid(&self, table: &ClusterTable) -> Result<IntegrityReport> {
        let report = self.check_clusters(table);

        if let Some(v) = report
            .violations
            .iter()
            .find(|v| v.violation_type == ViolationType::ZeroSize)
        {
            return Err(ProcessingError::ClusterSizeZero {
                cluster_id: v.cluster_id,
            });
        }
        if let Some(v) = report.violations.first() {
            return Err(ProcessingError::ClusterIntegrity(format!(
                "cluster {}: {}",
                v.cluster_id, v.details
            )));
        }

        Ok(report)
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Cluster Integrity Report ===\n");
        summary.push_str(&format!("Stations: {}\n", report.total_stations));
        summary.push_str(&format!("Clusters: {}\n", report.total_clusters));
        summary.push_str(&format!(
            "Summed cluster size: {}\n",
            report.summed_cluster_size
        ));
        summary.push_str(&format!("Largest cluster: {}\n", report.largest_cluster));
        summary.push_str(&format!(
            "Clusters re-merged across L1/L2: {}\n",
            report.split_clusters
        ));
        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));

        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Cluster {}: {}\n",
                    i + 1,
                    violation.cluster_id,
                    violation.details
                ));
            }
        }

        summary
    }

    /// Summary of one aggregation run
    pub fn aggregation_summary(&self, label: &str, summary: &AggregationSummary) -> String {
        format!(
            "{}: {} windows, {} rows, {} checkpoints, weather carried forward {} times, {} events at unknown stations",
            label,
            summary.steps,
            summary.rows,
            summary.checkpoints,
            summary.weather_carried_forward,
            summary.unmapped_events
        )
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cluster, Station, StationAssignment};
    use crate::processors::clusterer::StationClusterer;

    #[test]
    fn test_clustered_stations_pass() {
        let stations = vec![
            Station::new(1, 38.80, -77.10),
            Station::new(2, 38.95, -76.95),
            Station::new(3, 38.95, -76.95),
        ];
        let table = StationClusterer::new().build(&stations).unwrap();
        let checker = IntegrityChecker::new();

        let report = checker.ensure_valid(&table).unwrap();
        assert_eq!(report.summed_cluster_size, 3);
        assert_eq!(report.largest_cluster, 2);
        assert!(checker.generate_summary(&report).contains("Violations: 0"));
    }

    #[test]
    fn test_zero_size_cluster_is_reported() {
        let assignments = vec![StationAssignment {
            station_id: 1,
            cluster_id: 0,
            l1: "0".to_string(),
            l2: None,
        }];
        let table = ClusterTable::new(
            assignments,
            vec![Cluster::new(0, 1, "0", "0"), Cluster::new(1, 0, "0", "0")],
        );

        let checker = IntegrityChecker::new();
        let report = checker.check_clusters(&table);
        assert_eq!(report.violations.len(), 1);
        assert!(matches!(
            checker.ensure_valid(&table),
            Err(ProcessingError::ClusterSizeZero { cluster_id: 1 })
        ));
    }

    #[test]
    fn test_duplicate_rows_are_reported() {
        let assignments = vec![StationAssignment {
            station_id: 1,
            cluster_id: 0,
            l1: "0".to_string(),
            l2: None,
        }];
        let table = ClusterTable::new(
            assignments,
            vec![Cluster::new(0, 1, "0", "0"), Cluster::new(0, 1, "101", "0")],
        );

        let checker = IntegrityChecker::new();
        let report = checker.check_clusters(&table);
        assert!(report
            .violations
            .iter()
            .any(|v| v.violation_type == ViolationType::DuplicateCluster));

        let err = checker.ensure_valid(&table).unwrap_err();
        assert!(matches!(err, ProcessingError::ClusterIntegrity(_)));
        assert!(err.to_string().starts_with("Cluster integrity error: cluster 0"));
    }
}
