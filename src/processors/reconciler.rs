use crate::models::{Cluster, StationAssignment};
use std::collections::BTreeMap;
use tracing::debug;

/// Count stations per `(cluster_id, L1, L2)` group, in ascending key order.
pub fn group_sizes(assignments: &[StationAssignment]) -> Vec<Cluster> {
    let mut groups: BTreeMap<(u32, String, String), u32> = BTreeMap::new();
    for a in assignments {
        *groups
            .entry((a.cluster_id, a.l1.clone(), a.l2_label().to_string()))
            .or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|((cluster_id, l1, l2), size)| Cluster::new(cluster_id, size, l1, l2))
        .collect()
}

/// Collapse clusters whose stations fall into several `(L1, L2)` areas to a
/// single row carrying the total size and the label of the largest group.
/// Among equally large groups the first one in input order wins.
///
/// Output has one row per `cluster_id`, ordered by id.
pub fn reconcile(groups: &[Cluster]) -> Vec<Cluster> {
    let mut by_cluster: BTreeMap<u32, Vec<&Cluster>> = BTreeMap::new();
    for group in groups {
        by_cluster.entry(group.cluster_id).or_default().push(group);
    }

    by_cluster
        .into_iter()
        .map(|(cluster_id, rows)| {
            if rows.len() == 1 {
                return rows[0].clone();
            }

            let total: u32 = rows.iter().map(|r| r.size).sum();
            let mut majority = rows[0];
            for row in &rows[1..] {
                if row.size > majority.size {
                    majority = row;
                }
            }
            debug!(
                cluster_id,
                groups = rows.len(),
                l1 = %majority.l1,
                l2 = %majority.l2,
                "Re-merged split cluster"
            );

            Cluster::new(cluster_id, total, majority.l1.clone(), majority.l2.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assignment(station_id: u32, cluster_id: u32, l1: &str, l2: Option<&str>) -> StationAssignment {
        StationAssignment {
            station_id,
            cluster_id,
            l1: l1.to_string(),
            l2: l2.map(str::to_string),
        }
    }

    #[test]
    fn test_group_sizes_fill_undefined_l2() {
        let groups = group_sizes(&[
            assignment(1, 0, "101", Some("101_0")),
            assignment(2, 0, "101", Some("101_0")),
            assignment(3, 1, "303", None),
        ]);
        assert_eq!(
            groups,
            vec![
                Cluster::new(0, 2, "101", "101_0"),
                Cluster::new(1, 1, "303", "0"),
            ]
        );
    }

    #[test]
    fn test_split_cluster_takes_majority_label() {
        let groups = vec![
            Cluster::new(0, 1, "101", "101_0"),
            Cluster::new(0, 3, "102", "102_1"),
            Cluster::new(1, 2, "2", "2_100"),
        ];
        assert_eq!(
            reconcile(&groups),
            vec![
                Cluster::new(0, 4, "102", "102_1"),
                Cluster::new(1, 2, "2", "2_100"),
            ]
        );
    }

    #[test]
    fn test_tie_takes_first_group() {
        let groups = vec![
            Cluster::new(5, 2, "101", "101_0"),
            Cluster::new(5, 2, "102", "102_3"),
        ];
        assert_eq!(reconcile(&groups), vec![Cluster::new(5, 4, "101", "101_0")]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let groups = vec![
            Cluster::new(0, 1, "101", "101_0"),
            Cluster::new(0, 3, "102", "102_1"),
            Cluster::new(1, 2, "2", "2_100"),
            Cluster::new(2, 1, "0", "0"),
        ];
        let once = reconcile(&groups);
        let twice = reconcile(&once);
        assert_eq!(once, twice);

        let total: u32 = once.iter().map(|c| c.size).sum();
        assert_eq!(total, 7);
    }
}
