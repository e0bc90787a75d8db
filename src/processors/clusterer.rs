use crate::error::{ProcessingError, Result};
use crate::models::{Cluster, Station, StationAssignment};
use crate::processors::reconciler::{group_sizes, reconcile};
use crate::utils::constants::{DEFAULT_GRID_SIZE, DENSE_L1_LABELS, LOCATION_GRID_SIZE};
use std::collections::HashMap;
use tracing::{debug, info};

/// `n + 1` evenly spaced thresholds from `min` to `max`, both inclusive.
pub fn linear_thresholds(min: f64, max: f64, n: usize) -> Vec<f64> {
    let step = (max - min) / n as f64;
    (0..=n)
        .map(|i| if i == n { max } else { min + step * i as f64 })
        .collect()
}

/// Highest threshold index the value strictly exceeds, 0 if none.
///
/// The first threshold is the range minimum and never promotes a value.
pub fn grid_bin(value: f64, thresholds: &[f64]) -> u32 {
    let mut bin = 0;
    for (i, threshold) in thresholds.iter().enumerate().skip(1) {
        if value > *threshold {
            bin = i as u32;
        }
    }
    bin
}

/// A G×G grid laid over the bounding box of a set of stations.
#[derive(Debug, Clone)]
pub struct Grid {
    lat_thresholds: Vec<f64>,
    lon_thresholds: Vec<f64>,
}

impl Grid {
    pub fn over<'a, I>(stations: I, size: usize) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Station>,
    {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for s in stations {
            bounds = Some(match bounds {
                None => (s.latitude, s.latitude, s.longitude, s.longitude),
                Some((min_lat, max_lat, min_lon, max_lon)) => (
                    min_lat.min(s.latitude),
                    max_lat.max(s.latitude),
                    min_lon.min(s.longitude),
                    max_lon.max(s.longitude),
                ),
            });
        }

        bounds.map(|(min_lat, max_lat, min_lon, max_lon)| Self {
            lat_thresholds: linear_thresholds(min_lat, max_lat, size),
            lon_thresholds: linear_thresholds(min_lon, max_lon, size),
        })
    }

    /// Cell key `latBin * 100 + lonBin`.
    pub fn cell(&self, station: &Station) -> u32 {
        grid_bin(station.latitude, &self.lat_thresholds) * 100
            + grid_bin(station.longitude, &self.lon_thresholds)
    }
}

/// Stations with their cluster assignments and the reconciled cluster table.
#[derive(Debug, Clone)]
pub struct ClusterTable {
    pub assignments: Vec<StationAssignment>,
    pub clusters: Vec<Cluster>,
    station_to_cluster: HashMap<u32, u32>,
}

impl ClusterTable {
    pub fn new(assignments: Vec<StationAssignment>, clusters: Vec<Cluster>) -> Self {
        let station_to_cluster = assignments
            .iter()
            .map(|a| (a.station_id, a.cluster_id))
            .collect();
        Self {
            assignments,
            clusters,
            station_to_cluster,
        }
    }

    pub fn cluster_of(&self, station_id: u32) -> Option<u32> {
        self.station_to_cluster.get(&station_id).copied()
    }

    pub fn station_count(&self) -> usize {
        self.assignments.len()
    }
}

pub struct StationClusterer {
    grid_size: usize,
    location_grid_size: usize,
    dense_labels: Vec<String>,
}

impl StationClusterer {
    pub fn new() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            location_grid_size: LOCATION_GRID_SIZE,
            dense_labels: DENSE_L1_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_dense_labels(mut self, labels: Vec<String>) -> Self {
        self.dense_labels = labels;
        self
    }

    /// Cluster, label and reconcile the stations.
    pub fn build(&self, stations: &[Station]) -> Result<ClusterTable> {
        let assignments = self.assign(stations)?;
        let groups = group_sizes(&assignments);
        let clusters = reconcile(&groups);

        info!(
            stations = stations.len(),
            clusters = clusters.len(),
            groups = groups.len(),
            "Built cluster table"
        );

        Ok(ClusterTable::new(assignments, clusters))
    }

    /// Per-station cluster id, L1 and L2 labels in station input order.
    pub fn assign(&self, stations: &[Station]) -> Result<Vec<StationAssignment>> {
        if stations.is_empty() {
            return Err(ProcessingError::EmptyOrMalformedInput(
                "no stations to cluster".to_string(),
            ));
        }

        let cluster_ids = self.cluster_ids(stations)?;
        let l1_labels = self.l1_labels(stations)?;
        let l2_labels = self.l2_labels(stations, &l1_labels);

        Ok(stations
            .iter()
            .zip(cluster_ids)
            .zip(l1_labels)
            .zip(l2_labels)
            .map(|(((station, cluster_id), l1), l2)| StationAssignment {
                station_id: station.id,
                cluster_id,
                l1,
                l2,
            })
            .collect())
    }

    /// Grid cells numbered by descending member count, densest first.
    /// Equal counts keep the order in which the cells first appear.
    pub fn cluster_ids(&self, stations: &[Station]) -> Result<Vec<u32>> {
        let grid = Grid::over(stations, self.grid_size).ok_or_else(|| {
            ProcessingError::EmptyOrMalformedInput("no stations to cluster".to_string())
        })?;
        let cells: Vec<u32> = stations.iter().map(|s| grid.cell(s)).collect();

        let mut counts: Vec<(u32, usize)> = Vec::new();
        let mut position: HashMap<u32, usize> = HashMap::new();
        for cell in &cells {
            match position.get(cell) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    position.insert(*cell, counts.len());
                    counts.push((*cell, 1));
                }
            }
        }
        // stable sort keeps first-appearance order among ties
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let ids: HashMap<u32, u32> = counts
            .iter()
            .enumerate()
            .map(|(id, (cell, _))| (*cell, id as u32))
            .collect();
        debug!(cells = ids.len(), grid = self.grid_size, "Assigned grid cells");

        Ok(cells.iter().map(|cell| ids[cell]).collect())
    }

    pub fn l1_labels(&self, stations: &[Station]) -> Result<Vec<String>> {
        let grid = Grid::over(stations, self.location_grid_size).ok_or_else(|| {
            ProcessingError::EmptyOrMalformedInput("no stations to label".to_string())
        })?;
        Ok(stations.iter().map(|s| grid.cell(s).to_string()).collect())
    }

    /// L2 labels, defined only for stations inside one of the dense L1 areas.
    /// Each dense area gets its own grid over its own coordinate range.
    pub fn l2_labels(&self, stations: &[Station], l1_labels: &[String]) -> Vec<Option<String>> {
        let mut labels = vec![None; stations.len()];

        for dense in &self.dense_labels {
            let members: Vec<usize> = l1_labels
                .iter()
                .enumerate()
                .filter(|(_, l1)| *l1 == dense)
                .map(|(i, _)| i)
                .collect();

            let Some(grid) = Grid::over(members.iter().map(|&i| &stations[i]), self.location_grid_size)
            else {
                continue;
            };

            for i in members {
                labels[i] = Some(format!("{}_{}", dense, grid.cell(&stations[i])));
            }
        }

        labels
    }
}

impl Default for StationClusterer {
    fn default() -> Self {
        Self::new()
    }
}
