use crate::error::{ProcessingError, Result};
use crate::models::{ActionRecord, DemandRecord};
use tracing::info;

/// Round non-positive values down and positive values up, so a fractional
/// demand is never truncated towards zero.
pub fn round_away_from_zero(x: f64) -> i64 {
    if x <= 0.0 {
        x.floor() as i64
    } else {
        x.ceil() as i64
    }
}

fn relative(count: u32, size: u32, cluster_id: u32) -> Result<f64> {
    if size == 0 {
        return Err(ProcessingError::ClusterSizeZero { cluster_id });
    }
    Ok(count as f64 / size as f64)
}

/// Demand of one aligned pickups/returns row pair.
pub fn demand_for(pickup: &ActionRecord, ret: &ActionRecord) -> Result<DemandRecord> {
    if pickup.cluster_id != ret.cluster_id || pickup.datetime != ret.datetime {
        return Err(ProcessingError::DataMerge(format!(
            "pickups row (cluster {}, {}) does not line up with returns row (cluster {}, {})",
            pickup.cluster_id, pickup.datetime, ret.cluster_id, ret.datetime
        )));
    }

    let rel_pickups = relative(pickup.count, pickup.cluster_size, pickup.cluster_id)?;
    let rel_returns = relative(ret.count, ret.cluster_size, ret.cluster_id)?;
    let rel = rel_returns - rel_pickups;

    Ok(DemandRecord::from_features(ret, round_away_from_zero(rel)))
}

/// Combine a year of pickups and returns, row by row.
pub fn calculate_demand(pickups: &[ActionRecord], returns: &[ActionRecord]) -> Result<Vec<DemandRecord>> {
    if pickups.len() != returns.len() {
        return Err(ProcessingError::DataMerge(format!(
            "pickups table has {} rows, returns table has {}",
            pickups.len(),
            returns.len()
        )));
    }

    let demand = pickups
        .iter()
        .zip(returns)
        .map(|(p, r)| demand_for(p, r))
        .collect::<Result<Vec<_>>>()?;

    info!(rows = demand.len(), "Calculated demand");
    Ok(demand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(cluster_id: u32, cluster_size: u32, count: u32) -> ActionRecord {
        let datetime = NaiveDate::from_ymd_opt(2018, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ActionRecord {
            cluster_id,
            cluster_size,
            l1: "101".to_string(),
            l2: "101_0".to_string(),
            holiday: 0,
            weekday: 1,
            datetime,
            time: datetime.time(),
            month: 3,
            temperature: Some(65.0),
            humidity: Some(45.0),
            wind: 0,
            wintry: 0,
            thunderstorm: 0,
            extreme_weather: 0,
            foggy: 0,
            rain: 0,
            clear_sky: 1,
            temp: 60,
            hum: 40,
            count,
        }
    }

    #[test]
    fn test_rounding_away_from_zero() {
        assert_eq!(round_away_from_zero(-0.5), -1);
        assert_eq!(round_away_from_zero(0.5), 1);
        assert_eq!(round_away_from_zero(0.0), 0);
        assert_eq!(round_away_from_zero(-3.5), -4);
        assert_eq!(round_away_from_zero(2.0), 2);
    }

    #[test]
    fn test_relative_demand() {
        let pickups = vec![row(0, 4, 2), row(1, 2, 0)];
        let returns = vec![row(0, 4, 1), row(1, 2, 3)];
        let demand = calculate_demand(&pickups, &returns).unwrap();

        // 1/4 - 2/4 = -0.25 -> -1, 3/2 - 0 = 1.5 -> 2
        assert_eq!(demand[0].demand, -1);
        assert_eq!(demand[1].demand, 2);
        assert_eq!(demand[1].cluster_id, 1);
        assert_eq!(demand[0].clear_sky, 1);
    }

    #[test]
    fn test_zero_size_cluster_is_fatal() {
        let result = calculate_demand(&[row(3, 0, 1)], &[row(3, 0, 1)]);
        assert!(matches!(
            result,
            Err(ProcessingError::ClusterSizeZero { cluster_id: 3 })
        ));
    }

    #[test]
    fn test_misaligned_tables_are_rejected() {
        assert!(matches!(
            calculate_demand(&[row(0, 1, 1)], &[]),
            Err(ProcessingError::DataMerge(_))
        ));
        assert!(matches!(
            calculate_demand(&[row(0, 1, 1)], &[row(1, 1, 1)]),
            Err(ProcessingError::DataMerge(_))
        ));
    }
}
