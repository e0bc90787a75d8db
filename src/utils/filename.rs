use crate::models::Direction;
use crate::utils::constants::{RESULTS_ALL_STEM, RESULTS_STEM};
use std::path::{Path, PathBuf};

/// Aggregated table of one direction and year: `pickups_{year}.csv` or `returns_{year}.csv`
pub fn action_table_path(data_dir: &Path, direction: Direction, year: i32) -> PathBuf {
    data_dir.join(format!("{}_{}.csv", direction.column_name(), year))
}

/// Demand table of one year: `results_{year}.csv`
pub fn results_path(data_dir: &Path, year: i32) -> PathBuf {
    data_dir.join(format!("{}_{}.csv", RESULTS_STEM, year))
}

pub fn results_all_csv_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!("{}.csv", RESULTS_ALL_STEM))
}

pub fn results_all_parquet_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!("{}.parquet", RESULTS_ALL_STEM))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_table_path() {
        let dir = Path::new("data");

        assert_eq!(
            action_table_path(dir, Direction::Pickup, 2017),
            PathBuf::from("data/pickups_2017.csv")
        );
        assert_eq!(
            action_table_path(dir, Direction::Return, 2019),
            PathBuf::from("data/returns_2019.csv")
        );
    }

    #[test]
    fn test_results_paths() {
        let dir = Path::new("data");

        assert_eq!(results_path(dir, 2018), PathBuf::from("data/results_2018.csv"));
        assert_eq!(results_all_csv_path(dir), PathBuf::from("data/results_all.csv"));
        assert_eq!(
            results_all_parquet_path(dir),
            PathBuf::from("data/results_all.parquet")
        );
    }
}
