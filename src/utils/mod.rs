pub mod constants;
pub mod filename;
pub mod holidays;
pub mod progress;

pub use constants::*;
pub use filename::{action_table_path, results_all_csv_path, results_all_parquet_path, results_path};
pub use holidays::{HolidayCalendar, NoHolidays, UsFederalHolidays};
pub use progress::ProgressReporter;
