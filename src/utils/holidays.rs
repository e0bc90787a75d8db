use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Answers whether a calendar date is a public holiday.
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// United States federal holidays, including their observed dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsFederalHolidays;

impl UsFederalHolidays {
    pub fn new() -> Self {
        Self
    }

    /// All holiday dates falling in `year`, actual and observed.
    pub fn holidays_in(&self, year: i32) -> Vec<NaiveDate> {
        let mut fixed = vec![
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 7, 4),
            NaiveDate::from_ymd_opt(year, 11, 11),
            NaiveDate::from_ymd_opt(year, 12, 25),
        ];
        if year >= 2021 {
            fixed.push(NaiveDate::from_ymd_opt(year, 6, 19));
        }

        let mut days: Vec<NaiveDate> = Vec::new();
        for date in fixed.into_iter().flatten() {
            days.push(date);
            let observed = observed(date);
            if observed != date && observed.year() == year {
                days.push(observed);
            }
        }

        // New Year's Day on a Saturday is observed on Dec 31 of the year before
        if let Some(next_new_year) = NaiveDate::from_ymd_opt(year + 1, 1, 1) {
            if next_new_year.weekday() == Weekday::Sat {
                days.push(observed(next_new_year));
            }
        }

        let floating = [
            (year >= 1986).then(|| nth_weekday(year, 1, Weekday::Mon, 3)),
            Some(nth_weekday(year, 2, Weekday::Mon, 3)),
            Some(last_weekday(year, 5, Weekday::Mon)),
            Some(nth_weekday(year, 9, Weekday::Mon, 1)),
            Some(nth_weekday(year, 10, Weekday::Mon, 2)),
            Some(nth_weekday(year, 11, Weekday::Thu, 4)),
        ];
        days.extend(floating.into_iter().flatten().flatten());

        days.sort();
        days.dedup();
        days
    }
}

impl HolidayCalendar for UsFederalHolidays {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays_in(date.year()).contains(&date)
    }
}

fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut day = first_of_next - Duration::days(1);
    while day.weekday() != weekday {
        day -= Duration::days(1);
    }
    Some(day)
}

/// A calendar with no holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fixed_and_floating_holidays_2018() {
        let cal = UsFederalHolidays::new();
        assert!(cal.is_holiday(date(2018, 1, 1)));
        assert!(cal.is_holiday(date(2018, 1, 15))); // MLK
        assert!(cal.is_holiday(date(2018, 2, 19))); // Washington's Birthday
        assert!(cal.is_holiday(date(2018, 5, 28))); // Memorial Day
        assert!(cal.is_holiday(date(2018, 9, 3))); // Labor Day
        assert!(cal.is_holiday(date(2018, 10, 8))); // Columbus Day
        assert!(cal.is_holiday(date(2018, 11, 22))); // Thanksgiving
        assert!(cal.is_holiday(date(2018, 12, 25)));
        assert!(!cal.is_holiday(date(2018, 3, 5)));
    }

    #[test]
    fn test_observed_dates() {
        let cal = UsFederalHolidays::new();
        // 2017-01-01 was a Sunday
        assert!(cal.is_holiday(date(2017, 1, 2)));
        // 2018-11-11 was a Sunday
        assert!(cal.is_holiday(date(2018, 11, 12)));
        // 2022-01-01 was a Saturday
        assert!(cal.is_holiday(date(2021, 12, 31)));
    }

    #[test]
    fn test_juneteenth_only_from_2021() {
        let cal = UsFederalHolidays::new();
        assert!(!cal.is_holiday(date(2019, 6, 19)));
        assert!(cal.is_holiday(date(2023, 6, 19)));
    }
}
