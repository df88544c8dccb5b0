//! Calendar time for the simulation
//!
//! The simulation advances in discrete ticks of one calendar month each.
//! `YearMonth` is the month value type; `TimeManager` walks the run window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing or constructing a calendar month
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonthError {
    #[error("month {0} out of range 1-12")]
    MonthOutOfRange(u32),

    #[error("invalid month literal '{0}', expected YYYY-MM")]
    InvalidLiteral(String),
}

/// A calendar month (year + month 1-12)
///
/// Serialized as `"YYYY-MM"`.
///
/// # Example
/// ```
/// use loan_tape_core_rs::YearMonth;
///
/// let jan = YearMonth::new(2022, 1).unwrap();
/// let mar = YearMonth::new(2022, 3).unwrap();
/// assert_eq!(mar.months_since(jan), 2);
/// assert_eq!(jan.to_string(), "2022-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month, rejecting months outside 1-12
    pub fn new(year: i32, month: u32) -> Result<Self, MonthError> {
        if !(1..=12).contains(&month) {
            return Err(MonthError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months since year 0, used for arithmetic
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// Inverse of [`YearMonth::ordinal`]
    pub fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: (ordinal.rem_euclid(12) + 1) as u32,
        }
    }

    /// The following calendar month
    pub fn next(&self) -> Self {
        self.add_months(1)
    }

    pub fn add_months(&self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    /// Signed number of months from `earlier` to `self`
    pub fn months_since(&self, earlier: YearMonth) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    /// First calendar day of the month
    pub fn first_day(&self) -> NaiveDate {
        // year/month are validated at construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day of the month (reporting / due date)
    pub fn month_end(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MIN)
    }

    /// Vintage quarter label, e.g. `2022-Q3`
    pub fn quarter_label(&self) -> String {
        format!("{}-Q{}", self.year, (self.month - 1) / 3 + 1)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = MonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MonthError::InvalidLiteral(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = MonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Walks the simulation window one calendar month per tick
///
/// # Example
/// ```
/// use loan_tape_core_rs::{TimeManager, YearMonth};
///
/// let start = YearMonth::new(2022, 11).unwrap();
/// let end = YearMonth::new(2023, 1).unwrap();
/// let mut time = TimeManager::new(start, end);
/// assert_eq!(time.total_ticks(), 3);
///
/// time.advance_tick();
/// assert_eq!(time.current_month().to_string(), "2022-12");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeManager {
    start: YearMonth,
    end: YearMonth,
    current_tick: usize,
}

impl TimeManager {
    /// Create a time manager covering `start..=end`
    ///
    /// # Panics
    /// Panics if `end` precedes `start`
    pub fn new(start: YearMonth, end: YearMonth) -> Self {
        assert!(end >= start, "simulation end must not precede start");
        Self {
            start,
            end,
            current_tick: 0,
        }
    }

    /// Advance time by one month
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Ticks elapsed since simulation start
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    /// Calendar month of the current tick
    pub fn current_month(&self) -> YearMonth {
        self.start.add_months(self.current_tick as i64)
    }

    /// Number of monthly ticks in the window (inclusive of both ends)
    pub fn total_ticks(&self) -> usize {
        (self.end.months_since(self.start) + 1) as usize
    }

    /// True once every month in the window has been simulated
    pub fn is_finished(&self) -> bool {
        self.current_tick >= self.total_ticks()
    }

    pub fn start(&self) -> YearMonth {
        self.start
    }

    pub fn end(&self) -> YearMonth {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "simulation end must not precede start")]
    fn test_inverted_window_panics() {
        let a = YearMonth::new(2023, 1).unwrap();
        let b = YearMonth::new(2022, 12).unwrap();
        TimeManager::new(a, b);
    }

    #[test]
    fn test_month_end_handles_leap_february() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.month_end(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        let dec = YearMonth::new(2023, 12).unwrap();
        assert_eq!(dec.month_end(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_ordinal_round_trip_across_year_boundary() {
        let dec = YearMonth::new(2022, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2023, 1).unwrap());
        assert_eq!(YearMonth::from_ordinal(dec.ordinal()), dec);
    }
}
