//! Calendar months and the monthly simulation clock

use chrono::NaiveDate;
use loan_tape_core_rs::{MonthError, TimeManager, YearMonth};

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

#[test]
fn test_rejects_month_thirteen() {
    assert_eq!(YearMonth::new(2022, 13), Err(MonthError::MonthOutOfRange(13)));
    assert_eq!(YearMonth::new(2022, 0), Err(MonthError::MonthOutOfRange(0)));
}

#[test]
fn test_parse_and_display() {
    let m: YearMonth = "2023-07".parse().unwrap();
    assert_eq!(m, ym(2023, 7));
    assert_eq!(m.to_string(), "2023-07");
    assert!("2023/07".parse::<YearMonth>().is_err());
    assert!("2023-7x".parse::<YearMonth>().is_err());
}

#[test]
fn test_serde_uses_literal() {
    let json = serde_json::to_string(&ym(2021, 3)).unwrap();
    assert_eq!(json, "\"2021-03\"");
    let back: YearMonth = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ym(2021, 3));
    assert!(serde_json::from_str::<YearMonth>("\"2021-00\"").is_err());
}

#[test]
fn test_month_arithmetic() {
    assert_eq!(ym(2022, 11).add_months(3), ym(2023, 2));
    assert_eq!(ym(2023, 2).add_months(-3), ym(2022, 11));
    assert_eq!(ym(2024, 1).months_since(ym(2022, 1)), 24);
    assert_eq!(ym(2022, 1).months_since(ym(2022, 5)), -4);
}

#[test]
fn test_reporting_dates() {
    assert_eq!(ym(2022, 2).month_end(), NaiveDate::from_ymd_opt(2022, 2, 28).unwrap());
    assert_eq!(ym(2022, 4).month_end(), NaiveDate::from_ymd_opt(2022, 4, 30).unwrap());
    assert_eq!(ym(2022, 4).first_day(), NaiveDate::from_ymd_opt(2022, 4, 1).unwrap());
    assert_eq!(ym(2022, 4).quarter_label(), "2022-Q2");
    assert_eq!(ym(2022, 12).quarter_label(), "2022-Q4");
}

#[test]
fn test_time_manager_walks_inclusive_window() {
    let mut time = TimeManager::new(ym(2022, 10), ym(2023, 3));
    assert_eq!(time.total_ticks(), 6);

    let mut seen = Vec::new();
    while !time.is_finished() {
        seen.push(time.current_month());
        time.advance_tick();
    }

    assert_eq!(seen.first(), Some(&ym(2022, 10)));
    assert_eq!(seen.last(), Some(&ym(2023, 3)));
    assert_eq!(seen.len(), 6);
    assert_eq!(time.current_tick(), 6);
}

#[test]
fn test_single_month_window() {
    let time = TimeManager::new(ym(2022, 5), ym(2022, 5));
    assert_eq!(time.total_ticks(), 1);
    assert!(!time.is_finished());
    assert_eq!(time.start(), time.end());
}
