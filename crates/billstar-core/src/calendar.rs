//! Calendar attributes derived from a `YYYY-MM-DD` period name.
//!
//! Everything here is pure: the same name always yields the same attributes,
//! so callers may memoise freely.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// `strftime` pattern for period names.
pub const PERIOD_FORMAT: &str = "%Y-%m-%d";

/// The attributes of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarAttributes {
  pub date:         NaiveDate,
  pub day:          u32,
  pub month:        u32,
  pub year:         i32,
  /// 1–4.
  pub quarter:      u32,
  /// 1 = Monday … 7 = Sunday.
  pub day_of_week:  u32,
  pub day_of_year:  u32,
  /// ISO-8601 week number.
  pub week_of_year: u32,
  /// No holiday calendar is wired in; always `false`.
  pub is_holiday:   bool,
}

impl CalendarAttributes {
  pub fn from_date(date: NaiveDate) -> Self {
    Self {
      date,
      day: date.day(),
      month: date.month(),
      year: date.year(),
      quarter: quarter_of(date.month()),
      day_of_week: date.weekday().number_from_monday(),
      day_of_year: date.ordinal(),
      week_of_year: date.iso_week().week(),
      is_holiday: false,
    }
  }
}

/// Derive the calendar attributes for `period_name`.
pub fn derive(period_name: &str) -> Result<CalendarAttributes> {
  parse_period_name(period_name).map(CalendarAttributes::from_date)
}

/// Parse a strict `YYYY-MM-DD` string.
///
/// chrono's `%Y` accepts signs and more than four digits, and `%m`/`%d`
/// accept a single digit, so the shape is checked byte-by-byte first.
pub fn parse_period_name(period_name: &str) -> Result<NaiveDate> {
  let bytes = period_name.as_bytes();
  let well_shaped = bytes.len() == 10
    && bytes.iter().enumerate().all(|(i, b)| match i {
      4 | 7 => *b == b'-',
      _ => b.is_ascii_digit(),
    });

  if !well_shaped {
    return Err(Error::InvalidPeriodFormat(period_name.to_owned()));
  }

  NaiveDate::parse_from_str(period_name, PERIOD_FORMAT)
    .map_err(|_| Error::InvalidPeriodFormat(period_name.to_owned()))
}

/// Format a date as a period name.
pub fn period_name(date: NaiveDate) -> String {
  date.format(PERIOD_FORMAT).to_string()
}

fn quarter_of(month: u32) -> u32 { (month - 1) / 3 + 1 }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derives_saturday_in_april() {
    let attrs = derive("2024-04-20").unwrap();
    assert_eq!(attrs.day, 20);
    assert_eq!(attrs.month, 4);
    assert_eq!(attrs.year, 2024);
    assert_eq!(attrs.quarter, 2);
    assert_eq!(attrs.day_of_week, 6);
    assert_eq!(attrs.day_of_year, 111);
    assert_eq!(attrs.week_of_year, 16);
    assert!(!attrs.is_holiday);
  }

  #[test]
  fn quarter_stays_within_one_to_four() {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    for date in start.iter_days().take(800) {
      let attrs = derive(&period_name(date)).unwrap();
      assert_eq!(attrs.quarter, (attrs.month - 1) / 3 + 1);
      assert!((1..=4).contains(&attrs.quarter));
    }
  }

  #[test]
  fn december_is_fourth_quarter() {
    assert_eq!(derive("2024-12-31").unwrap().quarter, 4);
    assert_eq!(derive("2024-03-31").unwrap().quarter, 1);
  }

  #[test]
  fn iso_week_wraps_at_year_boundary() {
    // 2021-01-03 is a Sunday that belongs to week 53 of 2020.
    let attrs = derive("2021-01-03").unwrap();
    assert_eq!(attrs.week_of_year, 53);
    assert_eq!(attrs.day_of_week, 7);
    assert_eq!(attrs.day_of_year, 3);
  }

  #[test]
  fn leap_day_is_accepted() {
    let attrs = derive("2024-02-29").unwrap();
    assert_eq!(attrs.day_of_year, 60);
  }

  #[test]
  fn rejects_malformed_names() {
    for bad in [
      "",
      "2024-4-20",
      "2024/04/20",
      "20240420",
      "+2024-04-20",
      "2024-04-20T00:00:00",
      "2023-02-29",
      "2024-13-01",
      " 2024-04-20",
    ] {
      match derive(bad) {
        Err(Error::InvalidPeriodFormat(value)) => assert_eq!(value, bad),
        other => panic!("{bad:?} should be rejected, got {other:?}"),
      }
    }
  }

  #[test]
  fn period_name_round_trips() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    assert_eq!(period_name(date), "2024-01-05");
    assert_eq!(parse_period_name("2024-01-05").unwrap(), date);
  }
}
