//! Interval gap calculation for the period dimension.
//!
//! Given the current bounds of the stored periods and a new period name,
//! [`gap`] returns the names that must be created so the stored range grows
//! outward without holes. It only ever extends the range; holes already
//! inside `[min, max]` are left to [`missing_within`].

use chrono::{Days, NaiveDate};

use crate::{
  Result,
  calendar::{parse_period_name, period_name},
};

/// Names to create so that `new_key` joins the contiguous range
/// `bounds = (min, max)`, in ascending order.
///
/// - no bounds: exactly `[new_key]`
/// - `new_key > max`: `max + 1 ..= new_key`
/// - `new_key < min`: `new_key ..= min - 1`
/// - otherwise: empty
pub fn gap(bounds: Option<(&str, &str)>, new_key: &str) -> Result<Vec<String>> {
  let new_date = parse_period_name(new_key)?;

  let Some((min, max)) = bounds else {
    return Ok(vec![period_name(new_date)]);
  };

  let min_date = parse_period_name(min)?;
  let max_date = parse_period_name(max)?;

  let names = if new_date > max_date {
    date_range(next_day(max_date), new_date)
  } else if new_date < min_date {
    date_range(new_date, prev_day(min_date))
  } else {
    Vec::new()
  };

  Ok(names.into_iter().map(period_name).collect())
}

/// Every date in `from..=to`. Empty when `from > to`.
pub fn date_range(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
  from.iter_days().take_while(|d| *d <= to).collect()
}

/// Dates in `from..=to` for which `is_present` returns `false`.
pub fn missing_within(
  from: NaiveDate,
  to: NaiveDate,
  mut is_present: impl FnMut(NaiveDate) -> bool,
) -> Vec<NaiveDate> {
  date_range(from, to)
    .into_iter()
    .filter(|d| !is_present(*d))
    .collect()
}

fn next_day(date: NaiveDate) -> NaiveDate {
  date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX)
}

fn prev_day(date: NaiveDate) -> NaiveDate {
  date.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Error;

  fn names(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

  #[test]
  fn empty_dimension_yields_new_key() {
    assert_eq!(gap(None, "2024-04-01").unwrap(), names(&["2024-04-01"]));
  }

  #[test]
  fn extends_forward_to_new_key() {
    let bounds = Some(("2024-04-01", "2024-04-01"));
    assert_eq!(
      gap(bounds, "2024-04-04").unwrap(),
      names(&["2024-04-02", "2024-04-03", "2024-04-04"])
    );
  }

  #[test]
  fn extends_backward_to_new_key() {
    let bounds = Some(("2024-03-02", "2024-03-10"));
    assert_eq!(
      gap(bounds, "2024-02-28").unwrap(),
      names(&["2024-02-28", "2024-02-29", "2024-03-01"])
    );
  }

  #[test]
  fn covered_key_yields_nothing() {
    let bounds = Some(("2024-04-01", "2024-04-30"));
    assert!(gap(bounds, "2024-04-01").unwrap().is_empty());
    assert!(gap(bounds, "2024-04-30").unwrap().is_empty());
    assert!(gap(bounds, "2024-04-15").unwrap().is_empty());
  }

  #[test]
  fn crosses_year_boundary() {
    let bounds = Some(("2023-12-30", "2023-12-30"));
    assert_eq!(
      gap(bounds, "2024-01-01").unwrap(),
      names(&["2023-12-31", "2024-01-01"])
    );
  }

  #[test]
  fn malformed_new_key_is_rejected() {
    let err = gap(Some(("2024-04-01", "2024-04-02")), "04/03/2024").unwrap_err();
    assert!(matches!(err, Error::InvalidPeriodFormat(v) if v == "04/03/2024"));
  }

  #[test]
  fn malformed_bound_is_rejected() {
    let err = gap(Some(("bogus", "2024-04-02")), "2024-04-03").unwrap_err();
    assert!(matches!(err, Error::InvalidPeriodFormat(v) if v == "bogus"));
  }

  #[test]
  fn date_range_is_inclusive_and_empty_when_reversed() {
    let a = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let b = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
    assert_eq!(date_range(a, b).len(), 30);
    assert_eq!(date_range(a, a), vec![a]);
    assert!(date_range(b, a).is_empty());
  }

  #[test]
  fn missing_within_reports_holes() {
    let a = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let b = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
    let held = [a, NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(), b];

    let missing = missing_within(a, b, |d| held.contains(&d));
    assert_eq!(
      missing.into_iter().map(period_name).collect::<Vec<_>>(),
      names(&["2024-04-02", "2024-04-04"])
    );
  }
}
