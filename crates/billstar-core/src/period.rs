//! The calendar dimension.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  calendar::{self, CalendarAttributes},
  dimension::{Dimension, DimensionKind},
};

/// One calendar day. Every field except the code is a pure function of
/// `period_name`, so two periods with the same name are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
  pub period_code:         Uuid,
  /// `YYYY-MM-DD`; the natural key.
  pub period_name:         String,
  pub period_date:         NaiveDate,
  pub period_day:          u32,
  pub period_month:        u32,
  pub period_year:         i32,
  pub period_quarter:      u32,
  pub period_day_of_week:  u32,
  pub period_day_of_year:  u32,
  pub period_week_of_year: u32,
  #[serde(default)]
  pub period_is_holiday:   bool,
}

impl Period {
  /// Build a period for `period_name`, deriving its calendar attributes.
  pub fn new(period_code: Uuid, period_name: &str) -> Result<Self> {
    let attrs = calendar::derive(period_name)?;
    Ok(Self::from_attributes(period_code, attrs))
  }

  pub fn from_attributes(period_code: Uuid, attrs: CalendarAttributes) -> Self {
    Self {
      period_code,
      period_name: calendar::period_name(attrs.date),
      period_date: attrs.date,
      period_day: attrs.day,
      period_month: attrs.month,
      period_year: attrs.year,
      period_quarter: attrs.quarter,
      period_day_of_week: attrs.day_of_week,
      period_day_of_year: attrs.day_of_year,
      period_week_of_year: attrs.week_of_year,
      period_is_holiday: attrs.is_holiday,
    }
  }

  /// The calendar attributes carried by this record.
  pub fn calendar(&self) -> CalendarAttributes {
    CalendarAttributes {
      date:         self.period_date,
      day:          self.period_day,
      month:        self.period_month,
      year:         self.period_year,
      quarter:      self.period_quarter,
      day_of_week:  self.period_day_of_week,
      day_of_year:  self.period_day_of_year,
      week_of_year: self.period_week_of_year,
      is_holiday:   self.period_is_holiday,
    }
  }

  /// Serialise into a flat JSON object keyed by column name.
  pub fn to_dict(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }

  /// Inverse of [`Period::to_dict`].
  pub fn from_dict(data: serde_json::Value) -> Result<Self> {
    Ok(serde_json::from_value(data)?)
  }
}

impl Dimension for Period {
  type Key = String;

  const KIND: DimensionKind = DimensionKind::Period;

  fn code(&self) -> Uuid { self.period_code }

  fn natural_key(&self) -> String { self.period_name.clone() }

  fn build(code: Uuid, key: &String, _parent: Option<Uuid>) -> Result<Self> {
    Self::new(code, key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_derives_every_field() {
    let code = Uuid::new_v4();
    let period = Period::new(code, "2024-04-01").unwrap();

    assert_eq!(period.period_code, code);
    assert_eq!(period.period_name, "2024-04-01");
    assert_eq!(period.period_date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    assert_eq!(period.period_day, 1);
    assert_eq!(period.period_month, 4);
    assert_eq!(period.period_year, 2024);
    assert_eq!(period.period_quarter, 2);
    assert_eq!(period.period_day_of_week, 1);
    assert_eq!(period.period_day_of_year, 92);
    assert_eq!(period.period_week_of_year, 14);
    assert!(!period.period_is_holiday);
  }

  #[test]
  fn dict_round_trip_preserves_record() {
    let period = Period::new(Uuid::new_v4(), "2024-04-20").unwrap();
    let dict = period.to_dict().unwrap();

    assert_eq!(dict["period_name"], "2024-04-20");
    assert_eq!(dict["period_date"], "2024-04-20");
    assert_eq!(dict["period_day_of_week"], 6);

    assert_eq!(Period::from_dict(dict).unwrap(), period);
  }

  #[test]
  fn same_name_and_code_compare_equal() {
    let code = Uuid::new_v4();
    assert_eq!(
      Period::new(code, "2024-04-01").unwrap(),
      Period::new(code, "2024-04-01").unwrap()
    );
  }

  #[test]
  fn calendar_reflects_fields() {
    let period = Period::new(Uuid::new_v4(), "2024-04-20").unwrap();
    assert_eq!(period.calendar(), calendar::derive("2024-04-20").unwrap());
  }

  #[test]
  fn from_dict_rejects_incomplete_object() {
    let dict = serde_json::json!({ "period_name": "2024-04-01" });
    assert!(Period::from_dict(dict).is_err());
  }
}
