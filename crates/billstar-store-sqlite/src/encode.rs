//! Encoding and decoding helpers between billstar records and the
//! plain-text representations stored in SQLite columns.
//!
//! Codes are stored as hyphenated lowercase UUID strings and dates as
//! `YYYY-MM-DD`, which sorts correctly as text.

use billstar_core::{
  calendar::PERIOD_FORMAT,
  dimension::{Account, Organisation, Provider, Resource},
  fact::Usage,
  period::Period,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format(PERIOD_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, PERIOD_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `periods` row.
pub struct RawPeriod {
  pub period_code:         String,
  pub period_name:         String,
  pub period_date:         String,
  pub period_day:          u32,
  pub period_month:        u32,
  pub period_year:         i32,
  pub period_quarter:      u32,
  pub period_day_of_week:  u32,
  pub period_day_of_year:  u32,
  pub period_week_of_year: u32,
  pub period_is_holiday:   bool,
}

/// Column list matching [`RawPeriod::from_row`].
pub const PERIOD_COLUMNS: &str = "period_code, period_name, period_date, period_day, \
   period_month, period_year, period_quarter, period_day_of_week, \
   period_day_of_year, period_week_of_year, period_is_holiday";

impl RawPeriod {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      period_code:         row.get(0)?,
      period_name:         row.get(1)?,
      period_date:         row.get(2)?,
      period_day:          row.get(3)?,
      period_month:        row.get(4)?,
      period_year:         row.get(5)?,
      period_quarter:      row.get(6)?,
      period_day_of_week:  row.get(7)?,
      period_day_of_year:  row.get(8)?,
      period_week_of_year: row.get(9)?,
      period_is_holiday:   row.get(10)?,
    })
  }

  pub fn into_period(self) -> Result<Period> {
    Ok(Period {
      period_code:         decode_uuid(&self.period_code)?,
      period_name:         self.period_name,
      period_date:         decode_date(&self.period_date)?,
      period_day:          self.period_day,
      period_month:        self.period_month,
      period_year:         self.period_year,
      period_quarter:      self.period_quarter,
      period_day_of_week:  self.period_day_of_week,
      period_day_of_year:  self.period_day_of_year,
      period_week_of_year: self.period_week_of_year,
      period_is_holiday:   self.period_is_holiday,
    })
  }
}

/// Raw strings read from any of the single-key dimension tables:
/// `(code, natural key, optional parent code)`.
pub struct RawDimension {
  pub code:   String,
  pub key:    String,
  pub parent: Option<String>,
}

impl RawDimension {
  pub fn into_organisation(self) -> Result<Organisation> {
    Ok(Organisation {
      org_code: decode_uuid(&self.code)?,
      org_name: self.key,
    })
  }

  pub fn into_provider(self) -> Result<Provider> {
    Ok(Provider {
      provider_code: decode_uuid(&self.code)?,
      provider_name: self.key,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_code: decode_uuid(&self.code)?,
      account_id:   self.key,
      org_code:     decode_opt_uuid(self.parent)?,
    })
  }
}

/// Raw strings read directly from a `resources` row.
pub struct RawResource {
  pub resource_code: String,
  pub resource_id:   String,
  pub resource_name: String,
  pub account_code:  Option<String>,
}

impl RawResource {
  pub fn into_resource(self) -> Result<Resource> {
    Ok(Resource {
      resource_code: decode_uuid(&self.resource_code)?,
      resource_id:   self.resource_id,
      resource_name: self.resource_name,
      account_code:  decode_opt_uuid(self.account_code)?,
    })
  }
}

/// Raw values read directly from a `usages` row.
pub struct RawUsage {
  pub usage_code:     String,
  pub period_code:    String,
  pub org_code:       Option<String>,
  pub provider_code:  Option<String>,
  pub account_code:   Option<String>,
  pub resource_code:  Option<String>,
  pub usage_amount:   f64,
  pub usage_currency: String,
}

impl RawUsage {
  pub fn into_usage(self) -> Result<Usage> {
    Ok(Usage {
      usage_code:     decode_uuid(&self.usage_code)?,
      period_code:    decode_uuid(&self.period_code)?,
      org_code:       decode_opt_uuid(self.org_code)?,
      provider_code:  decode_opt_uuid(self.provider_code)?,
      account_code:   decode_opt_uuid(self.account_code)?,
      resource_code:  decode_opt_uuid(self.resource_code)?,
      usage_amount:   self.usage_amount,
      usage_currency: self.usage_currency,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn date_round_trip() {
    let date = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
    assert_eq!(encode_date(date), "2024-04-20");
    assert_eq!(decode_date("2024-04-20").unwrap(), date);
    assert!(matches!(decode_date("20/04/2024"), Err(Error::DateParse(_))));
  }

  #[test]
  fn uuid_is_lowercase_hyphenated() {
    let id = Uuid::new_v4();
    let encoded = encode_uuid(id);
    assert_eq!(encoded.len(), 36);
    assert_eq!(encoded, encoded.to_lowercase());
    assert_eq!(decode_uuid(&encoded).unwrap(), id);
  }
}
