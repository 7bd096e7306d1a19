//! Usage facts and the raw rows they are assembled from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Canonical columns ───────────────────────────────────────────────────────

/// Canonical field names of a [`RawRow`]. Mapping a provider export's own
/// headers onto these is the caller's job.
pub mod columns {
  pub const PERIOD_NAME: &str = "period_name";
  pub const ORG_NAME: &str = "org_name";
  pub const PROVIDER_NAME: &str = "provider_name";
  pub const ACCOUNT_ID: &str = "account_id";
  pub const RESOURCE_ID: &str = "resource_id";
  pub const RESOURCE_NAME: &str = "resource_name";
  pub const USAGE_AMOUNT: &str = "usage_amount";
  pub const USAGE_CURRENCY: &str = "usage_currency";
}

// ─── RawRow ──────────────────────────────────────────────────────────────────

/// One input line item: canonical field name to raw string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(BTreeMap<String, String>);

impl RawRow {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insert.
  pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
    self.insert(column, value);
    self
  }

  pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
    self.0.insert(column.into(), value.into());
  }

  /// The trimmed value of `column`; `None` if absent or blank.
  pub fn get(&self, column: &str) -> Option<&str> {
    self
      .0
      .get(column)
      .map(|v| v.trim())
      .filter(|v| !v.is_empty())
  }

  pub fn columns(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
  K: Into<String>,
  V: Into<String>,
{
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

// ─── Usage ───────────────────────────────────────────────────────────────────

/// An immutable cost measurement. It references dimensions only by code;
/// a dimension that is not configured for the load is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
  pub usage_code:     Uuid,
  pub period_code:    Uuid,
  pub org_code:       Option<Uuid>,
  pub provider_code:  Option<Uuid>,
  pub account_code:   Option<Uuid>,
  pub resource_code:  Option<Uuid>,
  /// Passed through as read; no sign check, no conversion.
  pub usage_amount:   f64,
  pub usage_currency: String,
}

impl Usage {
  pub fn to_dict(&self) -> crate::Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }

  pub fn from_dict(data: serde_json::Value) -> crate::Result<Self> {
    Ok(serde_json::from_value(data)?)
  }
}
