//! Loader configuration and the header-to-column mapping.

use std::{collections::BTreeMap, path::PathBuf};

use billstar_core::{
  assembler::AssemblerConfig, dimension::DimensionKind, fact::RawRow, loader::GapPolicy,
};
use serde::Deserialize;

// ─── LoaderConfig ─────────────────────────────────────────────────────────────

/// Top-level settings, read from `billstar.toml` and `BILLSTAR_*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
  pub store_path: PathBuf,
  pub gap_policy: GapPolicy,
  /// Dimensions, besides the period, every row must reference.
  pub dimensions: Vec<DimensionKind>,
  pub columns:    ColumnMapping,
}

impl Default for LoaderConfig {
  fn default() -> Self {
    let assembler = AssemblerConfig::default();
    Self {
      store_path: PathBuf::from("billstar.db"),
      gap_policy: GapPolicy::default(),
      dimensions: assembler.dimensions,
      columns:    ColumnMapping::default(),
    }
  }
}

impl LoaderConfig {
  pub fn assembler(&self) -> AssemblerConfig {
    AssemblerConfig::with_dimensions(self.dimensions.iter().copied())
  }
}

// ─── ColumnMapping ────────────────────────────────────────────────────────────

/// Maps an export's own headers onto canonical field names.
///
/// Headers are matched case-insensitively after trimming. A header with no
/// entry keeps its own (trimmed) name, so an export that already uses the
/// canonical names needs no mapping at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<String, String>);

impl ColumnMapping {
  pub fn canonical<'a>(&'a self, header: &'a str) -> &'a str {
    let header = header.trim();
    self
      .0
      .iter()
      .find(|(raw, _)| raw.trim().eq_ignore_ascii_case(header))
      .map(|(_, canonical)| canonical.as_str())
      .unwrap_or(header)
  }

  /// Rename every field of `record` and collect it into a [`RawRow`].
  ///
  /// When two headers map to the same canonical name, the later non-blank
  /// value wins.
  pub fn apply<I>(&self, record: I) -> RawRow
  where
    I: IntoIterator<Item = (String, String)>,
  {
    let mut row = RawRow::new();
    for (header, value) in record {
      let column = self.canonical(&header);
      if row.get(column).is_some() && value.trim().is_empty() {
        continue;
      }
      row.insert(column, value);
    }
    row
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnMapping {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}
