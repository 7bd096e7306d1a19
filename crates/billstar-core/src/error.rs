//! Error types for `billstar-core`.

use thiserror::Error;

use crate::dimension::DimensionKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid period format: {0:?} (expected YYYY-MM-DD)")]
  InvalidPeriodFormat(String),

  /// A record with this natural key appeared between lookup and insert.
  #[error("{kind} with natural key {key} already exists")]
  DuplicateNaturalKeyRace { kind: DimensionKind, key: String },

  #[error("row {row}: no {kind} reference could be resolved")]
  UnknownDimensionReference { kind: DimensionKind, row: usize },

  #[error("row {row}: invalid usage amount {value:?}")]
  InvalidAmount { row: usize, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether the error rejects a single row instead of aborting the batch.
  pub fn is_row_rejection(&self) -> bool {
    matches!(
      self,
      Self::UnknownDimensionReference { .. } | Self::InvalidAmount { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
