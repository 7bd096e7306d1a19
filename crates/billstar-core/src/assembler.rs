//! [`UsageAssembler`]: raw rows in, [`Usage`] facts out.
//!
//! Each row's period goes through the [`crate::loader::PeriodLoader`] (so
//! missing days are filled), each configured dimension through its
//! resolver, and the resulting fact carries codes only. Facts are never
//! deduplicated; dimensions always are.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  dimension::{Dimension, DimensionKind, ResourceKey},
  fact::{RawRow, Usage, columns},
  resolver::DimensionResolver,
  store::DimensionStore,
  warehouse::Warehouse,
};

// ─── Config ──────────────────────────────────────────────────────────────────

/// Which dimensions, besides the period, every row must reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerConfig {
  #[serde(default = "default_dimensions")]
  pub dimensions: Vec<DimensionKind>,
}

fn default_dimensions() -> Vec<DimensionKind> { vec![DimensionKind::Resource] }

impl Default for AssemblerConfig {
  fn default() -> Self {
    Self {
      dimensions: default_dimensions(),
    }
  }
}

impl AssemblerConfig {
  pub fn with_dimensions(dimensions: impl IntoIterator<Item = DimensionKind>) -> Self {
    Self {
      dimensions: dimensions.into_iter().collect(),
    }
  }

  pub fn includes(&self, kind: DimensionKind) -> bool { self.dimensions.contains(&kind) }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// A row that could not be turned into a fact.
#[derive(Debug)]
pub struct RowRejection {
  /// Zero-based position in the input.
  pub row:   usize,
  pub error: Error,
}

/// The outcome of one [`UsageAssembler::assemble`] call.
#[derive(Debug, Default)]
pub struct AssemblyReport {
  /// Facts in input order.
  pub facts:    Vec<Usage>,
  pub rejected: Vec<RowRejection>,
}

// ─── Assembler ───────────────────────────────────────────────────────────────

/// Natural keys and measures pulled out of one row before anything is
/// resolved, so a rejected row creates no dimension records beyond its
/// period.
struct RowKeys<'r> {
  org:      Option<String>,
  provider: Option<String>,
  account:  Option<String>,
  resource: Option<ResourceKey>,
  amount:   f64,
  currency: &'r str,
}

#[derive(Debug, Clone, Default)]
pub struct UsageAssembler {
  config: AssemblerConfig,
}

impl UsageAssembler {
  pub fn new(config: AssemblerConfig) -> Self { Self { config } }

  pub fn config(&self) -> &AssemblerConfig { &self.config }

  /// Turn `rows` into facts against `warehouse`.
  ///
  /// Rows with a missing dimension key or an unparseable amount are
  /// rejected and listed in the report; the rest of the batch continues. A
  /// row with no period name is rejected the same way and creates nothing.
  /// A malformed period name aborts the call. Records created before an
  /// abort stay in the warehouse.
  pub fn assemble<'r, I>(&self, warehouse: &mut Warehouse, rows: I) -> Result<AssemblyReport>
  where
    I: IntoIterator<Item = &'r RawRow>,
  {
    let mut report = AssemblyReport::default();

    for (index, row) in rows.into_iter().enumerate() {
      let outcome = match row.get(columns::PERIOD_NAME) {
        Some(period_name) => {
          let period = warehouse.periods.load_one(period_name)?;
          self
            .extract(index, row)
            .and_then(|keys| self.resolve(warehouse, index, period.period_code, keys))
        }
        None => Err(Error::UnknownDimensionReference {
          kind: DimensionKind::Period,
          row:  index,
        }),
      };

      match outcome {
        Ok(fact) => report.facts.push(fact),
        Err(error) if error.is_row_rejection() => {
          warn!(row = index, %error, "rejected usage row");
          report.rejected.push(RowRejection { row: index, error });
        }
        Err(error) => return Err(error),
      }
    }

    debug!(
      facts = report.facts.len(),
      rejected = report.rejected.len(),
      "assembled usage facts"
    );
    Ok(report)
  }

  fn extract<'r>(&self, index: usize, row: &'r RawRow) -> Result<RowKeys<'r>> {
    let required = |kind: DimensionKind, column: &str| -> Result<Option<String>> {
      if !self.config.includes(kind) {
        return Ok(None);
      }
      row
        .get(column)
        .map(|v| Some(v.to_owned()))
        .ok_or(Error::UnknownDimensionReference { kind, row: index })
    };

    let org = required(DimensionKind::Organisation, columns::ORG_NAME)?;
    let provider = required(DimensionKind::Provider, columns::PROVIDER_NAME)?;
    let account = required(DimensionKind::Account, columns::ACCOUNT_ID)?;
    let resource = required(DimensionKind::Resource, columns::RESOURCE_ID)?.map(|id| {
      ResourceKey::new(id, row.get(columns::RESOURCE_NAME).unwrap_or_default())
    });

    let raw_amount = row.get(columns::USAGE_AMOUNT).unwrap_or_default();
    let amount = raw_amount
      .parse::<f64>()
      .ok()
      .filter(|a| a.is_finite())
      .ok_or_else(|| Error::InvalidAmount {
        row:   index,
        value: raw_amount.to_owned(),
      })?;

    Ok(RowKeys {
      org,
      provider,
      account,
      resource,
      amount,
      currency: row.get(columns::USAGE_CURRENCY).unwrap_or_default(),
    })
  }

  fn resolve(
    &self,
    warehouse: &mut Warehouse,
    index: usize,
    period_code: Uuid,
    keys: RowKeys<'_>,
  ) -> Result<Usage> {
    let org_code = resolve_code(&mut warehouse.organisations, keys.org.as_ref(), None, index)?;
    let provider_code =
      resolve_code(&mut warehouse.providers, keys.provider.as_ref(), None, index)?;
    let account_code =
      resolve_code(&mut warehouse.accounts, keys.account.as_ref(), org_code, index)?;
    let resource_code = resolve_code(
      &mut warehouse.resources,
      keys.resource.as_ref(),
      account_code,
      index,
    )?;

    Ok(Usage {
      usage_code: Uuid::new_v4(),
      period_code,
      org_code,
      provider_code,
      account_code,
      resource_code,
      usage_amount: keys.amount,
      usage_currency: keys.currency.to_owned(),
    })
  }
}

/// Get-or-create `key` and confirm the record is findable under the code
/// that will be written into the fact.
fn resolve_code<D: Dimension, S: DimensionStore<D>>(
  resolver: &mut DimensionResolver<D, S>,
  key: Option<&D::Key>,
  parent: Option<Uuid>,
  row: usize,
) -> Result<Option<Uuid>> {
  let Some(key) = key else {
    return Ok(None);
  };

  let (record, _) = resolver.get_or_create_with_parent(key, parent)?;
  match resolver.find_by_natural_key(key) {
    Some(held) if held.code() == record.code() => Ok(Some(record.code())),
    _ => Err(Error::UnknownDimensionReference { kind: D::KIND, row }),
  }
}
