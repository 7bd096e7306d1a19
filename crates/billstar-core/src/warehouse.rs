//! [`Warehouse`]: the set of dimension tables a load resolves against.
//!
//! The host builds one, optionally seeds it from storage, and passes it
//! explicitly to [`crate::assembler::UsageAssembler`] and
//! [`crate::sink::publish`]. Nothing in the core holds global state.
//!
//! The warehouse is the in-memory working set of a load: its tables are
//! always [`crate::store::InMemoryStore`]s. Another
//! [`crate::store::DimensionStore`] plugs in one level down, through
//! [`DimensionResolver::new`] and [`PeriodLoader::new`]. Durable storage is
//! reached through [`crate::sink::WarehouseSink`], and earlier runs come back
//! in through [`DimensionResolver::seed`].

use crate::{
  dimension::{Account, Organisation, Provider, Resource},
  loader::{GapPolicy, PeriodLoader},
  resolver::DimensionResolver,
};

#[derive(Debug, Clone, Default)]
pub struct Warehouse {
  pub periods:       PeriodLoader,
  pub organisations: DimensionResolver<Organisation>,
  pub providers:     DimensionResolver<Provider>,
  pub accounts:      DimensionResolver<Account>,
  pub resources:     DimensionResolver<Resource>,
}

impl Warehouse {
  pub fn new(policy: GapPolicy) -> Self {
    Self {
      periods: PeriodLoader::default().with_policy(policy),
      ..Self::default()
    }
  }

  /// Record counts per dimension.
  pub fn counts(&self) -> DimensionCounts {
    DimensionCounts {
      periods:       self.periods.resolver().len(),
      organisations: self.organisations.len(),
      providers:     self.providers.len(),
      accounts:      self.accounts.len(),
      resources:     self.resources.len(),
    }
  }
}

/// Number of records held per dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DimensionCounts {
  pub periods:       usize,
  pub organisations: usize,
  pub providers:     usize,
  pub accounts:      usize,
  pub resources:     usize,
}
