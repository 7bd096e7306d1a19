//! The `WarehouseSink` trait and [`publish`].
//!
//! The trait is implemented by persistence backends (e.g.
//! `billstar-store-sqlite`). The core only hands over fully-resolved
//! records; it knows nothing about SQL, files, or wire formats.

use std::future::Future;

use serde::Serialize;

use crate::{
  dimension::{Account, Organisation, Provider, Resource},
  fact::Usage,
  period::Period,
  warehouse::Warehouse,
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Accepts resolved records and stores them.
///
/// Each call is a single-record write and must be atomic: no reader may see
/// a half-written record. Writing a record that is already stored under the
/// same code must succeed without creating a second copy.
///
/// All methods return `Send` futures so the trait can be driven from a
/// multi-threaded tokio runtime.
pub trait WarehouseSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn put_period<'a>(
    &'a self,
    period: &'a Period,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn put_organisation<'a>(
    &'a self,
    organisation: &'a Organisation,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn put_provider<'a>(
    &'a self,
    provider: &'a Provider,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn put_account<'a>(
    &'a self,
    account: &'a Account,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn put_resource<'a>(
    &'a self,
    resource: &'a Resource,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn put_usage<'a>(
    &'a self,
    usage: &'a Usage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Publish ─────────────────────────────────────────────────────────────────

/// How many records [`publish`] handed to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishSummary {
  pub periods:       usize,
  pub organisations: usize,
  pub providers:     usize,
  pub accounts:      usize,
  pub resources:     usize,
  pub usages:        usize,
}

/// Write every dimension record in `warehouse`, then every fact.
///
/// Parents are written before children (organisations before accounts,
/// accounts before resources) and all dimensions before facts, so a sink
/// that enforces foreign keys never sees a dangling code.
pub async fn publish<S: WarehouseSink>(
  sink: &S,
  warehouse: &Warehouse,
  facts: &[Usage],
) -> Result<PublishSummary, S::Error> {
  let mut summary = PublishSummary::default();

  for period in warehouse.periods.resolver().list_by_date() {
    sink.put_period(period).await?;
    summary.periods += 1;
  }
  for organisation in warehouse.organisations.list_all() {
    sink.put_organisation(organisation).await?;
    summary.organisations += 1;
  }
  for provider in warehouse.providers.list_all() {
    sink.put_provider(provider).await?;
    summary.providers += 1;
  }
  for account in warehouse.accounts.list_all() {
    sink.put_account(account).await?;
    summary.accounts += 1;
  }
  for resource in warehouse.resources.list_all() {
    sink.put_resource(resource).await?;
    summary.resources += 1;
  }
  for usage in facts {
    sink.put_usage(usage).await?;
    summary.usages += 1;
  }

  tracing::debug!(?summary, "published warehouse");
  Ok(summary)
}
