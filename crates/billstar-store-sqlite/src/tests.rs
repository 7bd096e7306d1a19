//! Integration tests for `SqliteStore` against in-memory and on-disk databases.

use billstar_core::{
  assembler::{AssemblerConfig, UsageAssembler},
  dimension::{DimensionKind, Organisation, Resource},
  fact::{RawRow, columns},
  loader::GapPolicy,
  sink::{WarehouseSink, publish},
  warehouse::Warehouse,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn full_config() -> AssemblerConfig {
  AssemblerConfig::with_dimensions([
    DimensionKind::Organisation,
    DimensionKind::Provider,
    DimensionKind::Account,
    DimensionKind::Resource,
  ])
}

fn row(period: &str, account: &str, resource_id: &str, amount: &str) -> RawRow {
  RawRow::new()
    .with(columns::PERIOD_NAME, period)
    .with(columns::ORG_NAME, "acme")
    .with(columns::PROVIDER_NAME, "aws")
    .with(columns::ACCOUNT_ID, account)
    .with(columns::RESOURCE_ID, resource_id)
    .with(columns::RESOURCE_NAME, "ec2")
    .with(columns::USAGE_AMOUNT, amount)
    .with(columns::USAGE_CURRENCY, "USD")
}

fn assemble(warehouse: &mut Warehouse, rows: &[RawRow]) -> Vec<billstar_core::fact::Usage> {
  let report = UsageAssembler::new(full_config())
    .assemble(warehouse, rows)
    .unwrap();
  assert!(report.rejected.is_empty());
  report.facts
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_store_is_empty() {
  let s = store().await;
  assert!(s.list_periods().await.unwrap().is_empty());
  assert!(s.list_usages().await.unwrap().is_empty());
  assert_eq!(s.count_usages().await.unwrap(), 0);
}

#[tokio::test]
async fn reopening_file_keeps_schema_and_rows() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("warehouse.db");

  let mut warehouse = Warehouse::default();
  let facts = assemble(&mut warehouse, &[row("2024-04-01", "a-1", "i-1", "1.5")]);
  {
    let s = SqliteStore::open(&path).await.unwrap();
    publish(&s, &warehouse, &facts).await.unwrap();
  }

  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.count_usages().await.unwrap(), 1);
  assert_eq!(reopened.list_periods().await.unwrap().len(), 1);
}

// ─── Publish ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn publish_writes_every_record() {
  let s = store().await;
  let mut warehouse = Warehouse::default();
  let facts = assemble(
    &mut warehouse,
    &[
      row("2024-04-01", "a-1", "i-1", "1.5"),
      row("2024-04-03", "a-1", "i-2", "2.25"),
    ],
  );

  let summary = publish(&s, &warehouse, &facts).await.unwrap();
  assert_eq!(summary.periods, 3);
  assert_eq!(summary.organisations, 1);
  assert_eq!(summary.providers, 1);
  assert_eq!(summary.accounts, 1);
  assert_eq!(summary.resources, 2);
  assert_eq!(summary.usages, 2);

  let periods = s.list_periods().await.unwrap();
  let names: Vec<_> = periods.iter().map(|p| p.period_name.as_str()).collect();
  assert_eq!(names, ["2024-04-01", "2024-04-02", "2024-04-03"]);

  let usages = s.list_usages().await.unwrap();
  assert_eq!(usages, facts);
}

#[tokio::test]
async fn period_attributes_survive_storage() {
  let s = store().await;
  let mut warehouse = Warehouse::default();
  let facts = assemble(&mut warehouse, &[row("2024-04-20", "a-1", "i-1", "1")]);
  publish(&s, &warehouse, &facts).await.unwrap();

  let stored = s.list_periods().await.unwrap();
  let expected = warehouse.periods.sorted();
  assert_eq!(stored, expected);

  let p = &stored[0];
  assert_eq!(p.period_day_of_week, 6);
  assert_eq!(p.period_quarter, 2);
  assert_eq!(p.period_week_of_year, 16);
  assert!(!p.period_is_holiday);
}

#[tokio::test]
async fn republishing_is_a_no_op() {
  let s = store().await;
  let mut warehouse = Warehouse::default();
  let facts = assemble(&mut warehouse, &[row("2024-04-01", "a-1", "i-1", "1")]);

  publish(&s, &warehouse, &facts).await.unwrap();
  publish(&s, &warehouse, &facts).await.unwrap();

  assert_eq!(s.count_usages().await.unwrap(), 1);
  assert_eq!(s.list_periods().await.unwrap().len(), 1);
}

#[tokio::test]
async fn usage_with_unknown_period_is_refused() {
  let s = store().await;
  let mut warehouse = Warehouse::default();
  let mut facts = assemble(&mut warehouse, &[row("2024-04-01", "a-1", "i-1", "1")]);
  publish(&s, &warehouse, &[]).await.unwrap();

  facts[0].period_code = Uuid::new_v4();
  assert!(s.put_usage(&facts[0]).await.is_err());
  assert_eq!(s.count_usages().await.unwrap(), 0);
}

#[tokio::test]
async fn same_code_twice_is_a_no_op() {
  let s = store().await;
  let acme = Organisation {
    org_code: Uuid::new_v4(),
    org_name: "acme".to_owned(),
  };

  s.put_organisation(&acme).await.unwrap();
  s.put_organisation(&acme).await.unwrap();

  let hydrated = s.load_warehouse(GapPolicy::Backfill).await.unwrap();
  assert_eq!(hydrated.organisations.len(), 1);
}

#[tokio::test]
async fn natural_key_under_new_code_is_a_race() {
  let s = store().await;
  let first = Organisation {
    org_code: Uuid::new_v4(),
    org_name: "acme".to_owned(),
  };
  let second = Organisation {
    org_code: Uuid::new_v4(),
    org_name: "acme".to_owned(),
  };

  s.put_organisation(&first).await.unwrap();
  let err = s.put_organisation(&second).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(billstar_core::Error::DuplicateNaturalKeyRace {
      kind: DimensionKind::Organisation,
      ref key,
    }) if key == "acme"
  ));

  let hydrated = s.load_warehouse(GapPolicy::Backfill).await.unwrap();
  let held = hydrated
    .organisations
    .find_by_natural_key(&"acme".to_owned())
    .unwrap();
  assert_eq!(held.org_code, first.org_code);
}

#[tokio::test]
async fn resource_tuple_under_new_code_is_a_race() {
  let s = store().await;
  let resource = |code| Resource {
    resource_code: code,
    resource_id:   "i-1".to_owned(),
    resource_name: "ec2".to_owned(),
    account_code:  None,
  };

  s.put_resource(&resource(Uuid::new_v4())).await.unwrap();
  let err = s.put_resource(&resource(Uuid::new_v4())).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(billstar_core::Error::DuplicateNaturalKeyRace {
      kind: DimensionKind::Resource,
      ..
    })
  ));
}

#[tokio::test]
async fn publishing_a_stale_warehouse_fails_before_facts() {
  let s = store().await;
  let mut first = Warehouse::default();
  let facts = assemble(&mut first, &[row("2024-04-01", "a-1", "i-1", "1")]);
  publish(&s, &first, &facts).await.unwrap();

  // Built without hydrating, so every dimension gets a fresh code.
  let mut stale = Warehouse::default();
  let stale_facts = assemble(&mut stale, &[row("2024-04-01", "a-1", "i-1", "2")]);
  let err = publish(&s, &stale, &stale_facts).await.unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(billstar_core::Error::DuplicateNaturalKeyRace {
      kind: DimensionKind::Period,
      ..
    })
  ));
  assert_eq!(s.count_usages().await.unwrap(), 1);
}

// ─── Hydration ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn hydrated_warehouse_reuses_codes() {
  let s = store().await;
  let mut first = Warehouse::default();
  let first_facts = assemble(&mut first, &[row("2024-04-01", "a-1", "i-1", "1")]);
  publish(&s, &first, &first_facts).await.unwrap();

  let mut second = s.load_warehouse(GapPolicy::Backfill).await.unwrap();
  assert_eq!(second.counts(), first.counts());

  let second_facts = assemble(&mut second, &[row("2024-04-01", "a-1", "i-1", "4")]);
  let (a, b) = (&first_facts[0], &second_facts[0]);
  assert_eq!(a.period_code, b.period_code);
  assert_eq!(a.org_code, b.org_code);
  assert_eq!(a.provider_code, b.provider_code);
  assert_eq!(a.account_code, b.account_code);
  assert_eq!(a.resource_code, b.resource_code);
  assert_ne!(a.usage_code, b.usage_code);

  publish(&s, &second, &second_facts).await.unwrap();
  assert_eq!(s.count_usages().await.unwrap(), 2);
  assert_eq!(s.list_periods().await.unwrap().len(), 1);
}

#[tokio::test]
async fn hydrated_warehouse_extends_from_stored_bounds() {
  let s = store().await;
  let mut first = Warehouse::default();
  let facts = assemble(&mut first, &[row("2024-04-01", "a-1", "i-1", "1")]);
  publish(&s, &first, &facts).await.unwrap();

  let mut second = s.load_warehouse(GapPolicy::Backfill).await.unwrap();
  let facts = assemble(&mut second, &[row("2024-04-04", "a-1", "i-1", "1")]);
  publish(&s, &second, &facts).await.unwrap();

  let names: Vec<_> = s
    .list_periods()
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.period_name)
    .collect();
  assert_eq!(names, ["2024-04-01", "2024-04-02", "2024-04-03", "2024-04-04"]);
}

#[tokio::test]
async fn hydration_keeps_parent_links() {
  let s = store().await;
  let mut warehouse = Warehouse::default();
  let facts = assemble(&mut warehouse, &[row("2024-04-01", "a-1", "i-1", "1")]);
  publish(&s, &warehouse, &facts).await.unwrap();

  let hydrated = s.load_warehouse(GapPolicy::Backfill).await.unwrap();
  let account = hydrated.accounts.find_by_natural_key(&"a-1".to_owned()).unwrap();
  assert_eq!(account.org_code, facts[0].org_code);

  let resource = hydrated.resources.list_all()[0];
  assert_eq!(resource.account_code, facts[0].account_code);
}

// ─── Range queries ───────────────────────────────────────────────────────────

#[tokio::test]
async fn periods_between_is_inclusive() {
  let s = store().await;
  let mut warehouse = Warehouse::default();
  warehouse.periods.load_interval("2024-02-27", "2024-03-03").unwrap();
  publish(&s, &warehouse, &[]).await.unwrap();

  let names: Vec<_> = s
    .periods_between("2024-02-28", "2024-03-01")
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.period_name)
    .collect();
  assert_eq!(names, ["2024-02-28", "2024-02-29", "2024-03-01"]);
}

#[tokio::test]
async fn periods_between_rejects_bad_bounds() {
  let s = store().await;
  let result = s.periods_between("2024-13-01", "2024-12-31").await;
  assert!(matches!(
    result,
    Err(crate::Error::Core(billstar_core::Error::InvalidPeriodFormat(_)))
  ));
}
