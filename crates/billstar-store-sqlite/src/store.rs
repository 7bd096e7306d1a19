//! [`SqliteStore`]: the SQLite implementation of [`WarehouseSink`].

use std::path::Path;

use billstar_core::{
  calendar::parse_period_name,
  dimension::{Account, DimensionKind, Organisation, Provider, Resource},
  fact::Usage,
  loader::GapPolicy,
  period::Period,
  sink::WarehouseSink,
  warehouse::Warehouse,
};
use tracing::{debug, warn};

use crate::{
  Result,
  encode::{
    PERIOD_COLUMNS, RawDimension, RawPeriod, RawResource, RawUsage, encode_date,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A billstar warehouse backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("sqlite schema ready");
    Ok(())
  }

  /// Build a [`Warehouse`] holding every persisted dimension record, codes
  /// intact, so a new load resolves against what earlier runs wrote.
  pub async fn load_warehouse(&self, policy: GapPolicy) -> Result<Warehouse> {
    let mut warehouse = Warehouse::new(policy);

    let periods = self.list_periods().await?;
    let organisations = self
      .list_dimension("SELECT org_code, org_name, NULL FROM organisations")
      .await?
      .into_iter()
      .map(RawDimension::into_organisation)
      .collect::<Result<Vec<_>>>()?;
    let providers = self
      .list_dimension("SELECT provider_code, provider_name, NULL FROM providers")
      .await?
      .into_iter()
      .map(RawDimension::into_provider)
      .collect::<Result<Vec<_>>>()?;
    let accounts = self
      .list_dimension("SELECT account_code, account_id, org_code FROM accounts")
      .await?
      .into_iter()
      .map(RawDimension::into_account)
      .collect::<Result<Vec<_>>>()?;
    let resources = self.list_resources().await?;

    warehouse.periods.resolver_mut().seed(periods)?;
    warehouse.organisations.seed(organisations)?;
    warehouse.providers.seed(providers)?;
    warehouse.accounts.seed(accounts)?;
    warehouse.resources.seed(resources)?;

    debug!(counts = ?warehouse.counts(), "hydrated warehouse from sqlite");
    Ok(warehouse)
  }

  /// All stored periods ordered by date.
  pub async fn list_periods(&self) -> Result<Vec<Period>> {
    let sql = format!("SELECT {PERIOD_COLUMNS} FROM periods ORDER BY period_date");
    let raws: Vec<RawPeriod> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawPeriod::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPeriod::into_period).collect()
  }

  /// Stored periods with `from <= period_date <= to`, ordered by date.
  pub async fn periods_between(&self, from: &str, to: &str) -> Result<Vec<Period>> {
    let from_str = encode_date(parse_period_name(from)?);
    let to_str = encode_date(parse_period_name(to)?);
    let sql = format!(
      "SELECT {PERIOD_COLUMNS} FROM periods
       WHERE period_date BETWEEN ?1 AND ?2
       ORDER BY period_date"
    );

    let raws: Vec<RawPeriod> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![from_str, to_str], RawPeriod::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPeriod::into_period).collect()
  }

  /// All stored facts in insertion order.
  pub async fn list_usages(&self) -> Result<Vec<Usage>> {
    let raws: Vec<RawUsage> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT usage_code, period_code, org_code, provider_code,
                  account_code, resource_code, usage_amount, usage_currency
           FROM usages ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawUsage {
              usage_code:     row.get(0)?,
              period_code:    row.get(1)?,
              org_code:       row.get(2)?,
              provider_code:  row.get(3)?,
              account_code:   row.get(4)?,
              resource_code:  row.get(5)?,
              usage_amount:   row.get(6)?,
              usage_currency: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUsage::into_usage).collect()
  }

  pub async fn count_usages(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM usages", [], |r| r.get(0))?))
      .await?;
    Ok(count as usize)
  }

  async fn list_dimension(&self, sql: &'static str) -> Result<Vec<RawDimension>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDimension {
              code:   row.get(0)?,
              key:    row.get(1)?,
              parent: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws)
  }

  async fn list_resources(&self) -> Result<Vec<Resource>> {
    let raws: Vec<RawResource> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT resource_code, resource_id, resource_name, account_code FROM resources",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawResource {
              resource_code: row.get(0)?,
              resource_id:   row.get(1)?,
              resource_name: row.get(2)?,
              account_code:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResource::into_resource).collect()
  }

  /// Run a single-row insert.
  ///
  /// Every statement ends in `ON CONFLICT(<code>) DO NOTHING`, so writing a
  /// record already stored under the same code is a no-op. A clash on a
  /// natural-key `UNIQUE` column means the same key is stored under another
  /// code; `natural_key` names it in the returned
  /// [`billstar_core::Error::DuplicateNaturalKeyRace`].
  async fn insert(
    &self,
    natural_key: Option<(DimensionKind, String)>,
    sql: &'static str,
    params: Vec<Box<dyn rusqlite::ToSql + Send>>,
  ) -> Result<()> {
    let outcome = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(sql, rusqlite::params_from_iter(params.iter().map(|p| p.as_ref()))))
      })
      .await?;

    match (outcome, natural_key) {
      (Ok(_), _) => Ok(()),
      (Err(rusqlite::Error::SqliteFailure(e, _)), Some((kind, key)))
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
      {
        warn!(%kind, %key, "natural key already stored under another code");
        Err(billstar_core::Error::DuplicateNaturalKeyRace { kind, key }.into())
      }
      (Err(e), _) => Err(tokio_rusqlite::Error::from(e).into()),
    }
  }
}

fn boxed<T: rusqlite::ToSql + Send + 'static>(value: T) -> Box<dyn rusqlite::ToSql + Send> {
  Box::new(value)
}

// ─── WarehouseSink impl ──────────────────────────────────────────────────────

impl WarehouseSink for SqliteStore {
  type Error = crate::Error;

  async fn put_period(&self, period: &Period) -> Result<()> {
    self
      .insert(
        Some((DimensionKind::Period, period.period_name.clone())),
        "INSERT INTO periods (
           period_code, period_name, period_date, period_day, period_month,
           period_year, period_quarter, period_day_of_week, period_day_of_year,
           period_week_of_year, period_is_holiday
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(period_code) DO NOTHING",
        vec![
          boxed(encode_uuid(period.period_code)),
          boxed(period.period_name.clone()),
          boxed(encode_date(period.period_date)),
          boxed(period.period_day),
          boxed(period.period_month),
          boxed(period.period_year),
          boxed(period.period_quarter),
          boxed(period.period_day_of_week),
          boxed(period.period_day_of_year),
          boxed(period.period_week_of_year),
          boxed(period.period_is_holiday),
        ],
      )
      .await
  }

  async fn put_organisation(&self, organisation: &Organisation) -> Result<()> {
    self
      .insert(
        Some((DimensionKind::Organisation, organisation.org_name.clone())),
        "INSERT INTO organisations (org_code, org_name) VALUES (?1, ?2)
         ON CONFLICT(org_code) DO NOTHING",
        vec![
          boxed(encode_uuid(organisation.org_code)),
          boxed(organisation.org_name.clone()),
        ],
      )
      .await
  }

  async fn put_provider(&self, provider: &Provider) -> Result<()> {
    self
      .insert(
        Some((DimensionKind::Provider, provider.provider_name.clone())),
        "INSERT INTO providers (provider_code, provider_name) VALUES (?1, ?2)
         ON CONFLICT(provider_code) DO NOTHING",
        vec![
          boxed(encode_uuid(provider.provider_code)),
          boxed(provider.provider_name.clone()),
        ],
      )
      .await
  }

  async fn put_account(&self, account: &Account) -> Result<()> {
    self
      .insert(
        Some((DimensionKind::Account, account.account_id.clone())),
        "INSERT INTO accounts (account_code, account_id, org_code)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(account_code) DO NOTHING",
        vec![
          boxed(encode_uuid(account.account_code)),
          boxed(account.account_id.clone()),
          boxed(account.org_code.map(encode_uuid)),
        ],
      )
      .await
  }

  async fn put_resource(&self, resource: &Resource) -> Result<()> {
    self
      .insert(
        Some((
          DimensionKind::Resource,
          format!("{}/{}", resource.resource_id, resource.resource_name),
        )),
        "INSERT INTO resources (resource_code, resource_id, resource_name, account_code)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(resource_code) DO NOTHING",
        vec![
          boxed(encode_uuid(resource.resource_code)),
          boxed(resource.resource_id.clone()),
          boxed(resource.resource_name.clone()),
          boxed(resource.account_code.map(encode_uuid)),
        ],
      )
      .await
  }

  async fn put_usage(&self, usage: &Usage) -> Result<()> {
    self
      .insert(
        None,
        "INSERT INTO usages (
           usage_code, period_code, org_code, provider_code, account_code,
           resource_code, usage_amount, usage_currency
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(usage_code) DO NOTHING",
        vec![
          boxed(encode_uuid(usage.usage_code)),
          boxed(encode_uuid(usage.period_code)),
          boxed(usage.org_code.map(encode_uuid)),
          boxed(usage.provider_code.map(encode_uuid)),
          boxed(usage.account_code.map(encode_uuid)),
          boxed(usage.resource_code.map(encode_uuid)),
          boxed(usage.usage_amount),
          boxed(usage.usage_currency.clone()),
        ],
      )
      .await
  }
}
