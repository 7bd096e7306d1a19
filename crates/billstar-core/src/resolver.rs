//! [`DimensionResolver`]: get-or-create by natural key.

use std::marker::PhantomData;

use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  dimension::Dimension,
  period::Period,
  store::{DimensionStore, InMemoryStore},
};

/// Owns the table for one dimension type and guarantees exactly one record
/// per natural key. A code is assigned the first time a key is seen and
/// never changes afterwards.
///
/// Not thread-safe by contract: `get_or_create` is a read followed by a
/// write. Wrap the resolver in a lock if it must be shared.
#[derive(Debug, Clone)]
pub struct DimensionResolver<D: Dimension, S: DimensionStore<D> = InMemoryStore<D>> {
  store:   S,
  _marker: PhantomData<D>,
}

impl<D: Dimension, S: DimensionStore<D> + Default> Default for DimensionResolver<D, S> {
  fn default() -> Self { Self::new(S::default()) }
}

impl<D: Dimension, S: DimensionStore<D>> DimensionResolver<D, S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      _marker: PhantomData,
    }
  }

  /// Return the record for `key`, creating it on first sight.
  ///
  /// The flag is `true` only when a record was created by this call.
  pub fn get_or_create(&mut self, key: &D::Key) -> Result<(D, bool)> {
    self.get_or_create_with_parent(key, None)
  }

  /// Like [`Self::get_or_create`], recording `parent` if the record is new.
  /// An existing record keeps the parent it was created with.
  pub fn get_or_create_with_parent(
    &mut self,
    key: &D::Key,
    parent: Option<Uuid>,
  ) -> Result<(D, bool)> {
    if let Some(existing) = self.store.get(key) {
      return Ok((existing.clone(), false));
    }

    let record = D::build(Uuid::new_v4(), key, parent)?;
    self.store.insert(record.clone())?;
    debug!(kind = %D::KIND, code = %record.code(), ?key, "created dimension record");
    Ok((record, true))
  }

  /// Read-only lookup.
  pub fn find_by_natural_key(&self, key: &D::Key) -> Option<&D> { self.store.get(key) }

  /// All records in insertion order.
  pub fn list_all(&self) -> Vec<&D> { self.store.iter().collect() }

  pub fn min_max_natural_key(&self) -> Option<(D::Key, D::Key)> { self.store.key_bounds() }

  /// Records with natural keys in `from..=to`, in key order.
  pub fn range(&self, from: &D::Key, to: &D::Key) -> Vec<&D> { self.store.range(from, to) }

  /// Preload records that already carry codes, typically read back from a
  /// persistence backend.
  ///
  /// A record identical to one already held is skipped. A record whose
  /// natural key is held under a different code is a conflict. Returns the
  /// number of records added.
  pub fn seed(&mut self, records: impl IntoIterator<Item = D>) -> Result<usize> {
    let mut added = 0;
    for record in records {
      let key = record.natural_key();
      match self.store.get(&key) {
        Some(held) if held.code() == record.code() => continue,
        Some(_) => {
          return Err(Error::DuplicateNaturalKeyRace {
            kind: D::KIND,
            key:  format!("{key:?}"),
          });
        }
        None => {
          self.store.insert(record)?;
          added += 1;
        }
      }
    }
    Ok(added)
  }

  pub fn len(&self) -> usize { self.store.len() }

  pub fn is_empty(&self) -> bool { self.store.is_empty() }
}

impl<S: DimensionStore<Period>> DimensionResolver<Period, S> {
  /// All periods sorted by `period_date` ascending.
  pub fn list_by_date(&self) -> Vec<&Period> {
    let mut periods = self.list_all();
    periods.sort_by_key(|p| p.period_date);
    periods
  }
}
