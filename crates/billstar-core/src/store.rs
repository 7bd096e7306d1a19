//! The [`DimensionStore`] trait and its in-memory implementation.
//!
//! A store is a plain keyed table. It does not assign codes or derive
//! attributes; it only holds records and answers lookups. Resolution logic
//! lives in [`crate::resolver`], so any backend that satisfies this trait
//! gets the same deduplication guarantees.

use std::collections::BTreeMap;

use crate::{Error, Result, dimension::Dimension};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A synchronous key-value table for one dimension type.
pub trait DimensionStore<D: Dimension> {
  /// Look up a record by natural key. Never mutates.
  fn get(&self, key: &D::Key) -> Option<&D>;

  /// Store a new record.
  ///
  /// Fails with [`Error::DuplicateNaturalKeyRace`] if a record with the same
  /// natural key is already present.
  fn insert(&mut self, record: D) -> Result<()>;

  /// All records in insertion order.
  fn iter(&self) -> impl Iterator<Item = &D> + '_;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool { self.len() == 0 }

  /// The smallest and largest natural keys, or `None` when empty.
  fn key_bounds(&self) -> Option<(D::Key, D::Key)> {
    let mut keys = self.iter().map(Dimension::natural_key);
    let first = keys.next()?;
    Some(keys.fold((first.clone(), first), |(lo, hi), k| {
      if k < lo {
        (k, hi)
      } else if k > hi {
        (lo, k)
      } else {
        (lo, hi)
      }
    }))
  }

  /// Records whose natural key lies in `from..=to`, in key order.
  fn range(&self, from: &D::Key, to: &D::Key) -> Vec<&D> {
    let mut hits: Vec<&D> = self
      .iter()
      .filter(|d| {
        let k = d.natural_key();
        &k >= from && &k <= to
      })
      .collect();
    hits.sort_by_key(|d| d.natural_key());
    hits
  }
}

// ─── In-memory ───────────────────────────────────────────────────────────────

/// A [`DimensionStore`] held entirely in memory.
///
/// Records live in a `Vec` (insertion order) with a `BTreeMap` index from
/// natural key to position, so lookups, bounds and range scans are all
/// logarithmic.
#[derive(Debug, Clone)]
pub struct InMemoryStore<D: Dimension> {
  records: Vec<D>,
  index:   BTreeMap<D::Key, usize>,
}

impl<D: Dimension> Default for InMemoryStore<D> {
  fn default() -> Self {
    Self {
      records: Vec::new(),
      index:   BTreeMap::new(),
    }
  }
}

impl<D: Dimension> InMemoryStore<D> {
  pub fn new() -> Self { Self::default() }
}

impl<D: Dimension> DimensionStore<D> for InMemoryStore<D> {
  fn get(&self, key: &D::Key) -> Option<&D> {
    self.index.get(key).map(|&i| &self.records[i])
  }

  fn insert(&mut self, record: D) -> Result<()> {
    let key = record.natural_key();
    if self.index.contains_key(&key) {
      return Err(Error::DuplicateNaturalKeyRace {
        kind: D::KIND,
        key:  format!("{key:?}"),
      });
    }
    self.index.insert(key, self.records.len());
    self.records.push(record);
    Ok(())
  }

  fn iter(&self) -> impl Iterator<Item = &D> + '_ { self.records.iter() }

  fn len(&self) -> usize { self.records.len() }

  fn key_bounds(&self) -> Option<(D::Key, D::Key)> {
    let (lo, _) = self.index.first_key_value()?;
    let (hi, _) = self.index.last_key_value()?;
    Some((lo.clone(), hi.clone()))
  }

  fn range(&self, from: &D::Key, to: &D::Key) -> Vec<&D> {
    if from > to {
      return Vec::new();
    }
    self
      .index
      .range(from.clone()..=to.clone())
      .map(|(_, &i)| &self.records[i])
      .collect()
  }
}
