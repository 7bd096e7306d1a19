//! [`PeriodLoader`]: turns raw period names into a contiguous, sorted set of
//! [`Period`] records.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Result,
  calendar::{parse_period_name, period_name},
  gap::{gap, missing_within},
  period::Period,
  resolver::DimensionResolver,
  store::{DimensionStore, InMemoryStore},
};

/// How a load treats holes inside the already-stored range.
///
/// Outward extension alone keeps the range contiguous as long as every
/// period goes through the loader. Periods seeded from storage, or created
/// straight through the resolver, can leave holes between `min` and `max`
/// that extension never revisits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
  /// Only extend the stored range outward. Existing holes stay; a requested
  /// name that falls in a hole is created on its own.
  Extend,
  /// After every load, create every missing day in `[min, max]`.
  #[default]
  Backfill,
}

/// Resolves period names through a [`DimensionResolver<Period>`], filling
/// gaps so the stored days stay contiguous.
#[derive(Debug, Clone)]
pub struct PeriodLoader<S: DimensionStore<Period> = InMemoryStore<Period>> {
  resolver: DimensionResolver<Period, S>,
  policy:   GapPolicy,
}

impl<S: DimensionStore<Period> + Default> Default for PeriodLoader<S> {
  fn default() -> Self { Self::new(DimensionResolver::default(), GapPolicy::default()) }
}

impl<S: DimensionStore<Period>> PeriodLoader<S> {
  pub fn new(resolver: DimensionResolver<Period, S>, policy: GapPolicy) -> Self {
    Self { resolver, policy }
  }

  pub fn with_policy(mut self, policy: GapPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn policy(&self) -> GapPolicy { self.policy }

  pub fn resolver(&self) -> &DimensionResolver<Period, S> { &self.resolver }

  pub fn resolver_mut(&mut self) -> &mut DimensionResolver<Period, S> { &mut self.resolver }

  /// Resolve every name in `period_names` and return all stored periods
  /// sorted by date.
  ///
  /// Duplicates are expected and harmless; an empty input returns the
  /// current contents. A malformed name fails the call with
  /// [`crate::Error::InvalidPeriodFormat`]; periods created before it stay.
  pub fn load<I, N>(&mut self, period_names: I) -> Result<Vec<Period>>
  where
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
  {
    let mut created = 0;
    for name in period_names {
      created += self.extend_to(name.as_ref())?;
    }
    if self.policy == GapPolicy::Backfill {
      created += self.backfill()?;
    }
    debug!(created, total = self.resolver.len(), "loaded periods");
    Ok(self.sorted())
  }

  /// Resolve a single name and return its record.
  pub fn load_one(&mut self, period_name: &str) -> Result<Period> {
    let key = period_name.to_owned();
    if let Some(period) = self.resolver.find_by_natural_key(&key) {
      return Ok(period.clone());
    }

    self.extend_to(period_name)?;
    // `extend_to` always stores the requested name; this is a lookup.
    let (period, _) = self.resolver.get_or_create(&key)?;
    Ok(period)
  }

  /// Create every day of `from..=to` and return those periods in order.
  ///
  /// The interval is joined to the stored range the same way [`Self::load`]
  /// joins individual names, and any hole inside the interval is filled
  /// whatever the policy. An interval with `from > to` is empty.
  pub fn load_interval(&mut self, from: &str, to: &str) -> Result<Vec<Period>> {
    let from_date = parse_period_name(from)?;
    let to_date = parse_period_name(to)?;
    if from_date > to_date {
      return Ok(Vec::new());
    }

    self.load([from, to])?;
    let missing = missing_within(from_date, to_date, |d| {
      self.resolver.find_by_natural_key(&period_name(d)).is_some()
    });
    for date in &missing {
      self.resolver.get_or_create(&period_name(*date))?;
    }
    if !missing.is_empty() {
      debug!(filled = missing.len(), from, to, "filled interval holes");
    }
    self.periods_between(from, to)
  }

  /// Stored periods with `from <= period_name <= to`. Creates nothing.
  pub fn periods_between(&self, from: &str, to: &str) -> Result<Vec<Period>> {
    parse_period_name(from)?;
    parse_period_name(to)?;
    Ok(
      self
        .resolver
        .range(&from.to_owned(), &to.to_owned())
        .into_iter()
        .cloned()
        .collect(),
    )
  }

  /// All stored periods sorted by date.
  pub fn sorted(&self) -> Vec<Period> {
    self.resolver.list_by_date().into_iter().cloned().collect()
  }

  /// Create every missing day between the stored bounds. Returns the number
  /// of periods created.
  pub fn backfill(&mut self) -> Result<usize> {
    let Some((min, max)) = self.resolver.min_max_natural_key() else {
      return Ok(0);
    };
    let from = parse_period_name(&min)?;
    let to = parse_period_name(&max)?;

    let held = self.resolver.len();
    let span = (to - from).num_days() as usize + 1;
    if held >= span {
      return Ok(0);
    }

    let missing = missing_within(from, to, |d| {
      self.resolver.find_by_natural_key(&period_name(d)).is_some()
    });
    for date in &missing {
      self.resolver.get_or_create(&period_name(*date))?;
    }
    debug!(filled = missing.len(), %min, %max, "backfilled period holes");
    Ok(missing.len())
  }

  /// Create whatever is needed for `name` to be stored. Returns the number
  /// of periods created.
  fn extend_to(&mut self, name: &str) -> Result<usize> {
    let key = name.to_owned();
    if self.resolver.find_by_natural_key(&key).is_some() {
      return Ok(0);
    }

    let bounds = self.resolver.min_max_natural_key();
    let names = gap(
      bounds.as_ref().map(|(lo, hi)| (lo.as_str(), hi.as_str())),
      name,
    )?;

    let mut created = 0;
    for missing in &names {
      let (_, was_created) = self.resolver.get_or_create(missing)?;
      created += usize::from(was_created);
    }

    // Inside the bounds but absent: an interior hole.
    if names.is_empty() {
      let (_, was_created) = self.resolver.get_or_create(&key)?;
      created += usize::from(was_created);
    }

    if created > 0 {
      debug!(period_name = name, created, "extended period dimension");
    }
    Ok(created)
  }
}
