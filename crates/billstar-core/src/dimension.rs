//! The [`Dimension`] trait and the non-calendar dimension records.
//!
//! Every dimension follows the same pattern: a synthetic code assigned once,
//! a natural key used for deduplication, and an optional parent code fixed at
//! creation. [`crate::period::Period`] is the calendar dimension and lives in
//! its own module.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Discriminant naming each dimension type.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DimensionKind {
  Period,
  Organisation,
  Provider,
  Account,
  Resource,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A reference entity identified by a natural key.
///
/// Implementors are plain records. Deduplication and code assignment are the
/// job of [`crate::resolver::DimensionResolver`].
pub trait Dimension: Clone + Debug + Send + Sync + 'static {
  /// The natural key. Its `Ord` is the dimension's sort order.
  type Key: Clone + Debug + Ord + Send + Sync + 'static;

  const KIND: DimensionKind;

  fn code(&self) -> Uuid;

  fn natural_key(&self) -> Self::Key;

  fn parent_code(&self) -> Option<Uuid> { None }

  /// Build a fresh record for `key` with the given code.
  ///
  /// Dimensions without a parent ignore `parent`.
  fn build(code: Uuid, key: &Self::Key, parent: Option<Uuid>) -> Result<Self>;
}

// ─── Organisation ────────────────────────────────────────────────────────────

/// The customer organisation that owns the billed usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
  pub org_code: Uuid,
  pub org_name: String,
}

impl Dimension for Organisation {
  type Key = String;

  const KIND: DimensionKind = DimensionKind::Organisation;

  fn code(&self) -> Uuid { self.org_code }

  fn natural_key(&self) -> String { self.org_name.clone() }

  fn build(code: Uuid, key: &String, _parent: Option<Uuid>) -> Result<Self> {
    Ok(Self { org_code: code, org_name: key.clone() })
  }
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// A cloud provider, e.g. `aws`, `azure`, `oci`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
  pub provider_code: Uuid,
  pub provider_name: String,
}

impl Dimension for Provider {
  type Key = String;

  const KIND: DimensionKind = DimensionKind::Provider;

  fn code(&self) -> Uuid { self.provider_code }

  fn natural_key(&self) -> String { self.provider_name.clone() }

  fn build(code: Uuid, key: &String, _parent: Option<Uuid>) -> Result<Self> {
    Ok(Self { provider_code: code, provider_name: key.clone() })
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A billing account (subscription, tenancy, project) at a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub account_code: Uuid,
  pub account_id:   String,
  /// The organisation the account was first seen under.
  pub org_code:     Option<Uuid>,
}

impl Dimension for Account {
  type Key = String;

  const KIND: DimensionKind = DimensionKind::Account;

  fn code(&self) -> Uuid { self.account_code }

  fn natural_key(&self) -> String { self.account_id.clone() }

  fn parent_code(&self) -> Option<Uuid> { self.org_code }

  fn build(code: Uuid, key: &String, parent: Option<Uuid>) -> Result<Self> {
    Ok(Self {
      account_code: code,
      account_id:   key.clone(),
      org_code:     parent,
    })
  }
}

// ─── Resource ────────────────────────────────────────────────────────────────

/// Natural key of a [`Resource`]: the provider-side id plus its display name.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ResourceKey {
  pub resource_id:   String,
  pub resource_name: String,
}

impl ResourceKey {
  pub fn new(resource_id: impl Into<String>, resource_name: impl Into<String>) -> Self {
    Self {
      resource_id:   resource_id.into(),
      resource_name: resource_name.into(),
    }
  }
}

/// A billed cloud resource (instance, bucket, database, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
  pub resource_code: Uuid,
  pub resource_id:   String,
  pub resource_name: String,
  /// The account the resource was first seen under.
  pub account_code:  Option<Uuid>,
}

impl Dimension for Resource {
  type Key = ResourceKey;

  const KIND: DimensionKind = DimensionKind::Resource;

  fn code(&self) -> Uuid { self.resource_code }

  fn natural_key(&self) -> ResourceKey {
    ResourceKey::new(self.resource_id.clone(), self.resource_name.clone())
  }

  fn parent_code(&self) -> Option<Uuid> { self.account_code }

  fn build(code: Uuid, key: &ResourceKey, parent: Option<Uuid>) -> Result<Self> {
    Ok(Self {
      resource_code: code,
      resource_id:   key.resource_id.clone(),
      resource_name: key.resource_name.clone(),
      account_code:  parent,
    })
  }
}
