//! Core types and algorithms for the billstar usage warehouse.
//!
//! Raw billing rows go in; canonical, deduplicated dimension records
//! (periods, organisations, providers, accounts, resources) and usage facts
//! that reference them by code come out. Storage backends live in other
//! crates and plug in through [`sink::WarehouseSink`].
//!
//! This crate is deliberately free of database and CLI dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assembler;
pub mod calendar;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod gap;
pub mod loader;
pub mod period;
pub mod resolver;
pub mod sink;
pub mod store;
pub mod warehouse;

pub use error::{Error, Result};
