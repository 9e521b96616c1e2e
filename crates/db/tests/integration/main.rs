//! Repository integration tests against PostgreSQL.
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test -p strata-db -- --ignored`. Every test works in a fresh
//! random scheme so runs do not interfere.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod fiscal;
mod invoice;
mod ledger;
mod reconciliation;
