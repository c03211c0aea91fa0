//! Session reconciliation engine for Prospect.
//!
//! This crate turns three unreliable, eventually-consistent status oracles
//! into one authoritative [`Belief`] about the external login session, and
//! keeps that belief fresh without a push channel from the service that owns
//! the real state.
//!
//! # Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`Reconciler`] | Ordered oracle reduction with a fixed precedence and degraded-provenance handling |
//! | [`BeliefStore`] | Process-wide current belief behind a watch channel; wholesale atomic replacement |
//! | [`SessionMonitor`] | Interval poller with single-flight deduplication, post-action nudges, and epoch-guarded teardown |
//! | [`can_scrape`] | The pure predicate gating session-dependent actions |
//!
//! # Data flow
//!
//! Monitor triggers → [`Reconciler`] fans out reads → reduction produces a
//! new [`Belief`] → [`BeliefStore`] replaces the current value and notifies
//! subscribers → [`can_scrape`] and observers read the store. A manual
//! override ([`SessionMonitor::force`]) short-circuits the store directly and
//! expires at the next completed pass.

mod gate;
mod monitor;
mod reconcile;
mod store;

pub use gate::can_scrape;
pub use monitor::{DEFAULT_POLL_INTERVAL, POST_ACTION_DELAY, SessionMonitor};
pub use reconcile::Reconciler;
pub use store::BeliefStore;

// Re-export the domain types consumers need alongside the engine.
pub use prospect_client::{ApiClient, ClientError, ScrapeError};
pub use prospect_types::{Belief, BeliefSource, Signal, SignalKind, Tristate};
