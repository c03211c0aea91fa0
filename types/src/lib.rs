//! Core domain types for Prospect.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the
//! application: the belief/signal model for session reconciliation and the
//! record types exchanged with the scraping service.

mod belief;
mod lead;
mod signal;

pub use belief::{Belief, BeliefSource};
pub use lead::{Education, Experience, Lead};
pub use signal::{ScrapeJob, Signal, SignalKind, Tristate};
