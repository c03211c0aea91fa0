//! The reconciled belief about external-session validity.
//!
//! A [`Belief`] is an immutable value: every reconciliation pass produces a
//! new one that replaces the previous wholesale, so readers never observe a
//! torn update. Constructors take the observation time explicitly; callers
//! own the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signal::{SignalKind, Tristate};

/// Which oracle (or override) last determined the belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeliefSource {
    LiveVerify,
    CachedStatus,
    StatusFile,
    ForceOverride,
    Unknown,
}

impl From<SignalKind> for BeliefSource {
    fn from(kind: SignalKind) -> Self {
        match kind {
            SignalKind::LiveVerify => Self::LiveVerify,
            SignalKind::CachedStatus => Self::CachedStatus,
            SignalKind::StatusFile => Self::StatusFile,
        }
    }
}

impl BeliefSource {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::LiveVerify => "live verify",
            Self::CachedStatus => "cached status",
            Self::StatusFile => "status file",
            Self::ForceOverride => "manual override",
            Self::Unknown => "unknown",
        }
    }
}

/// The client's single reconciled opinion about session validity.
///
/// `logged_in` and `message` are private and only settable together through
/// the constructors: a consumer can never read a login verdict without its
/// explanatory provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Belief {
    logged_in: bool,
    source: BeliefSource,
    driver_active: Tristate,
    message: String,
    observed_at: DateTime<Utc>,
}

impl Belief {
    /// The belief held before any oracle has been consulted.
    #[must_use]
    pub fn initial(observed_at: DateTime<Utc>) -> Self {
        Self {
            logged_in: false,
            source: BeliefSource::Unknown,
            driver_active: Tristate::Unknown,
            message: "session state not yet checked".to_owned(),
            observed_at,
        }
    }

    /// An oracle confirmed an active session.
    #[must_use]
    pub fn confirmed(
        source: BeliefSource,
        driver_active: Tristate,
        message: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            logged_in: true,
            source,
            driver_active,
            message: message.into(),
            observed_at,
        }
    }

    /// No oracle confirmed an active session.
    #[must_use]
    pub fn denied(
        source: BeliefSource,
        driver_active: Tristate,
        message: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            logged_in: false,
            source,
            driver_active,
            message: message.into(),
            observed_at,
        }
    }

    /// A manual override, held only until the next reconciliation pass.
    #[must_use]
    pub fn overridden(
        logged_in: bool,
        message: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            logged_in,
            source: BeliefSource::ForceOverride,
            driver_active: Tristate::Unknown,
            message: message.into(),
            observed_at,
        }
    }

    #[must_use]
    pub const fn logged_in(&self) -> bool {
        self.logged_in
    }

    #[must_use]
    pub const fn source(&self) -> BeliefSource {
        self.source
    }

    #[must_use]
    pub const fn driver_active(&self) -> Tristate {
        self.driver_active
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// True when this belief came from the self-expiring manual override.
    #[must_use]
    pub const fn is_override(&self) -> bool {
        matches!(self.source, BeliefSource::ForceOverride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_belief_is_logged_out_unknown() {
        let belief = Belief::initial(Utc::now());
        assert!(!belief.logged_in());
        assert_eq!(belief.source(), BeliefSource::Unknown);
        assert_eq!(belief.driver_active(), Tristate::Unknown);
        assert!(!belief.message().is_empty());
    }

    #[test]
    fn verdict_always_carries_provenance() {
        let now = Utc::now();
        let belief = Belief::confirmed(
            BeliefSource::LiveVerify,
            Tristate::Yes,
            "live session confirmed",
            now,
        );
        assert!(belief.logged_in());
        assert_eq!(belief.message(), "live session confirmed");
        assert_eq!(belief.observed_at(), now);
    }

    #[test]
    fn override_is_marked_as_such() {
        let belief = Belief::overridden(true, "forced logged in", Utc::now());
        assert!(belief.is_override());
        assert_eq!(belief.source(), BeliefSource::ForceOverride);
        assert_eq!(belief.driver_active(), Tristate::Unknown);
    }

    #[test]
    fn serialization_roundtrip() {
        let belief = Belief::denied(
            BeliefSource::StatusFile,
            Tristate::No,
            "no oracle confirms an active session",
            Utc::now(),
        );
        let json = serde_json::to_string(&belief).unwrap();
        let restored: Belief = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, belief);
    }
}
