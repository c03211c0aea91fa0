//! Oracle signals and the jobs they gate.
//!
//! A [`Signal`] is the outcome of querying one status oracle. Oracles are
//! unreliable by design: a transport failure or malformed payload produces
//! `ok == false` rather than an error, and missing fields degrade to
//! [`Tristate::Unknown`] instead of being guessed.

use serde::{Deserialize, Serialize};

/// A boolean claim that an oracle may decline to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    Yes,
    No,
    Unknown,
}

impl Tristate {
    /// True only for a positive claim; `No` and `Unknown` both fail.
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    /// True only for an explicit negative claim.
    #[must_use]
    pub const fn is_no(self) -> bool {
        matches!(self, Self::No)
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}

/// The three status oracles, in reconciliation precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Live round trip through the automation driver.
    LiveVerify,
    /// The service's in-memory status snapshot.
    CachedStatus,
    /// Status persisted to disk by the out-of-process login flow.
    StatusFile,
}

/// Result of one oracle query.
///
/// `logged_in` is only meaningful when `ok` is true, and only
/// [`SignalKind::LiveVerify`] ever populates `driver_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub ok: bool,
    pub logged_in: Tristate,
    pub driver_active: Tristate,
}

impl Signal {
    /// A successfully parsed oracle report.
    #[must_use]
    pub fn report(kind: SignalKind, logged_in: Tristate, driver_active: Tristate) -> Self {
        Self {
            kind,
            ok: true,
            logged_in,
            driver_active,
        }
    }

    /// Transport or parse failure. Carries no claim about the session.
    #[must_use]
    pub fn failed(kind: SignalKind) -> Self {
        Self {
            kind,
            ok: false,
            logged_in: Tristate::Unknown,
            driver_active: Tristate::Unknown,
        }
    }

    /// An oracle that answered and confirms an active session.
    #[must_use]
    pub fn confirms_login(&self) -> bool {
        self.ok && self.logged_in.is_yes()
    }
}

/// A profile scrape request, passed through to the scraping service untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub profile_url: String,
    pub use_existing_session: bool,
    /// Whether the service should persist the resulting record.
    #[serde(rename = "save")]
    pub persist: bool,
}

impl ScrapeJob {
    /// Standard job: reuse the external session and persist the record.
    #[must_use]
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self {
            profile_url: profile_url.into(),
            use_existing_session: true,
            persist: true,
        }
    }
}
