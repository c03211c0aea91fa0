//! Error types for service calls that are allowed to fail loudly.
//!
//! Oracle queries never produce these; they degrade to `Signal { ok: false }`
//! inside the client. Command endpoints (login initiation, profile scrape)
//! do return errors, and the scrape path distinguishes "login required" from
//! every other failure so callers can react differently.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid service base URL {url:?}: {reason}")]
    BadBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {path} failed: {source}")]
    Transport {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned HTTP {status}")]
    Status { path: &'static str, status: StatusCode },

    #[error("{path} returned a malformed response: {source}")]
    Malformed {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("service rejected the request: {0}")]
    Rejected(String),
}

/// Failure modes of a profile scrape.
///
/// Sum type in the spirit of structurally separating outcomes so callers
/// cannot treat an authentication failure as a generic one.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The service answered HTTP 401: the external session is not logged in.
    #[error("login required: the external session is not logged in")]
    LoginRequired,

    /// The service processed the request but declined it.
    #[error("scrape rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ScrapeError {
    /// True when the fix is to (re-)run the external login flow.
    #[must_use]
    pub const fn is_login_required(&self) -> bool {
        matches!(self, Self::LoginRequired)
    }
}
