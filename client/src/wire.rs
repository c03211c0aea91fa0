//! Wire payloads for the scraping service's JSON-over-HTTP API.
//!
//! Every response field is `Option` with a default: the payloads are
//! untrusted, and a missing or mistyped field must degrade to "unknown"
//! rather than fail the whole parse.

use serde::{Deserialize, Serialize};

use prospect_types::Lead;

/// `GET /api/linkedin/verify-login`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct VerifyLoginResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub logged_in: Option<bool>,
    #[serde(default)]
    pub driver_active: Option<bool>,
    #[serde(default)]
    pub status: Option<VerifyLoginStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VerifyLoginStatus {
    #[serde(default)]
    pub logged_in: Option<bool>,
}

impl VerifyLoginResponse {
    /// Top-level `logged_in` wins; the nested `status.logged_in` is the
    /// older field some service builds still report.
    pub(crate) fn logged_in(&self) -> Option<bool> {
        self.logged_in
            .or_else(|| self.status.as_ref().and_then(|s| s.logged_in))
    }
}

/// `GET /api/linkedin/login-status`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LoginStatusResponse {
    #[serde(default)]
    pub logged_in: Option<bool>,
}

/// `GET /api/linkedin/check-status-file`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusFileResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub logged_in: Option<bool>,
}

/// `POST /api/linkedin/force-login`
#[derive(Debug, Serialize)]
pub(crate) struct ForceLoginRequest<'a> {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ForceLoginResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub logged_in: Option<bool>,
}

/// `POST /api/run-test-scraper`
#[derive(Debug, Serialize)]
pub(crate) struct StartLoginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartLoginResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /api/linkedin/scrape-profile`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ScrapeProfileResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub lead: Option<Lead>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScrapeProfileResponse {
    pub(crate) fn failure_reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "scrape failed without a reason".to_owned())
    }
}
