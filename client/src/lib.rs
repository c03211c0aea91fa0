//! HTTP client for the scraping service.
//!
//! # Architecture
//!
//! The crate is organized around two call classes with different failure
//! contracts:
//!
//! - **Oracle queries** ([`ApiClient::query_live`], [`ApiClient::query_cached`],
//!   [`ApiClient::query_file`], [`ApiClient::force_set`]) return a
//!   [`Signal`] and never fail past this boundary. A transport error, a
//!   non-2xx status, or a malformed payload all degrade to
//!   `Signal { ok: false }` so the reconciliation engine can fall through to
//!   the next oracle.
//! - **Commands** ([`ApiClient::start_login`], [`ApiClient::scrape_profile`])
//!   return `Result`; the scrape path maps HTTP 401 to the dedicated
//!   [`ScrapeError::LoginRequired`] variant.
//!
//! # Endpoints
//!
//! | Operation | Method | Path |
//! |-----------|--------|------|
//! | Live verify | GET | `/api/linkedin/verify-login?_t=<nonce>` |
//! | Cached status | GET | `/api/linkedin/login-status?_t=<nonce>` |
//! | File status | GET | `/api/linkedin/check-status-file?_t=<nonce>` |
//! | Force override | POST | `/api/linkedin/force-login` |
//! | Initiate external login | POST | `/api/run-test-scraper` |
//! | Scrape profile | POST | `/api/linkedin/scrape-profile` |
//!
//! Freshness-sensitive GETs carry a `_t` millisecond nonce so no cache layer
//! between us and the service can serve a stale answer.
//!
//! Each query is a single round trip: no implicit retry. The engine's
//! multi-oracle fallback already provides the resilience a retry loop would,
//! without multiplying in-flight requests.

mod error;
mod wire;

pub use error::{ClientError, ScrapeError};

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use prospect_types::{Lead, ScrapeJob, Signal, SignalKind, Tristate};

const VERIFY_LOGIN_PATH: &str = "/api/linkedin/verify-login";
const LOGIN_STATUS_PATH: &str = "/api/linkedin/login-status";
const STATUS_FILE_PATH: &str = "/api/linkedin/check-status-file";
const FORCE_LOGIN_PATH: &str = "/api/linkedin/force-login";
const START_LOGIN_PATH: &str = "/api/run-test-scraper";
const SCRAPE_PROFILE_PATH: &str = "/api/linkedin/scrape-profile";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the scraping service's JSON API.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client with the default request timeout.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Create a client with an explicit per-request timeout.
    ///
    /// The timeout doubles as the upper bound on how long one oracle query
    /// can stall a reconciliation pass.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|source| ClientError::BadBaseUrl {
            url: base_url.to_owned(),
            reason: source.to_string(),
        })?;
        // A cannot-be-a-base URL (mailto:, data:) parses but cannot take the
        // API paths; reject it here rather than panicking at the first query.
        if base.cannot_be_a_base() {
            return Err(ClientError::BadBaseUrl {
                url: base_url.to_owned(),
                reason: "URL cannot serve as a base for API paths".to_owned(),
            });
        }
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, base })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Live round trip through the automation driver.
    ///
    /// The only oracle that can report `driver_active` with confidence.
    pub async fn query_live(&self) -> Signal {
        match self.get_fresh::<wire::VerifyLoginResponse>(VERIFY_LOGIN_PATH).await {
            Ok(body) => {
                if body.success == Some(false) {
                    tracing::debug!("live verify answered but reported failure");
                    return Signal::failed(SignalKind::LiveVerify);
                }
                Signal::report(
                    SignalKind::LiveVerify,
                    body.logged_in().into(),
                    body.driver_active.into(),
                )
            }
            Err(error) => {
                tracing::debug!(%error, "live verify unreachable");
                Signal::failed(SignalKind::LiveVerify)
            }
        }
    }

    /// The service's in-memory status snapshot.
    pub async fn query_cached(&self) -> Signal {
        match self.get_fresh::<wire::LoginStatusResponse>(LOGIN_STATUS_PATH).await {
            Ok(body) => Signal::report(
                SignalKind::CachedStatus,
                body.logged_in.into(),
                Tristate::Unknown,
            ),
            Err(error) => {
                tracing::debug!(%error, "cached status unreachable");
                Signal::failed(SignalKind::CachedStatus)
            }
        }
    }

    /// Status persisted to disk by the out-of-process login flow.
    pub async fn query_file(&self) -> Signal {
        match self.get_fresh::<wire::StatusFileResponse>(STATUS_FILE_PATH).await {
            Ok(body) => {
                if body.success == Some(false) {
                    tracing::debug!("status file not readable on the service side");
                    return Signal::failed(SignalKind::StatusFile);
                }
                Signal::report(
                    SignalKind::StatusFile,
                    body.logged_in.into(),
                    Tristate::Unknown,
                )
            }
            Err(error) => {
                tracing::debug!(%error, "status file check unreachable");
                Signal::failed(SignalKind::StatusFile)
            }
        }
    }

    /// Write the login status on the service side.
    ///
    /// The returned signal is the authority's echo of the write. It mutates
    /// the service's cached status, so the echo is attributed to
    /// [`SignalKind::CachedStatus`]; the engine treats it as provisional
    /// until the next reconciliation pass corroborates it.
    pub async fn force_set(&self, logged_in: bool, message: &str) -> Signal {
        let request = wire::ForceLoginRequest {
            status: logged_in,
            message: (!message.is_empty()).then_some(message),
        };
        let url = self.endpoint(FORCE_LOGIN_PATH);
        let result = async {
            let response = self
                .http
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|source| ClientError::Transport {
                    path: FORCE_LOGIN_PATH,
                    source,
                })?;
            let status = response.status();
            if !status.is_success() {
                return Err(ClientError::Status {
                    path: FORCE_LOGIN_PATH,
                    status,
                });
            }
            response
                .json::<wire::ForceLoginResponse>()
                .await
                .map_err(|source| ClientError::Malformed {
                    path: FORCE_LOGIN_PATH,
                    source,
                })
        }
        .await;

        match result {
            Ok(body) if body.success != Some(false) => Signal::report(
                SignalKind::CachedStatus,
                body.logged_in.into(),
                Tristate::Unknown,
            ),
            Ok(_) => {
                tracing::warn!("force-login write was rejected by the service");
                Signal::failed(SignalKind::CachedStatus)
            }
            Err(error) => {
                tracing::warn!(%error, "force-login write failed");
                Signal::failed(SignalKind::CachedStatus)
            }
        }
    }

    /// Kick off the out-of-process login flow.
    ///
    /// With `profile_url` set, the service scrapes that profile automatically
    /// once the operator completes the login in the opened browser window.
    /// Returns the service's status message.
    pub async fn start_login(&self, profile_url: Option<&str>) -> Result<String, ClientError> {
        let request = wire::StartLoginRequest { profile_url };
        let response = self
            .http
            .post(self.endpoint(START_LOGIN_PATH))
            .json(&request)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                path: START_LOGIN_PATH,
                source,
            })?;
        let status = response.status();
        let body: wire::StartLoginResponse =
            response
                .json()
                .await
                .map_err(|source| ClientError::Malformed {
                    path: START_LOGIN_PATH,
                    source,
                })?;
        if body.success == Some(true) {
            Ok(body
                .message
                .unwrap_or_else(|| "external login flow started".to_owned()))
        } else if let Some(reason) = body.error.or(body.message) {
            Err(ClientError::Rejected(reason))
        } else {
            Err(ClientError::Status {
                path: START_LOGIN_PATH,
                status,
            })
        }
    }

    /// Scrape one profile through the external session.
    ///
    /// HTTP 401 maps to [`ScrapeError::LoginRequired`]; callers gate on the
    /// current belief first, but the service has the final word.
    pub async fn scrape_profile(&self, job: &ScrapeJob) -> Result<Lead, ScrapeError> {
        let response = self
            .http
            .post(self.endpoint(SCRAPE_PROFILE_PATH))
            .json(job)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                path: SCRAPE_PROFILE_PATH,
                source,
            })?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ScrapeError::LoginRequired);
        }
        match response.json::<wire::ScrapeProfileResponse>().await {
            Ok(body) => {
                if body.success == Some(true) {
                    body.lead.ok_or_else(|| {
                        ScrapeError::Rejected("service reported success without a record".to_owned())
                    })
                } else {
                    Err(ScrapeError::Rejected(body.failure_reason()))
                }
            }
            // Error pages without a JSON body surface as their status code.
            Err(_) if !status.is_success() => Err(ClientError::Status {
                path: SCRAPE_PROFILE_PATH,
                status,
            }
            .into()),
            Err(source) => Err(ClientError::Malformed {
                path: SCRAPE_PROFILE_PATH,
                source,
            }
            .into()),
        }
    }

    /// One nonce-tagged GET, parsed leniently.
    async fn get_fresh<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, ClientError> {
        let mut url = self.endpoint(path);
        url.query_pairs_mut()
            .append_pair("_t", &Utc::now().timestamp_millis().to_string());
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport { path, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { path, status });
        }
        response
            .json()
            .await
            .map_err(|source| ClientError::Malformed { path, source })
    }

    fn endpoint(&self, path: &'static str) -> Url {
        self.base
            .join(path)
            .expect("static API paths always join onto a valid base URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        let err = ApiClient::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::BadBaseUrl { .. }));
    }

    #[test]
    fn rejects_base_url_that_cannot_take_paths() {
        // Parses as a URL but cannot serve as a join base; must fail at
        // construction, not at the first oracle query.
        let err = ApiClient::new("mailto:ops@example.com").unwrap_err();
        match err {
            ClientError::BadBaseUrl { reason, .. } => {
                assert!(reason.contains("cannot serve as a base"));
            }
            other => panic!("expected BadBaseUrl, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_joins_onto_base() {
        let client = ApiClient::new("http://localhost:5000").unwrap();
        assert_eq!(
            client.endpoint(VERIFY_LOGIN_PATH).as_str(),
            "http://localhost:5000/api/linkedin/verify-login"
        );
    }
}
