//! The ordered oracle reduction.
//!
//! One reconciliation pass queries the oracles sequentially in precedence
//! order and reduces their answers to a single [`Belief`]. Precedence favors
//! the freshest signal (a live round trip through the automation driver) but
//! a transient failure of that check can never produce a false negative on
//! its own: both fallback oracles must also fail to confirm before the pass
//! concludes "not logged in". The extra round trips buy resistance to
//! flapping.

use chrono::Utc;

use prospect_client::ApiClient;
use prospect_types::{Belief, BeliefSource, Tristate};

const MSG_LIVE_CONFIRMED: &str = "live session confirmed";
const MSG_CACHED_CONFIRMED: &str = "cached status confirms login";
const MSG_FILE_RECOVERED: &str = "recovered from persisted status";
const MSG_NO_ORACLE: &str = "no oracle confirms an active session";
const MSG_DEGRADED: &str = "session state may be stale; automation driver inactive";

/// Runs reconciliation passes against the service's status oracles.
#[derive(Debug, Clone)]
pub struct Reconciler {
    client: ApiClient,
}

impl Reconciler {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One full pass. Deterministic: the same ordered oracle answers always
    /// produce the same belief. Never fails; the worst case is a
    /// conservative logged-out belief.
    pub async fn pass(&self) -> Belief {
        let live = self.client.query_live().await;
        if live.confirms_login() {
            return Belief::confirmed(
                BeliefSource::LiveVerify,
                live.driver_active,
                MSG_LIVE_CONFIRMED,
                Utc::now(),
            );
        }

        // A dead driver does not prove the human session is invalid; note the
        // degraded evidence and keep going instead of concluding logged-out.
        let degraded = live.ok && live.logged_in.is_no() && live.driver_active.is_no();
        if degraded {
            tracing::warn!("{MSG_DEGRADED}");
        }

        let cached = self.client.query_cached().await;
        if cached.confirms_login() {
            return Belief::confirmed(
                BeliefSource::CachedStatus,
                Tristate::Unknown,
                MSG_CACHED_CONFIRMED,
                Utc::now(),
            );
        }
        // An explicit "logged out" from the cache is only tentative here; the
        // status file gets a last corroboration attempt either way.

        let file = self.client.query_file().await;
        if file.confirms_login() {
            return Belief::confirmed(
                BeliefSource::StatusFile,
                Tristate::Unknown,
                MSG_FILE_RECOVERED,
                Utc::now(),
            );
        }

        let message = if degraded {
            format!("{MSG_NO_ORACLE}; {MSG_DEGRADED}")
        } else {
            MSG_NO_ORACLE.to_owned()
        };
        Belief::denied(
            BeliefSource::from(file.kind),
            live.driver_active,
            message,
            Utc::now(),
        )
    }
}
