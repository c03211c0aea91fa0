//! The poller/scheduler that keeps the belief fresh.
//!
//! All triggers (the interval tick, an explicit refresh, a post-action
//! nudge) route through the same single-flight entry point, so concurrent
//! triggers deduplicate instead of fanning out overlapping oracle queries.
//! Teardown invalidates in-flight passes with an epoch counter: a pass that
//! started before shutdown can still finish its network calls but its result
//! is discarded, never applied to the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use prospect_client::{ApiClient, ClientError};
use prospect_types::Belief;

use crate::reconcile::Reconciler;
use crate::store::BeliefStore;

/// Fixed cadence for background reconciliation.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(8);

/// Grace period before re-checking after a session-affecting command, giving
/// the out-of-process automation time to complete.
pub const POST_ACTION_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Inner {
    client: ApiClient,
    reconciler: Reconciler,
    store: BeliefStore,
    /// Single-flight guard: true while a pass is running.
    in_flight: AtomicBool,
    /// Per-pass validity token; bumped on shutdown.
    epoch: AtomicU64,
    closed: AtomicBool,
}

impl Inner {
    /// The single entry point every trigger routes through.
    ///
    /// Returns true when the pass ran to completion and its belief was
    /// applied; false when it was skipped (already in flight, or shut down)
    /// or invalidated mid-flight.
    async fn run_pass(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("reconciliation already in flight; trigger skipped");
            return false;
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        let belief = self.reconciler.pass().await;
        let valid = self.epoch.load(Ordering::Acquire) == epoch;
        if valid {
            self.store.publish(belief);
        } else {
            tracing::debug!("discarding reconciliation result from an invalidated pass");
        }

        self.in_flight.store(false, Ordering::Release);
        valid
    }
}

/// Owns the polling task and the belief store for one consuming view.
///
/// Spawning runs an immediate startup pass and then polls on a fixed
/// interval. [`SessionMonitor::shutdown`] (or dropping the monitor) cancels
/// the timer and invalidates any in-flight pass.
#[derive(Debug)]
pub struct SessionMonitor {
    inner: Arc<Inner>,
    poller: JoinHandle<()>,
}

impl SessionMonitor {
    /// Spawn the monitor with its background polling task.
    #[must_use]
    pub fn spawn(client: ApiClient, interval: Duration) -> Self {
        let inner = Arc::new(Inner {
            reconciler: Reconciler::new(client.clone()),
            client,
            store: BeliefStore::new(),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        });

        let poller = tokio::spawn({
            let inner = Arc::clone(&inner);
            async move {
                // First tick fires immediately: the startup pass.
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    inner.run_pass().await;
                }
            }
        });

        Self { inner, poller }
    }

    /// Current reconciled belief.
    #[must_use]
    pub fn current(&self) -> Belief {
        self.inner.store.current()
    }

    /// Subscribe to belief changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Belief> {
        self.inner.store.subscribe()
    }

    /// Run one on-demand pass now, subject to single-flight deduplication.
    ///
    /// Returns true when the pass ran and its result was applied.
    pub async fn refresh(&self) -> bool {
        self.inner.run_pass().await
    }

    /// Schedule one pass after `delay`, for commands whose effect takes a
    /// while to land on the service side.
    pub fn nudge_after(&self, delay: Duration) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.run_pass().await;
        });
    }

    /// Kick off the out-of-process login flow and schedule the follow-up
    /// status check.
    pub async fn start_login(&self, profile_url: Option<&str>) -> Result<String, ClientError> {
        let message = self.inner.client.start_login(profile_url).await?;
        self.nudge_after(POST_ACTION_DELAY);
        Ok(message)
    }

    /// Manually override the login status, symmetric for both directions.
    ///
    /// The override is published immediately as the current belief but is
    /// self-expiring: the corroboration pass scheduled here (and every later
    /// pass) replaces it with whatever the oracles determine. It can never
    /// permanently pin a belief. The service's echo of the write is treated
    /// as provisional; when the write fails the override is still held
    /// locally, with provenance saying so, and heals on the next cycle.
    pub async fn force(&self, logged_in: bool, message: &str) -> Belief {
        let echo = self.inner.client.force_set(logged_in, message).await;
        let verdict = if logged_in { "logged in" } else { "logged out" };
        let provenance = if echo.ok {
            if message.is_empty() {
                format!("manual override: {verdict} (until next check)")
            } else {
                format!("manual override: {message} (until next check)")
            }
        } else {
            format!("manual override: {verdict}, not confirmed by service (until next check)")
        };

        let belief = Belief::overridden(logged_in, provenance, Utc::now());
        self.inner.store.publish(belief.clone());
        self.nudge_after(POST_ACTION_DELAY);
        belief
    }

    /// Stop polling and invalidate any in-flight pass.
    ///
    /// Idempotent. After this returns no pass result will be applied to the
    /// store, including passes already past their oracle queries.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        self.poller.abort();
        tracing::debug!("session monitor shut down");
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
