//! Process-wide belief store with change notifications.

use chrono::Utc;
use tokio::sync::watch;

use prospect_types::Belief;

/// Holds the single current [`Belief`] and notifies subscribers on change.
///
/// The belief is always replaced wholesale, never mutated field by field, so
/// a subscriber can never observe a login verdict without its matching
/// provenance message. There is exactly one writer context (the active
/// reconciliation pass or a manual override), so no lock beyond the watch
/// channel is needed.
#[derive(Debug)]
pub struct BeliefStore {
    tx: watch::Sender<Belief>,
}

impl BeliefStore {
    /// Start with the pre-oracle belief: logged out, source unknown.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Belief::initial(Utc::now()));
        Self { tx }
    }

    /// Snapshot of the current belief.
    #[must_use]
    pub fn current(&self) -> Belief {
        self.tx.borrow().clone()
    }

    /// Replace the current belief and wake subscribers.
    pub fn publish(&self, belief: Belief) {
        let transition = {
            let previous = self.tx.borrow();
            previous.logged_in() != belief.logged_in() || previous.source() != belief.source()
        };
        if transition {
            tracing::info!(
                logged_in = belief.logged_in(),
                source = belief.source().describe(),
                message = belief.message(),
                "session belief changed"
            );
        } else {
            tracing::debug!(
                logged_in = belief.logged_in(),
                source = belief.source().describe(),
                "session belief refreshed"
            );
        }
        self.tx.send_replace(belief);
    }

    /// Subscribe to belief changes. Receivers always see full values.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Belief> {
        self.tx.subscribe()
    }
}

impl Default for BeliefStore {
    fn default() -> Self {
        Self::new()
    }
}
