//! The action gate for session-dependent commands.

use prospect_types::Belief;

/// Whether session-gated actions (profile scrape) are currently permitted.
///
/// Pure predicate over the reconciled belief; every call site that needs the
/// condition routes through here instead of re-deriving it.
#[must_use]
pub const fn can_scrape(belief: &Belief) -> bool {
    belief.logged_in()
}
