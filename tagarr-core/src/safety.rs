//! The safety lock: decides which tags may justify deletion this run.
//!
//! An incomplete scrape must never silently wipe out previously-synced
//! items. A failing source that declared tags poisons exactly those tags; a
//! failing source with no tags cannot be isolated, so it disables cleanup
//! for the whole target.

use std::collections::BTreeSet;

/// Fetch outcome for one configured source list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetch completed. `claimed` is the number of raw entries the
    /// source reported, `usable` the number that carried a resolvable
    /// external identifier, `degraded` whether the source flagged partial
    /// per-item failures.
    Fetched {
        claimed: usize,
        usable: usize,
        degraded: bool,
    },
    /// Total fetch failure (network, parse).
    Failed,
}

/// What one source list contributed to this run.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub name: String,
    /// Tags the list declares for its items; empty for untagged lists.
    pub tags: BTreeSet<String>,
    pub outcome: FetchOutcome,
}

impl SourceReport {
    /// Whether this list's output cannot be trusted as complete.
    pub fn compromised(&self) -> bool {
        match &self.outcome {
            FetchOutcome::Failed => true,
            FetchOutcome::Fetched {
                claimed,
                usable,
                degraded,
            } => *degraded || (*claimed > 0 && *usable == 0),
        }
    }
}

/// The aggregated safety decision for one target's run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyVerdict {
    /// Tags that must never be used to justify deletion this run. Items
    /// carrying any of these on the target are exempt from cleanup.
    pub unsafe_tags: BTreeSet<String>,
    /// Disables the cleanup phase entirely, regardless of per-item tags.
    pub abort_cleanup: bool,
}

impl SafetyVerdict {
    pub fn is_clean(&self) -> bool {
        self.unsafe_tags.is_empty() && !self.abort_cleanup
    }
}

/// Aggregate per-source outcomes into the run's safety verdict.
pub fn assess(reports: &[SourceReport]) -> SafetyVerdict {
    let mut verdict = SafetyVerdict::default();

    for report in reports {
        if !report.compromised() {
            continue;
        }
        if report.tags.is_empty() {
            // No tag boundary to scope the failure to.
            tracing::warn!(
                source = %report.name,
                "untagged source list is compromised; disabling cleanup for this run"
            );
            verdict.abort_cleanup = true;
        } else {
            tracing::warn!(
                source = %report.name,
                tags = ?report.tags,
                "source list is compromised; its tags are exempt from deletion"
            );
            verdict.unsafe_tags.extend(report.tags.iter().cloned());
        }
    }

    verdict
}
