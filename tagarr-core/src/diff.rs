//! Ownership-aware tag diffing.
//!
//! The next tag set for an item is `(current - managed) | desired`: anything
//! outside the managed set is a manual tag and survives untouched, anything
//! inside it is fully replaced by the desired set. Applying the function
//! twice with the same desired set is a no-op.

use std::collections::BTreeSet;

/// Compute the next tag set from the current one.
///
/// Works for any identifier type; arr-style targets call it with numeric tag
/// ids, label-style targets with strings.
pub fn next_tags<T>(current: &BTreeSet<T>, managed: &BTreeSet<T>, desired: &BTreeSet<T>) -> BTreeSet<T>
where
    T: Ord + Clone,
{
    current
        .iter()
        .filter(|tag| !managed.contains(tag))
        .cloned()
        .chain(desired.iter().cloned())
        .collect()
}

/// Case-insensitive variant for label-based targets.
///
/// Membership in `managed` and `desired` is decided on a case-folded key,
/// but preserved manual labels keep their original casing and desired labels
/// are emitted exactly as given.
pub fn next_labels(
    current: &BTreeSet<String>,
    managed: &BTreeSet<String>,
    desired: &BTreeSet<String>,
) -> BTreeSet<String> {
    let managed_folded: BTreeSet<String> = managed.iter().map(|l| l.to_lowercase()).collect();
    let desired_folded: BTreeSet<String> = desired.iter().map(|l| l.to_lowercase()).collect();

    current
        .iter()
        .filter(|label| {
            let folded = label.to_lowercase();
            // Keep manual labels; also keep the current spelling of a label
            // that stays desired, so re-syncs do not flap on casing.
            !managed_folded.contains(&folded) || desired_folded.contains(&folded)
        })
        .cloned()
        .chain(desired.iter().filter(|label| {
            let folded = label.to_lowercase();
            !current.iter().any(|c| c.to_lowercase() == folded)
        }).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<T: Ord + Clone>(items: &[T]) -> BTreeSet<T> {
        items.iter().cloned().collect()
    }

    #[test]
    fn replaces_managed_and_preserves_manual() {
        // current {10,20,99}, managed {10,20,30}, desired {20,30}
        // => 10 removed, 20 kept, 30 added, 99 untouched
        let next = next_tags(&set(&[10, 20, 99]), &set(&[10, 20, 30]), &set(&[20, 30]));
        assert_eq!(next, set(&[20, 30, 99]));
    }

    #[test]
    fn manual_tags_survive_unconditionally() {
        let current = set(&[1, 2, 3, 4]);
        let managed = set(&[1, 2]);
        let next = next_tags(&current, &managed, &BTreeSet::new());
        assert_eq!(next, set(&[3, 4]));
    }

    #[test]
    fn idempotent() {
        let current = set(&[10, 20, 99]);
        let managed = set(&[10, 20, 30]);
        let desired = set(&[20, 30]);

        let once = next_tags(&current, &managed, &desired);
        let twice = next_tags(&once, &managed, &desired);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_managed_only_adds() {
        let next = next_tags(&set(&[5]), &BTreeSet::new(), &set(&[7]));
        assert_eq!(next, set(&[5, 7]));
    }

    #[test]
    fn labels_match_case_insensitively() {
        let current = set(&["Anime".to_string(), "4K".to_string()]);
        let managed = set(&["anime".to_string(), "trending".to_string()]);
        let desired = set(&["trending".to_string()]);

        let next = next_labels(&current, &managed, &desired);
        // "Anime" is managed (case-folded) and not desired => removed;
        // "4K" is manual => kept; "trending" added as given.
        assert_eq!(next, set(&["4K".to_string(), "trending".to_string()]));
    }

    #[test]
    fn labels_keep_current_casing_when_still_desired() {
        let current = set(&["Trending".to_string()]);
        let managed = set(&["trending".to_string()]);
        let desired = set(&["trending".to_string()]);

        let next = next_labels(&current, &managed, &desired);
        // The remote spelling wins; no churn on casing alone.
        assert_eq!(next, set(&["Trending".to_string()]));
    }
}
