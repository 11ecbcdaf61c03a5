//! Watchlist source collection.
//!
//! Sources produce desired items; this module drives every configured
//! collector once per run, stamps items with their list's declared tags,
//! merges duplicates, and feeds per-source outcomes to the safety lock.

pub mod json_list;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tagarr_model::{DesiredItem, MediaKind};
use tracing::{info, warn};

use crate::error::Result;
use crate::safety::{FetchOutcome, SourceReport};

pub use json_list::JsonListSource;

/// What one fetch produced.
///
/// Per-item failures never surface as an `Err`; the broken item is omitted
/// and `has_errors` is set. `Err` is reserved for total fetch failure.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub items: Vec<DesiredItem>,
    pub has_errors: bool,
}

/// One configured watchlist source.
#[async_trait]
pub trait SourceCollector: Send + Sync {
    /// Human-readable name for logs and safety reports.
    fn name(&self) -> String;

    /// Which library kind this list feeds.
    fn kind(&self) -> MediaKind;

    /// Tags this list declares for its items; empty for untagged lists.
    fn declared_tags(&self) -> BTreeSet<String>;

    async fn fetch(&self) -> Result<FetchResult>;
}

/// The merged output of one collection pass across all sources.
#[derive(Debug, Default)]
pub struct Collection {
    pub items: Vec<DesiredItem>,
    pub reports: Vec<SourceReport>,
}

impl Collection {
    /// Desired items for one target kind.
    pub fn desired_for(&self, kind: MediaKind) -> Vec<DesiredItem> {
        self.items
            .iter()
            .filter(|item| item.kind == kind)
            .cloned()
            .collect()
    }

    /// Safety reports for the sources feeding one target kind.
    pub fn reports_for(&self, kind: MediaKind, kinds: &HashMap<String, MediaKind>) -> Vec<SourceReport> {
        self.reports
            .iter()
            .filter(|report| kinds.get(&report.name) == Some(&kind))
            .cloned()
            .collect()
    }
}

/// Fetch every source once and merge the results.
///
/// Duplicate items (same kind and primary external id) are merged by tag-set
/// union; the first-seen title and overrides win. Items without a primary id
/// pass through unmerged; they are counted as unusable for the source's
/// safety report and skipped later at ADD time.
pub async fn collect(sources: &[Arc<dyn SourceCollector>]) -> Collection {
    let mut merged: HashMap<(MediaKind, u64), DesiredItem> = HashMap::new();
    let mut unkeyed: Vec<DesiredItem> = Vec::new();
    let mut reports = Vec::new();

    for source in sources {
        let name = source.name();
        let declared = source.declared_tags();
        match source.fetch().await {
            Ok(FetchResult { items, has_errors }) => {
                let claimed = items.len();
                let mut usable = 0usize;
                for mut item in items {
                    item.tags.extend(declared.iter().cloned());
                    match item.primary_id(item.kind) {
                        Some(id) => {
                            usable += 1;
                            merge(&mut merged, (item.kind, id), item);
                        }
                        None => unkeyed.push(item),
                    }
                }
                info!(
                    source = %name,
                    claimed,
                    usable,
                    degraded = has_errors,
                    "source list fetched"
                );
                reports.push(SourceReport {
                    name,
                    tags: declared,
                    outcome: FetchOutcome::Fetched {
                        claimed,
                        usable,
                        degraded: has_errors,
                    },
                });
            }
            Err(err) => {
                warn!(source = %name, error = %err, "source list fetch failed");
                reports.push(SourceReport {
                    name,
                    tags: declared,
                    outcome: FetchOutcome::Failed,
                });
            }
        }
    }

    let mut items: Vec<DesiredItem> = merged.into_values().collect();
    items.extend(unkeyed);
    Collection { items, reports }
}

fn merge(
    merged: &mut HashMap<(MediaKind, u64), DesiredItem>,
    key: (MediaKind, u64),
    item: DesiredItem,
) {
    match merged.entry(key) {
        std::collections::hash_map::Entry::Occupied(mut entry) => {
            let existing = entry.get_mut();
            existing.tags.extend(item.tags);
            if existing.quality_override.is_none() {
                existing.quality_override = item.quality_override;
            }
            if existing.season_selector.is_none() {
                existing.season_selector = item.season_selector;
            }
        }
        std::collections::hash_map::Entry::Vacant(entry) => {
            entry.insert(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use tagarr_model::TmdbId;

    struct FakeSource {
        name: &'static str,
        tags: BTreeSet<String>,
        result: std::sync::Mutex<Option<Result<FetchResult>>>,
    }

    impl FakeSource {
        fn new(name: &'static str, tags: &[&str], result: Result<FetchResult>) -> Arc<Self> {
            Arc::new(Self {
                name,
                tags: tags.iter().map(|s| s.to_string()).collect(),
                result: std::sync::Mutex::new(Some(result)),
            })
        }
    }

    #[async_trait]
    impl SourceCollector for FakeSource {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn kind(&self) -> MediaKind {
            MediaKind::Movies
        }

        fn declared_tags(&self) -> BTreeSet<String> {
            self.tags.clone()
        }

        async fn fetch(&self) -> Result<FetchResult> {
            self.result.lock().unwrap().take().expect("fetched twice")
        }
    }

    fn movie(title: &str, tmdb: u64) -> DesiredItem {
        let mut item = DesiredItem::new(MediaKind::Movies, title);
        item.tmdb_id = Some(TmdbId(tmdb));
        item
    }

    #[tokio::test]
    async fn stamps_declared_tags_onto_items() {
        let source = FakeSource::new(
            "trending",
            &["trending"],
            Ok(FetchResult {
                items: vec![movie("Heat", 949)],
                has_errors: false,
            }),
        );

        let collection = collect(&[source as Arc<dyn SourceCollector>]).await;
        assert_eq!(collection.items.len(), 1);
        assert!(collection.items[0].tags.contains("trending"));
    }

    #[tokio::test]
    async fn merges_duplicates_with_tag_union() {
        let a = FakeSource::new(
            "trending",
            &["trending"],
            Ok(FetchResult {
                items: vec![movie("Heat", 949)],
                has_errors: false,
            }),
        );
        let b = FakeSource::new(
            "classics",
            &["classics"],
            Ok(FetchResult {
                items: vec![movie("Heat", 949)],
                has_errors: false,
            }),
        );

        let collection =
            collect(&[a as Arc<dyn SourceCollector>, b as Arc<dyn SourceCollector>]).await;
        assert_eq!(collection.items.len(), 1);
        let item = &collection.items[0];
        assert!(item.tags.contains("trending") && item.tags.contains("classics"));
    }

    #[tokio::test]
    async fn total_failure_becomes_a_failed_report() {
        let source = FakeSource::new(
            "broken",
            &["broken"],
            Err(EngineError::SourceFetch("connection refused".into())),
        );

        let collection = collect(&[source as Arc<dyn SourceCollector>]).await;
        assert!(collection.items.is_empty());
        assert_eq!(collection.reports.len(), 1);
        assert_eq!(collection.reports[0].outcome, FetchOutcome::Failed);
    }

    #[tokio::test]
    async fn items_without_primary_id_are_not_usable() {
        let mut keyless = DesiredItem::new(MediaKind::Movies, "Obscure");
        keyless.imdb_id = Some("tt0000001".into());
        let source = FakeSource::new(
            "weekly",
            &["weekly"],
            Ok(FetchResult {
                items: vec![keyless],
                has_errors: false,
            }),
        );

        let collection = collect(&[source as Arc<dyn SourceCollector>]).await;
        // The item passes through for logging purposes but counts as
        // unusable, so the safety lock sees claimed=1 usable=0.
        assert_eq!(collection.items.len(), 1);
        match &collection.reports[0].outcome {
            FetchOutcome::Fetched { claimed, usable, .. } => {
                assert_eq!((*claimed, *usable), (1, 0));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
