//! Per-target reconciliation: resolve context, diff every desired item
//! against the target's inventory, then conditionally clean up orphans.
//!
//! Add/update operations are best-effort and independent; cleanup is
//! strictly sequenced after the item phase and works off the snapshot
//! fetched at the start of the run.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tagarr_model::{
    DesiredItem, ManagedItem, MediaKind, MonitorStrategy, RunSummary, SeasonState, TagId,
};
use tracing::{debug, info, warn};

use crate::diff::next_tags;
use crate::error::{EngineError, Result};
use crate::queue::AdaptiveQueue;
use crate::retry::{RetryPolicy, retry};
use crate::safety::SafetyVerdict;
use crate::tags::TagResolver;
use crate::targets::{AddOutcome, DeleteOptions, ItemUpdate, NewItem, TargetClient};

/// Per-target behavior knobs, fixed for the lifetime of the reconciler.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Tag marking an item as created/managed by this system. Gates every
    /// update and deletion.
    pub ownership_tag: String,
    /// Additional system tags applied to every synced item.
    pub extra_tags: Vec<String>,
    /// Update items even when they do not carry the ownership tag.
    pub update_untagged: bool,
    pub monitor: MonitorStrategy,
    /// Quality profile name used unless a desired item overrides it.
    pub quality_profile: String,
    /// Root folder path for new items; the target's first listed folder
    /// when unset.
    pub root_folder: Option<String>,
    pub search_on_add: bool,
    /// Log and skip every mutating call.
    pub dry_run: bool,
    pub delete: DeleteOptions,
}

impl SyncSettings {
    fn system_tags(&self) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = self.extra_tags.iter().cloned().collect();
        tags.insert(self.ownership_tag.clone());
        tags
    }
}

/// Everything resolved once per run before any item is touched.
#[derive(Debug)]
struct SyncContext {
    tag_map: HashMap<String, TagId>,
    ownership_tag_id: Option<TagId>,
    system_tag_ids: BTreeSet<TagId>,
    /// Every tag id this run may add or remove. Tags outside this set are
    /// manual and survive untouched.
    managed_tag_ids: BTreeSet<TagId>,
    /// Tags that block deletion of any item carrying them.
    unsafe_tag_ids: BTreeSet<TagId>,
    profile_ids: HashMap<String, i32>,
    default_profile_id: i32,
    root_folder: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemAction {
    Added,
    Updated,
    Deleted,
    Unchanged,
    Skipped,
    Failed,
}

/// Reconciles one target against the desired item set. One instantiation per
/// target; all per-run state lives in [`SyncContext`].
pub struct Reconciler<C: TargetClient + ?Sized> {
    client: Arc<C>,
    settings: SyncSettings,
    queue: AdaptiveQueue,
    retry: RetryPolicy,
}

impl<C: TargetClient + ?Sized> Reconciler<C> {
    pub fn new(
        client: Arc<C>,
        settings: SyncSettings,
        queue: AdaptiveQueue,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            settings,
            queue,
            retry,
        }
    }

    /// One full reconciliation pass.
    ///
    /// `declared_tags` is the union of every configured source's declared
    /// tag names for this target kind, independent of what the sources
    /// produced this run: a list that failed outright still contributes its
    /// names, which is what keeps its items protected and its stale tags
    /// strippable.
    ///
    /// Only context resolution failures (missing quality profile or root
    /// folder, unreachable target) abort the pass; individual item failures
    /// are logged, counted, and skipped.
    pub async fn run(
        &self,
        desired: &[DesiredItem],
        declared_tags: &BTreeSet<String>,
        verdict: &SafetyVerdict,
    ) -> Result<RunSummary> {
        let target = self.client.name();
        let kind = self.client.kind();
        info!(
            target = %target,
            kind = %kind,
            desired = desired.len(),
            dry_run = self.settings.dry_run,
            "starting reconciliation pass"
        );

        let ctx = self.build_context(desired, declared_tags, verdict).await?;
        let snapshot = retry(self.retry, "list items", || self.client.list_items()).await?;
        let by_primary: HashMap<u64, &ManagedItem> = snapshot
            .iter()
            .filter_map(|item| item.primary_id(kind).map(|id| (id, item)))
            .collect();

        let mut summary = RunSummary::default();
        let actions = join_all(
            desired
                .iter()
                .map(|item| self.process_item(item, kind, &ctx, &by_primary)),
        )
        .await;
        for action in actions {
            summary_count(&mut summary, action);
        }

        // Cleanup over the stale snapshot, strictly after the item phase.
        if verdict.abort_cleanup {
            warn!(target = %target, "cleanup disabled for this run by the safety lock");
        } else {
            let desired_ids: HashSet<u64> =
                desired.iter().filter_map(|d| d.primary_id(kind)).collect();
            for item in &snapshot {
                if let Some(action) = self.consider_delete(item, kind, &ctx, &desired_ids).await {
                    summary_count(&mut summary, action);
                }
            }
        }

        info!(target = %target, %summary, "reconciliation pass finished");
        Ok(summary)
    }

    async fn build_context(
        &self,
        desired: &[DesiredItem],
        declared_tags: &BTreeSet<String>,
        verdict: &SafetyVerdict,
    ) -> Result<SyncContext> {
        let target = self.client.name();

        let profiles = retry(self.retry, "list quality profiles", || {
            self.client.quality_profiles()
        })
        .await?;
        let profile_ids: HashMap<String, i32> = profiles
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p.id))
            .collect();
        let default_profile_id = *profile_ids
            .get(&self.settings.quality_profile.to_lowercase())
            .ok_or_else(|| {
                EngineError::ConfigResolution(format!(
                    "quality profile '{}' does not exist on {target}",
                    self.settings.quality_profile
                ))
            })?;

        let folders = retry(self.retry, "list root folders", || {
            self.client.root_folders()
        })
        .await?;
        let root_folder = match &self.settings.root_folder {
            Some(path) => folders
                .iter()
                .find(|f| &f.path == path)
                .map(|f| f.path.clone())
                .ok_or_else(|| {
                    EngineError::ConfigResolution(format!(
                        "root folder '{path}' does not exist on {target}"
                    ))
                })?,
            None => folders
                .first()
                .map(|f| f.path.clone())
                .ok_or_else(|| {
                    EngineError::ConfigResolution(format!("no root folders on {target}"))
                })?,
        };

        // Resolve every name this run may manage: the system tags, every
        // source-declared tag, and any per-item extras. Unsafe tags are a
        // subset of the declared set but are included explicitly so the
        // deletion guard never depends on that staying true.
        let mut names = self.settings.system_tags();
        names.extend(declared_tags.iter().cloned());
        names.extend(verdict.unsafe_tags.iter().cloned());
        for item in desired {
            names.extend(item.tags.iter().cloned());
        }
        let resolver = TagResolver::new(self.client.as_ref(), self.retry, self.settings.dry_run);
        let tag_map = resolver.resolve(&names).await?;

        let ownership_tag_id = tag_map.get(&self.settings.ownership_tag).copied();
        if ownership_tag_id.is_none() {
            warn!(
                target = %target,
                tag = %self.settings.ownership_tag,
                "ownership tag unresolved; updates and deletions are disabled this run"
            );
        }
        let system_tag_ids: BTreeSet<TagId> = self
            .settings
            .system_tags()
            .iter()
            .filter_map(|name| tag_map.get(name).copied())
            .collect();
        // Every resolved name is fair game for add/remove this run.
        let managed_tag_ids: BTreeSet<TagId> = tag_map.values().copied().collect();
        let unsafe_tag_ids: BTreeSet<TagId> = verdict
            .unsafe_tags
            .iter()
            .filter_map(|name| tag_map.get(name).copied())
            .collect();

        Ok(SyncContext {
            tag_map,
            ownership_tag_id,
            system_tag_ids,
            managed_tag_ids,
            unsafe_tag_ids,
            profile_ids,
            default_profile_id,
            root_folder,
        })
    }

    /// Tag ids a desired item should end up carrying: the system tags plus
    /// its own declared tags, minus anything that failed to resolve.
    fn desired_tag_ids(&self, item: &DesiredItem, ctx: &SyncContext) -> BTreeSet<TagId> {
        let mut ids = ctx.system_tag_ids.clone();
        ids.extend(item.tags.iter().filter_map(|name| ctx.tag_map.get(name)));
        ids
    }

    fn profile_for(&self, item: &DesiredItem, ctx: &SyncContext) -> i32 {
        match &item.quality_override {
            None => ctx.default_profile_id,
            Some(name) => match ctx.profile_ids.get(&name.to_lowercase()) {
                Some(id) => *id,
                None => {
                    warn!(
                        title = %item.title,
                        profile = %name,
                        "quality override does not exist on target; using default"
                    );
                    ctx.default_profile_id
                }
            },
        }
    }

    async fn process_item(
        &self,
        item: &DesiredItem,
        kind: MediaKind,
        ctx: &SyncContext,
        index: &HashMap<u64, &ManagedItem>,
    ) -> ItemAction {
        let Some(primary) = item.primary_id(kind) else {
            // Not an error; the item simply cannot be synced to this target.
            debug!(title = %item.title, "skipping item without a usable external id");
            return ItemAction::Skipped;
        };

        match index.get(&primary) {
            None => self.add_item(item, kind, ctx).await,
            Some(current) => self.update_item(item, current, kind, ctx).await,
        }
    }

    async fn add_item(&self, item: &DesiredItem, kind: MediaKind, ctx: &SyncContext) -> ItemAction {
        let seasons = match (kind, &item.season_selector) {
            (MediaKind::Series, Some(selector)) => selector
                .iter()
                .map(|number| SeasonState {
                    number: *number,
                    monitored: true,
                })
                .collect(),
            _ => Vec::new(),
        };
        let payload = NewItem {
            title: item.title.clone(),
            tmdb_id: item.tmdb_id.map(|id| id.as_u64()),
            tvdb_id: item.tvdb_id.map(|id| id.as_u64()),
            quality_profile_id: self.profile_for(item, ctx),
            root_folder: ctx.root_folder.clone(),
            tags: self.desired_tag_ids(item, ctx),
            monitored: self.settings.monitor != MonitorStrategy::None,
            seasons,
            search_on_add: self.settings.search_on_add,
        };

        if self.settings.dry_run {
            info!(title = %item.title, "dry run: would add item");
            return ItemAction::Added;
        }

        let result = self
            .queue
            .run(retry(self.retry, "add item", || {
                self.client.add_item(&payload)
            }))
            .await;
        match result {
            Ok(AddOutcome::Added) => {
                info!(title = %item.title, "added item");
                ItemAction::Added
            }
            Ok(AddOutcome::AlreadyExists) => {
                debug!(title = %item.title, "item already present on target");
                ItemAction::Unchanged
            }
            Err(err) => {
                warn!(title = %item.title, error = %err, "add failed; item skipped this run");
                ItemAction::Failed
            }
        }
    }

    async fn update_item(
        &self,
        item: &DesiredItem,
        current: &ManagedItem,
        kind: MediaKind,
        ctx: &SyncContext,
    ) -> ItemAction {
        let owned = ctx
            .ownership_tag_id
            .map(|id| current.has_tag(id))
            .unwrap_or(false);
        if !owned && !self.settings.update_untagged {
            debug!(title = %current.title, "item not owned by this system; leaving untouched");
            return ItemAction::Skipped;
        }

        let mut update = ItemUpdate::default();

        let desired_tags = self.desired_tag_ids(item, ctx);
        let next = next_tags(&current.tags, &ctx.managed_tag_ids, &desired_tags);
        if next != current.tags {
            update.tags = Some(next);
        }

        let want_monitored = self.settings.monitor != MonitorStrategy::None;
        if current.monitored != want_monitored {
            update.monitored = Some(want_monitored);
        }

        if kind == MediaKind::Series && !current.seasons.is_empty() {
            let seasons = desired_seasons(
                &current.seasons,
                item.season_selector.as_ref(),
                self.settings.monitor,
            );
            if seasons != current.seasons {
                update.seasons = Some(seasons);
            }
        }

        if update.is_empty() {
            return ItemAction::Unchanged;
        }

        if self.settings.dry_run {
            info!(title = %current.title, "dry run: would update item");
            return ItemAction::Updated;
        }

        let result = self
            .queue
            .run(retry(self.retry, "update item", || {
                self.client.update_item(current.local_id, &update)
            }))
            .await;
        match result {
            Ok(()) => {
                info!(title = %current.title, "updated item");
                ItemAction::Updated
            }
            Err(err) => {
                warn!(title = %current.title, error = %err, "update failed; item skipped this run");
                ItemAction::Failed
            }
        }
    }

    /// Deletion requires every safety condition at once: the item carries
    /// the ownership tag, nothing desired matches it, none of its current
    /// tags are unsafe, and cleanup is not aborted (checked by the caller).
    async fn consider_delete(
        &self,
        item: &ManagedItem,
        kind: MediaKind,
        ctx: &SyncContext,
        desired_ids: &HashSet<u64>,
    ) -> Option<ItemAction> {
        let ownership = ctx.ownership_tag_id?;
        if !item.has_tag(ownership) {
            return None;
        }
        // Identity cannot be proven without a primary id; never delete.
        let primary = item.primary_id(kind)?;
        if desired_ids.contains(&primary) {
            return None;
        }
        if item.tags.iter().any(|tag| ctx.unsafe_tag_ids.contains(tag)) {
            info!(
                title = %item.title,
                "orphaned item protected by safety lock; not deleting"
            );
            return Some(ItemAction::Skipped);
        }

        if self.settings.dry_run {
            info!(title = %item.title, "dry run: would delete item");
            return Some(ItemAction::Deleted);
        }

        let result = self
            .queue
            .run(retry(self.retry, "delete item", || {
                self.client.delete_item(item.local_id, &self.settings.delete)
            }))
            .await;
        match result {
            Ok(()) => {
                info!(title = %item.title, "deleted orphaned item");
                Some(ItemAction::Deleted)
            }
            Err(err) => {
                warn!(title = %item.title, error = %err, "delete failed; item left in place");
                Some(ItemAction::Failed)
            }
        }
    }
}

fn summary_count(summary: &mut RunSummary, action: ItemAction) {
    match action {
        ItemAction::Added => summary.added += 1,
        ItemAction::Updated => summary.updated += 1,
        ItemAction::Deleted => summary.deleted += 1,
        ItemAction::Unchanged => summary.unchanged += 1,
        ItemAction::Skipped => summary.skipped += 1,
        ItemAction::Failed => summary.failed += 1,
    }
}

/// Desired per-season monitored flags.
///
/// An explicit selector wins outright; otherwise the strategy applies to
/// regular seasons and specials stay unmonitored.
pub fn desired_seasons(
    current: &[SeasonState],
    selector: Option<&BTreeSet<u16>>,
    strategy: MonitorStrategy,
) -> Vec<SeasonState> {
    if let Some(selector) = selector {
        return current
            .iter()
            .map(|season| SeasonState {
                number: season.number,
                monitored: selector.contains(&season.number),
            })
            .collect();
    }

    let latest = current
        .iter()
        .filter(|s| s.number > 0)
        .map(|s| s.number)
        .max();
    current
        .iter()
        .map(|season| {
            let monitored = season.number > 0
                && match strategy {
                    MonitorStrategy::All => true,
                    MonitorStrategy::First => season.number == 1,
                    MonitorStrategy::Latest | MonitorStrategy::Future => {
                        Some(season.number) == latest
                    }
                    MonitorStrategy::None => false,
                };
            SeasonState {
                number: season.number,
                monitored,
            }
        })
        .collect()
}
