//! Tag name to id resolution against one target.

use std::collections::{BTreeSet, HashMap};

use tagarr_model::TagId;
use tracing::{info, warn};

use crate::error::Result;
use crate::retry::{RetryPolicy, retry};
use crate::targets::TargetClient;

/// Resolves human-readable tag names to a target's numeric tag ids,
/// creating missing tags on demand. Holds no state across calls.
pub struct TagResolver<'a, C: TargetClient + ?Sized> {
    client: &'a C,
    retry: RetryPolicy,
    dry_run: bool,
}

impl<'a, C: TargetClient + ?Sized> TagResolver<'a, C> {
    pub fn new(client: &'a C, retry: RetryPolicy, dry_run: bool) -> Self {
        Self {
            client,
            retry,
            dry_run,
        }
    }

    /// Resolve every name in `names`, creating tags that do not exist yet.
    ///
    /// A name whose creation fails is simply absent from the returned map;
    /// dependents treat it as not applicable. Re-resolving an existing name
    /// is a pure lookup with no mutation.
    pub async fn resolve(&self, names: &BTreeSet<String>) -> Result<HashMap<String, TagId>> {
        let mut resolved = HashMap::new();
        if names.is_empty() {
            return Ok(resolved);
        }

        // One full fetch per call; never paginated incrementally.
        let existing = retry(self.retry, "list tags", || self.client.list_tags()).await?;
        let by_name: HashMap<String, TagId> = existing
            .into_iter()
            .map(|tag| (tag.name.to_lowercase(), tag.id))
            .collect();

        for name in names {
            if let Some(id) = by_name.get(&name.to_lowercase()) {
                resolved.insert(name.clone(), *id);
                continue;
            }

            if self.dry_run {
                info!(tag = %name, target = %self.client.name(), "dry run: would create tag");
                continue;
            }

            match retry(self.retry, "create tag", || self.client.create_tag(name)).await {
                Ok(tag) => {
                    info!(tag = %tag.name, id = %tag.id, target = %self.client.name(), "created tag");
                    resolved.insert(name.clone(), tag.id);
                }
                Err(err) => {
                    // Dependents of this name treat it as not applicable.
                    warn!(
                        tag = %name,
                        target = %self.client.name(),
                        error = %err,
                        "tag creation failed; items will not carry it this run"
                    );
                }
            }
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::targets::MockTargetClient;
    use std::time::Duration;
    use tagarr_model::Tag;

    fn names(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(1, Duration::from_millis(1))
    }

    fn existing_tags() -> Vec<Tag<TagId>> {
        vec![
            Tag::new(TagId(1), "tagarr"),
            Tag::new(TagId(2), "trending"),
        ]
    }

    #[tokio::test]
    async fn existing_names_resolve_without_mutation() {
        let mut client = MockTargetClient::new();
        client.expect_name().return_const("radarr".to_string());
        client
            .expect_list_tags()
            .times(1)
            .returning(|| Ok(existing_tags()));
        client.expect_create_tag().never();

        let resolver = TagResolver::new(&client, fast_retry(), false);
        let map = resolver
            .resolve(&names(&["tagarr", "Trending"]))
            .await
            .unwrap();

        assert_eq!(map.get("tagarr"), Some(&TagId(1)));
        // Lookup is case-insensitive against the target's labels.
        assert_eq!(map.get("Trending"), Some(&TagId(2)));
    }

    #[tokio::test]
    async fn missing_names_are_created() {
        let mut client = MockTargetClient::new();
        client.expect_name().return_const("radarr".to_string());
        client
            .expect_list_tags()
            .times(1)
            .returning(|| Ok(existing_tags()));
        client
            .expect_create_tag()
            .withf(|name| name == "classics")
            .times(1)
            .returning(|_| Ok(Tag::new(TagId(9), "classics")));

        let resolver = TagResolver::new(&client, fast_retry(), false);
        let map = resolver.resolve(&names(&["classics"])).await.unwrap();

        assert_eq!(map.get("classics"), Some(&TagId(9)));
    }

    #[tokio::test]
    async fn creation_failure_leaves_name_unresolved() {
        let mut client = MockTargetClient::new();
        client.expect_name().return_const("radarr".to_string());
        client
            .expect_list_tags()
            .times(1)
            .returning(|| Ok(existing_tags()));
        client.expect_create_tag().returning(|_| {
            Err(EngineError::Api {
                status: 500,
                message: "boom".into(),
            })
        });

        let resolver = TagResolver::new(&client, fast_retry(), false);
        let map = resolver
            .resolve(&names(&["trending", "doomed"]))
            .await
            .unwrap();

        // The failing name is absent, the rest resolve normally.
        assert_eq!(map.get("trending"), Some(&TagId(2)));
        assert!(!map.contains_key("doomed"));
    }

    #[tokio::test]
    async fn dry_run_skips_creation() {
        let mut client = MockTargetClient::new();
        client.expect_name().return_const("radarr".to_string());
        client
            .expect_list_tags()
            .times(1)
            .returning(|| Ok(existing_tags()));
        client.expect_create_tag().never();

        let resolver = TagResolver::new(&client, fast_retry(), true);
        let map = resolver
            .resolve(&names(&["tagarr", "brand-new"]))
            .await
            .unwrap();

        assert_eq!(map.get("tagarr"), Some(&TagId(1)));
        assert!(!map.contains_key("brand-new"));
    }
}
