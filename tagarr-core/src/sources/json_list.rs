//! A watchlist source backed by a JSON document over HTTP.
//!
//! Expects an array of objects with a `title` and at least one external id
//! (`tmdb_id`, `tvdb_id`, `imdb_id`). Malformed entries are skipped and
//! surfaced through `has_errors`, never as a fetch failure.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tagarr_model::{DesiredItem, MediaKind, TmdbId, TvdbId};
use tracing::warn;
use url::Url;

use super::{FetchResult, SourceCollector};
use crate::error::Result;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RawEntry {
    title: Option<String>,
    tmdb_id: Option<u64>,
    tvdb_id: Option<u64>,
    imdb_id: Option<String>,
    quality_profile: Option<String>,
    seasons: Option<Vec<u16>>,
}

/// HTTP JSON list source.
#[derive(Debug)]
pub struct JsonListSource {
    name: String,
    kind: MediaKind,
    tags: BTreeSet<String>,
    url: Url,
    http: reqwest::Client,
}

impl JsonListSource {
    pub fn new(
        name: impl Into<String>,
        kind: MediaKind,
        tags: BTreeSet<String>,
        url: Url,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            name: name.into(),
            kind,
            tags,
            url,
            http,
        })
    }

    fn convert(&self, raw: RawEntry) -> Option<DesiredItem> {
        let title = raw.title?;
        let mut item = DesiredItem::new(self.kind, title);
        item.tmdb_id = raw.tmdb_id.map(TmdbId);
        item.tvdb_id = raw.tvdb_id.map(TvdbId);
        item.imdb_id = raw.imdb_id;
        item.quality_override = raw.quality_profile;
        item.season_selector = raw.seasons.map(|s| s.into_iter().collect());
        if !item.has_external_id() {
            return None;
        }
        Some(item)
    }
}

#[async_trait]
impl SourceCollector for JsonListSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn declared_tags(&self) -> BTreeSet<String> {
        self.tags.clone()
    }

    async fn fetch(&self) -> Result<FetchResult> {
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;
        let entries: Vec<serde_json::Value> = response.json().await?;

        let mut result = FetchResult::default();
        for entry in entries {
            let parsed: std::result::Result<RawEntry, _> = serde_json::from_value(entry);
            match parsed.ok().and_then(|raw| self.convert(raw)) {
                Some(item) => result.items.push(item),
                None => {
                    warn!(source = %self.name, "skipping malformed list entry");
                    result.has_errors = true;
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> JsonListSource {
        JsonListSource::new(
            "list",
            MediaKind::Movies,
            BTreeSet::new(),
            Url::parse("http://localhost/list.json").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn converts_complete_entries() {
        let item = source()
            .convert(RawEntry {
                title: Some("Heat".into()),
                tmdb_id: Some(949),
                tvdb_id: None,
                imdb_id: None,
                quality_profile: Some("HD-1080p".into()),
                seasons: None,
            })
            .unwrap();

        assert_eq!(item.tmdb_id, Some(TmdbId(949)));
        assert_eq!(item.quality_override.as_deref(), Some("HD-1080p"));
    }

    #[test]
    fn rejects_entries_without_any_external_id() {
        assert!(
            source()
                .convert(RawEntry {
                    title: Some("Mystery".into()),
                    tmdb_id: None,
                    tvdb_id: None,
                    imdb_id: None,
                    quality_profile: None,
                    seasons: None,
                })
                .is_none()
        );
    }

    #[test]
    fn rejects_entries_without_title() {
        assert!(
            source()
                .convert(RawEntry {
                    title: None,
                    tmdb_id: Some(1),
                    tvdb_id: None,
                    imdb_id: None,
                    quality_profile: None,
                    seasons: None,
                })
                .is_none()
        );
    }
}
