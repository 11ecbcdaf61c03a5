//! Sonarr v3 target client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagarr_model::{LocalId, ManagedItem, MediaKind, SeasonState, Tag, TagId, TvdbId};
use url::Url;

use super::http::ArrHttp;
use super::{AddOutcome, DeleteOptions, ItemUpdate, NewItem, QualityProfile, RootFolder, TargetClient};
use crate::error::{EngineError, Result};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeasonResource {
    season_number: u16,
    monitored: bool,
}

/// Series fields the reconciler needs; full resources are round-tripped as
/// raw JSON for updates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResource {
    id: i64,
    title: String,
    tvdb_id: u64,
    monitored: bool,
    #[serde(default)]
    tags: Vec<i32>,
    #[serde(default)]
    seasons: Vec<SeasonResource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewSeries<'a> {
    title: &'a str,
    tvdb_id: u64,
    quality_profile_id: i32,
    root_folder_path: &'a str,
    monitored: bool,
    tags: Vec<i32>,
    seasons: Vec<SeasonResource>,
    add_options: AddSeriesOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddSeriesOptions {
    search_for_missing_episodes: bool,
}

#[derive(Debug, Deserialize)]
struct TagResource {
    id: i32,
    label: String,
}

/// Client for one Sonarr instance.
#[derive(Debug, Clone)]
pub struct SonarrClient {
    http: ArrHttp,
    name: String,
}

impl SonarrClient {
    pub fn new(name: impl Into<String>, base_url: Url, api_key: String) -> Result<Self> {
        Ok(Self {
            http: ArrHttp::new(base_url, api_key)?,
            name: name.into(),
        })
    }

    fn is_already_exists(message: &str) -> bool {
        message.contains("SeriesExistsValidator") || message.contains("already been added")
    }
}

#[async_trait]
impl TargetClient for SonarrClient {
    fn kind(&self) -> MediaKind {
        MediaKind::Series
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn list_items(&self) -> Result<Vec<ManagedItem>> {
        let series: Vec<SeriesResource> = self.http.get_json("series").await?;
        Ok(series
            .into_iter()
            .map(|series| ManagedItem {
                local_id: LocalId(series.id),
                title: series.title,
                tmdb_id: None,
                tvdb_id: Some(TvdbId(series.tvdb_id)),
                tags: series.tags.into_iter().map(TagId).collect(),
                monitored: series.monitored,
                seasons: series
                    .seasons
                    .into_iter()
                    .map(|s| SeasonState {
                        number: s.season_number,
                        monitored: s.monitored,
                    })
                    .collect(),
            })
            .collect())
    }

    async fn add_item(&self, item: &NewItem) -> Result<AddOutcome> {
        let tvdb_id = item.tvdb_id.ok_or_else(|| {
            EngineError::InvalidResponse(format!("series payload without tvdb id: {}", item.title))
        })?;
        let payload = NewSeries {
            title: &item.title,
            tvdb_id,
            quality_profile_id: item.quality_profile_id,
            root_folder_path: &item.root_folder,
            monitored: item.monitored,
            tags: item.tags.iter().map(|t| t.as_i32()).collect(),
            seasons: item
                .seasons
                .iter()
                .map(|s| SeasonResource {
                    season_number: s.number,
                    monitored: s.monitored,
                })
                .collect(),
            add_options: AddSeriesOptions {
                search_for_missing_episodes: item.search_on_add,
            },
        };

        match self
            .http
            .post_json::<_, serde_json::Value>("series", &payload)
            .await
        {
            Ok(_) => Ok(AddOutcome::Added),
            Err(EngineError::Api { status: 400, message }) if Self::is_already_exists(&message) => {
                Ok(AddOutcome::AlreadyExists)
            }
            Err(err) => Err(err),
        }
    }

    async fn update_item(&self, id: LocalId, update: &ItemUpdate) -> Result<()> {
        let mut resource: serde_json::Value = self.http.get_json(&format!("series/{id}")).await?;

        if let Some(tags) = &update.tags {
            let ids: Vec<i32> = tags.iter().map(|t| t.as_i32()).collect();
            resource["tags"] = serde_json::json!(ids);
        }
        if let Some(monitored) = update.monitored {
            resource["monitored"] = serde_json::json!(monitored);
        }
        if let Some(seasons) = &update.seasons
            && let Some(existing) = resource["seasons"].as_array_mut()
        {
            for entry in existing {
                let number = entry["seasonNumber"].as_u64().unwrap_or(u64::MAX);
                if let Some(desired) = seasons.iter().find(|s| u64::from(s.number) == number) {
                    entry["monitored"] = serde_json::json!(desired.monitored);
                }
            }
        }

        self.http.put_json(&format!("series/{id}"), &resource).await
    }

    async fn delete_item(&self, id: LocalId, options: &DeleteOptions) -> Result<()> {
        self.http
            .delete(
                &format!("series/{id}"),
                &[
                    ("deleteFiles", options.delete_files.to_string()),
                    (
                        "addImportListExclusion",
                        options.add_import_exclusion.to_string(),
                    ),
                ],
            )
            .await
    }

    async fn list_tags(&self) -> Result<Vec<Tag<TagId>>> {
        let tags: Vec<TagResource> = self.http.get_json("tag").await?;
        Ok(tags
            .into_iter()
            .map(|tag| Tag::new(TagId(tag.id), tag.label))
            .collect())
    }

    async fn create_tag(&self, name: &str) -> Result<Tag<TagId>> {
        let created: TagResource = self
            .http
            .post_json("tag", &serde_json::json!({ "label": name }))
            .await?;
        Ok(Tag::new(TagId(created.id), created.label))
    }

    async fn quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        self.http.get_json("qualityprofile").await
    }

    async fn root_folders(&self) -> Result<Vec<RootFolder>> {
        self.http.get_json("rootfolder").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_already_exists_shapes() {
        assert!(SonarrClient::is_already_exists(
            r#"[{"errorCode":"SeriesExistsValidator","errorMessage":"This series has already been added"}]"#
        ));
        assert!(!SonarrClient::is_already_exists("Invalid root folder"));
    }
}
