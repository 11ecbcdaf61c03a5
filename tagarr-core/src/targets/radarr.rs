//! Radarr v3 target client.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagarr_model::{LocalId, ManagedItem, MediaKind, Tag, TagId, TmdbId};
use url::Url;

use super::http::ArrHttp;
use super::{AddOutcome, DeleteOptions, ItemUpdate, NewItem, QualityProfile, RootFolder, TargetClient};
use crate::error::{EngineError, Result};

/// Movie fields the reconciler needs; the full resource is only handled as
/// raw JSON during read-modify-write updates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieResource {
    id: i64,
    title: String,
    tmdb_id: u64,
    monitored: bool,
    #[serde(default)]
    tags: Vec<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewMovie<'a> {
    title: &'a str,
    tmdb_id: u64,
    quality_profile_id: i32,
    root_folder_path: &'a str,
    monitored: bool,
    tags: Vec<i32>,
    add_options: AddMovieOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddMovieOptions {
    search_for_movie: bool,
}

#[derive(Debug, Deserialize)]
struct TagResource {
    id: i32,
    label: String,
}

/// Client for one Radarr instance.
#[derive(Debug, Clone)]
pub struct RadarrClient {
    http: ArrHttp,
    name: String,
}

impl RadarrClient {
    pub fn new(name: impl Into<String>, base_url: Url, api_key: String) -> Result<Self> {
        Ok(Self {
            http: ArrHttp::new(base_url, api_key)?,
            name: name.into(),
        })
    }

    fn is_already_exists(message: &str) -> bool {
        message.contains("MovieExistsValidator") || message.contains("already been added")
    }
}

#[async_trait]
impl TargetClient for RadarrClient {
    fn kind(&self) -> MediaKind {
        MediaKind::Movies
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    async fn list_items(&self) -> Result<Vec<ManagedItem>> {
        let movies: Vec<MovieResource> = self.http.get_json("movie").await?;
        Ok(movies
            .into_iter()
            .map(|movie| ManagedItem {
                local_id: LocalId(movie.id),
                title: movie.title,
                tmdb_id: Some(TmdbId(movie.tmdb_id)),
                tvdb_id: None,
                tags: movie.tags.into_iter().map(TagId).collect(),
                monitored: movie.monitored,
                seasons: Vec::new(),
            })
            .collect())
    }

    async fn add_item(&self, item: &NewItem) -> Result<AddOutcome> {
        let tmdb_id = item.tmdb_id.ok_or_else(|| {
            EngineError::InvalidResponse(format!("movie payload without tmdb id: {}", item.title))
        })?;
        let payload = NewMovie {
            title: &item.title,
            tmdb_id,
            quality_profile_id: item.quality_profile_id,
            root_folder_path: &item.root_folder,
            monitored: item.monitored,
            tags: item.tags.iter().map(|t| t.as_i32()).collect(),
            add_options: AddMovieOptions {
                search_for_movie: item.search_on_add,
            },
        };

        match self
            .http
            .post_json::<_, serde_json::Value>("movie", &payload)
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
        // Round-trip the full resource so fields we do not model survive
        // the PUT.
        let mut resource: serde_json::Value = self.http.get_json(&format!("movie/{id}")).await?;

        if let Some(tags) = &update.tags {
            let ids: Vec<i32> = tags.iter().map(|t| t.as_i32()).collect();
            resource["tags"] = serde_json::json!(ids);
        }
        if let Some(monitored) = update.monitored {
            resource["monitored"] = serde_json::json!(monitored);
        }

        self.http.put_json(&format!("movie/{id}"), &resource).await
    }

    async fn delete_item(&self, id: LocalId, options: &DeleteOptions) -> Result<()> {
        self.http
            .delete(
                &format!("movie/{id}"),
                &[
                    ("deleteFiles", options.delete_files.to_string()),
                    (
                        "addImportExclusion",
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
        assert!(RadarrClient::is_already_exists(
            r#"[{"errorCode":"MovieExistsValidator","errorMessage":"This movie has already been added"}]"#
        ));
        assert!(RadarrClient::is_already_exists(
            "This movie has already been added"
        ));
        assert!(!RadarrClient::is_already_exists("Invalid quality profile"));
    }

    #[test]
    fn unused_seasons_field_is_tolerated() {
        let update = ItemUpdate {
            tags: None,
            monitored: Some(true),
            seasons: None,
        };
        assert!(!update.is_empty());
    }
}
