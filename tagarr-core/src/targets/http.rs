//! Shared HTTP plumbing for arr-style targets.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{EngineError, Result};

/// Hard per-request timeout; a timeout surfaces to the retry wrapper as an
/// ordinary retryable failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "X-Api-Key";

/// Authenticated JSON transport for one arr v3 API.
#[derive(Debug, Clone)]
pub(crate) struct ArrHttp {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl ArrHttp {
    pub(crate) fn new(base: Url, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(&format!("api/v3/{path}"))
            .map_err(|e| EngineError::InvalidResponse(format!("bad endpoint {path}: {e}")))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn put_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let response = self
            .http
            .put(self.endpoint(path)?)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint(path)?)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(EngineError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
