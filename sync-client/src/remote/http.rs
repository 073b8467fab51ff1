//! HTTP remote store.
//!
//! Maps the record operations onto a small REST surface:
//!
//! | Operation        | Request                                       |
//! |------------------|-----------------------------------------------|
//! | fetch            | `GET    {base}/users/{user}/slices/{type}`    |
//! | upsert (merge)   | `PATCH  {base}/users/{user}/slices/{type}`    |
//! | upsert (replace) | `PUT    {base}/users/{user}/slices/{type}`    |
//! | delete           | `DELETE {base}/users/{user}/slices/{type}`    |
//!
//! A 404 on GET or DELETE means "absent" and is not an error.

use super::{RemoteStore, StoreError, WriteMode};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use studysync_types::SliceKey;
use tracing::debug;

/// Default per-request timeout enforced by the HTTP client itself.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote store backed by an HTTP data service.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base: Url,
}

impl HttpRemoteStore {
    /// Create a store rooted at `base` (e.g. `https://data.example.com/v1`).
    pub fn new(base: &str) -> Result<Self, StoreError> {
        Self::with_timeout(base, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a store with a custom per-request timeout.
    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base = Url::parse(base)
            .map_err(|e| StoreError::Unavailable(format!("invalid endpoint {base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "endpoint cannot be a base URL: {base}"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Endpoint this store talks to.
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn slice_url(&self, key: &SliceKey) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("bad endpoint: {}", self.base)))?
            .pop_if_empty()
            .extend([
                "users",
                key.user.as_str(),
                "slices",
                key.data_type.as_str(),
            ]);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        key: &SliceKey,
        body: Option<&Value>,
    ) -> Result<Response, StoreError> {
        let url = self.slice_url(key)?;
        debug!(%method, %url, "sending slice request");

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(map_transport_error)?;

        debug!(%method, status = %response.status(), "received slice response");
        Ok(response)
    }
}

fn map_transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else if err.is_decode() {
        StoreError::Serialization(err.to_string())
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

async fn status_error(response: Response) -> StoreError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return StoreError::NotFound;
    }
    let message = response.text().await.unwrap_or_default();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        StoreError::Unavailable(format!("{status}: {message}"))
    } else {
        StoreError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_slice(&self, key: &SliceKey) -> Result<Option<Value>, StoreError> {
        let response = self.send(Method::GET, key, None).await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let value: Value = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn upsert_slice(
        &self,
        key: &SliceKey,
        value: &Value,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let method = match mode {
            WriteMode::Merge => Method::PATCH,
            WriteMode::Replace => Method::PUT,
        };
        let response = self.send(method, key, Some(value)).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }

    async fn delete_slice(&self, key: &SliceKey) -> Result<(), StoreError> {
        let response = self.send(Method::DELETE, key, None).await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }
}
