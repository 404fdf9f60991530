//! Account-scoped façade over [`DirectClient`].
//!
//! Binds one account name and trades raw status codes for typed results:
//! listings come back as decoded JSON records, header maps are plain
//! string maps, and any non-2xx outcome is an [`CorvioError::HttpStatus`].

use crate::error::{CorvioError, Result};
use crate::proxy::DirectClient;
use crate::query::ListingOptions;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// One container in an account listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub last_modified: String,
}

/// One object in a container listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub last_modified: String,
}

pub struct AccountClient {
    client: Arc<DirectClient>,
    account: String,
}

fn headers_from_map(map: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in map {
        let name = match HeaderName::try_from(key.as_str()) {
            Ok(name) => name,
            Err(_) => {
                tracing::debug!("dropping invalid header name: {}", key);
                continue;
            }
        };
        let value = match HeaderValue::try_from(value.as_str()) {
            Ok(value) => value,
            Err(_) => {
                tracing::debug!("dropping invalid header value for {}", key);
                continue;
            }
        };
        headers.insert(name, value);
    }
    headers
}

fn map_from_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_string(), value.to_string());
        }
    }
    map
}

fn expect_success(status: u16) -> Result<()> {
    if status / 100 == 2 {
        Ok(())
    } else {
        Err(CorvioError::HttpStatus(status))
    }
}

/// Listings always force `format=json` so the backend answer is decodable.
fn listing_options(
    marker: &str,
    end_marker: &str,
    limit: usize,
    prefix: &str,
    delimiter: &str,
) -> ListingOptions {
    ListingOptions {
        format: "json".to_string(),
        marker: marker.to_string(),
        end_marker: end_marker.to_string(),
        prefix: prefix.to_string(),
        delimiter: delimiter.to_string(),
        limit,
    }
}

/// A backend that answers a listing with undecodable JSON still produced a
/// 200; callers get an empty, iterable result and the defect is logged.
fn decode_listing<T: serde::de::DeserializeOwned>(body: &[u8]) -> Vec<T> {
    match serde_json::from_slice(body) {
        Ok(records) => records,
        Err(error) => {
            tracing::warn!("discarding undecodable listing body: {}", error);
            Vec::new()
        }
    }
}

impl AccountClient {
    pub fn new(client: Arc<DirectClient>, account: impl Into<String>) -> Self {
        Self {
            client,
            account: account.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub async fn put_account(&self, headers: &HashMap<String, String>) -> Result<()> {
        let status = self
            .client
            .put_account(&self.account, &headers_from_map(headers))
            .await;
        expect_success(status)
    }

    pub async fn post_account(&self, headers: &HashMap<String, String>) -> Result<()> {
        let status = self
            .client
            .post_account(&self.account, &headers_from_map(headers))
            .await;
        expect_success(status)
    }

    pub async fn get_account(
        &self,
        marker: &str,
        end_marker: &str,
        limit: usize,
        prefix: &str,
        delimiter: &str,
        headers: &HashMap<String, String>,
    ) -> Result<(Vec<ContainerRecord>, HashMap<String, String>)> {
        let options = listing_options(marker, end_marker, limit, prefix, delimiter);
        let response = self
            .client
            .get_account(&self.account, &options, &headers_from_map(headers))
            .await
            .ok_or(CorvioError::HttpStatus(404))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(CorvioError::HttpStatus(status));
        }
        let response_headers = map_from_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| CorvioError::Http(e.to_string()))?;
        Ok((decode_listing(&body), response_headers))
    }

    pub async fn head_account(
        &self,
        headers: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        let head = self
            .client
            .head_account(&self.account, &headers_from_map(headers))
            .await
            .ok_or(CorvioError::HttpStatus(404))?;
        expect_success(head.status)?;
        Ok(map_from_headers(&head.headers))
    }

    pub async fn delete_account(&self, headers: &HashMap<String, String>) -> Result<()> {
        let status = self
            .client
            .delete_account(&self.account, &headers_from_map(headers))
            .await;
        expect_success(status)
    }

    pub async fn put_container(
        &self,
        container: &str,
        headers: &HashMap<String, String>,
    ) -> Result<()> {
        let status = self
            .client
            .put_container(&self.account, container, &headers_from_map(headers))
            .await;
        expect_success(status)
    }

    pub async fn post_container(
        &self,
        container: &str,
        headers: &HashMap<String, String>,
    ) -> Result<()> {
        let status = self
            .client
            .post_container(&self.account, container, &headers_from_map(headers))
            .await;
        expect_success(status)
    }

    pub async fn get_container(
        &self,
        container: &str,
        marker: &str,
        end_marker: &str,
        limit: usize,
        prefix: &str,
        delimiter: &str,
        headers: &HashMap<String, String>,
    ) -> Result<(Vec<ObjectRecord>, HashMap<String, String>)> {
        let options = listing_options(marker, end_marker, limit, prefix, delimiter);
        let response = self
            .client
            .get_container(&self.account, container, &options, &headers_from_map(headers))
            .await
            .ok_or(CorvioError::HttpStatus(404))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(CorvioError::HttpStatus(status));
        }
        let response_headers = map_from_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| CorvioError::Http(e.to_string()))?;
        Ok((decode_listing(&body), response_headers))
    }

    pub async fn head_container(
        &self,
        container: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        let head = self
            .client
            .head_container(&self.account, container, &headers_from_map(headers))
            .await
            .ok_or(CorvioError::HttpStatus(404))?;
        expect_success(head.status)?;
        Ok(map_from_headers(&head.headers))
    }

    pub async fn delete_container(
        &self,
        container: &str,
        headers: &HashMap<String, String>,
    ) -> Result<()> {
        let status = self
            .client
            .delete_container(&self.account, container, &headers_from_map(headers))
            .await;
        expect_success(status)
    }

    pub async fn put_object<R>(
        &self,
        container: &str,
        object: &str,
        headers: &HashMap<String, String>,
        source: R,
    ) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let status = self
            .client
            .put_object(
                &self.account,
                container,
                object,
                &headers_from_map(headers),
                source,
            )
            .await;
        expect_success(status)
    }

    pub async fn post_object(
        &self,
        container: &str,
        object: &str,
        headers: &HashMap<String, String>,
    ) -> Result<()> {
        let status = self
            .client
            .post_object(&self.account, container, object, &headers_from_map(headers))
            .await;
        expect_success(status)
    }

    /// The returned response streams the winning replica's body; the
    /// caller owns it and drops it to release the connection.
    pub async fn get_object(
        &self,
        container: &str,
        object: &str,
        headers: &HashMap<String, String>,
    ) -> Result<(reqwest::Response, HashMap<String, String>)> {
        let response = self
            .client
            .get_object(&self.account, container, object, &headers_from_map(headers))
            .await
            .ok_or(CorvioError::HttpStatus(404))?;
        expect_success(response.status().as_u16())?;
        let response_headers = map_from_headers(response.headers());
        Ok((response, response_headers))
    }

    pub async fn head_object(
        &self,
        container: &str,
        object: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>> {
        let head = self
            .client
            .head_object(&self.account, container, object, &headers_from_map(headers))
            .await
            .ok_or(CorvioError::HttpStatus(404))?;
        expect_success(head.status)?;
        Ok(map_from_headers(&head.headers))
    }

    pub async fn delete_object(
        &self,
        container: &str,
        object: &str,
        headers: &HashMap<String, String>,
    ) -> Result<()> {
        let status = self
            .client
            .delete_object(&self.account, container, object, &headers_from_map(headers))
            .await;
        expect_success(status)
    }
}
