#![doc = "Delivery API client: the HTTP implementation of the core crate's content source."]
//
//! # Delivery client (CLI <-> Core)
//!
//! [`DeliveryClient`] implements [`ContentSource`] against the Contentful Delivery API:
//! `GET {host}/spaces/{space}/environments/{env}/entries` with a bearer token, the query
//! rendered by [`EntryQuery::to_params`].
//!
//! The client reports transport facts only ([`SourceError`]); classification into the
//! user-facing taxonomy happens in the gateway.
//!
//! - Non-2xx: `SourceError::Http` with the status, the API's error message and, when the
//!   `X-Contentful-RateLimit-Reset` header is present, the retry hint in seconds.
//! - Connection failures: `SourceError::Connect`. Client-side timeout: `SourceError::Timeout`.
//! - A body that is not an entry collection: `SourceError::Decode`.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use portfolio_content_core::config::ContentfulConfig;
use portfolio_content_core::contract::{ContentSource, EntryCollection};
use portfolio_content_core::error::SourceError;
use portfolio_content_core::query::EntryQuery;

pub const RATE_LIMIT_RESET_HEADER: &str = "X-Contentful-RateLimit-Reset";

pub struct DeliveryClient {
    http: Client,
    entries_url: String,
    access_token: String,
}

impl DeliveryClient {
    pub fn new(config: &ContentfulConfig) -> Result<Self> {
        let http = match Client::builder().timeout(config.timeout()).build() {
            Ok(http) => http,
            Err(e) => {
                error!(error = ?e, "Failed to build HTTP client");
                return Err(anyhow::anyhow!("Failed to build HTTP client: {e}"));
            }
        };
        let entries_url = config.entries_url();
        info!(
            entries_url = %entries_url,
            access_token_set = !config.access_token.is_empty(),
            "Initialized DeliveryClient"
        );
        Ok(Self {
            http,
            entries_url,
            access_token: config.access_token.clone(),
        })
    }

    pub fn entries_url(&self) -> &str {
        &self.entries_url
    }
}

/// Error body returned by the Delivery API on failures.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

fn transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        SourceError::Connect(e.to_string())
    } else if e.is_decode() {
        SourceError::Decode(e.to_string())
    } else {
        SourceError::Other(e.to_string())
    }
}

#[async_trait]
impl ContentSource for DeliveryClient {
    async fn get_entries(&self, query: &EntryQuery) -> Result<EntryCollection, SourceError> {
        let params = query.to_params();
        debug!(url = %self.entries_url, ?params, "Requesting entries");

        let response = self
            .http
            .get(&self.entries_url)
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, content_type = query.content_type(), "Delivery API request failed");
                transport_error(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(RATE_LIMIT_RESET_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            error!(
                status = status.as_u16(),
                message = %message,
                retry_after_secs = ?retry_after_secs,
                "Delivery API returned an error status"
            );
            return Err(SourceError::Http {
                status: status.as_u16(),
                message,
                retry_after_secs,
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let collection: EntryCollection = serde_json::from_slice(&body).map_err(|e| {
            error!(error = %e, "Delivery API returned an unreadable body");
            SourceError::Decode(e.to_string())
        })?;
        info!(
            content_type = query.content_type(),
            items = collection.items.len(),
            assets = collection.includes.assets.len(),
            total = collection.total,
            "Received entries"
        );
        Ok(collection)
    }
}
