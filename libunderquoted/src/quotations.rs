//! Quotation service client
//!
//! The quotation service is a plain JSON endpoint: each requested tag is
//! appended to the configured URL as a `search` parameter and the first
//! result is used. Fetching never fails from the caller's point of view;
//! anything short of a usable quotation yields the "not found" message.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PlatformError, Result};

/// Message used when no quotation can be offered
pub const NOT_FOUND_MESSAGE: &str = "No quotations found";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of candidate quotation text
#[async_trait]
pub trait QuotationSource: Send + Sync {
    /// Fetch a quotation matching `tags`
    ///
    /// Returns the formatted quotation, or [`not_found_message`] for `tags`
    /// when the service has nothing usable.
    async fn fetch(&self, tags: &[String]) -> String;
}

/// Append `" matching #tag1 #tag2"` to `base` when tags were given
pub fn annotate_with_tags(base: &str, tags: &[String]) -> String {
    if tags.is_empty() {
        return base.to_string();
    }

    let hashed: Vec<String> = tags.iter().map(|tag| format!("#{}", tag)).collect();
    format!("{} matching {}", base, hashed.join(" "))
}

/// The deterministic fallback message for `tags`
pub fn not_found_message(tags: &[String]) -> String {
    annotate_with_tags(NOT_FOUND_MESSAGE, tags)
}

/// One entry of the service's `results` array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quotation {
    pub text: String,
    pub author: String,
}

impl std::fmt::Display for Quotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.text, self.author)
    }
}

#[derive(Debug, Deserialize)]
struct QuotationPage {
    results: Vec<Quotation>,
}

/// HTTP quotation service client
pub struct HttpQuotationSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuotationSource {
    /// Create a client for the service at `base_url`
    ///
    /// `base_url` is used verbatim; tags are appended as `&search=<tag>`, so
    /// it normally already carries a query string (e.g. `...?format=json`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PlatformError::Network(format!("Failed to build quotation client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// URL queried for `tags`
    pub fn request_url(&self, tags: &[String]) -> String {
        let mut url = self.base_url.clone();
        for tag in tags {
            url.push_str("&search=");
            url.push_str(tag);
        }
        url
    }

    /// First quotation for `url`, `Ok(None)` when the service answered with no results
    async fn first_quotation(&self, url: &str) -> std::result::Result<Option<Quotation>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        debug!("Quotation request, status code={}", status.as_u16());
        if status != reqwest::StatusCode::OK {
            return Err(format!("unexpected status {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {}", e))?;
        let page: QuotationPage =
            serde_json::from_str(&body).map_err(|e| format!("malformed body: {}", e))?;

        Ok(page.results.into_iter().next())
    }
}

#[async_trait]
impl QuotationSource for HttpQuotationSource {
    async fn fetch(&self, tags: &[String]) -> String {
        let url = self.request_url(tags);
        debug!("Trying URL: {}", url);

        match self.first_quotation(&url).await {
            Ok(Some(quotation)) => quotation.to_string(),
            Ok(None) => {
                debug!("Quotation service returned no results");
                not_found_message(tags)
            }
            Err(reason) => {
                warn!("Quotation service unavailable: {}", reason);
                not_found_message(tags)
            }
        }
    }
}

/// Quotation source that always offers the same text and records requests
///
/// Available in all builds so integration tests can drive the pipeline
/// without a quotation service.
#[derive(Clone, Default)]
pub struct FixedQuotationSource {
    text: String,
    fetches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FixedQuotationSource {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fetches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Tags of every fetch, in order
    pub fn fetches(&self) -> Vec<Vec<String>> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl QuotationSource for FixedQuotationSource {
    async fn fetch(&self, tags: &[String]) -> String {
        self.fetches.lock().unwrap().push(tags.to_vec());
        self.text.clone()
    }
}
