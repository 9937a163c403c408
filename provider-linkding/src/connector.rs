//! Linkding API connector
//!
//! Implements `RemoteStoreClient` against the Linkding REST API.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_collect::{DisplayRecord, RemoteStoreClient, UniqueKey};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::bookmark::{build_bookmark, decode_unique_key};
use crate::config::LinkdingConfig;
use crate::error::{LinkdingError, Result};
use crate::types::{Bookmark, BookmarkListResponse};

/// Upper bound on followed pages, in case a server keeps returning `next`.
const MAX_PAGES: usize = 10_000;

/// Longest error body kept in an `ApiError`
const MAX_ERROR_BODY: usize = 200;

/// Linkding API connector
///
/// # Example
///
/// ```ignore
/// use provider_linkding::{LinkdingConfig, LinkdingConnector};
///
/// let config = LinkdingConfig::builder("https://links.example.com", token).build()?;
/// let connector = LinkdingConnector::new(http_client, config)?;
/// let keys = connector.search_existing(&connector.existing_filter()).await?;
/// ```
pub struct LinkdingConnector {
    http_client: Arc<dyn HttpClient>,
    config: LinkdingConfig,
}

impl LinkdingConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, config: LinkdingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &LinkdingConfig {
        &self.config
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .token_auth(&self.config.token)
            .header("Accept", "application/json")
            .timeout(self.config.request_timeout)
    }

    fn check_response(response: HttpResponse) -> Result<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        let mut message = response
            .text()
            .unwrap_or_else(|_| "<non-UTF-8 body>".to_string());
        let cut = message.char_indices().nth(MAX_ERROR_BODY).map(|(i, _)| i);
        if let Some(cut) = cut {
            message.truncate(cut);
        }
        Err(LinkdingError::ApiError {
            status_code: response.status,
            message,
        })
    }

    /// All bookmarks matching `query`, following pagination.
    #[instrument(skip(self))]
    pub async fn search_bookmarks(&self, query: &str) -> Result<Vec<Bookmark>> {
        let mut bookmarks = Vec::new();
        let mut offset = 0usize;

        for page in 0..MAX_PAGES {
            let url = format!(
                "{}?q={}&limit={}&offset={}",
                self.config.bookmarks_url(),
                urlencoding::encode(query),
                self.config.page_size,
                offset
            );

            let response = self
                .http_client
                .execute_with_retry(self.request(HttpMethod::Get, url), RetryPolicy::default())
                .await?;
            let response = Self::check_response(response)?;
            let list: BookmarkListResponse = serde_json::from_slice(&response.body)
                .map_err(|e| LinkdingError::ParseError(e.to_string()))?;

            let received = list.results.len();
            debug!(page, received, total = ?list.count, "Fetched bookmark page");
            bookmarks.extend(list.results);

            if received == 0 || list.next.is_none() {
                info!(count = bookmarks.len(), "Bookmark search complete");
                return Ok(bookmarks);
            }
            offset += received;
        }

        warn!(
            count = bookmarks.len(),
            "Stopped following bookmark pages after {} pages", MAX_PAGES
        );
        Ok(bookmarks)
    }

    /// Create one bookmark.
    ///
    /// Not retried: a timed out create may still have landed, and the next
    /// probe will pick it up.
    #[instrument(skip(self, bookmark), fields(url = %bookmark.url))]
    pub async fn save_bookmark(&self, bookmark: &Bookmark) -> Result<()> {
        let request = self
            .request(HttpMethod::Post, self.config.bookmarks_url())
            .json(bookmark)?;

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?;
        Self::check_response(response)?;

        debug!("Bookmark saved");
        Ok(())
    }
}

#[async_trait]
impl RemoteStoreClient for LinkdingConnector {
    fn name(&self) -> &'static str {
        "linkding"
    }

    fn existing_filter(&self) -> String {
        self.config.search_filter.clone()
    }

    async fn search_existing(&self, filter: &str) -> BridgeResult<HashSet<UniqueKey>> {
        let bookmarks = self.search_bookmarks(filter).await?;

        let mut skipped = 0usize;
        let keys: HashSet<UniqueKey> = bookmarks
            .iter()
            .filter_map(|b| {
                let key = decode_unique_key(&b.url);
                if key.is_none() {
                    skipped += 1;
                }
                key
            })
            .collect();

        if skipped > 0 {
            debug!(skipped, "Ignored bookmarks without a TMDB key");
        }
        Ok(keys)
    }

    async fn create(&self, record: &DisplayRecord) -> BridgeResult<()> {
        let bookmark = build_bookmark(record, &self.config)?;
        self.save_bookmark(&bookmark).await?;
        Ok(())
    }
}
