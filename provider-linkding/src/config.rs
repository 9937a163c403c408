//! Linkding connection and payload settings

use crate::error::{LinkdingError, Result};
use std::fmt;
use std::time::Duration;

/// Query matching every bookmark this provider creates.
pub const DEFAULT_SEARCH_FILTER: &str = "https://www.themoviedb.org/ #media #TMDB";

/// Linkding rejects larger `limit` values.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct LinkdingConfig {
    /// Server root without a trailing slash, e.g. `https://links.example.com`
    pub base_url: String,
    pub token: String,
    /// Extra tags added to every bookmark
    pub custom_tags: Vec<String>,
    /// Write markdown notes into each bookmark
    pub generate_notes: bool,
    /// Derive tags from category and genres; also turns note values into tag links
    pub auto_tags: bool,
    pub mark_unread: bool,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub search_filter: String,
}

impl LinkdingConfig {
    pub fn builder(base_url: impl Into<String>, token: impl Into<String>) -> LinkdingConfigBuilder {
        LinkdingConfigBuilder::new(base_url, token)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(LinkdingError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.token.trim().is_empty() {
            return Err(LinkdingError::Config("token must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(LinkdingError::Config(
                "page_size must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(LinkdingError::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn bookmarks_url(&self) -> String {
        format!("{}/api/bookmarks/", self.base_url)
    }

    /// Whether bookmarks carry tags at all.
    pub fn tags_enabled(&self) -> bool {
        self.auto_tags || !self.custom_tags.is_empty()
    }
}

impl fmt::Debug for LinkdingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkdingConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("custom_tags", &self.custom_tags)
            .field("generate_notes", &self.generate_notes)
            .field("auto_tags", &self.auto_tags)
            .field("mark_unread", &self.mark_unread)
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .field("search_filter", &self.search_filter)
            .finish()
    }
}

/// Split a comma separated tag list. Blank entries are dropped.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split([',', '，'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct LinkdingConfigBuilder {
    config: LinkdingConfig,
}

impl LinkdingConfigBuilder {
    fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            config: LinkdingConfig {
                base_url: base_url.into(),
                token: token.into(),
                custom_tags: Vec::new(),
                generate_notes: true,
                auto_tags: true,
                mark_unread: false,
                page_size: DEFAULT_PAGE_SIZE,
                request_timeout: DEFAULT_REQUEST_TIMEOUT,
                search_filter: DEFAULT_SEARCH_FILTER.to_string(),
            },
        }
    }

    /// Comma separated, e.g. `"watchlist, 2024"`.
    pub fn custom_tags(mut self, raw: &str) -> Self {
        self.config.custom_tags = parse_tag_list(raw);
        self
    }

    pub fn generate_notes(mut self, enabled: bool) -> Self {
        self.config.generate_notes = enabled;
        self
    }

    pub fn auto_tags(mut self, enabled: bool) -> Self {
        self.config.auto_tags = enabled;
        self
    }

    pub fn mark_unread(mut self, enabled: bool) -> Self {
        self.config.mark_unread = enabled;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn search_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.search_filter = filter.into();
        self
    }

    pub fn build(self) -> Result<LinkdingConfig> {
        let mut config = self.config;
        config.base_url = config.base_url.trim().trim_end_matches('/').to_string();
        config.token = config.token.trim().to_string();
        config.validate()?;
        Ok(config)
    }
}
