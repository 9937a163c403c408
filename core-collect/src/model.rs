//! # Item Model
//!
//! Candidate items, their categories and sources, and the [`UniqueKey`]
//! identity shared by local memory and the remote store.
//!
//! Identity of an [`Item`] is `(category, external_id)`; display fields never
//! participate. A [`UniqueKey`] adds a namespace and renders as
//! `<namespace>:<category>:<external_id>`, with the category always in its
//! lowercase symbolic form.

use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KEY_SEPARATOR: char = ':';

// ============================================================================
// Category
// ============================================================================

/// Catalog category of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movie,
    Tv,
    Collection,
    #[default]
    Unknown,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Movie,
        Category::Tv,
        Category::Collection,
        Category::Unknown,
    ];

    /// Canonical symbolic name used in unique keys and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Tv => "tv",
            Category::Collection => "collection",
            Category::Unknown => "unknown",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Movie => "Movie",
            Category::Tv => "TV Series",
            Category::Collection => "Collection",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SyncError;

    /// Accepts symbolic names and display labels, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| SyncError::InvalidInput(format!("Unknown category '{}'", s)))
    }
}

// ============================================================================
// Media Source
// ============================================================================

/// Where a candidate item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// Items already present in the media library
    Library,
    /// Active subscriptions
    Subscription,
    /// Finished or removed subscriptions
    SubscriptionHistory,
}

impl MediaSource {
    pub const ALL: [MediaSource; 3] = [
        MediaSource::Library,
        MediaSource::Subscription,
        MediaSource::SubscriptionHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSource::Library => "library",
            MediaSource::Subscription => "subscription",
            MediaSource::SubscriptionHistory => "subscription_history",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaSource::Library => "Media library",
            MediaSource::Subscription => "Subscription",
            MediaSource::SubscriptionHistory => "Subscription history",
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaSource {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        MediaSource::ALL
            .into_iter()
            .find(|m| {
                m.as_str().eq_ignore_ascii_case(needle) || m.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| SyncError::InvalidInput(format!("Unknown media source '{}'", s)))
    }
}

// ============================================================================
// Item
// ============================================================================

/// A candidate for synchronization.
///
/// Items missing a category or an external id are invalid and are dropped
/// before any planning happens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Item {
    pub category: Option<Category>,
    pub external_id: String,
    pub title: Option<String>,
    pub year: Option<String>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<String>,
}

impl Item {
    pub fn new(category: Category, external_id: impl Into<String>) -> Self {
        Self {
            category: Some(category),
            external_id: external_id.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_imdb_id(mut self, imdb_id: impl Into<String>) -> Self {
        self.imdb_id = Some(imdb_id.into());
        self
    }

    pub fn with_tvdb_id(mut self, tvdb_id: impl Into<String>) -> Self {
        self.tvdb_id = Some(tvdb_id.into());
        self
    }

    /// Both identity fields are present.
    pub fn is_valid(&self) -> bool {
        self.category.is_some() && !self.external_id.trim().is_empty()
    }

    /// Derive the unique key, or `None` if the item is invalid.
    pub fn unique_key(&self, namespace: &str) -> Option<UniqueKey> {
        let category = self.category?;
        UniqueKey::new(namespace, category, &self.external_id).ok()
    }

    /// A bare item rebuilt from a key found in the remote store.
    pub fn placeholder(key: &UniqueKey) -> Self {
        Self::new(key.category(), key.external_id())
    }
}

// ============================================================================
// Unique Key
// ============================================================================

/// Deterministic identity of a remote record.
///
/// Namespace and category never contain the `:` separator, so splitting on
/// the first two separators recovers every component even when the external
/// id itself contains one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UniqueKey {
    namespace: String,
    category: Category,
    external_id: String,
}

impl UniqueKey {
    pub fn new(namespace: &str, category: Category, external_id: &str) -> Result<Self> {
        let namespace = namespace.trim();
        let external_id = external_id.trim();

        if namespace.is_empty() || namespace.contains(KEY_SEPARATOR) {
            return Err(SyncError::InvalidKey {
                key: format!("{}:{}:{}", namespace, category, external_id),
                reason: "namespace must be non-empty and must not contain ':'".to_string(),
            });
        }

        if external_id.is_empty() {
            return Err(SyncError::InvalidKey {
                key: format!("{}:{}:", namespace, category),
                reason: "external id is empty".to_string(),
            });
        }

        Ok(Self {
            namespace: namespace.to_string(),
            category,
            external_id: external_id.to_string(),
        })
    }

    /// Parse `<namespace>:<category>:<external_id>`.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| SyncError::InvalidKey {
            key: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = raw.splitn(3, KEY_SEPARATOR);
        let (Some(namespace), Some(category), Some(external_id)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected <namespace>:<category>:<id>"));
        };

        let category = category
            .parse::<Category>()
            .map_err(|_| invalid("unknown category"))?;

        Self::new(namespace, category, external_id)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.namespace,
            self.category.as_str(),
            self.external_id,
            sep = KEY_SEPARATOR
        )
    }
}

impl FromStr for UniqueKey {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UniqueKey {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<UniqueKey> for String {
    fn from(key: UniqueKey) -> Self {
        key.to_string()
    }
}
