//! Linkding API types
//!
//! See: https://github.com/sissbruecker/linkding/blob/master/docs/API.md

use serde::{Deserialize, Serialize};

/// Bookmark resource.
///
/// Only the fields this crate writes are modelled; unknown response fields
/// are ignored. Absent optional fields are left out of request bodies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bookmark {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Markdown notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub is_archived: bool,

    #[serde(default)]
    pub unread: bool,

    #[serde(default)]
    pub shared: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,
}

impl Bookmark {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Paginated `GET /api/bookmarks/` response
#[derive(Debug, Deserialize)]
pub struct BookmarkListResponse {
    #[serde(default)]
    pub count: Option<u64>,

    /// URL of the next page; absent on the last page
    #[serde(default)]
    pub next: Option<String>,

    #[serde(default)]
    pub results: Vec<Bookmark>,
}
