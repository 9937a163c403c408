//! Bookmark payload builder
//!
//! Turns a catalog [`DisplayRecord`] into the [`Bookmark`] sent to Linkding,
//! and decodes stored bookmark URLs back into unique keys.

use crate::config::LinkdingConfig;
use crate::error::{LinkdingError, Result};
use crate::types::Bookmark;
use core_collect::{CatalogSource, Category, DisplayRecord, UniqueKey};
use std::collections::BTreeSet;

pub const TMDB_BASE_URL: &str = "https://www.themoviedb.org";

/// Namespace of every key this provider decodes.
pub const TMDB_NAMESPACE: &str = "tmdb";

const BASE_TAGS: [&str; 2] = ["media", "TMDB"];

const GENRE_MAPPINGS: [(&str, &str); 3] = [
    ("Sci-Fi & Fantasy", "Sci-Fi"),
    ("War & Politics", "War"),
    ("Action & Adventure", "Action"),
];

/// `https://www.themoviedb.org/<category>/<id>`
pub fn canonical_url(category: Category, external_id: &str) -> String {
    format!("{}/{}/{}", TMDB_BASE_URL, category.as_str(), external_id.trim())
}

/// Decode a bookmark URL into `tmdb:<category>:<id>` from its last two path
/// segments. Returns `None` for anything else.
pub fn decode_unique_key(url: &str) -> Option<UniqueKey> {
    let path = url.split(['?', '#']).next()?.trim_end_matches('/');
    let mut segments = path.rsplit('/');
    let id = urlencoding::decode(segments.next()?).ok()?;
    let category = urlencoding::decode(segments.next()?).ok()?;

    let category: Category = category.parse().ok()?;
    if category == Category::Unknown {
        return None;
    }
    UniqueKey::new(TMDB_NAMESPACE, category, &id).ok()
}

/// Map a catalog genre name to a single tag token.
pub fn map_genre(genre: &str) -> String {
    let genre = genre.trim();
    let mapped = GENRE_MAPPINGS
        .iter()
        .find(|(name, _)| *name == genre)
        .map_or(genre, |&(_, tag)| tag);
    tag_token(mapped)
}

/// Linkding splits tags on whitespace.
fn tag_token(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("-")
}

fn tag_link(tag: &str) -> String {
    format!("[{tag}](?q=%23{tag})")
}

pub fn bookmark_title(record: &DisplayRecord) -> String {
    match record.year.as_deref().map(str::trim).filter(|y| !y.is_empty()) {
        Some(year) => format!("{} ({}) — The Movie Database (TMDB)", record.title, year),
        None => format!("{} — The Movie Database (TMDB)", record.title),
    }
}

/// URL the bookmark is stored under.
///
/// The record's own detail link is used when it decodes to the record's key,
/// otherwise the canonical TMDB URL, so that probes always find it again.
pub fn bookmark_url(record: &DisplayRecord) -> String {
    let canonical = canonical_url(record.category, &record.external_id);
    match record.detail_link.as_deref() {
        Some(link)
            if decode_unique_key(link) == decode_unique_key(&canonical)
                && record.source == CatalogSource::Tmdb =>
        {
            link.to_string()
        }
        _ => canonical,
    }
}

fn type_labels(record: &DisplayRecord) -> Vec<String> {
    let mut labels = Vec::new();
    if record.category != Category::Unknown {
        labels.push(tag_token(record.category.label()));
    }
    if let Some(sub) = record.sub_category.as_deref().filter(|s| !s.trim().is_empty()) {
        labels.push(tag_token(sub));
    }
    labels
}

fn genre_tags(record: &DisplayRecord) -> Vec<String> {
    record
        .genres
        .iter()
        .filter(|g| !g.trim().is_empty())
        .map(|g| map_genre(g))
        .collect()
}

fn links(record: &DisplayRecord) -> Vec<String> {
    let mut links = Vec::new();
    let detail = record.detail_link.as_deref().filter(|l| !l.is_empty());

    if record.source == CatalogSource::Tmdb {
        links.push(format!("[TMDB]({})", bookmark_url(record)));
    }
    if let Some(imdb) = record.imdb_id.as_deref().filter(|id| !id.is_empty()) {
        links.push(format!("[IMDB](https://www.imdb.com/title/{})", imdb));
    }
    if let Some(tvdb) = record.tvdb_id.as_deref().filter(|id| !id.is_empty()) {
        links.push(format!("[TVDB](https://www.thetvdb.com/series/{})", tvdb));
    }
    if record.source == CatalogSource::Douban && record.douban_id.is_some() {
        if let Some(link) = detail {
            links.push(format!("[Douban]({})", link));
        }
    }
    links
}

/// Markdown notes. With `auto_tags`, type and genre values link to their
/// tag search.
pub fn build_notes(record: &DisplayRecord, auto_tags: bool) -> String {
    let linked = |values: Vec<String>| -> Vec<String> {
        if auto_tags {
            values.iter().map(|v| tag_link(v)).collect()
        } else {
            values
        }
    };

    let mut notes = format!("**Title:** {}\n", record.title);
    if let Some(original) = record
        .original_title
        .as_deref()
        .filter(|o| !o.is_empty() && *o != record.title)
    {
        notes.push_str(&format!("**Original title:** {}\n", original));
    }
    if let Some(year) = record.year.as_deref().filter(|y| !y.is_empty()) {
        notes.push_str(&format!("**Year:** {}\n", year));
    }
    if let Some(rating) = record.vote_average.filter(|r| *r > 0.0) {
        notes.push_str(&format!("**Rating:** {:.1}\n", rating));
    }
    if let Some(runtime) = record.runtime.filter(|r| *r > 0) {
        notes.push_str(&format!("**Runtime:** {} min\n", runtime));
    }

    let types = type_labels(record);
    if !types.is_empty() {
        notes.push_str(&format!("**Type:** {}\n", linked(types).join(" · ")));
    }
    let genres = genre_tags(record);
    if !genres.is_empty() {
        notes.push_str(&format!("**Genres:** {}\n", linked(genres).join(" | ")));
    }
    if !record.directors.is_empty() {
        notes.push_str(&format!("**Directors:** {}\n", record.directors.join(" | ")));
    }
    if !record.actors.is_empty() {
        notes.push_str(&format!("**Actors:** {}\n", record.actors.join(" | ")));
    }

    let links = links(record);
    if !links.is_empty() {
        notes.push_str(&format!("**Links:** {}\n", links.join(" | ")));
    }
    notes
}

/// Tag set, or `None` when neither custom nor automatic tags are enabled.
pub fn build_tags(record: &DisplayRecord, config: &LinkdingConfig) -> Option<Vec<String>> {
    if !config.tags_enabled() {
        return None;
    }

    let mut tags: BTreeSet<String> = BASE_TAGS.iter().map(|t| t.to_string()).collect();
    tags.extend(config.custom_tags.iter().map(|t| tag_token(t)));
    if config.auto_tags {
        tags.extend(type_labels(record));
        tags.extend(genre_tags(record));
    }
    tags.retain(|t| !t.is_empty());
    Some(tags.into_iter().collect())
}

pub fn build_bookmark(record: &DisplayRecord, config: &LinkdingConfig) -> Result<Bookmark> {
    if record.category == Category::Unknown || record.external_id.trim().is_empty() {
        return Err(LinkdingError::InvalidRecord(format!(
            "{}:{} has no TMDB identity",
            record.category, record.external_id
        )));
    }
    if record.title.trim().is_empty() {
        return Err(LinkdingError::InvalidRecord(format!(
            "{}:{} has no title",
            record.category, record.external_id
        )));
    }

    Ok(Bookmark {
        url: bookmark_url(record),
        title: Some(bookmark_title(record)),
        description: record.overview.clone().filter(|o| !o.is_empty()),
        notes: config
            .generate_notes
            .then(|| build_notes(record, config.auto_tags)),
        is_archived: false,
        unread: config.mark_unread,
        shared: false,
        tag_names: build_tags(record, config),
    })
}
