//! # Linkding Provider
//!
//! Implements `RemoteStoreClient` for a [Linkding](https://github.com/sissbruecker/linkding)
//! bookmark server.
//!
//! ## Overview
//!
//! This crate provides:
//! - Paginated bookmark search, decoding TMDB bookmark URLs into unique keys
//! - Bookmark creation from catalog display records
//! - Bookmark payloads with a title, markdown notes and tags
//! - Token authentication through the host `HttpClient`

pub mod bookmark;
pub mod config;
pub mod connector;
pub mod error;
pub mod types;

pub use config::{LinkdingConfig, LinkdingConfigBuilder};
pub use connector::LinkdingConnector;
pub use error::{LinkdingError, Result};
pub use types::Bookmark;
