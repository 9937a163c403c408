//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! the collection core needs:
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `SettingsStore` kept in process memory, for tests and ephemeral hosts
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::new("collect.db".into()).await?;
//!
//!     // Hand both to the collection service
//!     Ok(())
//! }
//! ```

mod http;
mod memory;
mod settings;

pub use http::ReqwestHttpClient;
pub use memory::MemorySettingsStore;
pub use settings::SqliteSettingsStore;
