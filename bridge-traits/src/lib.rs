//! # Host Bridge Traits
//!
//! Host capability traits that the collection core depends on.
//!
//! ## Overview
//!
//! This crate defines the contract between the collection core and the host
//! it runs in. Each trait represents a capability that the core requires but
//! that the host supplies (an HTTP stack, a durable key/value store, a clock,
//! a log pipeline).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and timeouts
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value storage
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Host Adapters
//!
//! | Host     | Implementation Crate | Status |
//! |----------|----------------------|--------|
//! | Desktop  | `bridge-desktop`     | ✅ Available |
//! | Embedded | TBD                  | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Host implementations should:
//!
//! - Convert host-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., key names, HTTP status)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent usage
//! across async tasks. Implementations must ensure thread safety.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::SettingsStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
