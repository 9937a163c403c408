//! Remote store abstraction.
//!
//! A remote store holds one record per unique key. The engine only needs to
//! probe which keys exist and to create new records; providers such as
//! `provider-linkding` implement this trait on top of the host
//! [`HttpClient`](bridge_traits::HttpClient).

use crate::catalog::DisplayRecord;
use crate::model::UniqueKey;
use async_trait::async_trait;
use bridge_traits::error::Result;
use std::collections::HashSet;

#[async_trait]
pub trait RemoteStoreClient: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Filter matching every record this engine creates.
    fn existing_filter(&self) -> String;

    /// Unique keys of all records matching `filter`.
    ///
    /// Records that do not decode to a key are skipped.
    async fn search_existing(&self, filter: &str) -> Result<HashSet<UniqueKey>>;

    /// Create one record.
    async fn create(&self, record: &DisplayRecord) -> Result<()>;
}
