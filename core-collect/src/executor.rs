//! # Sync Executor
//!
//! Pushes a planned work list to the remote store. Each item is resolved
//! through the catalog and created remotely; failures are recorded per item
//! and never abort the batch. Up to `max_concurrent` pushes run at once and
//! outcomes keep the work-list order.
//!
//! Each catalog lookup and each create is bounded by the request timeout;
//! a call that runs over fails that item only.
//!
//! Cancellation is checked between items. An interrupted execution returns
//! the outcomes gathered so far with `interrupted` set.

use crate::catalog::CatalogLookup;
use crate::planner::Candidate;
use crate::remote::RemoteStoreClient;
use crate::report::{ItemOutcome, ItemStatus};
use futures::stream::{self, StreamExt};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct Execution {
    pub outcomes: Vec<ItemOutcome>,
    pub interrupted: bool,
}

pub struct SyncExecutor {
    catalog: Arc<dyn CatalogLookup>,
    remote: Arc<dyn RemoteStoreClient>,
    max_concurrent: usize,
    request_timeout: Duration,
}

impl SyncExecutor {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        remote: Arc<dyn RemoteStoreClient>,
        max_concurrent: usize,
        request_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            remote,
            max_concurrent: max_concurrent.max(1),
            request_timeout,
        }
    }

    fn timed_out(&self) -> String {
        format!("timed out after {:?}", self.request_timeout)
    }

    pub async fn execute(&self, work: Vec<Candidate>, cancel: &CancellationToken) -> Execution {
        let mut execution = Execution {
            outcomes: Vec::with_capacity(work.len()),
            interrupted: false,
        };

        let mut pushes = pin!(stream::iter(work)
            .map(|candidate| self.push_one(candidate))
            .buffered(self.max_concurrent));

        loop {
            if cancel.is_cancelled() {
                execution.interrupted = true;
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    execution.interrupted = true;
                    break;
                }
                next = pushes.next() => match next {
                    Some(outcome) => execution.outcomes.push(outcome),
                    None => break,
                },
            }
        }

        if execution.interrupted {
            warn!(
                processed = execution.outcomes.len(),
                "Push interrupted by cancellation"
            );
        }
        execution
    }

    async fn push_one(&self, candidate: Candidate) -> ItemOutcome {
        let Candidate { key, item } = candidate;

        let lookup = timeout(
            self.request_timeout,
            self.catalog.lookup(key.category(), key.external_id()),
        )
        .await;

        let status = match lookup {
            Ok(Ok(Some(record))) => {
                match timeout(self.request_timeout, self.remote.create(&record)).await {
                    Ok(Ok(())) => ItemStatus::Created,
                    Ok(Err(e)) => {
                        warn!(%key, remote = self.remote.name(), "Create failed: {}", e);
                        ItemStatus::CreateFailed(e.to_string())
                    }
                    Err(_) => {
                        warn!(%key, remote = self.remote.name(), "Create timed out");
                        ItemStatus::CreateFailed(self.timed_out())
                    }
                }
            }
            Ok(Ok(None)) => {
                debug!(%key, "Catalog has no entry");
                ItemStatus::LookupMissing
            }
            Ok(Err(e)) => {
                warn!(%key, "Catalog lookup failed: {}", e);
                ItemStatus::LookupFailed(e.to_string())
            }
            Err(_) => {
                warn!(%key, "Catalog lookup timed out");
                ItemStatus::LookupFailed(self.timed_out())
            }
        };

        ItemOutcome { key, item, status }
    }
}
