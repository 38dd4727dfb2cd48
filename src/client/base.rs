//! The data source seam the poller fetches from.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;

/// Filter parameters of a single fetch. Keys may repeat (`state=OK&state=Erred`).
pub type Query = Vec<(String, String)>;

/// A source of aggregate statistics.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Number of objects behind a list endpoint such as `users` or `projects`,
    /// filtered by `query`.
    async fn count(&self, endpoint: &str, query: &[(String, String)]) -> Result<u64, ClientError>;

    /// Raw payload of a `marketplace-stats` action: either a list of rows or
    /// a nested mapping, depending on the action.
    async fn stats(&self, action: &str) -> Result<Value, ClientError>;
}
