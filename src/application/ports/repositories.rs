use async_trait::async_trait;
use anyhow::Result;

use crate::scan::Classification;

/// Store totals for the end-of-run report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub processed_repositories: i64,
    pub no_usage_repositories: i64,
    pub runner_absent_files: i64,
    pub distinct_valid_lines: i64,
    pub distinct_invalid_lines: i64,
    pub distinct_unsure_lines: i64,
}

/// Persistent survey results.
///
/// Every namespace is independent: a flag or counter write touches exactly
/// one key, so no operation needs a multi-key transaction.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Whether the repository was fully scanned by an earlier run
    async fn is_processed(&self, repository: &str) -> Result<bool>;

    /// Mark the repository as scanned
    async fn mark_processed(&self, repository: &str) -> Result<()>;

    /// Atomically add one to the counter for `line` in the namespace of
    /// `classification`
    async fn increment_line(&self, classification: Classification, line: &str) -> Result<()>;

    /// Current counter for `line`, 0 when never seen
    async fn line_count(&self, classification: Classification, line: &str) -> Result<i64>;

    /// Record a workflow file in which no run line was classified
    async fn mark_runner_absent(&self, repository: &str, file_name: &str) -> Result<()>;

    async fn is_runner_absent(&self, repository: &str, file_name: &str) -> Result<bool>;

    /// Record a repository with no valid runner invocation
    async fn mark_no_usage(&self, repository: &str) -> Result<()>;

    async fn has_no_usage(&self, repository: &str) -> Result<bool>;

    async fn summary(&self) -> Result<StoreSummary>;
}
