use async_trait::async_trait;
use anyhow::Result;

use crate::github::{CodeSearchItem, SearchPage};

/// Paged repository listing
#[async_trait]
pub trait RepositorySearch: Send + Sync {
    /// Fetch the page after `cursor`, or the first page when `None`.
    /// Throttling is absorbed by the implementation; an error is fatal.
    async fn search_page(&self, cursor: Option<&str>) -> Result<SearchPage>;
}

/// Access to one repository's CI workflow files
#[async_trait]
pub trait WorkflowSource: Send + Sync {
    /// Workflow files of `repository` that mention the runner keyword
    async fn find_workflow_files(&self, repository: &str) -> Result<Vec<CodeSearchItem>>;

    /// Decoded text of one file returned by `find_workflow_files`
    async fn fetch_content(&self, file: &CodeSearchItem) -> Result<String>;
}
