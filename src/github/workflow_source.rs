use anyhow::{Context, Result};
use async_trait::async_trait;

use super::client::GitHubClient;
use super::models::{CodeSearchItem, SearchPage};
use crate::application::ports::{RepositorySearch, WorkflowSource};

/// Binds a `GitHubClient` to the survey's fixed queries.
#[derive(Clone)]
pub struct GitHubSurveySource {
    client: GitHubClient,
    repository_query: String,
    page_size: u32,
    workflow_path: String,
    keyword: String,
}

impl GitHubSurveySource {
    pub fn new(
        client: GitHubClient,
        repository_query: String,
        page_size: u32,
        workflow_path: String,
        keyword: String,
    ) -> Self {
        Self {
            client,
            repository_query,
            page_size: page_size.clamp(1, 100),
            workflow_path,
            keyword,
        }
    }

    /// Code search query for the YAML workflows of one repository.
    pub fn workflow_query(&self, repository: &str) -> String {
        format!(
            "{} in:file filename:*.yml path:{} repo:{}",
            self.keyword, self.workflow_path, repository
        )
    }
}

#[async_trait]
impl RepositorySearch for GitHubSurveySource {
    async fn search_page(&self, cursor: Option<&str>) -> Result<SearchPage> {
        let page = self
            .client
            .search_repositories(&self.repository_query, self.page_size, cursor)
            .await
            .with_context(|| format!("Repository search failed (cursor: {:?})", cursor))?;
        Ok(page)
    }
}

#[async_trait]
impl WorkflowSource for GitHubSurveySource {
    async fn find_workflow_files(&self, repository: &str) -> Result<Vec<CodeSearchItem>> {
        let query = self.workflow_query(repository);
        let items = self
            .client
            .search_code(&query)
            .await
            .with_context(|| format!("Code search failed for {}", repository))?;
        Ok(items)
    }

    async fn fetch_content(&self, file: &CodeSearchItem) -> Result<String> {
        let content = self
            .client
            .get_file_content(file)
            .await
            .with_context(|| format!("Failed to download {}", file.path))?;
        Ok(content)
    }
}
