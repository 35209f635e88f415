use serde::{Deserialize, Serialize};

/// A repository returned by the repository search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name_with_owner: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page of repository search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub repositories: Vec<Repository>,
    pub page_info: PageInfo,
}

// GraphQL envelope

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySearchVariables<'a> {
    pub search_query: &'a str,
    pub first: u32,
    pub after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlErrorMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositorySearchData {
    pub search: SearchConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConnection {
    /// Nodes that are not repositories come back as `{}` or `null`
    #[serde(default)]
    pub nodes: Vec<Option<SearchNode>>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNode {
    pub name_with_owner: Option<String>,
    pub url: Option<String>,
}

impl SearchConnection {
    pub fn into_page(self) -> SearchPage {
        let repositories = self
            .nodes
            .into_iter()
            .flatten()
            .filter_map(|node| match (node.name_with_owner, node.url) {
                (Some(name_with_owner), Some(url)) => Some(Repository { name_with_owner, url }),
                _ => None,
            })
            .collect();

        SearchPage {
            repositories,
            page_info: self.page_info,
        }
    }
}

// REST code search

#[derive(Debug, Clone, Deserialize)]
pub struct CodeSearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<CodeSearchItem>,
}

/// A file matched by code search. `url` points at the contents API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeSearchItem {
    pub name: String,
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}
