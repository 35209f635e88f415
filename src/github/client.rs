use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};

use super::error::GitHubError;
use super::models::*;
use super::rate_limit::RateLimitBackoff;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Code search never returns results past this offset.
const CODE_SEARCH_RESULT_LIMIT: u32 = 1000;
const CODE_SEARCH_PAGE_SIZE: u32 = 100;

const REPOSITORY_SEARCH_QUERY: &str = r#"
query($searchQuery: String!, $first: Int!, $after: String) {
  search(query: $searchQuery, type: REPOSITORY, first: $first, after: $after) {
    nodes {
      ... on Repository {
        nameWithOwner
        url
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}
"#;

#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    token: String,
    api_base: String,
    backoff: RateLimitBackoff,
}

impl GitHubClient {
    pub fn new(token: String, api_base: impl Into<String>) -> Result<Self, GitHubError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            backoff: RateLimitBackoff::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: RateLimitBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "runner-survey")
            .header("Accept", "application/vnd.github.v3+json")
    }

    /// Send a request, sleeping through throttled responses and retrying the
    /// identical request. Any other non-success status is returned as
    /// `GitHubError::Api`.
    async fn send<F>(&self, build: F) -> Result<Response, GitHubError>
    where
        F: Fn() -> RequestBuilder,
    {
        loop {
            let response = self.authorized(build()).send().await?;
            let status = response.status();

            let now = chrono::Utc::now().timestamp();
            if let Some(wait) = self.backoff.retry_after(status, response.headers(), now) {
                warn!(
                    status = %status,
                    url = %response.url(),
                    wait_secs = wait.as_secs(),
                    "Rate limited, retry after: {} seconds",
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let url = response.url().to_string();
                let body = response.text().await.unwrap_or_default();
                return Err(GitHubError::Api { status, url, body });
            }

            return Ok(response);
        }
    }

    /// Fetch one page of the GraphQL repository search.
    /// `after` is `None` for the first page.
    pub async fn search_repositories(
        &self,
        query: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<SearchPage, GitHubError> {
        let url = format!("{}/graphql", self.api_base);
        let request = GraphQlRequest {
            query: REPOSITORY_SEARCH_QUERY,
            variables: RepositorySearchVariables {
                search_query: query,
                first,
                after,
            },
        };

        let response = self
            .send(|| self.client.post(&url).json(&request))
            .await?;
        let body: GraphQlResponse<RepositorySearchData> = response.json().await?;

        if !body.errors.is_empty() {
            return Err(GitHubError::GraphQl(
                body.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        let data = body
            .data
            .ok_or_else(|| GitHubError::GraphQl(vec!["response carried no data".to_string()]))?;
        Ok(data.search.into_page())
    }

    /// Run a code search and collect every result page.
    pub async fn search_code(&self, query: &str) -> Result<Vec<CodeSearchItem>, GitHubError> {
        let url = format!("{}/search/code", self.api_base);
        let per_page = CODE_SEARCH_PAGE_SIZE.to_string();
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let page_param = page.to_string();
            let response = self
                .send(|| {
                    self.client.get(&url).query(&[
                        ("q", query),
                        ("per_page", per_page.as_str()),
                        ("page", page_param.as_str()),
                    ])
                })
                .await?;
            let body: CodeSearchResponse = response.json().await?;

            if body.incomplete_results {
                debug!(query = %query, page, "Code search returned incomplete results");
            }

            let received = body.items.len() as u32;
            items.extend(body.items);

            let exhausted = received < CODE_SEARCH_PAGE_SIZE
                || items.len() as u64 >= body.total_count
                || page * CODE_SEARCH_PAGE_SIZE >= CODE_SEARCH_RESULT_LIMIT;
            if exhausted {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    /// Download and decode the text of a code search hit.
    pub async fn get_file_content(&self, item: &CodeSearchItem) -> Result<String, GitHubError> {
        let response = self.send(|| self.client.get(&item.url)).await?;
        let file: FileContent = response.json().await?;
        decode_content(&file)
    }
}

fn decode_content(file: &FileContent) -> Result<String, GitHubError> {
    let decode_error = |reason: String| GitHubError::Decode {
        path: file.path.clone(),
        reason,
    };

    if file.encoding != "base64" {
        return Err(decode_error(format!("unsupported encoding '{}'", file.encoding)));
    }

    let compact: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| decode_error(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::StatusCode;

    fn client_for(server: &mockito::ServerGuard) -> GitHubClient {
        GitHubClient::new("test-token".to_string(), server.url())
            .unwrap()
            .with_backoff(RateLimitBackoff {
                margin: Duration::ZERO,
                min: Duration::from_millis(10),
                cap: Duration::from_secs(1),
            })
    }

    fn search_body(names: &[&str], has_next: bool, cursor: Option<&str>) -> String {
        let nodes: Vec<serde_json::Value> = names
            .iter()
            .map(|n| serde_json::json!({ "nameWithOwner": n, "url": format!("https://github.com/{}", n) }))
            .collect();
        serde_json::json!({
            "data": {
                "search": {
                    "nodes": nodes,
                    "pageInfo": { "hasNextPage": has_next, "endCursor": cursor }
                }
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_search_repositories_sends_cursor_and_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "variables": { "searchQuery": "language:python stars:>200", "first": 100, "after": "Y3Vyc29yOjEwMA==" }
            })))
            .with_status(200)
            .with_body(search_body(&["psf/requests", "pallets/flask"], true, Some("Y3Vyc29yOjIwMA==")))
            .create_async()
            .await;

        let client = client_for(&server);
        let page = client
            .search_repositories("language:python stars:>200", 100, Some("Y3Vyc29yOjEwMA=="))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.repositories.len(), 2);
        assert_eq!(page.repositories[0].name_with_owner, "psf/requests");
        assert!(page.page_info.has_next_page);
        assert_eq!(page.page_info.end_cursor.as_deref(), Some("Y3Vyc29yOjIwMA=="));
    }

    #[tokio::test]
    async fn test_search_skips_non_repository_nodes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                r#"{"data":{"search":{"nodes":[{},null,{"nameWithOwner":"a/b","url":"https://github.com/a/b"}],
                "pageInfo":{"hasNextPage":false,"endCursor":null}}}}"#,
            )
            .create_async()
            .await;

        let page = client_for(&server).search_repositories("q", 10, None).await.unwrap();
        assert_eq!(page.repositories.len(), 1);
        assert!(!page.page_info.has_next_page);
    }

    #[tokio::test]
    async fn test_throttled_request_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let reset = (chrono::Utc::now().timestamp() - 10).to_string();
        let throttled = server
            .mock("POST", "/graphql")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", &reset)
            .with_body(r#"{"message":"API rate limit exceeded"}"#)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(search_body(&["a/b"], false, None))
            .expect(1)
            .create_async()
            .await;

        let page = client_for(&server).search_repositories("q", 100, None).await.unwrap();

        throttled.assert_async().await;
        ok.assert_async().await;
        assert_eq!(page.repositories.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_reset_does_not_retry_back_to_back() {
        let mut server = mockito::Server::new_async().await;
        let reset = (chrono::Utc::now().timestamp() - 10).to_string();
        let throttled = server
            .mock("POST", "/graphql")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", &reset)
            .expect_at_least(1)
            .expect_at_most(5)
            .create_async()
            .await;

        let client = GitHubClient::new("test-token".to_string(), server.url())
            .unwrap()
            .with_backoff(RateLimitBackoff {
                margin: Duration::ZERO,
                min: Duration::from_millis(100),
                cap: Duration::from_secs(1),
            });
        let outcome = tokio::time::timeout(
            Duration::from_millis(350),
            client.search_repositories("q", 100, None),
        )
        .await;

        assert!(outcome.is_err(), "throttled search should still be waiting");
        throttled.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_throttled_failure_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(502)
            .with_body("bad gateway")
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server).search_repositories("q", 100, None).await.unwrap_err();
        match err {
            GitHubError::Api { status, body, .. } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_graphql_errors_are_fatal() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"Bad credentials"}]}"#)
            .create_async()
            .await;

        let err = client_for(&server).search_repositories("q", 100, None).await.unwrap_err();
        assert!(matches!(err, GitHubError::GraphQl(ref m) if m == &vec!["Bad credentials".to_string()]));
    }

    #[tokio::test]
    async fn test_code_search_and_content_download() {
        let mut server = mockito::Server::new_async().await;
        let content_url = format!("{}/repos/a/b/contents/.github/workflows/ci.yml", server.url());
        server
            .mock("GET", "/search/code")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "pytest repo:a/b".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "total_count": 1,
                    "incomplete_results": false,
                    "items": [{ "name": "ci.yml", "path": ".github/workflows/ci.yml", "url": content_url }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let encoded = STANDARD.encode("jobs:\n  test:\n    steps:\n      - run: pytest\n");
        // The contents API wraps base64 at 60 columns
        let wrapped: String = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        server
            .mock("GET", "/repos/a/b/contents/.github/workflows/ci.yml")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "name": "ci.yml",
                    "path": ".github/workflows/ci.yml",
                    "content": wrapped,
                    "encoding": "base64"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let items = client.search_code("pytest repo:a/b").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "ci.yml");

        let text = client.get_file_content(&items[0]).await.unwrap();
        assert!(text.contains("- run: pytest"));
    }

    #[test]
    fn test_decode_rejects_unknown_encoding() {
        let file = FileContent {
            path: ".github/workflows/big.yml".to_string(),
            content: String::new(),
            encoding: "none".to_string(),
        };
        assert!(matches!(decode_content(&file), Err(GitHubError::Decode { .. })));
    }
}
