use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the GitHub APIs.
///
/// Throttling never shows up here: the client waits it out and retries.
#[derive(Error, Debug)]
pub enum GitHubError {
    /// Non-success, non-throttled response
    #[error("GitHub API error ({status}) at {url}: {body}")]
    Api {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// GraphQL answered 200 but reported errors
    #[error("GitHub GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File content could not be decoded to text
    #[error("Content decode error for {path}: {reason}")]
    Decode { path: String, reason: String },
}
