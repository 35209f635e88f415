pub mod client;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod workflow_parser;
pub mod workflow_source;

pub use client::{GitHubClient, DEFAULT_API_BASE};
pub use models::*;
pub use workflow_parser::WorkflowParser;
pub use workflow_source::GitHubSurveySource;
