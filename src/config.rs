use anyhow::{bail, Context, Result};
use std::env;

use crate::github::DEFAULT_API_BASE;
use crate::scan::RunnerProfile;

/// Survey configuration, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    pub github_token: String,
    pub github_api_url: String,
    pub database_url: String,
    pub repository_query: String,
    pub page_size: u32,
    pub workflow_path: String,
    pub run_key: String,
    /// Code search keyword; defaults to the runner name
    pub keyword: String,
    pub runner: RunnerProfile,
    pub log_dir: Option<String>,
}

impl SurveyConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let github_token = lookup("GITHUB_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .context("GITHUB_TOKEN not set")?;

        let page_size: u32 = var("SURVEY_PAGE_SIZE", "100")
            .parse()
            .context("SURVEY_PAGE_SIZE must be a positive integer")?;
        if page_size == 0 {
            bail!("SURVEY_PAGE_SIZE must be a positive integer");
        }

        let runner = RunnerProfile {
            runner: var("SURVEY_RUNNER", "pytest"),
            interpreter: var("SURVEY_INTERPRETER", "python"),
            container_tool: var("SURVEY_CONTAINER_TOOL", "docker"),
            task_runner: var("SURVEY_TASK_RUNNER", "poetry"),
            installer: var("SURVEY_INSTALLER", "pip"),
        };

        Ok(Self {
            github_token,
            github_api_url: var("GITHUB_API_URL", DEFAULT_API_BASE),
            database_url: var("DATABASE_URL", "sqlite://data/runner-survey.sqlite"),
            repository_query: var("SURVEY_REPOSITORY_QUERY", "language:python stars:>200"),
            page_size: page_size.min(100),
            workflow_path: var("SURVEY_WORKFLOW_PATH", ".github/workflows"),
            run_key: var("SURVEY_RUN_KEY", "run"),
            keyword: var("SURVEY_KEYWORD", &runner.runner),
            runner,
            log_dir: lookup("SURVEY_LOG_DIR").filter(|v| !v.trim().is_empty()),
        })
    }
}
