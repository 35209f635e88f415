mod application;
mod config;
mod github;
mod infrastructure;
mod scan;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use application::services::{RepositoryCrawler, SurveyService, WorkflowScanner};
use config::SurveyConfig;
use github::{GitHubClient, GitHubSurveySource};
use infrastructure::database::{self, SqliteResultStore};
use infrastructure::logging::{self, BoundaryLogger};
use scan::LineClassifier;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may carry everything
    dotenvy::dotenv().ok();

    let config = SurveyConfig::from_env()?;
    let _log_guard = logging::init(config.log_dir.as_deref())?;

    info!("Starting runner survey");
    info!(
        query = %config.repository_query,
        runner = %config.runner.runner,
        workflow_path = %config.workflow_path,
        "Survey settings"
    );

    ensure_database_dir(&config.database_url)?;
    info!("Connecting to database: {}", config.database_url);
    let pool = database::connect(&config.database_url).await?;
    let store = Arc::new(SqliteResultStore::new(pool));

    let client = GitHubClient::new(config.github_token.clone(), config.github_api_url.clone())
        .context("Failed to build GitHub client")?;
    let source = Arc::new(GitHubSurveySource::new(
        client,
        config.repository_query.clone(),
        config.page_size,
        config.workflow_path.clone(),
        config.keyword.clone(),
    ));

    let logger = Arc::new(BoundaryLogger::new());
    let crawler = RepositoryCrawler::new(source.clone(), logger.clone());
    let scanner = WorkflowScanner::new(
        source,
        store.clone(),
        LineClassifier::new(config.runner.clone()),
        config.run_key.clone(),
        logger.clone(),
    );
    let survey = SurveyService::new(crawler, scanner, store, logger);

    match survey.run().await {
        Ok(report) => {
            info!(
                "Survey complete: {} repositories seen, {} scanned, {} with valid usage, {} code searches failed",
                report.repositories_seen, report.scanned, report.with_valid_usage, report.search_failures
            );
            Ok(())
        }
        Err(e) => {
            error!("Survey aborted: {:#}", e);
            Err(e)
        }
    }
}

/// SQLite creates the database file but not its directory.
fn ensure_database_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory: {}", dir.display()))?;
    }
    Ok(())
}
