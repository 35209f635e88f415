use async_trait::async_trait;
use anyhow::Result;
use sqlx::SqlitePool;

use crate::application::ports::repositories::*;
use crate::scan::Classification;

/// SQLite implementation of ResultStore
#[derive(Clone)]
pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn is_processed(&self, repository: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM processed_repositories WHERE name_with_owner = ?"
        )
        .bind(repository)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn mark_processed(&self, repository: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO processed_repositories (name_with_owner) VALUES (?)"
        )
        .bind(repository)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_line(&self, classification: Classification, line: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO line_counts (classification, line, count) VALUES (?, ?, 1)
            ON CONFLICT (classification, line) DO UPDATE SET count = count + 1
            "#
        )
        .bind(classification.to_string())
        .bind(line)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn line_count(&self, classification: Classification, line: &str) -> Result<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT count FROM line_counts WHERE classification = ? AND line = ?"
        )
        .bind(classification.to_string())
        .bind(line)
        .fetch_optional(&self.pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    async fn mark_runner_absent(&self, repository: &str, file_name: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO runner_absent_files (repository, file_name) VALUES (?, ?)"
        )
        .bind(repository)
        .bind(file_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_runner_absent(&self, repository: &str, file_name: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM runner_absent_files WHERE repository = ? AND file_name = ?"
        )
        .bind(repository)
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn mark_no_usage(&self, repository: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO no_usage_repositories (name_with_owner) VALUES (?)"
        )
        .bind(repository)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn has_no_usage(&self, repository: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM no_usage_repositories WHERE name_with_owner = ?"
        )
        .bind(repository)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn summary(&self) -> Result<StoreSummary> {
        let processed_repositories: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM processed_repositories")
                .fetch_one(&self.pool)
                .await?;
        let no_usage_repositories: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM no_usage_repositories")
                .fetch_one(&self.pool)
                .await?;
        let runner_absent_files: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM runner_absent_files")
                .fetch_one(&self.pool)
                .await?;

        let per_classification: Vec<(String, i64)> = sqlx::query_as(
            "SELECT classification, COUNT(*) FROM line_counts GROUP BY classification"
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summary = StoreSummary {
            processed_repositories,
            no_usage_repositories,
            runner_absent_files,
            ..Default::default()
        };
        for (classification, distinct) in per_classification {
            match classification.parse::<Classification>() {
                Ok(Classification::Valid) => summary.distinct_valid_lines = distinct,
                Ok(Classification::Invalid) => summary.distinct_invalid_lines = distinct,
                Ok(Classification::Unsure) => summary.distinct_unsure_lines = distinct,
                Err(e) => tracing::warn!("Ignoring unknown line bucket: {}", e),
            }
        }

        Ok(summary)
    }
}
