use anyhow::Result;
use futures::TryStreamExt;
use std::sync::Arc;
use tracing::info;

use crate::application::ports::{RepositorySearch, ResultStore, StoreSummary, WorkflowSource};
use crate::application::services::{RepositoryCrawler, WorkflowScanner};
use crate::infrastructure::logging::{BoundaryLogger, Timer, TraceContext};

/// Totals for one run of the survey
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyReport {
    pub trace_id: String,
    pub repositories_seen: usize,
    pub scanned: usize,
    pub skipped: usize,
    pub with_valid_usage: usize,
    /// Repositories whose code search failed; recorded and not retried
    pub search_failures: usize,
    pub store: StoreSummary,
}

/// SurveyService - crawl, then scan each repository as it arrives
///
/// One logical thread of control: the next page is only requested once
/// every repository of the current page has been scanned.
pub struct SurveyService<S, W, R>
where
    S: RepositorySearch,
    W: WorkflowSource,
    R: ResultStore,
{
    crawler: RepositoryCrawler<S>,
    scanner: WorkflowScanner<W, R>,
    store: Arc<R>,
    logger: Arc<BoundaryLogger>,
}

impl<S, W, R> SurveyService<S, W, R>
where
    S: RepositorySearch,
    W: WorkflowSource,
    R: ResultStore,
{
    pub fn new(
        crawler: RepositoryCrawler<S>,
        scanner: WorkflowScanner<W, R>,
        store: Arc<R>,
        logger: Arc<BoundaryLogger>,
    ) -> Self {
        Self {
            crawler,
            scanner,
            store,
            logger,
        }
    }

    /// Run the crawl to exhaustion. Stops at the first fatal error; work
    /// already stored survives and is skipped on the next run.
    pub async fn run(&self) -> Result<SurveyReport> {
        let trace_id = TraceContext::new_trace_id();
        let timer = Timer::start();
        info!(trace_id = %trace_id, "[{}] Survey started", trace_id);

        let mut report = SurveyReport {
            trace_id: trace_id.clone(),
            ..Default::default()
        };

        let repositories = self.crawler.repositories(&trace_id);
        futures::pin_mut!(repositories);

        while let Some(repository) = repositories.try_next().await? {
            report.repositories_seen += 1;

            let scan = match self.scanner.scan(&trace_id, &repository).await {
                Ok(scan) => scan,
                Err(e) => {
                    self.logger.scan_error(&trace_id, &repository.name_with_owner, &format!("{:#}", e));
                    return Err(e);
                }
            };

            if scan.skipped {
                report.skipped += 1;
            } else {
                report.scanned += 1;
                if scan.search_failed {
                    report.search_failures += 1;
                }
                if scan.found_valid {
                    report.with_valid_usage += 1;
                }
            }
        }

        report.store = self.store.summary().await?;
        info!(
            trace_id = %trace_id,
            seen = report.repositories_seen,
            scanned = report.scanned,
            skipped = report.skipped,
            with_valid_usage = report.with_valid_usage,
            search_failures = report.search_failures,
            processed_total = report.store.processed_repositories,
            no_usage_total = report.store.no_usage_repositories,
            runner_absent_files = report.store.runner_absent_files,
            distinct_valid = report.store.distinct_valid_lines,
            distinct_invalid = report.store.distinct_invalid_lines,
            distinct_unsure = report.store.distinct_unsure_lines,
            duration_ms = %timer.elapsed_ms(),
            "[{}] Survey finished: {} repositories ({} scanned, {} skipped)",
            trace_id, report.repositories_seen, report.scanned, report.skipped
        );

        Ok(report)
    }
}
