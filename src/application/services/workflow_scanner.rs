use anyhow::Result;
use std::sync::Arc;

use crate::application::ports::{ResultStore, WorkflowSource};
use crate::github::{CodeSearchItem, Repository, WorkflowParser};
use crate::infrastructure::logging::{BoundaryLogger, Timer};
use crate::scan::{command_lines, Classification, LineClassifier};

/// What one `scan` call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// The repository was already processed; nothing was fetched
    pub skipped: bool,
    pub files: usize,
    pub found_valid: bool,
    pub valid_lines: usize,
    pub invalid_lines: usize,
    pub unsure_lines: usize,
    /// Files with no classified line (includes unreadable ones)
    pub runner_absent_files: Vec<String>,
    /// Files that could not be downloaded or parsed
    pub unreadable_files: usize,
    /// Code search failed for this repository; it was recorded without usage
    pub search_failed: bool,
}

impl ScanReport {
    fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Valid => self.valid_lines += 1,
            Classification::Invalid => self.invalid_lines += 1,
            Classification::Unsure => self.unsure_lines += 1,
        }
    }
}

/// WorkflowScanner - classifies the run lines of one repository's workflows
///
/// Responsibilities:
/// - skip repositories already processed
/// - find workflow files mentioning the runner and parse them
/// - classify every run line and bump the matching counter
/// - record runner-absent files and repositories with no valid usage
/// - mark the repository processed, whatever the outcome
///
/// A failed code search only loses that repository: it is logged, recorded
/// as no-usage and marked processed. Store failures abort the scan.
pub struct WorkflowScanner<W, R>
where
    W: WorkflowSource,
    R: ResultStore,
{
    source: Arc<W>,
    store: Arc<R>,
    classifier: LineClassifier,
    run_key: String,
    logger: Arc<BoundaryLogger>,
}

impl<W, R> WorkflowScanner<W, R>
where
    W: WorkflowSource,
    R: ResultStore,
{
    pub fn new(
        source: Arc<W>,
        store: Arc<R>,
        classifier: LineClassifier,
        run_key: String,
        logger: Arc<BoundaryLogger>,
    ) -> Self {
        Self {
            source,
            store,
            classifier,
            run_key,
            logger,
        }
    }

    pub async fn scan(&self, trace_id: &str, repository: &Repository) -> Result<ScanReport> {
        let name = repository.name_with_owner.as_str();

        if self.store.is_processed(name).await? {
            self.logger.repo_skipped(trace_id, name);
            return Ok(ScanReport {
                skipped: true,
                ..Default::default()
            });
        }

        let timer = Timer::start();
        self.logger.scan_entry(trace_id, name);

        let mut report = ScanReport::default();
        match self.source.find_workflow_files(name).await {
            Ok(files) => {
                report.files = files.len();
                for file in &files {
                    self.scan_file(trace_id, name, file, &mut report).await?;
                }
            }
            Err(e) => {
                self.logger.search_failed(trace_id, name, &format!("{:#}", e));
                report.search_failed = true;
            }
        }

        if !report.found_valid {
            self.store
                .mark_no_usage(name)
                .await
                .inspect_err(|e| self.logger.store_error(trace_id, "mark_no_usage", e))?;
        }
        self.store
            .mark_processed(name)
            .await
            .inspect_err(|e| self.logger.store_error(trace_id, "mark_processed", e))?;

        self.logger.scan_exit(trace_id, name, report.files, report.found_valid, timer.elapsed_ms());
        Ok(report)
    }

    /// Classify one file. Download and parse failures are logged and the
    /// file counts as runner-absent; store failures propagate.
    async fn scan_file(
        &self,
        trace_id: &str,
        repository: &str,
        file: &CodeSearchItem,
        report: &mut ScanReport,
    ) -> Result<()> {
        let document = match self.source.fetch_content(file).await {
            Ok(content) => WorkflowParser::parse(&file.name, &content).map_err(anyhow::Error::msg),
            Err(e) => Err(e),
        };
        let document = match document {
            Ok(document) => document,
            Err(e) => {
                self.logger.file_error(trace_id, repository, &file.name, &format!("{:#}", e));
                report.unreadable_files += 1;
                self.mark_runner_absent(trace_id, repository, &file.name, report).await?;
                return Ok(());
            }
        };

        let runs = document.run_blocks(&self.run_key);
        if !runs.key_found() {
            self.logger.key_not_found(trace_id, repository, &document.file_name, &self.run_key);
        }

        let mut handled = false;
        for block in &runs.blocks {
            for line in command_lines(block) {
                let classification = self.classifier.classify(&line);
                self.store
                    .increment_line(classification, &line)
                    .await
                    .inspect_err(|e| self.logger.store_error(trace_id, "increment_line", e))?;
                self.logger.line_classified(trace_id, repository, &file.name, classification, &line);

                handled = true;
                if classification == Classification::Valid {
                    report.found_valid = true;
                }
                report.record(classification);
            }
        }

        if !handled {
            self.mark_runner_absent(trace_id, repository, &file.name, report).await?;
        }
        Ok(())
    }

    async fn mark_runner_absent(
        &self,
        trace_id: &str,
        repository: &str,
        file_name: &str,
        report: &mut ScanReport,
    ) -> Result<()> {
        self.store
            .mark_runner_absent(repository, file_name)
            .await
            .inspect_err(|e| self.logger.store_error(trace_id, "mark_runner_absent", e))?;
        report.runner_absent_files.push(file_name.to_string());
        Ok(())
    }
}
