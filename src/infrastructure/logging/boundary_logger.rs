use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::scan::Classification;

/// BoundaryLogger - structured events at every survey stage boundary
///
/// Format: [trace_id] [caller→callee] operation [STAGE] details
#[derive(Clone)]
pub struct BoundaryLogger;

impl BoundaryLogger {
    pub fn new() -> Self {
        Self
    }

    /// Example: [Crawler→Search] page [←DONE] 100 repositories has_next_page=true cursor="cursor:100"
    pub fn page_fetched(&self, trace_id: &str, count: usize, has_next_page: bool, cursor: Option<&str>, duration_ms: f64) {
        let cursor = cursor.map(decode_cursor).unwrap_or_else(|| "-".to_string());
        info!(
            trace_id = %trace_id,
            flow = "Crawler→Search",
            stage = "←DONE",
            count = count,
            has_next_page = has_next_page,
            cursor = %cursor,
            duration_ms = %duration_ms,
            "[{}] [Crawler→Search] page [←DONE] {} repositories has_next_page={} cursor={:?} {:.2}ms",
            trace_id, count, has_next_page, cursor, duration_ms
        );
    }

    pub fn page_requested(&self, trace_id: &str, cursor: Option<&str>) {
        match cursor {
            None => info!(trace_id = %trace_id, flow = "Crawler→Search", stage = "EXT→", "[{}] [Crawler→Search] initial page [EXT→]", trace_id),
            Some(c) => info!(
                trace_id = %trace_id,
                flow = "Crawler→Search",
                stage = "EXT→",
                "[{}] [Crawler→Search] next page [EXT→] after={:?}",
                trace_id, decode_cursor(c)
            ),
        }
    }

    /// Example: [Scanner] psf/requests [SKIP] already processed
    pub fn repo_skipped(&self, trace_id: &str, repository: &str) {
        info!(
            trace_id = %trace_id,
            repository = %repository,
            stage = "SKIP",
            "[{}] [Scanner] {} [SKIP] already processed",
            trace_id, repository
        );
    }

    pub fn scan_entry(&self, trace_id: &str, repository: &str) {
        info!(
            trace_id = %trace_id,
            repository = %repository,
            stage = "ENTRY",
            "[{}] [Survey→Scanner] {} [ENTRY]",
            trace_id, repository
        );
    }

    /// Example: [Survey→Scanner] psf/requests [←DONE] files=2 valid=true 830.12ms
    pub fn scan_exit(&self, trace_id: &str, repository: &str, files: usize, found_valid: bool, duration_ms: f64) {
        info!(
            trace_id = %trace_id,
            repository = %repository,
            stage = "←DONE",
            files = files,
            found_valid = found_valid,
            duration_ms = %duration_ms,
            "[{}] [Survey→Scanner] {} [←DONE] files={} valid={} {:.2}ms",
            trace_id, repository, files, found_valid, duration_ms
        );
    }

    pub fn scan_error<E: std::fmt::Display>(&self, trace_id: &str, repository: &str, error: &E) {
        error!(
            trace_id = %trace_id,
            repository = %repository,
            stage = "←FAIL",
            error = %error,
            "[{}] [Survey→Scanner] {} [←FAIL] error={}",
            trace_id, repository, error
        );
    }

    /// Example: [Scanner] psf/requests ci.yml [Valid] pytest -v
    pub fn line_classified(&self, trace_id: &str, repository: &str, file_name: &str, classification: Classification, line: &str) {
        debug!(
            trace_id = %trace_id,
            repository = %repository,
            file = %file_name,
            classification = %classification,
            line = %line,
            "[{}] [Scanner] {} {} [{}] {}",
            trace_id, repository, file_name, classification, line
        );
    }

    /// The file was searched for the run key but had none
    pub fn key_not_found(&self, trace_id: &str, repository: &str, file_name: &str, key: &str) {
        warn!(
            trace_id = %trace_id,
            repository = %repository,
            file = %file_name,
            key = %key,
            "[{}] [Scanner] {} {} [NO-KEY] no occurrence of '{}'",
            trace_id, repository, file_name, key
        );
    }

    /// Per-file failure that does not stop the scan
    pub fn file_error<E: std::fmt::Display>(&self, trace_id: &str, repository: &str, file_name: &str, error: &E) {
        warn!(
            trace_id = %trace_id,
            repository = %repository,
            file = %file_name,
            stage = "←FAIL",
            error = %error,
            "[{}] [Scanner] {} {} [←FAIL] {}",
            trace_id, repository, file_name, error
        );
    }

    /// Code search for one repository failed; the crawl moves on
    pub fn search_failed<E: std::fmt::Display>(&self, trace_id: &str, repository: &str, error: &E) {
        warn!(
            trace_id = %trace_id,
            repository = %repository,
            flow = "Scanner→CodeSearch",
            stage = "←FAIL",
            error = %error,
            "[{}] [Scanner→CodeSearch] {} [←FAIL] {}",
            trace_id, repository, error
        );
    }

    pub fn store_error<E: std::fmt::Display>(&self, trace_id: &str, operation: &str, error: &E) {
        error!(
            trace_id = %trace_id,
            flow = "Scanner→Store",
            operation = %operation,
            stage = "←FAIL",
            error = %error,
            "[{}] [Scanner→Store] {} [←FAIL] error={}",
            trace_id, operation, error
        );
    }
}

impl Default for BoundaryLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// GitHub cursors are base64 of e.g. `cursor:100`; show the decoded form
/// when it is readable and the raw token otherwise.
pub fn decode_cursor(cursor: &str) -> String {
    STANDARD
        .decode(cursor)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| cursor.to_string())
}

/// Elapsed-time helper for boundary events
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
