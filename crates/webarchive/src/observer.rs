use crate::export::ExportResult;
use crate::filter::FilterStage;
use crate::parse::ParseStats;
use crate::Error;
use reqwest::Url;
use std::time::Duration;

/// Checkpoints of a pipeline run. Every method defaults to doing nothing.
pub trait PipelineObserver: Send + Sync {
    fn fetch_started(&self, _url: &Url, _attempt: usize, _max_attempts: usize) {}

    fn fetch_retry(
        &self,
        _attempt: usize,
        _max_attempts: usize,
        _error: &Error,
        _delay: Duration,
    ) {
    }

    fn fetch_completed(&self, _bytes: usize, _attempts: usize) {}

    fn records_parsed(&self, _stats: &ParseStats) {}

    fn filter_stage_completed(&self, _stage: FilterStage, _removed: usize, _remaining: usize) {}

    fn dns_check_completed(&self, _resolved: usize, _unresolved: usize) {}

    fn export_completed(&self, _result: &ExportResult) {}
}

#[cfg(test)]
pub struct NoopObserver;

#[cfg(test)]
impl PipelineObserver for NoopObserver {}
