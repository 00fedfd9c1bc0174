use crate::dns::{self, HostResolver};
use crate::domain::Domain;
use crate::export::{sorted, ExportResult, Exporter, Format};
use crate::fetch::{CdxFetcher, Delay, FetchConfig, Transport};
use crate::filter::{self, FilterConfig};
use crate::observer::PipelineObserver;
use crate::parse::RecordParser;
use crate::stats::{RunStatistics, StatsCollector};
use crate::Result;
use std::path::PathBuf;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub formats: Vec<Format>,
    /// Also dump the URLs of the considered records.
    pub save_raw: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub domain: Domain,
    /// Final subdomains, sorted.
    pub subdomains: Vec<String>,
    pub stats: RunStatistics,
    pub exports: Vec<ExportResult>,
    pub finished_at: OffsetDateTime,
}

/// Validate, fetch, parse, filter, optionally resolve, then export.
pub struct Pipeline<'a> {
    transport: &'a dyn Transport,
    delay: &'a dyn Delay,
    resolver: Option<&'a dyn HostResolver>,
    observer: &'a dyn PipelineObserver,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        delay: &'a dyn Delay,
        observer: &'a dyn PipelineObserver,
    ) -> Self {
        Self {
            transport,
            delay,
            resolver: None,
            observer,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn HostResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub async fn run(
        &self,
        input: &str,
        fetch: &FetchConfig,
        filter: &FilterConfig,
        export: &ExportConfig,
    ) -> Result<RunReport> {
        let domain = Domain::validate(input)?;
        let mut stats = StatsCollector::new();

        // -- fetch & parse
        let body = CdxFetcher::new(self.transport, self.delay, self.observer)
            .fetch(&domain, fetch)
            .await?;
        let parsed = RecordParser::new(&domain)
            .with_limit(fetch.max_results)
            .parse(&body)?;
        self.observer.records_parsed(&parsed.stats);
        stats.record_parse(&parsed.stats);

        // -- filter
        let (subdomains, filter_stats) =
            filter::apply_with(parsed.subdomains, filter, |stage, removed, remaining| {
                self.observer
                    .filter_stage_completed(stage, removed, remaining)
            });
        stats.record_filter(&filter_stats);

        let subdomains = match self.resolver {
            Some(resolver) => {
                let (alive, unresolved) =
                    dns::retain_resolving(subdomains, resolver, self.observer).await;
                stats.record_dns(unresolved);
                alive
            }
            None => subdomains,
        };

        // -- export
        let finished_at = OffsetDateTime::now_utc();
        let exporter = Exporter::new(&export.output_dir, &domain).with_timestamp(finished_at);
        let mut exports = Vec::with_capacity(export.formats.len() + 1);
        if export.save_raw {
            exports.push(exporter.export_raw(&parsed.urls));
        }
        exports.extend(exporter.export(&subdomains, &export.formats));
        for result in &exports {
            self.observer.export_completed(result);
        }

        let subdomains = sorted(&subdomains);
        let stats = stats.finish(subdomains.len());

        Ok(RunReport {
            domain,
            subdomains,
            stats,
            exports,
            finished_at,
        })
    }
}
