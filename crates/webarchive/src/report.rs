use crate::export::ExportResult;
use crate::filter::FilterStage;
use crate::observer::PipelineObserver;
use crate::parse::ParseStats;
use crate::pipeline::RunReport;
use crate::stats::LengthSummary;
use crate::Error;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Url;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error, info, warn};

const PREVIEW_LEN: usize = 20;

// region:        --- Log observer

/// Logs pipeline checkpoints and shows a spinner while fetching.
pub struct LogObserver {
    spinner: ProgressBar,
}

impl LogObserver {
    pub fn new(show_progress: bool) -> Self {
        let spinner = if show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg} [{elapsed}]") {
            spinner.set_style(style);
        }

        Self { spinner }
    }
}

impl PipelineObserver for LogObserver {
    fn fetch_started(&self, url: &Url, attempt: usize, max_attempts: usize) {
        info!("{:12} - {} (attempt {}/{})", "HTTP REQUEST", url, attempt, max_attempts);
        self.spinner.set_message("Fetching archived URLs");
        self.spinner.enable_steady_tick(Duration::from_millis(120));
    }

    fn fetch_retry(&self, attempt: usize, max_attempts: usize, error: &Error, delay: Duration) {
        warn!(
            "{:12} - attempt {}/{} failed: {}, retrying in {:?}",
            "HTTP RETRY", attempt, max_attempts, error, delay
        );
        self.spinner
            .set_message(format!("Retrying in {:?} ({attempt}/{max_attempts} failed)", delay));
    }

    fn fetch_completed(&self, bytes: usize, attempts: usize) {
        self.spinner.finish_and_clear();
        info!("{:12} - {} bytes after {} attempt(s)", "HTTP RESPONSE", bytes, attempts);
    }

    fn records_parsed(&self, stats: &ParseStats) {
        info!(
            "{:12} - {} records, {} unique subdomains",
            "PARSED", stats.records, stats.unique
        );
        debug!(
            "{:12} - malformed: {}, out of scope: {}, duplicates: {}, truncated: {}",
            "PARSED", stats.malformed, stats.out_of_scope, stats.duplicates, stats.truncated
        );
        if stats.truncated > 0 {
            warn!("{:12} - {} records past max_results ignored", "TRUNCATED", stats.truncated);
        }
    }

    fn filter_stage_completed(&self, stage: FilterStage, removed: usize, remaining: usize) {
        info!(
            "{:12} - {} removed, {} remaining",
            format!("FILTER {}", stage.name().to_uppercase()),
            removed,
            remaining
        );
    }

    fn dns_check_completed(&self, resolved: usize, unresolved: usize) {
        info!("{:12} - {} resolved, {} dropped", "DNS CHECK", resolved, unresolved);
    }

    fn export_completed(&self, result: &ExportResult) {
        match &result.outcome {
            Ok(count) => info!(
                "{:12} - {} entries to {}",
                format!("SAVED {}", result.kind.to_string().to_uppercase()),
                count,
                result.path.display()
            ),
            Err(err) => error!(
                "{:12} - {}: {}",
                format!("SAVE {}", result.kind.to_string().to_uppercase()),
                result.path.display(),
                err
            ),
        }
    }
}

impl Drop for LogObserver {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}

// endregion:     --- Log observer

// region:        --- Results display

pub fn display_results(report: &RunReport, verbose: bool) {
    let rule = "=".repeat(60);
    println!("\n{}", rule.cyan());
    println!("{}", "           RESULTS".cyan());
    println!("{}", rule.cyan());

    println!("\n{}", format!("Domain: {}", report.domain).blue());
    println!(
        "{}",
        format!("Total unique subdomains: {}", report.subdomains.len()).green()
    );
    let date = report
        .finished_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| report.finished_at.to_string());
    println!("{}", format!("Extraction date: {}", date).blue());

    println!("\n{}", "Saved files:".yellow());
    for export in &report.exports {
        let line = match &export.outcome {
            Ok(_) => format!(
                "       {:4}: {}",
                export.kind.to_string().to_uppercase(),
                export.path.display()
            )
            .yellow(),
            Err(err) => format!(
                "       {:4}: failed ({})",
                export.kind.to_string().to_uppercase(),
                err
            )
            .red(),
        };
        println!("{}", line);
    }

    if !report.subdomains.is_empty() {
        println!("\n{}", "[RESULT] Subdomain List:".cyan());
        let shown = if verbose {
            report.subdomains.len()
        } else {
            PREVIEW_LEN
        };
        println!("  {:>5}  {}", "Index", "Subdomain");
        for (index, subdomain) in report.subdomains.iter().take(shown).enumerate() {
            println!("  {:>5}  {}", index + 1, subdomain);
        }

        if report.subdomains.len() > shown {
            println!(
                "\n{}",
                format!(
                    "[NOTE] Only first {} subdomains shown. Use --verbose to see all {} subdomains.",
                    PREVIEW_LEN,
                    report.subdomains.len()
                )
                .yellow()
            );
        }
    }

    if verbose {
        let stats = &report.stats;
        println!("\n{}", "[STATS] Statistics:".cyan());
        let lines = [
            format!("Records fetched: {}", stats.fetched),
            format!("Malformed records: {}", stats.malformed),
            format!("Out of scope hosts: {}", stats.out_of_scope),
            format!("Duplicates removed: {}", stats.duplicates),
            format!("Truncated records: {}", stats.truncated),
            format!("Unique after parsing: {}", stats.parsed_unique),
            format!("Excluded by regex: {}", stats.excluded_by_regex),
            format!("Excluded by keyword: {}", stats.excluded_by_keyword),
            format!("Excluded by length: {}", stats.excluded_by_length),
            format!("Excluded by DNS: {}", stats.excluded_by_dns),
            format!("Final count: {}", stats.final_count),
        ];
        for line in lines {
            println!("{}", format!("       {}", line).blue());
        }

        match LengthSummary::of(&report.subdomains) {
            Some(summary) => {
                let lines = [
                    format!("Average length: {:.1} characters", summary.average),
                    format!("Shortest: {}", summary.shortest),
                    format!("Longest: {}", summary.longest),
                ];
                for line in lines {
                    println!("{}", format!("       {}", line).blue());
                }
            }
            None => println!("{}", "       Average length: N/A".blue()),
        }
    }
}

// endregion:     --- Results display
