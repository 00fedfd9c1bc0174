mod config;
mod dns;
mod domain;
mod error;
mod export;
mod fetch;
mod filter;
mod observer;
mod parse;
mod pipeline;
mod report;
mod stats;
mod utils;

pub use error::{Error, Result};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::{load_config, merge, split_words, CliOverrides, DEFAULT_CONFIG_FILE};
use dns::DnsResolver;
use export::Format;
use fetch::{HttpTransport, TokioDelay};
use pipeline::{ExportConfig, Pipeline};
use report::{display_results, LogObserver};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use utils::log::init_tracing_subscriber;

fn cli() -> Command {
    Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .about("Extract subdomains of a domain from the Wayback Machine archive")
        .arg(
            Arg::new("domain")
                .help("Target domain to analyze (e.g. example.com)")
                .value_name("DOMAIN")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for results")
                .default_value("."),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output formats, several can be given")
                .num_args(1..)
                .value_parser(Format::ALL)
                .default_value("txt"),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .value_name("REGEX")
                .help("Keep only subdomains matching this pattern (e.g. \"test|dev|staging\")"),
        )
        .arg(
            Arg::new("exclude-words")
                .long("exclude-words")
                .value_name("WORDS")
                .help("Comma separated words excluding a subdomain (e.g. admin,test)"),
        )
        .arg(length_arg("min-length", "Minimum subdomain length"))
        .arg(length_arg("max-length", "Maximum subdomain length"))
        .arg(
            Arg::new("max-results")
                .long("max-results")
                .value_name("N")
                .help("Maximum number of archive records to fetch [config default: 10000]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("HTTP request timeout")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .value_name("N")
                .help("Additional attempts when the request fails")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("retry-delay")
                .long("retry-delay")
                .value_name("SECONDS")
                .help("Pause between attempts")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("resolve")
                .long("resolve")
                .action(ArgAction::SetTrue)
                .help("Drop subdomains that do not resolve in DNS"),
        )
        .arg(
            Arg::new("no-raw")
                .long("no-raw")
                .action(ArgAction::SetTrue)
                .help("Do not save the raw archived URLs"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("List every subdomain and detailed statistics"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_FILE),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Logging level, RUST_LOG takes precedence")
                .value_parser(["debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .help("Directory of the log file")
                .default_value("logs"),
        )
}

fn length_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("N")
        .help(help)
        .value_parser(value_parser!(usize))
}

fn overrides(args: &ArgMatches) -> CliOverrides {
    CliOverrides {
        max_results: args.get_one::<usize>("max-results").copied(),
        timeout_secs: args.get_one::<u64>("timeout").copied(),
        max_retries: args.get_one::<usize>("retries").copied(),
        retry_delay_secs: args.get_one::<u64>("retry-delay").copied(),
        filter: args.get_one::<String>("filter").cloned(),
        exclude_words: args
            .get_one::<String>("exclude-words")
            .map(|words| split_words(words)),
        min_length: args.get_one::<usize>("min-length").copied(),
        max_length: args.get_one::<usize>("max-length").copied(),
    }
}

fn formats(args: &ArgMatches) -> Result<Vec<Format>> {
    args.get_many::<String>("format")
        .into_iter()
        .flatten()
        .map(|format| format.parse::<Format>())
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli().get_matches();

    let log_level = args
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    let log_dir = args.get_one::<String>("log-dir").map(Path::new);
    if !init_tracing_subscriber(log_level, log_dir)? {
        warn!("{:12} - log directory not writable, console only", "LOGGING");
    }

    match run(&args).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("{:12} - {}", "FAILED", err);
            Err(err)
        }
    }
}

async fn run(args: &ArgMatches) -> Result<()> {
    let domain = args
        .get_one::<String>("domain")
        .ok_or_else(|| Error::CliUsage("missing domain".into()))?;
    let verbose = args.get_flag("verbose");

    // -- configuration, all validated before the request
    let config_path = args
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let (fetch, filter) = merge(load_config(&config_path), overrides(args))?;
    let export = ExportConfig {
        output_dir: args
            .get_one::<String>("output-dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        formats: formats(args)?,
        save_raw: !args.get_flag("no-raw"),
    };
    debug!("{:12} - {:?}", "FETCH CONFIG", fetch);
    info!("{:12} - {}", "FILTERS", filter);

    // -- collaborators
    let transport = HttpTransport::new(&fetch)?;
    let observer = LogObserver::new(!verbose);
    let resolver = args.get_flag("resolve").then(DnsResolver::new);
    let mut pipeline = Pipeline::new(&transport, &TokioDelay, &observer);
    if let Some(resolver) = &resolver {
        pipeline = pipeline.with_resolver(resolver);
    }

    info!("{:12} - {}", "TARGET", domain);
    let report = pipeline.run(domain, &fetch, &filter, &export).await?;

    display_results(&report, verbose);
    let failed = report.exports.iter().filter(|res| !res.is_written()).count();
    if failed > 0 {
        warn!("{:12} - {} output file(s) could not be written", "SAVE", failed);
    }
    info!(
        "{:12} - {} subdomains kept, {} excluded",
        "DONE",
        report.stats.final_count,
        report.stats.excluded_total()
    );

    Ok(())
}
