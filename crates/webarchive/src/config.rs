use crate::fetch::FetchConfig;
use crate::filter::FilterConfig;
use crate::Result;
use ini::{Ini, ParseOption, Properties};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "config.ini";
const DEFAULT_SECTION: &str = "DEFAULT";

/// Settings read from the INI file. Absent keys stay `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub output: Option<String>,
    pub collapse: Option<String>,
    pub max_results: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_delay_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub filter: Option<String>,
    pub exclude_words: Option<Vec<String>>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// Values given on the command line, overriding the file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliOverrides {
    pub max_results: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
    pub retry_delay_secs: Option<u64>,
    pub filter: Option<String>,
    pub exclude_words: Option<Vec<String>>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

// region:        --- Loading

/// Missing or unreadable files fall back to defaults with a log line.
pub fn load_config(path: &Path) -> FileConfig {
    if !path.exists() {
        info!("{:12} - {} not found, using defaults", "CONFIG", path.display());
        return FileConfig::default();
    }

    match Ini::load_from_file_opt(path, parse_option()) {
        Ok(ini) => {
            info!("{:12} - loaded from {}", "CONFIG", path.display());
            FileConfig::from_ini(&ini)
        }
        Err(err) => {
            warn!("{:12} - failed to load {}: {}", "CONFIG", path.display(), err);
            FileConfig::default()
        }
    }
}

/// Backslashes are kept as written, filter patterns rely on them.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

impl FileConfig {
    pub fn from_ini(ini: &Ini) -> Self {
        // keys in [DEFAULT] win over keys written before any section
        let sections: Vec<&Properties> = [
            ini.section(Some(DEFAULT_SECTION)),
            ini.section(None::<String>),
        ]
        .into_iter()
        .flatten()
        .collect();
        let get = |key: &str| {
            sections
                .iter()
                .find_map(|section| section.get(key))
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        Self {
            api_url: get("api_url").map(String::from),
            output: get("output").map(String::from),
            collapse: get("collapse").map(String::from),
            max_results: get("max_results").and_then(|v| parse_number("max_results", v)),
            timeout_secs: get("timeout").and_then(|v| parse_number("timeout", v)),
            max_retries: get("max_retries").and_then(|v| parse_number("max_retries", v)),
            retry_delay_secs: get("retry_delay").and_then(|v| parse_number("retry_delay", v)),
            user_agent: get("user_agent").map(String::from),
            filter: get("filter").map(String::from),
            exclude_words: get("exclude_words").map(split_words),
            min_length: get("min_length").and_then(|v| parse_number("min_length", v)),
            max_length: get("max_length").and_then(|v| parse_number("max_length", v)),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(number) => Some(number),
        Err(_) => {
            warn!("{:12} - invalid {} value: {:?}, using default", "CONFIG", key, value);
            None
        }
    }
}

/// Comma separated list, blanks dropped.
pub fn split_words(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(String::from)
        .collect()
}

// endregion:     --- Loading

/// File values over defaults, command line over both. Compiles the filter.
pub fn merge(file: FileConfig, cli: CliOverrides) -> Result<(FetchConfig, FilterConfig)> {
    let defaults = FetchConfig::default();

    let fetch = FetchConfig {
        api_url: file.api_url.unwrap_or(defaults.api_url),
        output: file.output.unwrap_or(defaults.output),
        collapse: file.collapse.unwrap_or(defaults.collapse),
        max_results: cli
            .max_results
            .or(file.max_results)
            .unwrap_or(defaults.max_results),
        timeout: cli
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        max_retries: cli
            .max_retries
            .or(file.max_retries)
            .unwrap_or(defaults.max_retries),
        retry_delay: cli
            .retry_delay_secs
            .or(file.retry_delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry_delay),
        user_agent: file.user_agent.unwrap_or(defaults.user_agent),
    };

    let filter = FilterConfig::new(
        cli.filter.as_deref().or(file.filter.as_deref()),
        cli.exclude_words.or(file.exclude_words).unwrap_or_default(),
        cli.min_length.or(file.min_length),
        cli.max_length.or(file.max_length),
    )?;

    Ok((fetch, filter))
}
