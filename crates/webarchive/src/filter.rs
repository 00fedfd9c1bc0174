use crate::parse::SubdomainSet;
use crate::{Error, Result};
use regex::Regex;
use std::fmt;

// region:        --- Filter config

/// Immutable filter settings, validated when built.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pattern: Option<Regex>,
    exclude_words: Vec<String>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl FilterConfig {
    pub fn new<S: AsRef<str>>(
        pattern: Option<&str>,
        exclude_words: impl IntoIterator<Item = S>,
        min_length: Option<usize>,
        max_length: Option<usize>,
    ) -> Result<Self> {
        let pattern = pattern
            .filter(|pattern| !pattern.is_empty())
            .map(Regex::new)
            .transpose()?;

        let mut words: Vec<String> = exclude_words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        words.sort();
        words.dedup();

        if let (Some(min), Some(max)) = (min_length, max_length) {
            if min > max {
                return Err(Error::Config(format!(
                    "min_length ({min}) is greater than max_length ({max})"
                )));
            }
        }

        Ok(Self {
            pattern,
            exclude_words: words,
            min_length,
            max_length,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.exclude_words.is_empty()
            && self.min_length.is_none()
            && self.max_length.is_none()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    pub fn exclude_words(&self) -> &[String] {
        &self.exclude_words
    }

    fn matches_pattern(&self, host: &str) -> bool {
        self.pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(host))
    }

    fn has_no_excluded_word(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        !self
            .exclude_words
            .iter()
            .any(|word| host.contains(word.as_str()))
    }

    fn within_length(&self, host: &str) -> bool {
        let len = host.chars().count();
        self.min_length.map_or(true, |min| len >= min)
            && self.max_length.map_or(true, |max| len <= max)
    }
}

impl fmt::Display for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }

        let mut parts = Vec::new();
        if let Some(pattern) = self.pattern() {
            parts.push(format!("regex={pattern:?}"));
        }
        if !self.exclude_words().is_empty() {
            parts.push(format!("exclude_words={:?}", self.exclude_words()));
        }
        if let Some(min) = self.min_length {
            parts.push(format!("min_length={min}"));
        }
        if let Some(max) = self.max_length {
            parts.push(format!("max_length={max}"));
        }

        f.write_str(&parts.join(", "))
    }
}

// endregion:     --- Filter config

// region:        --- Filter chain

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Regex,
    Keyword,
    Length,
}

impl FilterStage {
    pub const ORDER: [FilterStage; 3] = [
        FilterStage::Regex,
        FilterStage::Keyword,
        FilterStage::Length,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterStage::Regex => "regex",
            FilterStage::Keyword => "keyword",
            FilterStage::Length => "length",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub excluded_by_regex: usize,
    pub excluded_by_keyword: usize,
    pub excluded_by_length: usize,
}

impl FilterStats {
    fn record(&mut self, stage: FilterStage, removed: usize) {
        match stage {
            FilterStage::Regex => self.excluded_by_regex += removed,
            FilterStage::Keyword => self.excluded_by_keyword += removed,
            FilterStage::Length => self.excluded_by_length += removed,
        }
    }
}

/// Runs the stages in order. `on_stage` receives each stage with the
/// number of hosts it removed and the number left.
pub fn apply_with(
    mut subdomains: SubdomainSet,
    config: &FilterConfig,
    mut on_stage: impl FnMut(FilterStage, usize, usize),
) -> (SubdomainSet, FilterStats) {
    let mut stats = FilterStats::default();

    for stage in FilterStage::ORDER {
        let before = subdomains.len();
        subdomains.retain(|host| match stage {
            FilterStage::Regex => config.matches_pattern(host),
            FilterStage::Keyword => config.has_no_excluded_word(host),
            FilterStage::Length => config.within_length(host),
        });

        let removed = before - subdomains.len();
        stats.record(stage, removed);
        on_stage(stage, removed, subdomains.len());
    }

    (subdomains, stats)
}

#[cfg(test)]
pub fn apply(subdomains: SubdomainSet, config: &FilterConfig) -> (SubdomainSet, FilterStats) {
    apply_with(subdomains, config, |_, _, _| {})
}

// endregion:     --- Filter chain
