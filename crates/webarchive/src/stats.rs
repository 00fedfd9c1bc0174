use crate::filter::FilterStats;
use crate::parse::ParseStats;

/// Counters of one pipeline run, frozen once the run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub fetched: usize,
    pub malformed: usize,
    pub out_of_scope: usize,
    pub duplicates: usize,
    pub truncated: usize,
    pub parsed_unique: usize,
    pub excluded_by_regex: usize,
    pub excluded_by_keyword: usize,
    pub excluded_by_length: usize,
    pub excluded_by_dns: usize,
    pub final_count: usize,
}

impl RunStatistics {
    pub fn excluded_total(&self) -> usize {
        self.excluded_by_regex
            + self.excluded_by_keyword
            + self.excluded_by_length
            + self.excluded_by_dns
    }
}

#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: RunStatistics,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_parse(&mut self, parse: &ParseStats) {
        self.stats.fetched += parse.records;
        self.stats.malformed += parse.malformed;
        self.stats.out_of_scope += parse.out_of_scope;
        self.stats.duplicates += parse.duplicates;
        self.stats.truncated += parse.truncated;
        self.stats.parsed_unique += parse.unique;
    }

    pub fn record_filter(&mut self, filter: &FilterStats) {
        self.stats.excluded_by_regex += filter.excluded_by_regex;
        self.stats.excluded_by_keyword += filter.excluded_by_keyword;
        self.stats.excluded_by_length += filter.excluded_by_length;
    }

    pub fn record_dns(&mut self, unresolved: usize) {
        self.stats.excluded_by_dns += unresolved;
    }

    pub fn finish(mut self, final_count: usize) -> RunStatistics {
        self.stats.final_count = final_count;
        self.stats
    }
}

/// Length figures shown in verbose mode.
#[derive(Debug, PartialEq)]
pub struct LengthSummary<'a> {
    pub average: f64,
    pub shortest: &'a str,
    pub longest: &'a str,
}

impl<'a> LengthSummary<'a> {
    pub fn of(subdomains: &'a [String]) -> Option<Self> {
        let shortest = subdomains.iter().min_by_key(|s| s.chars().count())?;
        let longest = subdomains.iter().max_by_key(|s| s.chars().count())?;
        let total: usize = subdomains.iter().map(|s| s.chars().count()).sum();

        Some(Self {
            average: total as f64 / subdomains.len() as f64,
            shortest,
            longest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_accumulates_stage_counts() {
        let mut collector = StatsCollector::new();
        collector.record_parse(&ParseStats {
            records: 10,
            malformed: 1,
            out_of_scope: 2,
            duplicates: 3,
            truncated: 0,
            unique: 4,
        });
        collector.record_filter(&FilterStats {
            excluded_by_regex: 1,
            excluded_by_keyword: 1,
            excluded_by_length: 0,
        });
        collector.record_dns(1);

        let stats = collector.finish(1);

        assert_eq!(10, stats.fetched);
        assert_eq!(4, stats.parsed_unique);
        assert_eq!(3, stats.excluded_total());
        assert_eq!(1, stats.final_count);
    }

    #[test]
    fn length_summary() {
        let subdomains = vec![
            "example.com".to_string(),
            "api.example.com".to_string(),
            "a.example.com".to_string(),
        ];

        let summary = LengthSummary::of(&subdomains).unwrap();

        assert_eq!("example.com", summary.shortest);
        assert_eq!("api.example.com", summary.longest);
        assert_eq!(13.0, summary.average);
        assert_eq!(None, LengthSummary::of(&[]));
    }
}
