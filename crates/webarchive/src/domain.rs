use crate::{Error, Result};
use lazy_regex::regex_is_match;
use std::fmt;

pub const MAX_DOMAIN_LEN: usize = 253;
pub const MAX_LABEL_LEN: usize = 63;

/// A syntactically valid, lowercase domain name without trailing dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    pub fn validate(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let name = trimmed.strip_suffix('.').unwrap_or(trimmed);

        if name.is_empty() || name.len() > MAX_DOMAIN_LEN {
            return Err(Error::InvalidDomain(input.to_string()));
        }

        let labels_ok = name.split('.').all(|label| {
            label.len() <= MAX_LABEL_LEN
                && regex_is_match!(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$", label)
        });
        if !labels_ok {
            return Err(Error::InvalidDomain(input.to_string()));
        }

        Ok(Self(name.to_ascii_lowercase()))
    }

    /// True when `host` is this domain or one of its subdomains.
    pub fn covers(&self, host: &str) -> bool {
        match host.strip_suffix(self.0.as_str()) {
            Some("") => true,
            Some(prefix) => prefix.len() > 1 && prefix.ends_with('.'),
            None => false,
        }
    }

    /// File-system friendly stem used for output file names.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                '.' | '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
                c => c,
            })
            .collect()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Domain;
    use crate::Error;

    #[test]
    fn normalizes_valid_domains() {
        let cases = [
            ("example.com", "example.com"),
            ("Example.COM", "example.com"),
            ("example.com.", "example.com"),
            ("  sub-1.Example.org  ", "sub-1.example.org"),
            ("localhost", "localhost"),
            ("xn--bcher-kva.example", "xn--bcher-kva.example"),
        ];

        for (input, expected) in cases {
            let domain = Domain::validate(input).unwrap();
            assert_eq!(expected, domain.to_string(), "input: {input:?}");
        }
    }

    #[test]
    fn rejects_malformed_domains() {
        let too_long_label = format!("{}.com", "a".repeat(64));
        let too_long_name = format!("{}com", "abcdefghi.".repeat(26));
        let cases = [
            "",
            "   ",
            ".",
            "example..com",
            ".example.com",
            "-example.com",
            "example-.com",
            "exa_mple.com",
            "exa mple.com",
            "http://example.com",
            "example.com/path",
            "bücher.example",
            too_long_label.as_str(),
            too_long_name.as_str(),
        ];

        for input in cases {
            assert!(
                matches!(Domain::validate(input), Err(Error::InvalidDomain(_))),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn accepts_label_of_max_length() {
        let label = "a".repeat(63);
        assert!(Domain::validate(&format!("{label}.com")).is_ok());
    }

    #[test]
    fn covers_only_itself_and_subdomains() {
        let domain = Domain::validate("example.com").unwrap();

        assert!(domain.covers("example.com"));
        assert!(domain.covers("api.example.com"));
        assert!(domain.covers("a.b.example.com"));
        assert!(!domain.covers("badexample.com"));
        assert!(!domain.covers(".example.com"));
        assert!(!domain.covers("example.com.evil.org"));
        assert!(!domain.covers("other.com"));
    }

    #[test]
    fn file_stem_replaces_dots() {
        let domain = Domain::validate("api.example.com").unwrap();
        assert_eq!("api_example_com", domain.file_stem());
    }
}
