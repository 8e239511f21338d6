//! Origin matching logic.
//!
//! # Design Decisions
//! - Host matching is case-insensitive
//! - A domain entry matches itself and every subdomain, nothing else
//! - No regex to guarantee O(n) matching

use url::Url;

/// Matches a hostname against one configured domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPattern {
    domain: String,
    suffix: String,
}

impl DomainPattern {
    /// Create a new pattern.
    /// The domain is normalized to lowercase for case-insensitive matching.
    pub fn new(domain: impl Into<String>) -> Self {
        let domain = domain.into().trim().trim_end_matches('.').to_lowercase();
        let suffix = format!(".{}", domain);
        Self { domain, suffix }
    }

    /// True iff `host` equals the domain or ends with `.` + domain.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        host == self.domain || host.ends_with(&self.suffix)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// Ordered list of allowed origin domains, built from a comma-separated
/// configuration value. An empty set denies every explicit origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOriginSet {
    patterns: Vec<DomainPattern>,
}

impl AllowedOriginSet {
    /// Parse a comma-separated domain list, skipping blank entries.
    pub fn parse(list: &str) -> Self {
        let patterns = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(DomainPattern::new)
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[DomainPattern] {
        &self.patterns
    }

    /// Whether an `Origin` header value names an allowed host.
    ///
    /// The value must parse as an absolute URL with a host; `null` and
    /// other opaque origins never match.
    pub fn allows(&self, origin: &str) -> bool {
        let host = match Url::parse(origin) {
            Ok(url) => match url.host_str() {
                Some(host) => host.to_string(),
                None => return false,
            },
            Err(_) => return false,
        };

        self.patterns.iter().any(|p| p.matches(&host))
    }
}
