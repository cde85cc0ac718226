//! Advisory audit of response security headers.
//!
//! The audit never blocks a download; missing headers are reported as
//! warnings which the fetcher logs.

use reqwest::header::HeaderMap;

/// A header the auditor looks for and when it applies.
#[derive(Debug, Clone, Copy)]
struct HeaderRule {
    name: &'static str,
    https_only: bool,
}

const SECURITY_HEADERS: &[HeaderRule] = &[
    HeaderRule {
        name: "Content-Security-Policy",
        https_only: false,
    },
    HeaderRule {
        name: "X-Content-Type-Options",
        https_only: false,
    },
    HeaderRule {
        name: "X-Frame-Options",
        https_only: false,
    },
    HeaderRule {
        name: "X-XSS-Protection",
        https_only: false,
    },
    HeaderRule {
        name: "Strict-Transport-Security",
        https_only: true,
    },
];

/// Ordered warnings produced by a header audit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityWarnings(Vec<String>);

impl SecurityWarnings {
    /// Returns true when no header was missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of warnings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the warning messages in table order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Consumes the warnings into a plain vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Checks response headers against the recommended security header set.
///
/// `Strict-Transport-Security` is only expected when the request was made
/// over HTTPS.
#[must_use]
pub fn audit_headers(headers: &HeaderMap, request_was_https: bool) -> SecurityWarnings {
    let warnings = SECURITY_HEADERS
        .iter()
        .filter(|rule| request_was_https || !rule.https_only)
        .filter(|rule| !headers.contains_key(rule.name))
        .map(|rule| format!("missing security header: {}", rule.name))
        .collect();
    SecurityWarnings(warnings)
}

/// Audits a received response.
#[must_use]
pub fn audit_response(response: &reqwest::Response, request_was_https: bool) -> SecurityWarnings {
    audit_headers(response.headers(), request_was_https)
}
