//! URL validation applied before any network call is made.
//!
//! Rules run in a fixed order and stop at the first failure:
//!
//! 1. empty (after trimming) → [`ValidationError::EmptyUrl`]
//! 2. unparsable → [`ValidationError::InvalidUrl`]
//! 3. scheme other than `https` → [`ValidationError::InvalidUrlScheme`]
//! 4. empty host → [`ValidationError::InvalidUrlHost`]
//! 5. `localhost`, loopback, private, or link-local host → [`ValidationError::InvalidUrlHost`]
//! 6. `..` in the path → [`ValidationError::DirectoryTraversal`]
//!
//! Host names are matched by label, not by substring: `localhost` and any
//! `*.localhost` name are refused, while `notlocalhost.example.com` or
//! `my10.example.com` are accepted. IP literals are parsed and checked by
//! range, including IPv4-mapped IPv6 forms.
//!
//! Only the literal host is inspected. No DNS lookup happens here, so a name
//! that later resolves to a private address is not caught.

use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use tracing::trace;
use url::{Host, Url};

/// Reasons a URL is refused before a request is built.
///
/// Messages never echo the rejected URL itself; the host is shown for host
/// rejections because it is already part of the sanitized form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The URL was empty or whitespace only.
    #[error("URL is empty")]
    EmptyUrl,

    /// The URL could not be parsed.
    #[error("invalid URL: {reason}")]
    InvalidUrl {
        /// Parser diagnostic (does not contain the input).
        reason: String,
    },

    /// The scheme is not `https`.
    #[error("URL scheme '{scheme}' is not allowed; only https is accepted")]
    InvalidUrlScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// The host is missing, local, or inside a private address range.
    #[error("URL host '{host}' is not allowed")]
    InvalidUrlHost {
        /// The rejected host (empty when missing).
        host: String,
    },

    /// The path contains a `..` segment.
    #[error("URL path contains a directory traversal sequence")]
    DirectoryTraversal,
}

/// Validates a raw URL string and returns the parsed URL.
///
/// # Errors
///
/// Returns the first [`ValidationError`] whose rule the input violates.
/// See the module docs for how `localhost` names and IP literals are matched.
///
/// # Examples
///
/// ```
/// use go_installer::download::{ValidationError, validate_url};
///
/// assert!(validate_url("https://example.com/go.tar.gz").is_ok());
/// assert!(matches!(
///     validate_url("ftp://example.com/go.tar.gz"),
///     Err(ValidationError::InvalidUrlScheme { .. })
/// ));
/// ```
pub fn validate_url(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let parsed = Url::parse(trimmed).map_err(|e| ValidationError::InvalidUrl {
        reason: e.to_string(),
    })?;

    if parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrlScheme {
            scheme: parsed.scheme().to_string(),
        });
    }

    let host = match parsed.host() {
        Some(Host::Domain("")) | None => {
            return Err(ValidationError::InvalidUrlHost {
                host: String::new(),
            });
        }
        Some(host) => host,
    };

    if is_disallowed_host(&host) {
        return Err(ValidationError::InvalidUrlHost {
            host: host.to_string(),
        });
    }

    // The parser resolves dot segments, so the raw text is checked as well.
    if contains_traversal(raw_path(trimmed)) || contains_traversal(parsed.path()) {
        return Err(ValidationError::DirectoryTraversal);
    }

    trace!(host = %host, "URL passed validation");
    Ok(parsed)
}

fn is_disallowed_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost" || domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => is_disallowed_ipv4(*ip),
        Host::Ipv6(ip) => is_disallowed_ipv6(*ip),
    }
}

fn is_disallowed_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_disallowed_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_disallowed_ipv4(mapped);
    }
    ip.is_loopback() || ip.is_unspecified() || ip.is_unique_local() || ip.is_unicast_link_local()
}

/// Returns the path portion of an unparsed URL (between authority and query).
fn raw_path(input: &str) -> &str {
    let after_scheme = input.split_once("://").map_or(input, |(_, rest)| rest);
    let end = after_scheme.find(['?', '#']).unwrap_or(after_scheme.len());
    let without_query = &after_scheme[..end];
    without_query
        .find(['/', '\\'])
        .map_or("", |start| &without_query[start..])
}

fn contains_traversal(path: &str) -> bool {
    if path.contains("..") {
        return true;
    }
    // %2e%2e and friends
    urlencoding::decode(path).is_ok_and(|decoded| decoded.contains(".."))
}
