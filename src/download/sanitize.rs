//! Scrubbing of URLs and filesystem paths before they reach logs or users.
//!
//! Query strings routinely carry signed tokens and local paths reveal the
//! layout of a user's machine, so every error and log line in the crate
//! renders URLs and paths through these two functions.

use std::path::Path;

use url::Url;

/// Placeholder returned when nothing safe can be derived from the input.
pub const UNKNOWN: &str = "unknown";

/// Reduces a URL to `scheme://host/path`.
///
/// Query, fragment, and userinfo are dropped. A port, when present, is kept
/// as part of the host. Input that does not parse as an absolute URL yields
/// [`UNKNOWN`].
///
/// # Examples
///
/// ```
/// use go_installer::download::sanitize_url;
///
/// assert_eq!(
///     sanitize_url("https://host/path?token=secret#frag"),
///     "https://host/path"
/// );
/// assert_eq!(sanitize_url("not a url"), "unknown");
/// ```
#[must_use]
pub fn sanitize_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return UNKNOWN.to_string();
    };

    let host = match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    format!("{}://{host}{}", parsed.scheme(), parsed.path())
}

/// Reduces a filesystem path to its final segment.
///
/// Both `/` and `\` are treated as separators regardless of the host
/// platform, so Windows paths are scrubbed on Unix and vice versa. Empty
/// input (or input made only of separators) yields [`UNKNOWN`].
///
/// # Examples
///
/// ```
/// use go_installer::download::sanitize_path;
///
/// assert_eq!(sanitize_path("/home/user/secret/go"), "go");
/// assert_eq!(sanitize_path(r"C:\Users\me\go.zip"), "go.zip");
/// assert_eq!(sanitize_path(""), "unknown");
/// ```
#[must_use]
pub fn sanitize_path(path: impl AsRef<Path>) -> String {
    let raw = path.as_ref().to_string_lossy();
    let trimmed = raw.trim_end_matches(['/', '\\']);

    match trimmed.rsplit(['/', '\\']).next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => UNKNOWN.to_string(),
    }
}
