//! User-Agent string sent with every download request.

/// Product token used in the User-Agent header.
pub const PRODUCT_NAME: &str = "go-installer";

/// Returns the client version embedded in the User-Agent header.
#[must_use]
pub fn client_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Default User-Agent for download requests: `<product>/<version>`.
#[must_use]
pub fn default_user_agent() -> String {
    format!("{PRODUCT_NAME}/{}", client_version())
}
