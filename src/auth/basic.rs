//! Basic-credential parsing for session creation
//!
//! The only endpoint that accepts `Authorization: Basic <base64(email:password)>`
//! is GET /connect. Any malformation collapses to `None`, which the caller
//! turns into the generic `Unauthorized` so account existence never leaks.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Credentials extracted from a Basic authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

/// Parse a `Basic <base64(email:password)>` header value.
///
/// The password may contain colons; the email may not.
pub fn parse_basic_header(header: &str) -> Option<BasicCredentials> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let (email, password) = decoded.split_once(':')?;
    if email.is_empty() || password.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        email: email.to_string(),
        password: password.to_string(),
    })
}
