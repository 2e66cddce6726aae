//! Post-sign-in redirect targets.

use url::Url;
use url::form_urlencoded;

const PLACEHOLDER_ORIGIN: &str = "http://atelier.invalid/";

/// Validate an intended destination as a same-origin relative path.
///
/// Returns the value unchanged when it is a plain absolute path on this
/// origin, otherwise `default`. Scheme-relative (`//host`), backslash,
/// and absolute URLs are all discarded.
pub fn safe_destination(intended: Option<&str>, default: &str) -> String {
    match intended {
        Some(value) if is_same_origin_path(value) => value.to_string(),
        _ => default.to_string(),
    }
}

fn is_same_origin_path(value: &str) -> bool {
    if !value.starts_with('/') || value.starts_with("//") {
        return false;
    }
    if value.contains('\\') || value.chars().any(char::is_control) {
        return false;
    }
    let Ok(base) = Url::parse(PLACEHOLDER_ORIGIN) else {
        return false;
    };
    match base.join(value) {
        Ok(joined) => joined.origin() == base.origin(),
        Err(_) => false,
    }
}

/// Login page URL carrying a machine code and a human-readable message.
pub fn login_redirect(login_path: &str, error: &str, message: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("error", error)
        .append_pair("message", message)
        .finish();
    format!("{login_path}?{query}")
}
