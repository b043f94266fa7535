//! Best-effort credential masking. Obfuscation only, not a security boundary.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;

const VISIBLE: usize = 4;
const SHORT_MASK: &str = "****";
const SENSITIVE_HEADERS: [&str; 3] = ["authorization", "cookie", "x-api-key"];
const AUTH_KEY_MARKERS: [&str; 5] = ["token", "auth", "devin", "session", "credential"];

/// Reduce a token to its first and last four characters.
///
/// Values of eight characters or fewer are hidden entirely. A `Bearer `
/// scheme prefix is preserved.
pub fn mask_token(value: &str) -> String {
    if let Some(token) = value.strip_prefix("Bearer ") {
        return format!("Bearer {}", mask_token(token));
    }

    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= VISIBLE * 2 {
        return SHORT_MASK.to_string();
    }
    let head: String = chars[..VISIBLE].iter().collect();
    let tail: String = chars[chars.len() - VISIBLE..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Mask unless raw capture was explicitly requested
pub fn mask_value(value: &str, capture_raw: bool) -> String {
    if capture_raw {
        value.to_string()
    } else {
        mask_token(value)
    }
}

pub fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_HEADERS.contains(&name.as_str()) || name.contains("token")
}

/// Storage keys that are worth an auth event
pub fn is_auth_key(key: &str) -> bool {
    let key = key.to_lowercase();
    AUTH_KEY_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Flatten headers into a map, masking sensitive values
pub fn sanitize_headers(headers: &HeaderMap, capture_raw: bool) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<non-utf8>");
            let value = if is_sensitive_header(name.as_str()) {
                mask_value(value, capture_raw)
            } else {
                value.to_string()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}
