//! Vault address normalization.

/// Normalizes a raw Vault address into a canonical base URL.
///
/// * blank input stays empty (the caller treats it as unset)
/// * a missing scheme defaults to `http://`
/// * `port` is appended only when the address has no explicit `:<digits>` port
/// * trailing slashes are removed
///
/// The function is idempotent.
pub fn normalize_address(raw: &str, port: Option<u16>) -> String {
    let addr = raw.trim();
    if addr.is_empty() {
        return String::new();
    }

    let mut addr = if has_http_scheme(addr) {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    };

    while addr.ends_with('/') && !addr.ends_with("://") {
        addr.pop();
    }

    // A scheme with no host is as unset as a blank string
    match addr.split_once("://") {
        Some((_, host)) if host.trim_matches('/').is_empty() => return String::new(),
        _ => {}
    }

    if let Some(port) = port {
        if !ends_with_port(&addr) {
            addr = format!("{}:{}", addr, port);
        }
    }

    addr
}

pub(crate) fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn ends_with_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((_, digits)) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
