// lib/vault-sync/src/path.rs
use regex::Regex;
use std::sync::OnceLock;

fn data_leaf() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/data/[^/]+$").expect("valid regex"))
}

fn engine_data_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^/]+/data/").expect("valid regex"))
}

/// Path of the secret fetched at startup.
///
/// * no base path: the secret name alone
/// * base path already naming a secret (`.../data/<name>`): the base path
/// * otherwise: base path joined with the secret name
///
/// An empty result means there is nothing to fetch.
pub fn bootstrap_secret_path(base_path: &str, secret: &str) -> String {
    let base = base_path.trim();
    let secret = secret.trim().trim_start_matches('/');

    let path = if base.is_empty() {
        secret.to_string()
    } else if data_leaf().is_match(base) || secret.is_empty() {
        base.trim_end_matches('/').to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), secret)
    };

    path.trim().to_string()
}

/// Startup paths are often written as `<engine>/data/<name>`; send those to the
/// API as-is instead of nesting them under the default engine again.
pub(crate) fn as_request_path(path: &str) -> String {
    let path = path.trim_start_matches('/');
    if engine_data_prefix().is_match(path) && !path.starts_with("v1/") {
        format!("v1/{}", path)
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_name_only() {
        assert_eq!(bootstrap_secret_path("", "billing"), "billing");
    }

    #[test]
    fn test_base_path_naming_a_secret() {
        assert_eq!(
            bootstrap_secret_path("secret/data/billing", "ignored"),
            "secret/data/billing"
        );
    }

    #[test]
    fn test_base_path_ending_in_data() {
        assert_eq!(
            bootstrap_secret_path("secret/data/", "billing"),
            "secret/data/billing"
        );
        assert_eq!(
            bootstrap_secret_path("secret/data", "billing"),
            "secret/data/billing"
        );
    }

    #[test]
    fn test_plain_base_path() {
        assert_eq!(bootstrap_secret_path("apps/", "billing"), "apps/billing");
    }

    #[test]
    fn test_nothing_to_fetch() {
        assert_eq!(bootstrap_secret_path("", ""), "");
        assert_eq!(bootstrap_secret_path("  ", " "), "");
    }

    #[test]
    fn test_base_path_without_secret() {
        assert_eq!(bootstrap_secret_path("apps/billing/", ""), "apps/billing");
    }

    #[test]
    fn test_as_request_path() {
        assert_eq!(as_request_path("secret/data/billing"), "v1/secret/data/billing");
        assert_eq!(as_request_path("/v1/secret/data/billing"), "v1/secret/data/billing");
        assert_eq!(as_request_path("billing"), "billing");
        assert_eq!(as_request_path("apps/billing"), "apps/billing");
    }
}
