use axum::http::{header, HeaderMap};

use backend_domain::RuntimeConfig;

/// Ingestion and legacy endpoints. No configured key means the surface is open.
pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    match &config.api_token {
        Some(api_token) => extract_bearer(headers).is_some_and(|token| token == *api_token),
        None => true,
    }
}

/// Browse and admin endpoints. `query_token` carries the key for clients that
/// cannot set headers (EventSource).
pub fn authorize_admin(config: &RuntimeConfig, headers: &HeaderMap, query_token: Option<&str>) -> bool {
    let Some(expected) = config.admin_token.as_ref().or(config.api_token.as_ref()) else {
        return true;
    };
    extract_bearer(headers)
        .as_deref()
        .or(query_token)
        .is_some_and(|token| token == expected)
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("header"),
        );
        headers
    }

    #[test]
    fn open_when_no_key_is_configured() {
        let config = RuntimeConfig::default();
        assert!(authorize(&config, &HeaderMap::new()));
        assert!(authorize_admin(&config, &HeaderMap::new(), None));
    }

    #[test]
    fn api_key_must_match_bearer() {
        let config = RuntimeConfig {
            api_token: Some("k1".to_string()),
            ..RuntimeConfig::default()
        };
        assert!(authorize(&config, &bearer("k1")));
        assert!(!authorize(&config, &bearer("k2")));
        assert!(!authorize(&config, &HeaderMap::new()));
    }

    #[test]
    fn admin_falls_back_to_api_key_and_accepts_query_token() {
        let shared = RuntimeConfig {
            api_token: Some("k1".to_string()),
            ..RuntimeConfig::default()
        };
        assert!(authorize_admin(&shared, &bearer("k1"), None));
        assert!(authorize_admin(&shared, &HeaderMap::new(), Some("k1")));

        let split = RuntimeConfig {
            api_token: Some("k1".to_string()),
            admin_token: Some("root".to_string()),
            ..RuntimeConfig::default()
        };
        assert!(!authorize_admin(&split, &bearer("k1"), None));
        assert!(authorize_admin(&split, &bearer("root"), None));
        assert!(!authorize_admin(&split, &HeaderMap::new(), Some("nope")));
    }

    #[test]
    fn malformed_authorization_headers_yield_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);
        assert_eq!(extract_bearer(&bearer(" ")), None);
    }
}
