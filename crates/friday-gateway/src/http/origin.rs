//! Network origin of a request, as reported by the fronting proxy.

use axum::http::HeaderMap;
use friday_core::types::SourceId;

/// Proxy headers consulted in order; the first non-empty value wins.
const ORIGIN_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Client address for rate limiting and blocking. `X-Forwarded-For` may
/// carry a chain; only its first hop is the client.
pub fn client_source(headers: &HeaderMap) -> SourceId {
    ORIGIN_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .filter_map(|raw| raw.split(',').next().map(str::trim))
        .find(|ip| !ip.is_empty())
        .map(SourceId::from)
        .unwrap_or_else(SourceId::unknown)
}

pub fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get("user-agent").and_then(|v| v.to_str().ok())
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn first_forwarded_hop_wins() {
        let h = headers(&[
            ("x-forwarded-for", "1.2.3.4, 10.0.0.1"),
            ("x-real-ip", "9.9.9.9"),
        ]);
        assert_eq!(client_source(&h).as_str(), "1.2.3.4");
    }

    #[test]
    fn falls_back_through_proxy_headers() {
        assert_eq!(
            client_source(&headers(&[("x-real-ip", "9.9.9.9")])).as_str(),
            "9.9.9.9"
        );
        assert_eq!(
            client_source(&headers(&[("x-forwarded-for", " "), ("cf-connecting-ip", "8.8.8.8")]))
                .as_str(),
            "8.8.8.8"
        );
        assert!(client_source(&HeaderMap::new()).is_unknown());
    }

    #[test]
    fn bearer_requires_scheme() {
        assert_eq!(
            bearer_token(&headers(&[("authorization", "Bearer abc")])),
            Some("abc")
        );
        assert_eq!(bearer_token(&headers(&[("authorization", "Basic abc")])), None);
        assert_eq!(bearer_token(&headers(&[("authorization", "Bearer ")])), None);
    }
}
