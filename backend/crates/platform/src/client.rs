//! Client identification
//!
//! Sessions are bound to a hash of the User-Agent so a stolen cookie
//! replayed from another browser is rejected.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

use crate::crypto::{constant_time_eq, sha256};

#[derive(Debug, Clone)]
pub struct ClientFingerprint {
    /// SHA-256 of the User-Agent header
    pub hash: [u8; 32],
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientFingerprint {
    /// Read the User-Agent and client address from a request.
    pub fn from_headers(
        headers: &HeaderMap,
        direct_ip: Option<IpAddr>,
    ) -> Result<Self, FingerprintError> {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .filter(|ua| !ua.trim().is_empty())
            .ok_or_else(|| FingerprintError::MissingHeader("User-Agent".to_string()))?;

        Ok(Self {
            hash: sha256(user_agent.as_bytes()),
            ip: extract_client_ip(headers, direct_ip),
            user_agent: Some(user_agent.to_string()),
        })
    }

    pub fn hash_vec(&self) -> Vec<u8> {
        self.hash.to_vec()
    }

    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }

    /// Compare against a stored fingerprint hash.
    pub fn matches(&self, stored: &[u8]) -> bool {
        constant_time_eq(&self.hash, stored)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FingerprintError {
    #[error("Missing required header: {0}")]
    MissingHeader(String),
}

/// First address of `X-Forwarded-For`, else the socket address
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_ua(ua: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(ua));
        headers
    }

    #[test]
    fn test_fingerprint_from_headers() {
        let fp = ClientFingerprint::from_headers(&headers_with_ua("Mozilla/5.0 Test"), None).unwrap();
        assert_eq!(fp.user_agent.as_deref(), Some("Mozilla/5.0 Test"));
        assert!(fp.matches(&sha256(b"Mozilla/5.0 Test")));
        assert!(!fp.matches(&sha256(b"curl/8.0")));
    }

    #[test]
    fn test_missing_user_agent() {
        let result = ClientFingerprint::from_headers(&HeaderMap::new(), None);
        assert!(matches!(result, Err(FingerprintError::MissingHeader(_))));
    }

    #[test]
    fn test_forwarded_ip_wins() {
        let mut headers = headers_with_ua("ua");
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(
            extract_client_ip(&headers, Some(direct)),
            Some("192.168.1.1".parse().unwrap())
        );
        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(direct)), Some(direct));
    }
}
