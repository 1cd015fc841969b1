//! Client Key - 限流主体标识
//!
//! 从请求元数据中提取调用方 IP，提取失败时退化为共享的哨兵 key

use http::HeaderMap;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// 提取失败时使用的哨兵 key
pub const UNKNOWN_CLIENT_KEY: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// IP 提取错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientIpError {
    #[error("No client IP address found in request metadata")]
    Missing,
}

/// 限流 key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKey {
    Ip(IpAddr),
    /// 所有无法识别 IP 的请求共用此 key
    Unknown,
}

impl ClientKey {
    /// 从请求头和对端地址解析限流 key，永不失败
    pub fn from_request_metadata(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        match extract_client_ip(headers, peer) {
            Ok(ip) => ClientKey::Ip(ip),
            Err(e) => {
                tracing::debug!(error = %e, "Falling back to shared client key");
                ClientKey::Unknown
            }
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ClientKey::Unknown)
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientKey::Ip(ip) => write!(f, "{}", ip),
            ClientKey::Unknown => f.write_str(UNKNOWN_CLIENT_KEY),
        }
    }
}

/// 提取调用方 IP
///
/// 顺序：`X-Forwarded-For` 第一项 > `X-Real-IP` > TCP 对端地址。
/// 每个候选值都必须能解析为 IP 地址，否则跳过
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Result<IpAddr, ClientIpError> {
    let forwarded = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip);
    if let Some(ip) = forwarded {
        return Ok(ip);
    }

    if let Some(ip) = header_str(headers, X_REAL_IP).and_then(parse_ip) {
        return Ok(ip);
    }

    peer.map(|addr| addr.ip()).ok_or(ClientIpError::Missing)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        let ip = extract_client_ip(&map, None).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_real_ip_when_forwarded_is_garbage() {
        let map = headers(&[
            ("x-forwarded-for", "not-an-ip"),
            ("x-real-ip", "2001:db8::1"),
        ]);
        let ip = extract_client_ip(&map, None).unwrap();
        assert_eq!(ip, "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_peer_address_fallback() {
        let peer: SocketAddr = "192.0.2.10:50123".parse().unwrap();
        let ip = extract_client_ip(&HeaderMap::new(), Some(peer)).unwrap();
        assert_eq!(ip, peer.ip());
    }

    #[test]
    fn test_missing_ip_yields_sentinel_key() {
        assert_eq!(
            extract_client_ip(&HeaderMap::new(), None),
            Err(ClientIpError::Missing)
        );
        let key = ClientKey::from_request_metadata(&HeaderMap::new(), None);
        assert!(key.is_unknown());
        assert_eq!(key.to_string(), UNKNOWN_CLIENT_KEY);
    }
}
