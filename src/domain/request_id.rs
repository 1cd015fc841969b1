//! Request Identifier
//!
//! 每个请求的唯一标识，贯穿日志与上游转发

use serde::Serialize;
use uuid::Uuid;

/// 请求 ID 的 HTTP 头名称
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 入站请求 ID 的最大长度
const MAX_INBOUND_LEN: usize = 255;

/// 请求唯一标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// 生成新的请求 ID（UUID v4）
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 复用客户端传入的请求 ID
    ///
    /// 只接受长度不超过 255 且仅包含 `[A-Za-z0-9_-=]` 的值，否则返回 None
    pub fn from_inbound(value: &str) -> Option<Self> {
        if value.is_empty() || value.len() > MAX_INBOUND_LEN {
            return None;
        }
        let valid = value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'='));
        valid.then(|| Self(value.to_string()))
    }

    /// 优先复用入站值，否则生成新的
    pub fn from_inbound_or_generate(value: Option<&str>) -> Self {
        value
            .and_then(Self::from_inbound)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_inbound_id_accepted() {
        let id = RequestId::from_inbound("abc-123_XYZ=").unwrap();
        assert_eq!(id.as_str(), "abc-123_XYZ=");
    }

    #[test]
    fn test_inbound_id_rejected() {
        assert!(RequestId::from_inbound("").is_none());
        assert!(RequestId::from_inbound("has space").is_none());
        assert!(RequestId::from_inbound("semi;colon").is_none());
        assert!(RequestId::from_inbound(&"a".repeat(256)).is_none());
        assert!(RequestId::from_inbound(&"a".repeat(255)).is_some());
    }

    #[test]
    fn test_fallback_generates() {
        let id = RequestId::from_inbound_or_generate(Some("bad value!"));
        assert_ne!(id.as_str(), "bad value!");
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
