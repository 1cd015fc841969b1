//! HTTP Upstream - 转发请求到外部协作服务
//!
//! 实现 CollaboratorPort，把请求原样转发到 `<base_url><原始路径>?<query>`，
//! 上游响应（任意状态码）以流式方式原样返回
//!
//! - 丢弃 hop-by-hop 头和 Host
//! - 设置 X-Request-Id，缺省时补 X-Forwarded-For
//! - 不跟随重定向
//! - 超时只限制等待响应头，响应体流不受限

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use http::header::{CONTENT_LENGTH, HOST};
use http::{HeaderMap, HeaderName, HeaderValue, Uri};
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{CollaboratorError, CollaboratorPort};
use crate::application::RequestContext;
use crate::domain::REQUEST_ID_HEADER;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// 上游配置
#[derive(Debug, Clone)]
pub struct HttpUpstreamConfig {
    /// 上游名称（用于日志）
    pub name: String,
    /// 上游基础 URL
    pub base_url: String,
    /// 等待上游响应头的超时时间（秒）
    pub timeout_secs: u64,
    /// 请求体最大字节数
    pub max_body_bytes: usize,
}

impl Default for HttpUpstreamConfig {
    fn default() -> Self {
        Self {
            name: "upstream".to_string(),
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 120,
            max_body_bytes: 50 * 1024 * 1024,
        }
    }
}

impl HttpUpstreamConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}

/// 构建上游共用的 HTTP 客户端
///
/// 不设置整体超时：下载可能是长时间的流
pub fn build_upstream_client() -> Result<Client, CollaboratorError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| CollaboratorError::Unavailable(e.to_string()))
}

/// HTTP 上游转发器
pub struct HttpUpstream {
    client: Client,
    config: HttpUpstreamConfig,
}

impl HttpUpstream {
    /// 使用独立客户端创建
    pub fn new(config: HttpUpstreamConfig) -> Result<Self, CollaboratorError> {
        let client = build_upstream_client()?;
        Ok(Self { client, config })
    }

    /// 与其他上游共享同一个客户端（连接池）
    pub fn with_client(client: Client, config: HttpUpstreamConfig) -> Self {
        Self { client, config }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// 目标 URL
    fn target_url(&self, uri: &Uri) -> String {
        let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            path_and_query
        )
    }

    /// 转发请求，`extra_headers` 覆盖同名请求头
    pub async fn forward(
        &self,
        ctx: &RequestContext,
        request: Request,
        extra_headers: &[(HeaderName, HeaderValue)],
    ) -> Result<Response, CollaboratorError> {
        let (parts, body) = request.into_parts();
        let url = self.target_url(&parts.uri);

        let body = axum::body::to_bytes(body, self.config.max_body_bytes)
            .await
            .map_err(|e| {
                let too_large = e
                    .into_inner()
                    .downcast_ref::<http_body_util::LengthLimitError>()
                    .is_some();
                if too_large {
                    CollaboratorError::BodyTooLarge {
                        limit: self.config.max_body_bytes,
                    }
                } else {
                    CollaboratorError::InvalidRequest("Failed to read request body".to_string())
                }
            })?;

        let mut headers = forwardable_headers(&parts.headers);
        headers.insert(
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderValue::from_str(ctx.request_id().as_str())
                .map_err(|e| CollaboratorError::InvalidRequest(e.to_string()))?,
        );
        if !headers.contains_key(X_FORWARDED_FOR) {
            if let Some(peer) = ctx.peer() {
                if let Ok(value) = HeaderValue::from_str(&peer.ip().to_string()) {
                    headers.insert(HeaderName::from_static(X_FORWARDED_FOR), value);
                }
            }
        }
        for (name, value) in extra_headers {
            headers.insert(name.clone(), value.clone());
        }

        tracing::debug!(
            parent: ctx.span(),
            upstream = %self.config.name,
            method = %parts.method,
            url = %url,
            body_len = body.len(),
            "Forwarding request to upstream"
        );

        let send = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send();
        let response = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), send)
            .await
            .map_err(|_| {
                tracing::warn!(
                    parent: ctx.span(),
                    upstream = %self.config.name,
                    timeout_secs = self.config.timeout_secs,
                    "Upstream did not respond in time"
                );
                CollaboratorError::Timeout
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    CollaboratorError::Timeout
                } else if e.is_connect() {
                    CollaboratorError::Unavailable(format!(
                        "Cannot connect to {}: {}",
                        self.config.name, e
                    ))
                } else if e.is_builder() {
                    CollaboratorError::InvalidRequest(e.to_string())
                } else {
                    CollaboratorError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        tracing::debug!(
            parent: ctx.span(),
            upstream = %self.config.name,
            status = status.as_u16(),
            "Upstream responded"
        );

        let mut builder = Response::builder().status(status);
        if let Some(out) = builder.headers_mut() {
            for (name, value) in response.headers() {
                if !is_hop_by_hop(name) {
                    out.append(name.clone(), value.clone());
                }
            }
        }

        builder
            .body(Body::from_stream(response.bytes_stream()))
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CollaboratorPort for HttpUpstream {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: Request,
    ) -> Result<Response, CollaboratorError> {
        self.forward(ctx, request, &[]).await
    }
}

/// 可以转发给上游的请求头
fn forwardable_headers(source: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if is_hop_by_hop(name) || name == HOST || name == CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::Router;
    use http::{Method, StatusCode};
    use http_body_util::BodyExt;

    use crate::application::ports::OpenApiBridgePort;
    use crate::domain::{ApiSurface, RequestId};
    use crate::infrastructure::adapters::HttpOpenApiBridge;

    /// 启动一个回显请求信息的本地上游
    async fn spawn_echo_upstream() -> String {
        async fn echo(request: Request) -> Response {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let header = |name: &str| {
                parts
                    .headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string()
            };
            let payload = serde_json::json!({
                "method": parts.method.as_str(),
                "uri": parts.uri.to_string(),
                "request_id": header("x-request-id"),
                "forwarded_for": header("x-forwarded-for"),
                "connection": header("connection"),
                "beta": header("x-api-beta"),
                "body": String::from_utf8_lossy(&body),
            });
            Response::builder()
                .status(StatusCode::CREATED)
                .header("x-upstream", "echo")
                .body(Body::from(payload.to_string()))
                .unwrap()
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(echo))
                .await
                .unwrap();
        });
        format!("http://{}", addr)
    }

    /// 启动一个本地上游，分块慢速输出响应体
    async fn spawn_slow_upstream(chunks: u8, interval: Duration) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(move || async move {
            let stream = futures_util::stream::unfold(0u8, move |i| async move {
                if i == chunks {
                    return None;
                }
                tokio::time::sleep(interval).await;
                Some((Ok::<_, std::io::Error>(Bytes::from(format!("part{};", i))), i + 1))
            });
            Body::from_stream(stream)
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// 启动一个迟迟不返回响应头的本地上游
    async fn spawn_stalled_upstream(delay: Duration) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(move || async move {
            tokio::time::sleep(delay).await;
            "late"
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn context() -> RequestContext {
        let peer = "192.0.2.44:40000".parse().ok();
        RequestContext::new(
            RequestId::from_inbound("req-42").unwrap(),
            &Method::POST,
            "/api/files/upload",
            peer,
        )
    }

    #[test]
    fn test_config_default() {
        let config = HttpUpstreamConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpUpstreamConfig::new("files", "http://files:9000")
            .with_timeout(30)
            .with_max_body_bytes(1024);
        assert_eq!(config.name, "files");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn test_target_url_keeps_path_and_query() {
        let upstream =
            HttpUpstream::new(HttpUpstreamConfig::new("files", "http://files:9000/")).unwrap();
        let uri: Uri = "/api/files/presigned?key=a%2Fb".parse().unwrap();
        assert_eq!(
            upstream.target_url(&uri),
            "http://files:9000/api/files/presigned?key=a%2Fb"
        );
    }

    #[test]
    fn test_hop_by_hop_headers_dropped() {
        let mut source = HeaderMap::new();
        source.insert("connection", HeaderValue::from_static("keep-alive"));
        source.insert("host", HeaderValue::from_static("example.com"));
        source.insert("content-length", HeaderValue::from_static("3"));
        source.insert("authorization", HeaderValue::from_static("Bearer t"));

        let headers = forwardable_headers(&source);
        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_forward_round_trip() {
        let base_url = spawn_echo_upstream().await;
        let upstream = HttpUpstream::new(HttpUpstreamConfig::new("files", base_url)).unwrap();

        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/api/files/upload?x=1")
            .header("connection", "close")
            .body(Body::from("hello"))
            .unwrap();

        let response = upstream.handle(&context(), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get("x-upstream").unwrap(), "echo");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let echoed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["uri"], "/api/files/upload?x=1");
        assert_eq!(echoed["request_id"], "req-42");
        assert_eq!(echoed["forwarded_for"], "192.0.2.44");
        assert_eq!(echoed["connection"], "");
        assert_eq!(echoed["body"], "hello");
    }

    #[tokio::test]
    async fn test_forward_rejects_oversized_body() {
        let upstream = HttpUpstream::new(
            HttpUpstreamConfig::new("files", "http://127.0.0.1:9").with_max_body_bytes(4),
        )
        .unwrap();
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/api/files/upload")
            .body(Body::from("too large"))
            .unwrap();

        let err = upstream.handle(&context(), request).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::BodyTooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        // 先占用再释放一个端口，确保无人监听
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream =
            HttpUpstream::new(HttpUpstreamConfig::new("auth", format!("http://{}", addr))).unwrap();
        let request = http::Request::builder()
            .uri("/api/auth/session")
            .body(Body::empty())
            .unwrap();

        let err = upstream.handle(&context(), request).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_slow_stream_outlives_header_timeout() {
        let base_url = spawn_slow_upstream(4, Duration::from_millis(600)).await;
        let upstream =
            HttpUpstream::new(HttpUpstreamConfig::new("files", base_url).with_timeout(1)).unwrap();
        let request = http::Request::builder()
            .uri("/api/files/download/large.pdf")
            .body(Body::empty())
            .unwrap();

        let response = upstream.handle(&context(), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"part0;part1;part2;part3;");
    }

    #[tokio::test]
    async fn test_stalled_upstream_times_out() {
        let base_url = spawn_stalled_upstream(Duration::from_secs(3)).await;
        let upstream =
            HttpUpstream::new(HttpUpstreamConfig::new("ai", base_url).with_timeout(1)).unwrap();
        let request = http::Request::builder()
            .uri("/api/ai/complete")
            .body(Body::empty())
            .unwrap();

        let err = upstream.handle(&context(), request).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Timeout));
    }

    async fn bridge_round_trip(surface: ApiSurface) -> serde_json::Value {
        let base_url = spawn_echo_upstream().await;
        let bridge = HttpOpenApiBridge::new(
            HttpUpstream::new(HttpUpstreamConfig::new("bridge", base_url)).unwrap(),
        );
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/api/v2/envelope/create")
            .header("x-api-beta", "spoofed")
            .body(Body::from(r#"{"title":"nda"}"#))
            .unwrap();

        let response = bridge.handle(&context(), surface, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bridge_forwards_stable_flag() {
        let echoed = bridge_round_trip(ApiSurface::Stable).await;
        assert_eq!(echoed["beta"], "false");
        assert_eq!(echoed["uri"], "/api/v2/envelope/create");
        assert_eq!(echoed["request_id"], "req-42");
        assert_eq!(echoed["body"], r#"{"title":"nda"}"#);
    }

    #[tokio::test]
    async fn test_bridge_forwards_beta_flag() {
        let echoed = bridge_round_trip(ApiSurface::Beta).await;
        assert_eq!(echoed["beta"], "true");
    }
}
