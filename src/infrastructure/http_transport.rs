//! 直连 HTTP 传输
//!
//! 不经页面、直接用 reqwest 发请求的 Transport 实现。
//! 配置 `transport_mode = "http"` 时由 App 装配，
//! 适用于调用上下文本身允许跨域请求的场合。

use crate::error::TransportError;
use crate::infrastructure::transport::{FetchReply, FetchRequest, Method, Transport};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// reqwest 实现的传输层
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::no_response(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchReply, TransportError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => {
                let mut b = self.client.post(&request.url);
                if let Some(body) = &request.body {
                    b = b.json(body);
                }
                b.header("Accept", "application/json")
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::no_response(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status, message));
        }

        // 响应体不是合法 JSON 时仍然返回状态信息，data 置 null
        let data = response
            .json::<JsonValue>()
            .await
            .unwrap_or(JsonValue::Null);

        Ok(FetchReply { status, data })
    }
}
