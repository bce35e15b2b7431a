//! 传输抽象 - 基础设施层
//!
//! 重试 / 退避逻辑与"请求实际怎么发出去"解耦：
//! 解析、资格检查只面向 `Transport`，不关心走直连 HTTP 还是页面内代理。

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// HTTP 方法（管线只用到这两种）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// 一次远端调用的描述
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    /// POST 时的 JSON 请求体
    pub body: Option<JsonValue>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: JsonValue) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            body: Some(body),
        }
    }
}

/// 成功响应（`{ ok, status, data }` 约定中 ok 为 true 的部分）
#[derive(Debug, Clone)]
pub struct FetchReply {
    pub status: u16,
    /// 解析后的 JSON 负载；响应体不是合法 JSON 时为 null
    pub data: JsonValue,
}

/// 可插拔传输接口
///
/// 实现者只负责把请求发出去并套用状态码分类，不做重试。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchReply, TransportError>;
}
