//! 页面内传输
//!
//! 在附着的浏览器页面里执行 fetch 的 Transport 实现。
//! 调用上下文不允许直接跨域请求时，把请求交给有权限的执行环境代发，
//! 回传统一的 `{ ok, status, data }` / `{ ok: false, status: 0, error }` 形状。

use crate::error::TransportError;
use crate::infrastructure::js_executor::JsExecutor;
use crate::infrastructure::transport::{FetchReply, FetchRequest, Method, Transport};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// 经页面代发请求的传输层
pub struct PageTransport {
    executor: JsExecutor,
}

impl PageTransport {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 构建页面内 fetch 脚本
    fn build_fetch_script(&self, request: &FetchRequest) -> Result<String, TransportError> {
        let body_snippet = match (&request.method, &request.body) {
            (Method::Post, Some(body)) => {
                let body_json = serde_json::to_string(body)
                    .map_err(|e| TransportError::no_response(e.to_string()))?;
                format!("body: JSON.stringify({}),", body_json)
            }
            _ => String::new(),
        };

        Ok(format!(
            r#"
            (async () => {{
                try {{
                    const res = await fetch({url}, {{
                        method: "{method}",
                        headers: {{
                            "Content-Type": "application/json",
                            "Accept": "application/json"
                        }},
                        {body}
                    }});
                    const data = await res.json().catch(() => null);
                    return {{ ok: res.ok, status: res.status, data: data }};
                }} catch (err) {{
                    return {{ ok: false, status: 0, error: err.message }};
                }}
            }})()
            "#,
            url = serde_json::to_string(&request.url)
                .map_err(|e| TransportError::no_response(e.to_string()))?,
            method = request.method.as_str(),
            body = body_snippet,
        ))
    }

    /// 解析代理回传的 `{ ok, status, data }` 形状
    fn parse_reply(reply: JsonValue) -> Result<FetchReply, TransportError> {
        let ok = reply.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
        let status = reply
            .get("status")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u16;

        if ok {
            let data = reply.get("data").cloned().unwrap_or(JsonValue::Null);
            return Ok(FetchReply { status, data });
        }

        let message = reply
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("代理未返回错误信息")
            .to_string();

        // status 0 表示请求根本没发出去（网络层失败）
        if status == 0 {
            Err(TransportError::no_response(message))
        } else {
            Err(TransportError::from_status(status, message))
        }
    }
}

#[async_trait]
impl Transport for PageTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchReply, TransportError> {
        let script = self.build_fetch_script(request)?;
        let reply = self
            .executor
            .eval(script)
            .await
            .map_err(|e| TransportError::no_response(e.to_string()))?;
        Self::parse_reply(reply)
    }
}
