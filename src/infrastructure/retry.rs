//! 带重试的远端调用
//!
//! 瞬时失败（429 / 5xx / 无响应）按指数退避重试，
//! 永久失败（其余 4xx）直接返回；重试耗尽后把终态错误交给调用方，
//! 由调用方按"无数据"处理，绝不向外层管线传播。

use crate::error::TransportError;
use crate::infrastructure::transport::{FetchRequest, Transport};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次尝试）
    pub max_retries: usize,
    /// 退避基准，每次尝试后翻倍
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// 第 attempt 次失败后的退避时长（500ms, 1000ms, 2000ms, ...）
    fn backoff_for(&self, attempt: usize) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt as u32)
    }
}

/// 发起一次远端调用，瞬时失败按策略重试
///
/// 成功时返回解析后的 JSON 负载。
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    request: &FetchRequest,
    policy: &RetryPolicy,
) -> Result<JsonValue, TransportError> {
    let mut attempt = 0;
    loop {
        match transport.fetch(request).await {
            Ok(reply) => return Ok(reply.data),
            Err(err) => {
                let should_retry = err.is_transient() && attempt < policy.max_retries;
                if !should_retry {
                    return Err(err);
                }

                let backoff = policy.backoff_for(attempt);
                // 限流单独记日志，便于区分服务端故障
                if err.is_rate_limited() {
                    warn!(
                        "[S2] 命中频率限制 (HTTP 429)，{}ms 后重试...",
                        backoff.as_millis()
                    );
                } else {
                    warn!(
                        "[S2] 瞬时失败 (HTTP {:?})，{}ms 后重试: {}",
                        err.status(),
                        backoff.as_millis(),
                        err
                    );
                }
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
