//! 资格检查服务 - 业务能力层
//!
//! 给定 corpusId，查询论文是否允许展示徽章。
//! `/isShowable` 接口是资格判定的唯一事实来源；
//! 解析结果里的 textAvailability 字段不参与判定。

use crate::error::TransportError;
use crate::infrastructure::{fetch_with_retry, FetchRequest, RetryPolicy, Transport};
use std::sync::Arc;
use tracing::debug;

/// 资格检查服务
pub struct ShowableService {
    transport: Arc<dyn Transport>,
    base_url: String,
    retry: RetryPolicy,
}

impl ShowableService {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            retry,
        }
    }

    /// 查询展示资格
    ///
    /// 响应缺少 showable 字段按 false 处理；
    /// 重试耗尽后的终态错误原样返回，由编排层按单条失败记账。
    pub async fn check_showable(&self, corpus_id: u64) -> Result<bool, TransportError> {
        let url = format!("{}/isShowable/{}", self.base_url, corpus_id);
        let request = FetchRequest::get(url);

        let data = fetch_with_retry(self.transport.as_ref(), &request, &self.retry).await?;
        let showable = data
            .get("showable")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        debug!("[S2] 资格检查: corpusId={} showable={}", corpus_id, showable);
        Ok(showable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::FetchReply;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedTransport {
        last_url: Mutex<Option<String>>,
        result: Result<serde_json::Value, u16>,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchReply, TransportError> {
            *self.last_url.lock().unwrap() = Some(request.url.clone());
            match &self.result {
                Ok(data) => Ok(FetchReply {
                    status: 200,
                    data: data.clone(),
                }),
                Err(status) => Err(TransportError::from_status(*status, "boom")),
            }
        }
    }

    fn service(result: Result<serde_json::Value, u16>) -> (ShowableService, Arc<CannedTransport>) {
        let transport = Arc::new(CannedTransport {
            last_url: Mutex::new(None),
            result,
        });
        (
            ShowableService::new(transport.clone(), "http://mage.test", RetryPolicy::default()),
            transport,
        )
    }

    #[tokio::test]
    async fn test_showable_true() {
        let (svc, transport) = service(Ok(json!({ "showable": true })));
        assert!(svc.check_showable(215416146).await.unwrap());
        assert_eq!(
            transport.last_url.lock().unwrap().as_deref(),
            Some("http://mage.test/isShowable/215416146")
        );
    }

    #[tokio::test]
    async fn test_missing_field_reads_as_false() {
        let (svc, _) = service(Ok(json!({})));
        assert!(!svc.check_showable(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_terminal_error_is_surfaced() {
        let (svc, _) = service(Err(404));
        assert!(svc.check_showable(1).await.is_err());
    }
}
