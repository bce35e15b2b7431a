//! 论文匹配服务 - 业务能力层
//!
//! 把标题或外部标识符解析成 corpusId：
//! - 单条：GET /paper/search/match（标题检索）
//! - 批量：POST /paper/batch（带前缀 id 列表，按位置对齐返回）
//!
//! 只处理单次调用，不关心分组 / 去重 / 流程顺序。

use crate::error::TransportError;
use crate::infrastructure::{fetch_with_retry, FetchRequest, RetryPolicy, Transport};
use crate::models::{PaperMatch, Reference};
use crate::utils::truncate_text;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 检索时请求的字段；textAvailability 仅用于诊断日志
const MATCH_FIELDS: &str = "corpusId,textAvailability";

/// 论文匹配服务
pub struct PaperMatchService {
    transport: Arc<dyn Transport>,
    base_url: String,
    retry: RetryPolicy,
}

impl PaperMatchService {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            retry,
        }
    }

    /// 按书目描述（标题）解析单篇论文
    ///
    /// 标题为空、库中无此论文或重试耗尽后仍失败时返回 None。
    pub async fn match_reference(&self, reference: &Reference) -> Option<PaperMatch> {
        let title = reference.title.trim();
        if title.is_empty() {
            return None;
        }

        let url = match reqwest::Url::parse_with_params(
            &format!("{}/paper/search/match", self.base_url),
            &[("query", title), ("fields", MATCH_FIELDS)],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!("[S2] 无法构造检索 URL: {}", e);
                return None;
            }
        };

        let request = FetchRequest::get(url);
        let data = match fetch_with_retry(self.transport.as_ref(), &request, &self.retry).await {
            Ok(data) => data,
            Err(err) => {
                self.log_match_failure(title, &err);
                return None;
            }
        };

        // HTTP 200 但结果为空 = 论文不在 S2 库中
        let first = data
            .get("data")
            .and_then(|v| v.as_array())
            .and_then(|rows| rows.first())
            .cloned()?;

        match serde_json::from_value::<PaperMatch>(first) {
            Ok(row) => {
                debug!(
                    "[S2] 标题匹配成功: \"{}\" -> corpusId={:?} (textAvailability={:?})",
                    truncate_text(title, 50),
                    row.corpus_id,
                    row.text_availability
                );
                Some(row)
            }
            Err(e) => {
                warn!("[S2] 无法解析匹配结果: {}", e);
                None
            }
        }
    }

    /// 按外部标识符批量解析
    ///
    /// 成功时返回与输入按位置对齐的结果数组（未命中的条目为 None）；
    /// 输入为空或调用失败时返回 None。响应形状不做修补，
    /// 长度校验是编排层的职责。
    pub async fn match_batch(&self, paper_ids: &[String]) -> Option<Vec<Option<PaperMatch>>> {
        if paper_ids.is_empty() {
            return None;
        }

        let url = format!("{}/paper/batch?fields={}", self.base_url, MATCH_FIELDS);
        let request = FetchRequest::post_json(url, json!({ "ids": paper_ids }));

        let data = match fetch_with_retry(self.transport.as_ref(), &request, &self.retry).await {
            Ok(data) => data,
            Err(err) => {
                warn!("[S2] 批量解析失败 ({} 个 id): {}", paper_ids.len(), err);
                return None;
            }
        };

        let rows = data.as_array()?;
        Some(
            rows.iter()
                .map(|row| serde_json::from_value::<PaperMatch>(row.clone()).ok())
                .collect(),
        )
    }

    /// 标题匹配失败的分类日志
    fn log_match_failure(&self, title: &str, err: &TransportError) {
        let preview = truncate_text(title, 50);
        match err.status() {
            // 重试耗尽仍被限流
            Some(429) => warn!("[S2] 重试耗尽仍被限流: \"{}\" - {}", preview, err),
            // 论文不在 S2 库中
            Some(404) => warn!("[S2] 未找到: \"{}\" - {}", preview, err),
            _ => error!("[S2] API 错误: \"{}\" - {}", preview, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{FetchReply, Method};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 记录请求并返回固定负载的传输桩
    struct CannedTransport {
        calls: AtomicUsize,
        last_request: Mutex<Option<FetchRequest>>,
        payload: serde_json::Value,
    }

    impl CannedTransport {
        fn new(payload: serde_json::Value) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                payload,
            }
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchReply, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(FetchReply {
                status: 200,
                data: self.payload.clone(),
            })
        }
    }

    fn service(transport: Arc<CannedTransport>) -> PaperMatchService {
        PaperMatchService::new(transport, "http://api.test/graph/v1", RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_empty_title_makes_no_call() {
        let transport = Arc::new(CannedTransport::new(json!({})));
        let svc = service(transport.clone());

        let result = svc.match_reference(&Reference::from_title("   ")).await;

        assert!(result.is_none());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_match_reference_returns_first_row() {
        let transport = Arc::new(CannedTransport::new(json!({
            "data": [
                { "corpusId": 11, "textAvailability": "fulltext" },
                { "corpusId": 22 }
            ]
        })));
        let svc = service(transport.clone());

        let row = svc
            .match_reference(&Reference::from_title("Attention Is All You Need"))
            .await
            .unwrap();

        assert_eq!(row.corpus_id, Some(11));

        // URL 里带上了编码后的标题和字段列表
        let request = transport.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.method, Method::Get);
        assert!(request.url.contains("/paper/search/match"));
        assert!(request.url.contains("query=Attention"));
        assert!(request.url.contains("fields=corpusId"));
    }

    #[tokio::test]
    async fn test_empty_result_set_is_none() {
        let transport = Arc::new(CannedTransport::new(json!({ "data": [] })));
        let svc = service(transport);
        assert!(svc
            .match_reference(&Reference::from_title("unknown paper"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_match_batch_aligns_rows_positionally() {
        let transport = Arc::new(CannedTransport::new(json!([
            { "corpusId": 1 },
            null,
            { "textAvailability": "abstract" }
        ])));
        let svc = service(transport.clone());

        let ids: Vec<String> = vec!["DOI:10.1/a".into(), "DOI:10.1/b".into(), "DOI:10.1/c".into()];
        let rows = svc.match_batch(&ids).await.unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap().corpus_id, Some(1));
        assert!(rows[1].is_none());
        // 第三行存在但没有 corpusId
        assert!(rows[2].as_ref().unwrap().corpus_id.is_none());

        let request = transport.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.as_ref().unwrap()["ids"][0], "DOI:10.1/a");
    }

    #[tokio::test]
    async fn test_match_batch_empty_input_makes_no_call() {
        let transport = Arc::new(CannedTransport::new(json!([])));
        let svc = service(transport.clone());
        assert!(svc.match_batch(&[]).await.is_none());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_match_batch_non_array_payload_is_none() {
        let transport = Arc::new(CannedTransport::new(json!({ "error": "bad request" })));
        let svc = service(transport);
        let ids = vec!["DOI:10.1/a".to_string()];
        assert!(svc.match_batch(&ids).await.is_none());
    }
}
