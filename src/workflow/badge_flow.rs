//! 单条引用处理流程 - 流程层
//!
//! 定义"一条引用"的完整链路：解析 corpusId → 立即做资格检查。
//! 解析和检查逐条内联串接（不等整组解析完再统一检查），
//! 单条的失败在这里终结，绝不影响同组其他条目。

use crate::models::{BadgeCandidate, CitationEl, ElementHandle, PaperMatch};
use crate::services::{PaperMatchService, ShowableService};
use tracing::warn;

/// 单条引用的终态
#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    /// 解析成功且允许展示
    Annotate(BadgeCandidate),
    /// 没有解析出 corpusId
    NoCorpusId,
    /// 解析成功但不允许展示
    NotShowable,
    /// 资格检查失败（重试耗尽）
    CheckFailed,
}

/// 引用处理流程
///
/// - 只依赖业务能力（services）
/// - 不持有元素列表，不关心分组和节奏
pub struct BadgeFlow {
    matcher: PaperMatchService,
    showable: ShowableService,
}

impl BadgeFlow {
    pub fn new(matcher: PaperMatchService, showable: ShowableService) -> Self {
        Self { matcher, showable }
    }

    /// 标题分支：解析一条无标识符的引用并内联检查资格
    pub async fn resolve_by_title(&self, el: &CitationEl) -> ResolveOutcome {
        let Some(reference) = &el.reference else {
            return ResolveOutcome::NoCorpusId;
        };

        let Some(row) = self.matcher.match_reference(reference).await else {
            return ResolveOutcome::NoCorpusId;
        };
        let Some(corpus_id) = row.corpus_id else {
            return ResolveOutcome::NoCorpusId;
        };

        self.check_candidate(&el.cite_el, corpus_id).await
    }

    /// 批量解析（标识符分支的第一阶段），直接委托给匹配服务
    pub async fn resolve_batch(&self, paper_ids: &[String]) -> Option<Vec<Option<PaperMatch>>> {
        self.matcher.match_batch(paper_ids).await
    }

    /// 对已解析出的 corpusId 做资格检查
    pub async fn check_candidate(&self, cite_el: &ElementHandle, corpus_id: u64) -> ResolveOutcome {
        match self.showable.check_showable(corpus_id).await {
            Ok(true) => ResolveOutcome::Annotate(BadgeCandidate {
                cite_el: cite_el.clone(),
                corpus_id,
            }),
            Ok(false) => ResolveOutcome::NotShowable,
            Err(err) => {
                // 单条检查失败只记日志，不中断同组其他条目
                warn!("[S2] 资格检查失败: corpusId={} - {}", corpus_id, err);
                ResolveOutcome::CheckFailed
            }
        }
    }
}
