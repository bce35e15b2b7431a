//! 徽章解析管线 - 编排层
//!
//! ## 职责
//!
//! 1. **互斥**：同一时刻至多一次执行在途（页面变更观察者可能反复触发）
//! 2. **清理**：无条件清除旧徽章，插入前再清一次
//! 3. **去重**：按 DOI / 标题去重，首个出现者生效
//! 4. **双分支**：标题解析与标识符批量解析并发推进，互不等待
//! 5. **分组节奏**：组内并发、组间串行，组间停顿避免触发限流
//! 6. **容错**：单条失败只记账，管线本身永不向外抛错
//!
//! 最坏情况下的对外表现只是"插入了零个徽章"。

use crate::annotator::Annotator;
use crate::models::{BadgeCandidate, BadgeSite, CitationEl};
use crate::services::format_paper_id;
use crate::utils::slice_into_chunks;
use crate::workflow::{BadgeFlow, ResolveOutcome};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// 分组与节奏参数
#[derive(Debug, Clone)]
pub struct PipelineTuning {
    /// 标题解析的组大小
    pub title_chunk_size: usize,
    /// 标识符批量解析的组大小
    pub id_batch_size: usize,
    /// 资格检查子组大小
    pub showable_chunk_size: usize,
    /// 标题解析组间停顿
    pub title_chunk_delay: Duration,
    /// 资格检查子组间停顿
    pub showable_chunk_delay: Duration,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        Self {
            title_chunk_size: 10,
            id_batch_size: 20,
            showable_chunk_size: 10,
            title_chunk_delay: Duration::from_millis(200),
            showable_chunk_delay: Duration::from_millis(100),
        }
    }
}

/// 单次执行的丢弃记账（只进日志，不对外抛错）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BadgeStats {
    /// 标题分支：没解析出 corpusId
    pub refs_no_corpus_id: usize,
    /// 标题分支：解析成功但不允许展示
    pub refs_not_showable: usize,
    /// 标识符分支：没解析出 corpusId
    pub dois_no_corpus_id: usize,
    /// 标识符分支：解析成功但不允许展示
    pub dois_not_showable: usize,
    /// 两分支：资格检查失败（重试耗尽）
    pub check_failed: usize,
}

impl BadgeStats {
    fn is_empty(&self) -> bool {
        *self == BadgeStats::default()
    }

    fn merge(&mut self, other: &BadgeStats) {
        self.refs_no_corpus_id += other.refs_no_corpus_id;
        self.refs_not_showable += other.refs_not_showable;
        self.dois_no_corpus_id += other.dois_no_corpus_id;
        self.dois_not_showable += other.dois_not_showable;
        self.check_failed += other.check_failed;
    }
}

/// 单次执行的结果汇总
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// 实际插入的徽章数量
    pub inserted: usize,
    pub stats: BadgeStats,
}

/// 执行期间持有互斥标志，离开作用域（包括分支提前返回）时释放
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 徽章解析管线
pub struct BadgePipeline {
    flow: BadgeFlow,
    annotator: Arc<dyn Annotator>,
    tuning: PipelineTuning,
    running: AtomicBool,
}

impl BadgePipeline {
    pub fn new(flow: BadgeFlow, annotator: Arc<dyn Annotator>, tuning: PipelineTuning) -> Self {
        Self {
            flow,
            annotator,
            tuning,
            running: AtomicBool::new(false),
        }
    }

    /// 执行一次完整的解析与插入
    ///
    /// `discover` 由调用方提供，同步返回当前页面上的引用元素列表。
    /// 站点配置缺失或已有执行在途时立即返回空汇总，不发任何请求、
    /// 不动 DOM。
    pub async fn run<F>(&self, site: Option<&BadgeSite>, discover: F) -> RunSummary
    where
        F: Fn() -> Vec<CitationEl>,
    {
        let Some(site) = site else {
            return RunSummary::default();
        };

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("已有管线执行在途，本次调用跳过");
            return RunSummary::default();
        }
        let _guard = RunGuard(&self.running);

        // 无条件清除旧徽章，即使本次不会产出新徽章
        self.remove_stale_badges().await;

        let els = discover();
        if els.is_empty() {
            return RunSummary::default();
        }

        let (refs_to_resolve, with_dois) = Self::dedup_and_partition(els);
        info!(
            "🔍 发现引用元素: 标题待解析 {} 个, 带标识符 {} 个",
            refs_to_resolve.len(),
            with_dois.len()
        );

        // 两条分支互相独立，并发推进
        let (title_result, id_result) = tokio::join!(
            self.run_title_branch(&refs_to_resolve),
            self.run_id_branch(&with_dois),
        );

        let mut badges = Vec::new();
        let mut stats = BadgeStats::default();
        let (mut title_badges, title_stats) = title_result;
        let (mut id_badges, id_stats) = id_result;
        badges.append(&mut title_badges);
        badges.append(&mut id_badges);
        stats.merge(&title_stats);
        stats.merge(&id_stats);

        // 两分支结束后再清一次，覆盖执行期间外部插入的旧徽章
        self.remove_stale_badges().await;

        let inserted = self.insert_badges(&badges, site).await;

        if !stats.is_empty() {
            debug!("[Asta] 徽章统计: {:?}", stats);
        }

        RunSummary { inserted, stats }
    }

    /// 去重并按"有无标识符"分流
    ///
    /// 去重键为空的元素（既无 DOI 也无标题）视为无效直接丢弃；
    /// 同键元素只保留首个出现者。
    fn dedup_and_partition(els: Vec<CitationEl>) -> (Vec<CitationEl>, Vec<CitationEl>) {
        let mut seen = HashSet::new();
        let mut refs_to_resolve = Vec::new();
        let mut with_dois = Vec::new();

        for el in els {
            let Some(key) = el.dedup_key() else {
                continue;
            };
            if !seen.insert(key) {
                continue;
            }

            let has_doi = el
                .doi
                .as_deref()
                .map(|d| !d.trim().is_empty())
                .unwrap_or(false);
            if has_doi {
                with_dois.push(el);
            } else {
                refs_to_resolve.push(el);
            }
        }

        (refs_to_resolve, with_dois)
    }

    /// 标题分支：组内并发解析，组间严格串行并停顿
    async fn run_title_branch(&self, items: &[CitationEl]) -> (Vec<BadgeCandidate>, BadgeStats) {
        let mut badges = Vec::new();
        let mut stats = BadgeStats::default();

        let groups: Vec<&[CitationEl]> =
            slice_into_chunks(items, self.tuning.title_chunk_size).collect();
        let total = groups.len();

        for (i, group) in groups.into_iter().enumerate() {
            let outcomes = join_all(group.iter().map(|el| self.flow.resolve_by_title(el))).await;
            for outcome in outcomes {
                match outcome {
                    ResolveOutcome::Annotate(candidate) => badges.push(candidate),
                    ResolveOutcome::NoCorpusId => stats.refs_no_corpus_id += 1,
                    ResolveOutcome::NotShowable => stats.refs_not_showable += 1,
                    ResolveOutcome::CheckFailed => stats.check_failed += 1,
                }
            }
            // 组间停顿避免限流；最后一组之后不停
            if i + 1 < total {
                sleep(self.tuning.title_chunk_delay).await;
            }
        }

        (badges, stats)
    }

    /// 标识符分支：整组批量解析，再分小组做资格检查
    async fn run_id_branch(&self, items: &[CitationEl]) -> (Vec<BadgeCandidate>, BadgeStats) {
        let mut badges = Vec::new();
        let mut stats = BadgeStats::default();

        for group in slice_into_chunks(items, self.tuning.id_batch_size) {
            let ids: Vec<String> = group
                .iter()
                .map(|el| format_paper_id(el.doi.as_deref().unwrap_or_default()))
                .collect();

            let Some(rows) = self.flow.resolve_batch(&ids).await else {
                warn!("批量解析无结果，丢弃本组 {} 条", group.len());
                continue;
            };

            // 长度对不上说明响应畸形，整组丢弃，避免错位配对
            if rows.len() != group.len() {
                warn!(
                    "⚠️ 批量响应长度不一致 (期望 {}, 实际 {})，丢弃本组",
                    group.len(),
                    rows.len()
                );
                continue;
            }

            let mut resolved: Vec<(&CitationEl, u64)> = Vec::new();
            for (el, row) in group.iter().zip(rows) {
                match row.and_then(|r| r.corpus_id) {
                    Some(corpus_id) => resolved.push((el, corpus_id)),
                    None => stats.dois_no_corpus_id += 1,
                }
            }

            // 资格检查按子组并发，子组间留小停顿
            let sub_groups: Vec<&[(&CitationEl, u64)]> =
                slice_into_chunks(&resolved, self.tuning.showable_chunk_size).collect();
            let sub_total = sub_groups.len();

            for (i, sub_group) in sub_groups.into_iter().enumerate() {
                let outcomes = join_all(
                    sub_group
                        .iter()
                        .map(|(el, corpus_id)| self.flow.check_candidate(&el.cite_el, *corpus_id)),
                )
                .await;
                for outcome in outcomes {
                    match outcome {
                        ResolveOutcome::Annotate(candidate) => badges.push(candidate),
                        ResolveOutcome::NoCorpusId => stats.dois_no_corpus_id += 1,
                        ResolveOutcome::NotShowable => stats.dois_not_showable += 1,
                        ResolveOutcome::CheckFailed => stats.check_failed += 1,
                    }
                }
                if i + 1 < sub_total {
                    sleep(self.tuning.showable_chunk_delay).await;
                }
            }
        }

        (badges, stats)
    }

    /// 清除旧徽章；失败只记日志
    async fn remove_stale_badges(&self) {
        if let Err(e) = self.annotator.remove_all().await {
            warn!("清除旧徽章失败: {}", e);
        }
    }

    /// 逐条插入徽章；单条失败只记日志
    async fn insert_badges(&self, badges: &[BadgeCandidate], site: &BadgeSite) -> usize {
        let mut inserted = 0;
        for badge in badges {
            match self
                .annotator
                .insert_badge(&badge.cite_el, badge.corpus_id, site)
                .await
            {
                Ok(true) => inserted += 1,
                Ok(false) => {
                    warn!("引用元素已不在页面上: corpusId={}", badge.corpus_id);
                }
                Err(e) => {
                    error!("❌ 插入徽章失败: corpusId={} - {}", badge.corpus_id, e);
                }
            }
        }
        if inserted > 0 {
            info!("✓ 已插入 {} 个徽章", inserted);
        }
        inserted
    }
}
