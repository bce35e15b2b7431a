//! 编排层
//!
//! - `badge_pipeline` - 徽章解析管线（去重、双分支并发、互斥、记账）
//! - `App` - 应用入口：连接浏览器、识别站点、扫描页面、驱动管线

pub mod badge_pipeline;

pub use badge_pipeline::{BadgePipeline, BadgeStats, PipelineTuning, RunSummary};

use crate::annotator::PageAnnotator;
use crate::browser;
use crate::config::{Config, TransportMode};
use crate::infrastructure::{HttpTransport, JsExecutor, PageTransport, RetryPolicy, Transport};
use crate::models::{site_for_host, BadgeSite, CitationEl, ElementHandle, Reference};
use crate::services::{parse_arxiv_id, parse_corpus_id, PaperMatchService, ShowableService};
use crate::utils::logging;
use crate::workflow::BadgeFlow;
use anyhow::Result;
use chromiumoxide::Browser;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 页面扫描返回的原始记录
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScannedEl {
    cite_el: String,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
    pipeline: BadgePipeline,
}

impl App {
    /// 初始化应用：日志、浏览器连接、管线装配
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            Some(&config.target_url),
            Some(&config.target_host),
        )
        .await?;

        let executor = JsExecutor::new(page.clone());

        // 解析和资格检查共用同一个传输层；
        // 默认经页面代发请求，也可配置为直连 HTTP
        let transport: Arc<dyn Transport> = match config.transport_mode {
            TransportMode::Page => Arc::new(PageTransport::new(JsExecutor::new(page.clone()))),
            TransportMode::Http => Arc::new(HttpTransport::new()?),
        };
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            backoff_base: std::time::Duration::from_millis(config.backoff_base_ms),
        };

        let matcher =
            PaperMatchService::new(transport.clone(), config.s2_api_base_url.clone(), retry.clone());
        let showable = ShowableService::new(
            transport,
            config.showable_api_base_url.clone(),
            retry,
        );
        let flow = BadgeFlow::new(matcher, showable);

        let annotator = Arc::new(PageAnnotator::new(
            JsExecutor::new(page),
            config.asta_ui_url.clone(),
        ));

        let pipeline = BadgePipeline::new(flow, annotator, config.pipeline_tuning());

        Ok(Self {
            config,
            _browser: browser,
            executor,
            pipeline,
        })
    }

    /// 运行应用主逻辑：识别站点 → 扫描 → 解析插入
    pub async fn run(&self) -> Result<()> {
        let Some((site, path)) = self.detect_site().await? else {
            warn!("⚠️ 当前页面不在支持的站点列表中，程序结束");
            return Ok(());
        };
        info!("✓ 识别到站点: {} (路径: {})", site.name, path);

        self.log_current_page_ids().await;

        let els = self.scan_citation_els(&site).await?;
        info!("📄 扫描到 {} 个引用元素", els.len());

        let summary = self.pipeline.run(Some(&site), || els.clone()).await;

        print_final_stats(&summary, &self.config);
        Ok(())
    }

    /// 按当前页面 URL 识别站点配置
    async fn detect_site(&self) -> Result<Option<(BadgeSite, String)>> {
        let Some(raw_url) = self.executor.page().url().await? else {
            return Ok(None);
        };
        let Ok(url) = reqwest::Url::parse(&raw_url) else {
            return Ok(None);
        };
        let Some(host) = url.host_str() else {
            return Ok(None);
        };
        Ok(site_for_host(host).map(|site| (site, url.path().to_string())))
    }

    /// 记录当前页面自身的论文标识（arxiv meta / corpus-id 文本）
    async fn log_current_page_ids(&self) {
        let script = r#"
            (() => {
                const meta = document.querySelector('meta[name="citation_arxiv_id"]');
                const corpus = document.querySelector('[data-test-id="corpus-id"]');
                return {
                    arxivMeta: meta ? meta.content : null,
                    corpusText: corpus ? corpus.textContent : null
                };
            })()
        "#;

        let Ok(ids) = self.executor.eval(script).await else {
            return;
        };
        if let Some(arxiv) = ids
            .get("arxivMeta")
            .and_then(|v| v.as_str())
            .and_then(parse_arxiv_id)
        {
            info!("当前页面 ArXiv 标识: {}", arxiv);
        }
        if let Some(corpus) = ids
            .get("corpusText")
            .and_then(|v| v.as_str())
            .and_then(parse_corpus_id)
        {
            info!("当前页面 Corpus 标识: {}", corpus);
        }
    }

    /// 扫描页面上的引用元素，打上句柄属性并抽取 DOI / 标题
    async fn scan_citation_els(&self, site: &BadgeSite) -> Result<Vec<CitationEl>> {
        let script = format!(
            r#"
            (() => {{
                const els = document.querySelectorAll({selector});
                const out = [];
                let i = 0;
                for (const el of els) {{
                    const handle = String(i++);
                    el.setAttribute("data-asta-ref", handle);
                    let doi = el.getAttribute("data-doi");
                    if (!doi) {{
                        const doiLink = el.querySelector("a[href*='doi.org/']");
                        if (doiLink) {{
                            doi = decodeURIComponent(doiLink.href.split("doi.org/")[1] || "") || null;
                        }}
                    }}
                    const titleEl = el.querySelector("h3 a, .docsum-title, .gsc_a_at, .cl-paper-title, a.title");
                    const title = titleEl ? titleEl.textContent.trim() : null;
                    out.push({{ citeEl: handle, doi: doi, title: title }});
                }}
                return out;
            }})()
            "#,
            selector = serde_json::to_string(&site.cite_selector)?,
        );

        let scanned: Vec<ScannedEl> = self.executor.eval_as(script).await?;
        debug!("页面扫描原始记录: {} 条", scanned.len());

        Ok(scanned
            .into_iter()
            .map(|raw| CitationEl {
                cite_el: ElementHandle(raw.cite_el),
                reference: raw
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .map(Reference::from_title),
                doi: raw.doi.filter(|d| !d.trim().is_empty()),
            })
            .collect())
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 引用徽章插入");
    info!("📊 部署目标: {:?} -> {}", config.deploy_target, config.asta_ui_url);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(summary: &RunSummary, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已插入徽章: {}", summary.inserted);
    info!(
        "❌ 丢弃: 无corpusId {} / 不可展示 {} / 检查失败 {}",
        summary.stats.refs_no_corpus_id + summary.stats.dois_no_corpus_id,
        summary.stats.refs_not_showable + summary.stats.dois_not_showable,
        summary.stats.check_failed
    );
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}
