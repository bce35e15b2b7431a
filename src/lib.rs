//! # Asta Badges
//!
//! 一个在学术站点引用旁插入 AI 徽章的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `Transport` - 出站请求抽象（页面内 fetch / 直连 HTTP）
//! - `fetch_with_retry` - 瞬时失败的退避重试
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个引用或一批标识符
//! - `PaperMatchService` - 标题匹配 / 标识符批量查询能力
//! - `ShowableService` - 资格检查能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条引用"的完整解析流程
//! - `BadgeFlow` - 流程编排（match → showable → 徽章候选）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/badge_pipeline` - 徽章管线，管理去重、分组、并发与互斥
//! - `orchestrator` - 应用入口，连接浏览器并发起扫描
//!
//! ## 模块结构

pub mod annotator;
pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use annotator::{Annotator, PageAnnotator};
pub use browser::connect_to_browser_and_page;
pub use config::{Config, DeployTarget, TransportMode};
pub use error::{AppError, AppResult, TransportError};
pub use infrastructure::{JsExecutor, Transport};
pub use models::{BadgeCandidate, BadgeSite, CitationEl, ElementHandle, PaperMatch, Reference};
pub use orchestrator::{App, BadgePipeline, BadgeStats, RunSummary};
pub use workflow::{BadgeFlow, ResolveOutcome};
