//! 程序配置
//!
//! 默认值 → TOML 文件 → 环境变量，逐层覆盖。
//! 出站链接的基准 URL 按部署目标选取（public / internal）。

use crate::error::{AppError, AppResult};
use crate::orchestrator::PipelineTuning;
use serde::Deserialize;
use std::time::Duration;

/// 部署目标
///
/// public: 实验性生产环境；internal: 内部试用（UI 地址可经 INTERNAL_URL 覆盖）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployTarget {
    Public,
    Internal,
}

impl DeployTarget {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("internal") {
            DeployTarget::Internal
        } else {
            DeployTarget::Public
        }
    }

    /// 该部署目标的 UI 基准 URL
    pub fn ui_base_url(self) -> String {
        const DEFAULT_UI_URL: &str = "https://docvis-ui.allen.ai";
        match self {
            DeployTarget::Public => DEFAULT_UI_URL.to_string(),
            DeployTarget::Internal => {
                std::env::var("INTERNAL_URL").unwrap_or_else(|_| DEFAULT_UI_URL.to_string())
            }
        }
    }
}

/// 出站请求的传输方式
///
/// page: 经附着页面内的 fetch 代发；http: 直连 reqwest（无浏览器上下文时使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Page,
    Http,
}

impl TransportMode {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("http") {
            TransportMode::Http
        } else {
            TransportMode::Page
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 部署目标
    pub deploy_target: DeployTarget,
    /// 出站请求的传输方式
    pub transport_mode: TransportMode,
    /// 出站链接基准 URL（默认按部署目标推导）
    pub asta_ui_url: String,
    /// S2 图谱 API 基准 URL
    pub s2_api_base_url: String,
    /// 资格检查 API 基准 URL
    pub showable_api_base_url: String,
    /// 标题解析组大小
    pub title_chunk_size: usize,
    /// 标识符批量组大小
    pub id_batch_size: usize,
    /// 资格检查子组大小
    pub showable_chunk_size: usize,
    /// 标题解析组间停顿（毫秒）
    pub title_chunk_delay_ms: u64,
    /// 资格检查子组间停顿（毫秒）
    pub showable_chunk_delay_ms: u64,
    /// 最大重试次数（不含首次尝试）
    pub max_retries: usize,
    /// 重试退避基准（毫秒）
    pub backoff_base_ms: u64,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 未找到已打开标签页时导航的地址
    pub target_url: String,
    /// 复用标签页的站点匹配串
    pub target_host: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        let deploy_target = DeployTarget::Public;
        Self {
            deploy_target,
            transport_mode: TransportMode::Page,
            asta_ui_url: deploy_target.ui_base_url(),
            s2_api_base_url:
                "https://i13p7wsrzb.execute-api.us-west-2.amazonaws.com/prod/graph/v1".to_string(),
            showable_api_base_url: "https://mage.allen.ai".to_string(),
            title_chunk_size: 10,
            id_batch_size: 20,
            showable_chunk_size: 10,
            title_chunk_delay_ms: 200,
            showable_chunk_delay_ms: 100,
            max_retries: 1,
            backoff_base_ms: 500,
            browser_debug_port: 9222,
            target_url: "https://scholar.google.com".to_string(),
            target_host: "scholar.google".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

/// TOML 配置文件的部分字段（缺省沿用默认值）
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    deploy_target: Option<DeployTarget>,
    transport_mode: Option<TransportMode>,
    asta_ui_url: Option<String>,
    s2_api_base_url: Option<String>,
    showable_api_base_url: Option<String>,
    title_chunk_size: Option<usize>,
    id_batch_size: Option<usize>,
    showable_chunk_size: Option<usize>,
    title_chunk_delay_ms: Option<u64>,
    showable_chunk_delay_ms: Option<u64>,
    max_retries: Option<usize>,
    backoff_base_ms: Option<u64>,
    browser_debug_port: Option<u16>,
    target_url: Option<String>,
    target_host: Option<String>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    /// 加载配置：TOML 文件（存在时）→ 环境变量，逐层覆盖
    ///
    /// 文件路径取 `CONFIG_FILE` 环境变量，未设置时默认 `config.toml`；
    /// 文件不存在则直接从默认值起步。
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        if std::path::Path::new(&path).exists() {
            let mut config = Self::from_toml_file(&path)?;
            config.apply_env();
            Ok(config)
        } else {
            Ok(Self::from_env())
        }
    }

    /// 从环境变量加载（缺省沿用默认值）
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// 用环境变量覆盖已有配置
    fn apply_env(&mut self) {
        if let Ok(target) = std::env::var("DEPLOY_TARGET") {
            self.deploy_target = DeployTarget::parse(&target);
            self.asta_ui_url = self.deploy_target.ui_base_url();
        }
        if let Ok(mode) = std::env::var("TRANSPORT_MODE") {
            self.transport_mode = TransportMode::parse(&mode);
        }
        if let Ok(url) = std::env::var("ASTA_UI_URL") {
            self.asta_ui_url = url;
        }
        if let Ok(url) = std::env::var("S2_API_BASE_URL") {
            self.s2_api_base_url = url;
        }
        if let Ok(url) = std::env::var("SHOWABLE_API_BASE_URL") {
            self.showable_api_base_url = url;
        }
        if let Some(port) = env_parse("BROWSER_DEBUG_PORT") {
            self.browser_debug_port = port;
        }
        if let Ok(url) = std::env::var("TARGET_URL") {
            self.target_url = url;
        }
        if let Ok(host) = std::env::var("TARGET_HOST") {
            self.target_host = host;
        }
        if let Some(verbose) = env_parse("VERBOSE_LOGGING") {
            self.verbose_logging = verbose;
        }
        if let Ok(path) = std::env::var("OUTPUT_LOG_FILE") {
            self.output_log_file = path;
        }
    }

    /// 从 TOML 文件加载并覆盖默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        let mut config = Self::default();

        if let Some(target) = file.deploy_target {
            config.deploy_target = target;
            config.asta_ui_url = target.ui_base_url();
        }
        merge(&mut config.transport_mode, file.transport_mode);
        merge(&mut config.asta_ui_url, file.asta_ui_url);
        merge(&mut config.s2_api_base_url, file.s2_api_base_url);
        merge(&mut config.showable_api_base_url, file.showable_api_base_url);
        merge(&mut config.title_chunk_size, file.title_chunk_size);
        merge(&mut config.id_batch_size, file.id_batch_size);
        merge(&mut config.showable_chunk_size, file.showable_chunk_size);
        merge(&mut config.title_chunk_delay_ms, file.title_chunk_delay_ms);
        merge(
            &mut config.showable_chunk_delay_ms,
            file.showable_chunk_delay_ms,
        );
        merge(&mut config.max_retries, file.max_retries);
        merge(&mut config.backoff_base_ms, file.backoff_base_ms);
        merge(&mut config.browser_debug_port, file.browser_debug_port);
        merge(&mut config.target_url, file.target_url);
        merge(&mut config.target_host, file.target_host);
        merge(&mut config.verbose_logging, file.verbose_logging);
        merge(&mut config.output_log_file, file.output_log_file);

        if config.title_chunk_size == 0 || config.id_batch_size == 0 {
            return Err(AppError::Config("分组大小不能为 0".to_string()));
        }
        Ok(config)
    }

    /// 管线的分组与节奏参数
    pub fn pipeline_tuning(&self) -> PipelineTuning {
        PipelineTuning {
            title_chunk_size: self.title_chunk_size,
            id_batch_size: self.id_batch_size,
            showable_chunk_size: self.showable_chunk_size,
            title_chunk_delay: Duration::from_millis(self.title_chunk_delay_ms),
            showable_chunk_delay: Duration::from_millis(self.showable_chunk_delay_ms),
        }
    }
}

fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
