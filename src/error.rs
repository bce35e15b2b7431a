//! 错误类型定义
//!
//! 传输层使用带分类的 `TransportError`（永久 / 瞬时），
//! 应用层统一用 `AppError` 包装，编排层入口处再由 anyhow 收口。

use thiserror::Error;

/// 远端调用错误，按"是否值得重试"分类
///
/// 分类规则（与后台代理的约定一致）：
/// - 4xx（429 除外）→ 永久失败，不重试
/// - 429 / 5xx / 无响应 → 瞬时失败，可重试
#[derive(Debug, Error)]
pub enum TransportError {
    /// 永久性客户端错误（如 404），重试无意义
    #[error("远端拒绝请求 (HTTP {status}): {message}")]
    Permanent { status: u16, message: String },
    /// 瞬时失败：限流、服务端错误或网络层无响应（status 为空）
    #[error("请求瞬时失败 (HTTP {status:?}): {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },
}

impl TransportError {
    /// 按 HTTP 状态码分类构造
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if (400..500).contains(&status) && status != 429 {
            TransportError::Permanent { status, message }
        } else {
            TransportError::Transient {
                status: Some(status),
                message,
            }
        }
    }

    /// 网络层失败（没有拿到任何响应）
    pub fn no_response(message: impl Into<String>) -> Self {
        TransportError::Transient {
            status: None,
            message: message.into(),
        }
    }

    /// 是否值得重试
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Transient { .. })
    }

    /// 是否是频率限制（单独记日志用）
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            TransportError::Transient {
                status: Some(429),
                ..
            }
        )
    }

    /// 响应状态码（网络层失败时为 None）
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Permanent { status, .. } => Some(*status),
            TransportError::Transient { status, .. } => *status,
        }
    }
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器 / CDP 相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    /// 远端调用错误
    #[error("传输错误: {0}")]
    Transport(#[from] TransportError),
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML 配置解析失败
    #[error("TOML解析失败: {0}")]
    Toml(#[from] toml::de::Error),
    /// 文件读写失败
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
