//! 错误类型
//!
//! 按来源划分为配置、暂存（staging）、认证、文件四类，
//! `StagingError` 的 Display 文本会原样写入条目的 `last_error`。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 暂存服务错误
    #[error("暂存错误: {0}")]
    Staging(#[from] StagingError),
    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 缺少生成服务的 API Key
    #[error("Gemini API Key (API_KEY) is not configured.")]
    MissingApiKey,
    /// 配置值无法识别
    #[error("配置项 {key} 的值 '{value}' 无效")]
    InvalidValue { key: String, value: String },
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {message}")]
    FileParseFailed { path: String, message: String },
}

/// 暂存网关错误
///
/// 所有网关失败都归入这三类，不会在网关内部重试。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StagingError {
    /// 凭据缺失
    #[error("{0}")]
    Configuration(String),
    /// 源图片无法转换为传输格式
    #[error("{0}")]
    Encoding(String),
    /// 网络错误，或响应中没有图片
    #[error("{0}")]
    Upstream(String),
}

impl StagingError {
    /// 错误类别名称（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            StagingError::Configuration(_) => "ConfigurationError",
            StagingError::Encoding(_) => "EncodingError",
            StagingError::Upstream(_) => "UpstreamError",
        }
    }
}

/// 认证错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// 表单校验失败
    #[error("{0}")]
    Validation(String),
    /// 身份服务拒绝（消息原样展示）
    #[error("{0}")]
    Rejected(String),
    /// 注册成功，但需要先完成邮件确认
    #[error("Check your email for the confirmation link!")]
    ConfirmationRequired,
    /// 网络请求失败
    #[error("{0}")]
    Transport(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 暂存结果不是合法的 data URI
    #[error("无法解析暂存结果: {0}")]
    InvalidDataUri(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

impl StagingError {
    /// 包装上游失败，保留底层原因
    pub fn upstream(cause: impl std::fmt::Display) -> Self {
        StagingError::Upstream(format!("Failed to stage image: {}", cause))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
