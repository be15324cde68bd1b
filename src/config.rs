use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::models::{AspectRatio, RoomType, StagingStyle};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 生成服务配置 ---
    /// 生成服务凭据，缺失时整个界面不可用
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model_name: String,
    // --- 身份服务配置 ---
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub auth_email: Option<String>,
    pub auth_password: Option<String>,
    pub auth_sign_up: bool,
    // --- 暂存参数 ---
    pub style: StagingStyle,
    pub aspect_ratio: AspectRatio,
    pub room_type: RoomType,
    pub refinement_note: Option<String>,
    // --- 输出 ---
    /// 导出暂存结果的目录
    pub output_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model_name: "gemini-2.5-flash-image-preview".to_string(),
            supabase_url: None,
            supabase_anon_key: None,
            auth_email: None,
            auth_password: None,
            auth_sign_up: false,
            style: StagingStyle::default(),
            aspect_ratio: AspectRatio::default(),
            room_type: RoomType::default(),
            refinement_note: None,
            output_dir: "staged_output".to_string(),
            output_log_file: "staging_log.txt".to_string(),
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    api_key: Option<String>,
    api_base_url: Option<String>,
    model_name: Option<String>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    auth_email: Option<String>,
    auth_password: Option<String>,
    auth_sign_up: Option<bool>,
    style: Option<String>,
    aspect_ratio: Option<String>,
    room_type: Option<String>,
    refinement_note: Option<String>,
    output_dir: Option<String>,
    output_log_file: Option<String>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 加载配置：默认值 → `STAGER_CONFIG` 指向的 TOML 文件 → 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("STAGER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// 仅使用环境变量覆盖默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileParseFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::FileParseFailed { message, .. } => ConfigError::FileParseFailed {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::FileParseFailed {
            path: String::new(),
            message: e.to_string(),
        })?;

        let default = Self::default();
        Ok(Self {
            api_key: file.api_key,
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            model_name: file.model_name.unwrap_or(default.model_name),
            supabase_url: file.supabase_url,
            supabase_anon_key: file.supabase_anon_key,
            auth_email: file.auth_email,
            auth_password: file.auth_password,
            auth_sign_up: file.auth_sign_up.unwrap_or(default.auth_sign_up),
            style: parse_option("style", file.style)?.unwrap_or(default.style),
            aspect_ratio: parse_option("aspect_ratio", file.aspect_ratio)?
                .unwrap_or(default.aspect_ratio),
            room_type: parse_option("room_type", file.room_type)?.unwrap_or(default.room_type),
            refinement_note: file.refinement_note,
            output_dir: file.output_dir.unwrap_or(default.output_dir),
            output_log_file: file.output_log_file.unwrap_or(default.output_log_file),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    /// 用外部变量覆盖配置（`lookup` 通常是环境变量）
    pub fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: lookup("API_KEY").or(self.api_key),
            api_base_url: lookup("API_BASE_URL").unwrap_or(self.api_base_url),
            model_name: lookup("MODEL_NAME").unwrap_or(self.model_name),
            supabase_url: lookup("SUPABASE_URL").or(self.supabase_url),
            supabase_anon_key: lookup("SUPABASE_ANON_KEY").or(self.supabase_anon_key),
            auth_email: lookup("AUTH_EMAIL").or(self.auth_email),
            auth_password: lookup("AUTH_PASSWORD").or(self.auth_password),
            auth_sign_up: parse_option("AUTH_SIGN_UP", lookup("AUTH_SIGN_UP"))?
                .unwrap_or(self.auth_sign_up),
            style: parse_option("STAGING_STYLE", lookup("STAGING_STYLE"))?.unwrap_or(self.style),
            aspect_ratio: parse_option("ASPECT_RATIO", lookup("ASPECT_RATIO"))?
                .unwrap_or(self.aspect_ratio),
            room_type: parse_option("ROOM_TYPE", lookup("ROOM_TYPE"))?.unwrap_or(self.room_type),
            refinement_note: lookup("REFINEMENT_NOTE").or(self.refinement_note),
            output_dir: lookup("OUTPUT_DIR").unwrap_or(self.output_dir),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            verbose_logging: parse_option("VERBOSE_LOGGING", lookup("VERBOSE_LOGGING"))?
                .unwrap_or(self.verbose_logging),
        })
    }

    /// 检查生成服务凭据
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    /// 身份服务是否已配置
    pub fn is_identity_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.supabase_url) && present(&self.supabase_anon_key)
    }
}

/// 解析可选的配置值，空字符串视为未设置
fn parse_option<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    match value {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        _ => Ok(None),
    }
}
