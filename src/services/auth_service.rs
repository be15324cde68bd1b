//! 身份服务 - 业务能力层
//!
//! 邮箱 + 密码登录/注册，直接调用 Supabase GoTrue 的 REST 接口。
//! 服务返回的错误消息原样交给表单展示。

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AuthError;

/// 认证成功后的会话信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub email: String,
    /// 注册后需要邮件确认时为空
    pub access_token: Option<String>,
}

/// 身份服务
pub trait IdentityProvider: Send + Sync {
    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthSession, AuthError>>;

    fn sign_up<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthSession, AuthError>>;
}

/// Supabase 身份服务客户端
pub struct SupabaseAuth {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl SupabaseAuth {
    /// 从配置创建；URL 或 anon key 缺失时返回 `None`
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.is_identity_configured() {
            return None;
        }
        let base_url = config.supabase_url.as_deref()?.trim_end_matches('/').to_string();
        let anon_key = config.supabase_anon_key.clone()?;

        Some(Self {
            client: reqwest::Client::new(),
            base_url,
            anon_key,
        })
    }

    /// `require_session` 为真时，成功响应里必须带有 access_token
    async fn post_credentials(
        &self,
        path: &str,
        email: &str,
        password: &str,
        require_session: bool,
    ) -> Result<AuthSession, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("调用身份服务: {}", url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| {
                warn!("身份服务请求失败: {}", e);
                AuthError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = extract_auth_message(&body)
                .unwrap_or_else(|| format!("Authentication failed (HTTP {})", status.as_u16()));
            return Err(AuthError::Rejected(message));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("身份服务响应无法解析: {}", e);
            AuthError::Transport(format!("Unexpected response from authentication service: {}", e))
        })?;
        if require_session && token.access_token.is_none() {
            return Err(AuthError::Transport(
                "Authentication service returned no session.".to_string(),
            ));
        }

        Ok(AuthSession {
            email: email.to_string(),
            access_token: token.access_token,
        })
    }
}

impl IdentityProvider for SupabaseAuth {
    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthSession, AuthError>> {
        Box::pin(self.post_credentials("/auth/v1/token?grant_type=password", email, password, true))
    }

    fn sign_up<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthSession, AuthError>> {
        Box::pin(self.post_credentials("/auth/v1/signup", email, password, false))
    }
}

/// 提取 GoTrue 错误消息（不同版本字段名不同）
fn extract_auth_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
