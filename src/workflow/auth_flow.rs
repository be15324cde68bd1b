//! 登录 / 注册表单流程
//!
//! 提交时只清空提示和错误，输入的邮箱和密码保持不变。

use tracing::{info, warn};

use crate::error::AuthError;
use crate::services::{AuthSession, IdentityProvider};

const MIN_PASSWORD_LEN: usize = 6;
const SIGN_UP_MESSAGE: &str = "Check your email for the confirmation link!";

/// 表单模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

/// 认证表单状态
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    pub mode: AuthMode,
    /// 成功提示
    pub message: Option<String>,
    /// 错误提示（身份服务的消息原样展示）
    pub error: Option<String>,
    pub loading: bool,
}

impl AuthForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>, mode: AuthMode) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            mode,
            ..Self::default()
        }
    }

    /// 切换登录 / 注册
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.message = None;
        self.error = None;
    }

    /// 提交按钮文字
    pub fn submit_label(&self) -> &'static str {
        match (self.loading, self.mode) {
            (true, _) => "Processing...",
            (false, AuthMode::SignIn) => "Sign In",
            (false, AuthMode::SignUp) => "Sign Up",
        }
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.email.trim().is_empty() {
            return Err(AuthError::Validation("Email address is required.".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    /// 提交表单
    pub async fn submit(
        &mut self,
        provider: &dyn IdentityProvider,
    ) -> Result<AuthSession, AuthError> {
        self.message = None;
        self.error = None;

        if let Err(e) = self.validate() {
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.loading = true;
        let result = match self.mode {
            AuthMode::SignIn => provider.sign_in(self.email.trim(), &self.password).await,
            AuthMode::SignUp => provider.sign_up(self.email.trim(), &self.password).await,
        };
        self.loading = false;

        match &result {
            Ok(session) => {
                info!("🔑 认证成功: {}", session.email);
                if self.mode == AuthMode::SignUp {
                    self.message = Some(SIGN_UP_MESSAGE.to_string());
                }
            }
            Err(e) => {
                warn!("认证失败: {}", e);
                self.error = Some(e.to_string());
            }
        }

        result
    }
}
