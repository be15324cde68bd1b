//! 应用主结构 - 编排层
//!
//! ## 职责
//!
//! 1. **启动检查**：凭据缺失时不构建网关，直接进入配置错误界面
//! 2. **认证**：配置了身份服务时先提交登录 / 注册表单
//! 3. **一次会话**：读取图片 → 上传 → 批量暂存 → 可选的优化 → 渲染 → 导出
//! 4. **资源清理**：会话结束时删除所有条目，释放预览

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError, StagingError};
use crate::models::{ItemStatus, SessionParams, SourceImage};
use crate::services::{GeminiGateway, IdentityProvider, StagingGateway, SupabaseAuth};
use crate::utils::{export, logging};
use crate::workflow::{AuthForm, AuthMode, StageOutcome, WorkflowController};

/// 会话统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub ready: usize,
    pub failed: usize,
    pub refined: usize,
    pub exported: Vec<PathBuf>,
    pub export_failed: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    controller: WorkflowController,
    identity: Option<Box<dyn IdentityProvider>>,
}

impl App {
    /// 初始化应用
    ///
    /// 凭据缺失时返回 `AppError::Config`，此时不会构建网关，也不会发起任何请求。
    pub fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;

        let gateway = GeminiGateway::new(&config)?;
        let identity = SupabaseAuth::from_config(&config)
            .map(|auth| Box::new(auth) as Box<dyn IdentityProvider>);

        logging::init_log_file(&config.output_log_file)
            .map_err(|e| AppError::file_write_failed(&config.output_log_file, e))?;

        Ok(Self::with_services(config, Arc::new(gateway), identity))
    }

    /// 使用指定的网关和身份服务创建应用
    pub fn with_services(
        config: Config,
        gateway: Arc<dyn StagingGateway>,
        identity: Option<Box<dyn IdentityProvider>>,
    ) -> Self {
        let session = SessionParams {
            style: config.style,
            aspect_ratio: config.aspect_ratio,
        };
        logging::log_startup(&session);

        let controller =
            WorkflowController::new(gateway, session).with_default_room_type(config.room_type);

        Self {
            config,
            controller,
            identity,
        }
    }

    pub fn controller(&self) -> &WorkflowController {
        &self.controller
    }

    /// 身份服务已配置时提交认证表单
    ///
    /// 失败时错误显示在表单下方，已输入的邮箱保持不变。
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        let Some(identity) = self.identity.as_deref() else {
            return Ok(());
        };

        let mode = if self.config.auth_sign_up {
            AuthMode::SignUp
        } else {
            AuthMode::SignIn
        };
        let mut form = AuthForm::new(
            self.config.auth_email.clone().unwrap_or_default(),
            self.config.auth_password.clone().unwrap_or_default(),
            mode,
        );

        let result = form.submit(identity).await;
        println!("{}", render_auth_form(&form));

        match result {
            // 注册成功但需要邮件确认，本次会话不能继续
            Ok(session) if session.access_token.is_none() && mode == AuthMode::SignUp => {
                Err(AuthError::ConfirmationRequired)
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// 运行一次暂存会话
    pub async fn run(&mut self, paths: &[PathBuf]) -> Result<RunSummary> {
        if paths.is_empty() {
            warn!("⚠️ 没有提供图片，程序结束");
            return Ok(RunSummary::default());
        }

        let files = load_images(paths).await?;
        self.controller.ingest_upload(files);

        self.controller.stage_all();
        self.controller.run_until_idle().await;

        let refined = self.refine_ready_items().await;

        println!("{}", logging::render_snapshot(self.controller.snapshot()));

        let summary = self.export_results(refined).await;

        for id in self.controller.store().ids() {
            self.controller.remove_item(id);
        }

        Ok(summary)
    }

    /// 导出结果并写入日志
    ///
    /// 单个条目导出失败只记录警告，不影响其他条目。
    async fn export_results(&self, refined: usize) -> RunSummary {
        let mut summary = RunSummary {
            total: self.controller.snapshot().len(),
            refined,
            ..Default::default()
        };

        let output_dir = PathBuf::from(&self.config.output_dir);
        for item in self.controller.snapshot() {
            match item.status {
                ItemStatus::Ready => summary.ready += 1,
                ItemStatus::Failed => summary.failed += 1,
                _ => {}
            }
            match export::export_item(item, &output_dir).await {
                Ok(Some(path)) => summary.exported.push(path),
                Ok(None) => {}
                Err(e) => {
                    warn!("[图片 {}] 导出失败: {:#}", item.id.short(), e);
                    summary.export_failed += 1;
                }
            }
            if let Err(e) = logging::append_item_result(&self.config.output_log_file, item) {
                warn!("写入日志失败: {}", e);
            }
        }

        logging::print_final_stats(
            summary.ready,
            summary.failed,
            summary.total,
            &self.config.output_log_file,
        );
        if summary.export_failed > 0 {
            warn!("⚠️ {} 张图片导出失败", summary.export_failed);
        }

        summary
    }

    /// 配置了反馈时，对已完成的条目再发起一次优化
    async fn refine_ready_items(&mut self) -> usize {
        let Some(note) = self
            .config
            .refinement_note
            .clone()
            .filter(|note| !note.trim().is_empty())
        else {
            return 0;
        };

        let ready: Vec<_> = self
            .controller
            .snapshot()
            .iter()
            .filter(|item| item.status == ItemStatus::Ready)
            .map(|item| item.id)
            .collect();

        let mut dispatched = 0;
        for id in ready {
            self.controller.set_refinement_note(id, note.clone());
            if matches!(self.controller.stage_one(id), StageOutcome::Dispatched(_)) {
                dispatched += 1;
            }
        }

        if dispatched > 0 {
            info!("🔁 按反馈优化 {} 张图片", dispatched);
            self.controller.run_until_idle().await;
        }
        dispatched
    }
}

/// 读取图片文件
async fn load_images(paths: &[PathBuf]) -> Result<Vec<SourceImage>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("无法读取图片: {}", path.display()))?;
        files.push(SourceImage::new(display_name(path), bytes));
    }
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 配置错误界面，替代整个交互界面
pub fn render_configuration_error(error: &AppError) -> String {
    let message = match error {
        AppError::Config(e) => e.to_string(),
        AppError::Staging(StagingError::Configuration(message)) => message.clone(),
        other => other.to_string(),
    };

    format!(
        "{line}\n⛔ Configuration Error\n\n{message}\n\nPlease set the required environment variables and restart the application.\n{line}",
        line = "=".repeat(60),
        message = message
    )
}

/// 认证表单（提示和错误显示在表单下方）
fn render_auth_form(form: &AuthForm) -> String {
    let title = match form.mode {
        AuthMode::SignIn => "Sign in to your account",
        AuthMode::SignUp => "Create an account to get started",
    };
    let mut out = format!("🔑 {}\n   Email address: {}\n   [{}]", title, form.email, form.submit_label());
    if let Some(message) = &form.message {
        out.push_str(&format!("\n   ✉️ {}", message));
    }
    if let Some(error) = &form.error {
        out.push_str(&format!("\n   ⚠️ {}", error));
    }
    out
}
