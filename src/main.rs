use anyhow::Result;
use std::path::PathBuf;
use tracing::error;

use virtual_stager::orchestrator::render_configuration_error;
use virtual_stager::utils::logging;
use virtual_stager::{App, AppError, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", render_configuration_error(&AppError::Config(e)));
            std::process::exit(2);
        }
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 待处理的图片
    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    // 初始化应用；凭据缺失时只显示配置错误界面
    let mut app = match App::initialize(config) {
        Ok(app) => app,
        Err(e @ (AppError::Config(_) | AppError::Staging(_))) => {
            eprintln!("{}", render_configuration_error(&e));
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = app.authenticate().await {
        error!("❌ 认证失败: {}", e);
        std::process::exit(1);
    }

    app.run(&paths).await?;

    Ok(())
}
