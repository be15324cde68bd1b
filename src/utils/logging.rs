use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、会话日志文件和输出格式化的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{Item, SessionParams};

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复调用是安全的。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化会话日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> std::io::Result<()> {
    let log_header = format!(
        "{}\n暂存会话日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加一条条目处理结果
pub fn append_item_result(log_file_path: &str, item: &Item) -> Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(log_file_path)?;
    writeln!(
        file,
        "[{}] {} | {} | {} | {}",
        chrono::Local::now().format("%H:%M:%S"),
        item.source.file_name,
        item.room_type,
        item.status,
        item.last_error.as_deref().unwrap_or("-")
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(session: &SessionParams) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - AI 虚拟家装暂存");
    info!("🎨 风格: {} | 📐 宽高比: {}", session.style, session.aspect_ratio);
    info!("{}", "=".repeat(60));
}

/// 渲染条目列表
pub fn render_snapshot(items: &[Item]) -> String {
    if items.is_empty() {
        return "（没有图片）".to_string();
    }

    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        let detail = match (&item.staged_image, &item.last_error) {
            (_, Some(error)) => format!("❌ {}", truncate_text(error, 80)),
            (Some(_), None) => "✅ 已生成".to_string(),
            (None, None) => "-".to_string(),
        };
        out.push_str(&format!(
            "{:>2}. {:<28} {:<12} {:<6} {}\n",
            idx + 1,
            truncate_text(&item.source.file_name, 25),
            item.room_type,
            item.status,
            detail
        ));
    }
    out
}

/// 打印最终统计信息
pub fn print_final_stats(ready: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", ready, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
