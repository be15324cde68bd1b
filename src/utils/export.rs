//! 导出暂存结果
//!
//! 终端里无法直接显示图片，完成的结果写到输出目录，
//! 文件名与网页版下载链接一致：`staged-<原文件名>.png`，重名时加序号。

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::FileError;
use crate::models::{ImageRef, Item};

/// 解码 data URI，返回 (MIME 类型, 字节)
pub fn decode_data_uri(image: &ImageRef) -> Result<(String, Vec<u8>), FileError> {
    let re = Regex::new(r"^data:([a-zA-Z0-9.+-]+/[a-zA-Z0-9.+-]+);base64,([A-Za-z0-9+/=\s]+)$")
        .map_err(|e| FileError::InvalidDataUri(e.to_string()))?;
    let caps = re
        .captures(image.as_str())
        .ok_or_else(|| FileError::InvalidDataUri("不是 base64 data URI".to_string()))?;

    let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| FileError::InvalidDataUri(e.to_string()))?;

    Ok((caps[1].to_string(), bytes))
}

/// 导出文件名：第一次为 `staged-<stem>.png`，重名时依次加 `-2`、`-3`……
pub fn export_file_name(stem: &str, attempt: usize) -> String {
    if attempt <= 1 {
        format!("staged-{}.png", stem)
    } else {
        format!("staged-{}-{}.png", stem, attempt)
    }
}

/// 导出单个条目的暂存结果；没有结果时返回 `None`
///
/// 已存在的文件不会被覆盖。
pub async fn export_item(item: &Item, output_dir: &Path) -> Result<Option<PathBuf>> {
    let Some(image) = &item.staged_image else {
        return Ok(None);
    };

    let (_, bytes) = decode_data_uri(image)?;

    fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("无法创建输出目录: {}", output_dir.display()))?;

    let (path, mut file) = create_unique(output_dir, item.source.file_stem()).await?;
    file.write_all(&bytes)
        .await
        .with_context(|| format!("无法写入文件: {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("无法写入文件: {}", path.display()))?;

    info!("[图片 {}] 💾 已导出: {}", item.id.short(), path.display());
    Ok(Some(path))
}

/// 在输出目录中创建一个尚不存在的导出文件
async fn create_unique(output_dir: &Path, stem: &str) -> Result<(PathBuf, fs::File)> {
    let mut attempt = 1;
    loop {
        let path = output_dir.join(export_file_name(stem, attempt));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(e).with_context(|| format!("无法创建文件: {}", path.display()));
            }
        }
    }
}
