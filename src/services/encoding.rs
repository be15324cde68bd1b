//! 源图片到传输格式的转换
//!
//! 生成服务要求内联图片：base64 数据 + 声明的 MIME 类型。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;

use crate::error::StagingError;
use crate::models::SourceImage;

/// 内联图片（传输格式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// 支持的栅格格式
fn supported_mime(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        _ => None,
    }
}

/// 将源图片编码为内联图片
///
/// 通过文件头识别格式，不依赖文件扩展名。
pub fn encode_inline(source: &SourceImage) -> Result<InlineImage, StagingError> {
    if source.bytes.is_empty() {
        return Err(StagingError::Encoding(format!(
            "Invalid file format. {} is empty.",
            source.file_name
        )));
    }

    let format = image::guess_format(&source.bytes).map_err(|_| {
        StagingError::Encoding(format!(
            "Invalid file format. Could not determine MIME type of {}.",
            source.file_name
        ))
    })?;

    let mime_type = supported_mime(format).ok_or_else(|| {
        StagingError::Encoding(format!(
            "Unsupported image format {:?} for {}.",
            format, source.file_name
        ))
    })?;

    Ok(InlineImage {
        mime_type: mime_type.to_string(),
        data: STANDARD.encode(&source.bytes),
    })
}
