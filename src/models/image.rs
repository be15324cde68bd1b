use std::fmt;
use std::sync::Arc;

/// 用户上传的原始房间照片（不可变）
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// 原始文件名（仅用于展示和导出命名）
    pub file_name: String,
    /// 图片字节
    pub bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// 去掉扩展名的文件名
    pub fn file_stem(&self) -> &str {
        match self.file_name.rfind('.') {
            Some(idx) if idx > 0 => &self.file_name[..idx],
            _ => &self.file_name,
        }
    }
}

/// 暂存结果的可展示引用，形如 `data:image/png;base64,...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    /// 由 MIME 类型和 base64 数据构造 data URI
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        ImageRef(format!("data:{};base64,{}", mime_type, data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// data URI 中声明的 MIME 类型
    pub fn mime_type(&self) -> Option<&str> {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(mime, _)| mime)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
