//! 条目数据模型：一张上传的照片及其暂存进度

use std::fmt;
use uuid::Uuid;

use crate::models::image::{ImageRef, SourceImage};
use crate::models::options::RoomType;
use crate::store::PreviewHandle;

/// 条目唯一标识，会话内不会复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        ItemId(Uuid::new_v4())
    }

    /// 日志前缀用的短 id
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// 条目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemStatus {
    #[default]
    Idle,
    Staging,
    Ready,
    Failed,
}

impl ItemStatus {
    /// 状态机允许的迁移
    ///
    /// Idle/Ready/Failed → Staging，Staging → Ready/Failed，其余都不合法。
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (Idle, Staging) | (Ready, Staging) | (Failed, Staging) | (Staging, Ready) | (Staging, Failed)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Idle => "待处理",
            ItemStatus::Staging => "处理中",
            ItemStatus::Ready => "已完成",
            ItemStatus::Failed => "失败",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 一张上传照片及其暂存状态
#[derive(Debug)]
pub struct Item {
    pub id: ItemId,
    pub source: SourceImage,
    pub preview: PreviewHandle,
    /// 最近一次成功的暂存结果；失败不会清除它
    pub staged_image: Option<ImageRef>,
    pub status: ItemStatus,
    /// 仅在 Failed 时存在
    pub last_error: Option<String>,
    pub room_type: RoomType,
    /// 用户反馈，会随后续每次暂存请求一起发送，不会自动清空
    pub refinement_note: String,
}

impl Item {
    pub fn is_staging(&self) -> bool {
        self.status == ItemStatus::Staging
    }

    pub fn has_result(&self) -> bool {
        self.staged_image.is_some()
    }
}

/// 条目的部分字段更新
///
/// `last_error` 为 `Some(None)` 时表示清除错误。
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub status: Option<ItemStatus>,
    pub staged_image: Option<ImageRef>,
    pub last_error: Option<Option<String>>,
    pub room_type: Option<RoomType>,
    pub refinement_note: Option<String>,
}

impl ItemPatch {
    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn staged_image(mut self, image: ImageRef) -> Self {
        self.staged_image = Some(image);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(Some(message.into()));
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.last_error = Some(None);
        self
    }

    pub fn room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = Some(room_type);
        self
    }

    pub fn refinement_note(mut self, note: impl Into<String>) -> Self {
        self.refinement_note = Some(note.into());
        self
    }

    /// 一次性应用到条目上
    pub(crate) fn apply_to(self, item: &mut Item) {
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(image) = self.staged_image {
            item.staged_image = Some(image);
        }
        if let Some(error) = self.last_error {
            item.last_error = error;
        }
        if let Some(room_type) = self.room_type {
            item.room_type = room_type;
        }
        if let Some(note) = self.refinement_note {
            item.refinement_note = note;
        }
    }
}
