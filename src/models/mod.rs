pub mod image;
pub mod item;
pub mod options;

pub use image::{ImageRef, SourceImage};
pub use item::{Item, ItemId, ItemPatch, ItemStatus};
pub use options::{AspectRatio, RoomType, StagingStyle, UnknownOption};

/// 会话级参数，对之后发起的所有暂存请求生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionParams {
    pub style: StagingStyle,
    pub aspect_ratio: AspectRatio,
}
