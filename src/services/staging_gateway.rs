//! 暂存网关 - 业务能力层
//!
//! 只负责"一张图 + 参数 → 一张暂存图"这一能力：
//! - 一次调用只发一次外部请求
//! - 调用之间不保留任何状态
//! - 不重试

use futures::future::BoxFuture;
use std::fmt;

use crate::error::StagingError;
use crate::models::{AspectRatio, ImageRef, RoomType, SourceImage, StagingStyle};
use crate::services::prompt::build_staging_prompt;

/// 请求类型：首次暂存或基于已有结果的优化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingMode {
    Stage,
    Refine,
}

impl fmt::Display for StagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingMode::Stage => write!(f, "stage"),
            StagingMode::Refine => write!(f, "refine"),
        }
    }
}

/// 单次暂存请求
#[derive(Debug, Clone)]
pub struct StagingRequest {
    pub image: SourceImage,
    pub style: StagingStyle,
    pub aspect_ratio: AspectRatio,
    pub room_type: RoomType,
    pub refinement_note: Option<String>,
    pub mode: StagingMode,
}

impl StagingRequest {
    /// 发送给生成服务的指令文本
    pub fn instruction(&self) -> String {
        build_staging_prompt(
            self.style,
            self.aspect_ratio,
            self.room_type,
            self.refinement_note.as_deref(),
        )
    }
}

/// 暂存网关
///
/// 实现方必须可以跨任务共享；控制器为每个条目的请求单独 spawn 任务。
pub trait StagingGateway: Send + Sync {
    fn stage(&self, request: StagingRequest) -> BoxFuture<'_, Result<ImageRef, StagingError>>;
}
