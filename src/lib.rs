//! # Virtual Stager
//!
//! 上传空房间照片，选择风格、宽高比和房间类型，调用生成式图片服务
//! 为照片添加家具和装饰（"暂存"），并可根据反馈反复优化。
//!
//! ## 架构设计
//!
//! ### ① 存储层（Store）
//! - `store/` - 按插入顺序持有所有条目，是渲染的唯一数据来源
//! - `PreviewRegistry` - 每个条目独占一个预览资源，删除时释放
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，一次只处理一张图
//! - `StagingGateway` - 一张图 + 参数 → 一张暂存图
//! - `GeminiGateway` - 基于 HTTP 的网关实现
//! - `SupabaseAuth` - 邮箱密码登录 / 注册
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张图"的状态迁移
//! - `WorkflowController` - 上传、删除、暂存、批量暂存、完成事件写回
//! - `AuthForm` - 认证表单
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 启动检查、认证、一次完整的 CLI 会话

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, AuthError, ConfigError, StagingError};
pub use models::{AspectRatio, ImageRef, Item, ItemId, ItemStatus, RoomType, SourceImage, StagingStyle};
pub use orchestrator::App;
pub use services::{GeminiGateway, StagingGateway, StagingMode, StagingRequest};
pub use store::ItemStore;
pub use workflow::{StageOutcome, WorkflowController};
