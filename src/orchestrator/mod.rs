//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (一次 CLI 会话)
//!     ↓
//! workflow::WorkflowController (单个条目的状态迁移)
//!     ↓
//! services (能力层：gateway / prompt / encoding / auth)
//!     ↓
//! store (条目存储、预览资源)
//! ```
//!
//! 编排层只做调度、渲染和统计，不做具体业务判断。

pub mod app;

pub use app::{render_configuration_error, App, RunSummary};
