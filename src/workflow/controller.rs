//! 暂存流程控制器 - 流程层
//!
//! 核心职责：把用户操作转换为条目状态迁移
//!
//! 状态机：
//! 1. Idle / Ready / Failed → Staging：`stage_one`，清除 `last_error`
//! 2. Staging → Ready：网关成功，写入结果图
//! 3. Staging → Failed：网关失败，写入错误消息，保留之前的结果图
//!
//! 每个条目同一时刻最多只有一个网关请求。请求在独立任务中执行，
//! 结束后通过通道发回 `CompletionEvent`，由控制器在自己的线程里写回存储；
//! 条目已被删除时事件直接丢弃。

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::StagingError;
use crate::models::{
    AspectRatio, ImageRef, Item, ItemId, ItemPatch, ItemStatus, RoomType, SessionParams,
    SourceImage, StagingStyle,
};
use crate::services::{StagingGateway, StagingMode, StagingRequest};
use crate::store::ItemStore;

/// 网关调用结束后发回的事件
#[derive(Debug)]
pub struct CompletionEvent {
    pub id: ItemId,
    pub mode: StagingMode,
    pub outcome: Result<ImageRef, StagingError>,
}

/// `stage_one` 的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// 已发起请求
    Dispatched(StagingMode),
    /// 条目已在处理中，本次调用被忽略
    AlreadyStaging,
    /// 条目不存在
    NotFound,
}

/// 暂存流程控制器
///
/// - 独占条目存储，所有修改都在调用方所在的线程完成
/// - 持有网关句柄，整个会话只构建一次
/// - 不关心渲染
pub struct WorkflowController {
    store: ItemStore,
    gateway: Arc<dyn StagingGateway>,
    session: SessionParams,
    default_room_type: RoomType,
    events_tx: mpsc::UnboundedSender<CompletionEvent>,
    events_rx: mpsc::UnboundedReceiver<CompletionEvent>,
    /// 已发出但尚未收到完成事件的请求数
    in_flight: usize,
}

impl WorkflowController {
    /// 创建新的控制器
    pub fn new(gateway: Arc<dyn StagingGateway>, session: SessionParams) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store: ItemStore::new(),
            gateway,
            session,
            default_room_type: RoomType::default(),
            events_tx,
            events_rx,
            in_flight: 0,
        }
    }

    /// 设置新上传条目的默认房间类型
    pub fn with_default_room_type(mut self, room_type: RoomType) -> Self {
        self.default_room_type = room_type;
        self
    }

    // ========== 用户操作 ==========

    /// 上传文件：每个文件创建一个条目，不会自动发起暂存
    pub fn ingest_upload(&mut self, files: impl IntoIterator<Item = SourceImage>) -> Vec<ItemId> {
        let mut ids = Vec::new();
        for file in files {
            let id = self.store.add(file).id;
            self.store.update(
                id,
                ItemPatch::default()
                    .room_type(self.default_room_type)
                    .refinement_note(""),
            );
            ids.push(id);
        }
        info!("📥 新增 {} 张图片，共 {} 张", ids.len(), self.store.len());
        ids
    }

    pub fn set_room_type(&mut self, id: ItemId, room_type: RoomType) -> bool {
        self.store
            .update(id, ItemPatch::default().room_type(room_type))
    }

    pub fn set_refinement_note(&mut self, id: ItemId, text: impl Into<String>) -> bool {
        self.store
            .update(id, ItemPatch::default().refinement_note(text))
    }

    pub fn set_style(&mut self, style: StagingStyle) {
        self.session.style = style;
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.session.aspect_ratio = aspect_ratio;
    }

    /// 对单个条目发起暂存（已有结果时为优化）
    pub fn stage_one(&mut self, id: ItemId) -> StageOutcome {
        let Some(item) = self.store.get(id) else {
            debug!("[图片 {}] 条目不存在，忽略暂存请求", id.short());
            return StageOutcome::NotFound;
        };

        if item.is_staging() {
            debug!("[图片 {}] 正在处理中，忽略重复请求", id.short());
            return StageOutcome::AlreadyStaging;
        }

        debug_assert!(item.status.can_transition_to(ItemStatus::Staging));

        let mode = if item.has_result() {
            StagingMode::Refine
        } else {
            StagingMode::Stage
        };

        let request = StagingRequest {
            image: item.source.clone(),
            style: self.session.style,
            aspect_ratio: self.session.aspect_ratio,
            room_type: item.room_type,
            refinement_note: Some(item.refinement_note.clone()).filter(|note| !note.is_empty()),
            mode,
        };

        match mode {
            StagingMode::Stage => info!(
                "[图片 {}] 🎨 开始暂存: {} ({}, {}, {})",
                id.short(),
                item.source.file_name,
                request.style,
                request.aspect_ratio,
                request.room_type
            ),
            StagingMode::Refine => info!(
                "[图片 {}] 🔁 开始优化: {} (反馈: {:?})",
                id.short(),
                item.source.file_name,
                request.refinement_note
            ),
        }

        self.store.update(
            id,
            ItemPatch::default()
                .status(ItemStatus::Staging)
                .clear_error(),
        );

        self.dispatch(id, request);
        StageOutcome::Dispatched(mode)
    }

    /// 对所有未在处理中、且还没有结果的条目发起暂存
    ///
    /// 每个条目独立执行，一个失败不影响其他条目。
    pub fn stage_all(&mut self) -> usize {
        let pending: Vec<ItemId> = self
            .store
            .snapshot()
            .iter()
            .filter(|item| !item.is_staging() && !item.has_result())
            .map(|item| item.id)
            .collect();

        let dispatched = pending
            .into_iter()
            .filter(|id| matches!(self.stage_one(*id), StageOutcome::Dispatched(_)))
            .count();

        info!("🚀 批量暂存: 发起 {} 个请求", dispatched);
        dispatched
    }

    /// 删除条目；进行中的请求结果到达后会被丢弃
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let was_staging = self.store.get(id).is_some_and(Item::is_staging);
        let removed = self.store.remove(id);
        if removed && was_staging {
            debug!("[图片 {}] 删除时仍有请求在进行", id.short());
        }
        removed
    }

    // ========== 完成事件 ==========

    /// 在独立任务中调用网关，结束后发送完成事件
    fn dispatch(&mut self, id: ItemId, request: StagingRequest) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.events_tx.clone();
        let mode = request.mode;
        self.in_flight += 1;

        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(gateway.stage(request)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!("[图片 {}] 网关任务 panic", id.short());
                    Err(StagingError::upstream("staging task panicked"))
                }
            };

            // 接收端只会随控制器一起销毁，此时结果已无处可写
            let _ = tx.send(CompletionEvent { id, mode, outcome });
        });
    }

    /// 将完成事件写回存储
    ///
    /// 条目已删除或不在 Staging 时丢弃事件，返回 `false`。
    pub fn apply_completion(&mut self, event: CompletionEvent) -> bool {
        let CompletionEvent { id, mode, outcome } = event;

        let Some(item) = self.store.get(id) else {
            debug!("[图片 {}] 条目已删除，丢弃 {} 结果", id.short(), mode);
            return false;
        };

        if !item.is_staging() {
            warn!(
                "[图片 {}] 状态为 {}，丢弃过期的 {} 结果",
                id.short(),
                item.status,
                mode
            );
            return false;
        }

        let patch = match outcome {
            Ok(image) => {
                info!("[图片 {}] ✓ {} 完成", id.short(), mode);
                ItemPatch::default()
                    .status(ItemStatus::Ready)
                    .staged_image(image)
                    .clear_error()
            }
            Err(e) => {
                warn!("[图片 {}] ❌ {} 失败 ({}): {}", id.short(), mode, e.kind(), e);
                ItemPatch::default()
                    .status(ItemStatus::Failed)
                    .error(e.to_string())
            }
        };

        self.store.update(id, patch)
    }

    /// 等待下一个完成事件；没有进行中的请求时返回 `None`
    pub async fn next_completion(&mut self) -> Option<CompletionEvent> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.in_flight -= 1;
        Some(event)
    }

    /// 处理完所有进行中的请求，返回实际写回的结果数
    pub async fn run_until_idle(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.next_completion().await {
            if self.apply_completion(event) {
                applied += 1;
            }
        }
        applied
    }

    // ========== 查询 ==========

    pub fn snapshot(&self) -> &[Item] {
        self.store.snapshot()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.store.get(id)
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn session(&self) -> SessionParams {
        self.session
    }

    /// 已发出但尚未收到完成事件的请求数
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_any_staging(&self) -> bool {
        self.store.snapshot().iter().any(Item::is_staging)
    }
}
