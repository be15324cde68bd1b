//! 预览资源
//!
//! 每个条目独占一个预览句柄，删除条目时释放，且只能释放一次：
//! `PreviewHandle` 不可克隆，`release` 会消费句柄。

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 本地可解析的预览引用（`preview://<uuid>`）
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    key: Uuid,
}

impl PreviewHandle {
    pub fn uri(&self) -> String {
        format!("preview://{}", self.key)
    }
}

/// 预览资源登记表
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    entries: HashMap<Uuid, Arc<[u8]>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为源图片登记一个预览
    pub fn register(&mut self, bytes: Arc<[u8]>) -> PreviewHandle {
        let key = Uuid::new_v4();
        self.entries.insert(key, bytes);
        PreviewHandle { key }
    }

    /// 解析预览内容
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Arc<[u8]>> {
        self.entries.get(&handle.key).cloned()
    }

    /// 释放预览
    pub fn release(&mut self, handle: PreviewHandle) {
        if self.entries.remove(&handle.key).is_some() {
            debug!("已释放预览 {}", handle.uri());
        }
    }

    /// 尚未释放的预览数量
    pub fn live(&self) -> usize {
        self.entries.len()
    }
}
