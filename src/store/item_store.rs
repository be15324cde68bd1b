//! 条目存储
//!
//! 按插入顺序保存所有条目，是界面渲染的唯一数据来源。
//! 所有修改都是同步的整块更新，不存在部分应用的补丁。

use std::sync::Arc;
use tracing::debug;

use crate::models::{Item, ItemId, ItemPatch, ItemStatus, RoomType, SourceImage};
use crate::store::preview::PreviewRegistry;

/// 条目存储
#[derive(Debug, Default)]
pub struct ItemStore {
    items: Vec<Item>,
    previews: PreviewRegistry,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新建一个 Idle 条目并追加到末尾
    pub fn add(&mut self, source: SourceImage) -> &Item {
        let preview = self.previews.register(source.bytes.clone());
        let item = Item {
            id: ItemId::new(),
            source,
            preview,
            staged_image: None,
            status: ItemStatus::Idle,
            last_error: None,
            room_type: RoomType::default(),
            refinement_note: String::new(),
        };
        debug!("[图片 {}] 已添加: {}", item.id.short(), item.source.file_name);

        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    /// 删除条目并释放其预览；未知 id 时什么也不做
    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(pos) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };

        let item = self.items.remove(pos);
        self.previews.release(item.preview);
        debug!("[图片 {}] 已删除", id.short());
        true
    }

    /// 对条目应用部分更新；未知 id 时什么也不做
    pub fn update(&mut self, id: ItemId, patch: ItemPatch) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                patch.apply_to(item);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// 按插入顺序的只读视图
    pub fn snapshot(&self) -> &[Item] {
        &self.items
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 解析条目的预览内容
    pub fn resolve_preview(&self, id: ItemId) -> Option<Arc<[u8]>> {
        self.get(id)
            .and_then(|item| self.previews.resolve(&item.preview))
    }

    /// 尚未释放的预览数量
    pub fn live_previews(&self) -> usize {
        self.previews.live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageRef;

    fn image(name: &str) -> SourceImage {
        SourceImage::new(name, vec![0u8; 4])
    }

    #[test]
    fn test_add_appends_idle_items() {
        let mut store = ItemStore::new();
        let a = store.add(image("a.png")).id;
        let b = store.add(image("b.png")).id;

        assert_eq!(store.ids(), vec![a, b]);
        for item in store.snapshot() {
            assert_eq!(item.status, ItemStatus::Idle);
            assert!(item.staged_image.is_none());
            assert!(item.last_error.is_none());
            assert_eq!(item.room_type, RoomType::Other);
            assert!(item.refinement_note.is_empty());
        }
        assert_eq!(store.live_previews(), 2);
    }

    #[test]
    fn test_remove_preserves_order_and_releases_preview() {
        let mut store = ItemStore::new();
        let ids: Vec<_> = (0..5)
            .map(|i| store.add(image(&format!("{}.png", i))).id)
            .collect();

        assert!(store.remove(ids[1]));
        assert!(store.remove(ids[3]));
        assert_eq!(store.ids(), vec![ids[0], ids[2], ids[4]]);
        assert_eq!(store.live_previews(), 3);
        assert!(store.resolve_preview(ids[1]).is_none());
        assert!(store.resolve_preview(ids[0]).is_some());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut store = ItemStore::new();
        let id = store.add(image("a.png")).id;
        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(!store.remove(ItemId::new()));
        assert_eq!(store.live_previews(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_interleaved_add_remove_matches_model() {
        let mut store = ItemStore::new();
        let mut expected: Vec<ItemId> = Vec::new();

        for round in 0..20 {
            let id = store.add(image("x.png")).id;
            expected.push(id);
            if round % 3 == 2 {
                let victim = expected.remove(round % expected.len());
                store.remove(victim);
            }
        }

        assert_eq!(store.ids(), expected);
        assert_eq!(store.live_previews(), expected.len());
    }

    #[test]
    fn test_update_applies_whole_patch() {
        let mut store = ItemStore::new();
        let id = store.add(image("a.png")).id;

        let patch = ItemPatch::default()
            .status(ItemStatus::Staging)
            .room_type(RoomType::Kitchen)
            .refinement_note("more plants");
        assert!(store.update(id, patch));

        let item = store.get(id).unwrap();
        assert_eq!(item.status, ItemStatus::Staging);
        assert_eq!(item.room_type, RoomType::Kitchen);
        assert_eq!(item.refinement_note, "more plants");

        let done = ItemPatch::default()
            .status(ItemStatus::Ready)
            .staged_image(ImageRef::from_base64("image/png", "AAAA"))
            .clear_error();
        store.update(id, done);
        assert!(store.get(id).unwrap().has_result());
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let mut store = ItemStore::new();
        assert!(!store.update(ItemId::new(), ItemPatch::default().status(ItemStatus::Ready)));
        assert!(store.is_empty());
    }
}
