pub mod item_store;
pub mod preview;

pub use item_store::ItemStore;
pub use preview::{PreviewHandle, PreviewRegistry};
