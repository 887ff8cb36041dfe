//! recode-editor-sync: store synchronization for the recode editor.
//!
//! This crate provides:
//! - `TransformStore` - the host store interface and its record types
//! - `SynchronizationBridge` - pull on selection changes, push commits back
//! - `HeaderBinding` - name/description field commit and revert

pub mod bridge;
pub mod error;
pub mod header;
pub mod store;

pub use bridge::{HeaderText, SyncStatus, SynchronizationBridge};
pub use error::StoreError;
pub use header::{HeaderBinding, HeaderField, HeaderKeydown};
pub use store::{
    StoreEvent, TransformId, TransformRecord, TransformStore, TransformUpdate, TransformValues,
};

// Re-export the core for convenience.
pub use recode_editor_core;
