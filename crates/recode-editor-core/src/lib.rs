//! recode-editor-core: Pure Rust logic for the conditional recode editor.
//!
//! This crate provides:
//! - `FormulaChain` - flat if / else-if / else rule with derived labels
//! - Operator prefix detection and normalisation for condition text
//! - `EditSessionController` - focus, commit and revert state machine
//! - `CoalescingQueue` - next-turn coalescing of chain writes
//! - Host service traits (shortcut suspension, capture surface, operator popup)

pub mod actions;
pub mod chain;
pub mod config;
pub mod error;
pub mod execute;
pub mod operator;
pub mod placeholder;
pub mod schedule;
pub mod services;
pub mod session;
pub mod view;

pub use actions::{ChainAction, Key, KeydownResult, Modifiers};
pub use chain::{Clause, ClauseLabel, FormulaChain, Slot, VALUE_PREFIX};
pub use config::EditorConfig;
pub use error::ChainError;
pub use execute::{ActionOutcome, execute_action};
pub use operator::{OperatorMatch, RelOp, detect_operator, replace_operator};
pub use placeholder::PlaceholderExamples;
pub use schedule::{CoalescingQueue, TaskHandle};
pub use services::{
    CaptureOptions, CaptureOutcome, CaptureSurface, FocusSuspension, FocusTarget, OperatorPopup,
    Services,
};
pub use session::{ApplyReason, EditSessionController, SessionState};
pub use smol_str::SmolStr;
pub use view::{Affordance, ClauseView, FieldView};
