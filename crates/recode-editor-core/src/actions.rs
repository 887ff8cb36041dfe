//! Editor actions and input types.
//!
//! Platform-agnostic definitions for chain editing operations. `ChainAction`
//! represents the semantic events a host forwards to the session (focus
//! changes, typed text, key presses, button clicks), independent of how the
//! host receives them.

use smol_str::SmolStr;

use crate::chain::Slot;
use crate::operator::RelOp;
use crate::services::{CaptureOutcome, FocusTarget};

/// Key values for keyboard input.
///
/// Platform-specific code converts from native key events to this enum.
/// Only the keys the chain editor reacts to are named.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    Enter,
    Tab,
    Escape,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }
}

/// Modifier key state for a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was handled and the focused field should give up focus.
    Blur,
    /// Event was not for the editor, let the platform handle it.
    NotHandled,
}

impl KeydownResult {
    pub fn prevents_default(&self) -> bool {
        !matches!(self, Self::NotHandled)
    }
}

/// All events a host can forward to the edit session.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainAction {
    // === Focus ===
    /// A clause field gained focus.
    FocusGained { slot: Slot },

    /// A clause field lost focus while holding `text`.
    FocusLost { slot: Slot, text: String },

    /// A clause field handed focus to a cooperating surface.
    FocusTransferred { target: FocusTarget },

    /// The operator popup closed.
    PopupClosed,

    // === Input ===
    /// The text of a clause field changed.
    TextInput { slot: Slot, text: String },

    /// A key was pressed while the chain editor had focus.
    KeyDown {
        key: Key,
        modifiers: Modifiers,
        /// Current text of the focused field, if one is focused.
        text: Option<String>,
    },

    // === Structure ===
    /// Append a condition/value pair before the default value.
    InsertClause,

    /// Remove a conditional clause.
    RemoveClause { clause: usize },

    // === Operators ===
    /// Open the operator popup for a clause's condition.
    OpenOperatorPopup { clause: usize },

    /// An operator was picked from the popup.
    ApplyOperator { clause: usize, op: RelOp },

    // === Capture surface ===
    /// The outside-click capture surface resolved.
    CaptureResolved { outcome: CaptureOutcome },
}
