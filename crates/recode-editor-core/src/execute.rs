//! Action execution for edit sessions.
//!
//! `execute_action` is the single entry point a host can route all of its
//! events through instead of calling the session methods one by one.

use crate::actions::{ChainAction, KeydownResult};
use crate::operator::OperatorMatch;
use crate::services::{CaptureSurface, FocusSuspension, OperatorPopup};
use crate::session::EditSessionController;

/// What the host should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action changed session state.
    Applied,
    /// The action did not apply in the current state.
    Ignored,
    /// Result of a key press.
    Key(KeydownResult),
    /// Operator detection for typed condition text.
    Detected(OperatorMatch),
    /// A clause was inserted at this index.
    ClauseInserted(usize),
    /// The popup opened; select this many characters of the condition.
    SelectOperator(usize),
    /// The condition text after picking an operator.
    ConditionRewritten(String),
}

fn applied(done: bool) -> ActionOutcome {
    if done {
        ActionOutcome::Applied
    } else {
        ActionOutcome::Ignored
    }
}

/// Execute an action on a session.
pub fn execute_action<F, C, P>(
    session: &mut EditSessionController<F, C, P>,
    action: &ChainAction,
) -> ActionOutcome
where
    F: FocusSuspension,
    C: CaptureSurface,
    P: OperatorPopup,
{
    match action {
        ChainAction::FocusGained { slot } => applied(session.focus_gained(*slot)),
        ChainAction::FocusLost { slot, text } => applied(session.focus_lost(*slot, text)),
        ChainAction::FocusTransferred { target } => {
            session.focus_transferred_to(*target);
            ActionOutcome::Applied
        }
        ChainAction::PopupClosed => {
            session.popup_closed();
            ActionOutcome::Applied
        }
        ChainAction::TextInput { slot, text } => session
            .text_input(*slot, text)
            .map(ActionOutcome::Detected)
            .unwrap_or(ActionOutcome::Ignored),
        ChainAction::KeyDown {
            key,
            modifiers,
            text,
        } => ActionOutcome::Key(session.keydown(key, *modifiers, text.as_deref())),
        ChainAction::InsertClause => ActionOutcome::ClauseInserted(session.insert_clause()),
        ChainAction::RemoveClause { clause } => applied(session.remove_clause(*clause)),
        ChainAction::OpenOperatorPopup { clause } => session
            .open_operator_popup(*clause)
            .map(ActionOutcome::SelectOperator)
            .unwrap_or(ActionOutcome::Ignored),
        ChainAction::ApplyOperator { clause, op } => session
            .apply_operator(*clause, *op)
            .map(ActionOutcome::ConditionRewritten)
            .unwrap_or(ActionOutcome::Ignored),
        ChainAction::CaptureResolved { outcome } => applied(session.capture_resolved(*outcome)),
    }
}
