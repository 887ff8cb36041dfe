//! Edit session state machine for a formula chain.
//!
//! The session tracks which field has focus and when typed text becomes part
//! of the chain. The first field focus of a burst puts the whole chain into a
//! focused super-state: a snapshot is taken for Escape, global shortcuts are
//! paused and the outside-click capture surface is shown. The super-state
//! ends on Enter, on Escape, or when the capture surface resolves. Every exit
//! path releases both services and schedules a write of the chain.
//!
//! ```text
//! Idle ──focus──▶ Editing(slot) ──blur / Enter──▶ Idle
//!   ╰──────── chain focused until Enter, Escape or outside click ────────╯
//! ```

use crate::actions::{Key, KeydownResult, Modifiers};
use crate::chain::{FormulaChain, Slot};
use crate::config::EditorConfig;
use crate::error::ChainError;
use crate::operator::{OperatorMatch, RelOp, detect_operator, replace_operator};
use crate::placeholder::PlaceholderExamples;
use crate::schedule::CoalescingQueue;
use crate::services::{
    CaptureOutcome, CaptureSurface, ChainFocusLease, FocusSuspension, FocusTarget, OperatorPopup,
    Services,
};
use crate::view::{ClauseView, build_views};

/// Field-level focus state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No field is focused.
    #[default]
    Idle,
    /// One field holds focus.
    Editing(Slot),
}

/// Why a chain write was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyReason {
    /// The chain was mutated.
    Mutation,
    /// The chain lost focus.
    SessionClosed(CaptureOutcome),
}

struct ChainFocus {
    undo_snapshot: FormulaChain,
    lease: ChainFocusLease,
}

/// Drives one chain editor.
pub struct EditSessionController<F, C, P>
where
    F: FocusSuspension,
    C: CaptureSurface,
    P: OperatorPopup,
{
    chain: FormulaChain,
    state: SessionState,
    chain_focus: Option<ChainFocus>,
    /// Field whose next blur must not commit (set by Escape).
    suppressed_blur: Option<Slot>,
    /// Clause whose condition handed focus to the operator popup.
    handoff: Option<usize>,
    /// Clause the operator popup is anchored at.
    popup_anchor: Option<usize>,
    /// Clause whose operator affordance is shown.
    affordance: Option<usize>,
    /// Placeholder text, aligned with the chain's flat entries.
    placeholders: Vec<String>,
    examples: PlaceholderExamples,
    apply: CoalescingQueue<ApplyReason>,
    services: Services<F, C, P>,
    config: EditorConfig,
}

impl<F, C, P> EditSessionController<F, C, P>
where
    F: FocusSuspension,
    C: CaptureSurface,
    P: OperatorPopup,
{
    /// Start with a chain holding only an empty default value.
    pub fn new(services: Services<F, C, P>, config: EditorConfig) -> Self {
        let examples = config
            .placeholder_seed
            .map(PlaceholderExamples::seeded)
            .unwrap_or_default();
        let mut session = Self {
            chain: FormulaChain::default(),
            state: SessionState::Idle,
            chain_focus: None,
            suppressed_blur: None,
            handoff: None,
            popup_anchor: None,
            affordance: None,
            placeholders: Vec::new(),
            examples,
            apply: CoalescingQueue::new(),
            services,
            config,
        };
        session.regenerate_placeholders();
        session
    }

    // === Accessors ===

    pub fn chain(&self) -> &FormulaChain {
        &self.chain
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_chain_focused(&self) -> bool {
        self.chain_focus.is_some()
    }

    /// Chain as it was when the chain gained focus.
    pub fn undo_snapshot(&self) -> Option<&FormulaChain> {
        self.chain_focus.as_ref().map(|focus| &focus.undo_snapshot)
    }

    /// Clause whose operator affordance is currently shown.
    pub fn visible_affordance(&self) -> Option<usize> {
        self.affordance
    }

    pub fn placeholder(&self, slot: Slot) -> Option<&str> {
        self.chain.text(slot)?;
        self.placeholders
            .get(slot.flat_index(self.chain.clause_count()))
            .map(String::as_str)
    }

    pub fn services(&self) -> &Services<F, C, P> {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Services<F, C, P> {
        &mut self.services
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn has_pending_apply(&self) -> bool {
        self.apply.is_pending()
    }

    /// One row per clause plus the default row.
    pub fn clauses(&self) -> Vec<ClauseView> {
        build_views(&self.chain, &self.placeholders, self.affordance)
    }

    // === Rebuilding ===

    /// Replace the chain wholesale, discarding field-level UI state.
    ///
    /// A focused chain keeps its focus, but its undo snapshot moves to the
    /// new chain so Escape cannot restore a different transform's rule.
    pub fn replace_chain(&mut self, chain: FormulaChain) {
        self.rebuild(chain);
        self.reset_snapshot();
    }

    /// Reconcile with the store's copy of the transform being edited,
    /// rebuilding only when it differs.
    ///
    /// The undo snapshot is kept, so Escape still restores the chain as it
    /// was before focus even after the store normalized a write. A malformed
    /// chain is replaced by one holding an empty default value. Returns
    /// whether the clause list was rebuilt.
    pub fn load_flat(&mut self, flat: &[String]) -> bool {
        let incoming = decode_or_default(flat);
        if incoming == self.chain {
            return false;
        }
        self.rebuild(incoming);
        true
    }

    /// Load a different transform's chain.
    ///
    /// Like [`load_flat`](Self::load_flat), but a focused chain's undo
    /// snapshot moves to the loaded chain.
    pub fn switch_flat(&mut self, flat: &[String]) -> bool {
        let rebuilt = self.load_flat(flat);
        self.reset_snapshot();
        rebuilt
    }

    fn rebuild(&mut self, chain: FormulaChain) {
        tracing::debug!(len = chain.len(), "Rebuilding clause list");
        self.chain = chain;
        self.regenerate_placeholders();
        self.state = SessionState::Idle;
        self.suppressed_blur = None;
        self.handoff = None;
        self.affordance = None;
        self.close_popup();
    }

    fn reset_snapshot(&mut self) {
        if let Some(focus) = self.chain_focus.as_mut() {
            focus.undo_snapshot = self.chain.clone();
        }
    }

    // === Focus ===

    /// A field gained focus.
    pub fn focus_gained(&mut self, slot: Slot) -> bool {
        if self.chain.text(slot).is_none() {
            tracing::warn!(?slot, "Focus on a field outside the chain");
            return false;
        }

        self.enter_chain_focus();

        if let SessionState::Editing(previous) = self.state {
            if previous != slot {
                tracing::debug!(?previous, ?slot, "Focus moved without a blur");
            }
        }

        self.handoff = None;
        self.suppressed_blur = None;
        self.state = SessionState::Editing(slot);
        if slot.has_operator() {
            self.affordance = slot.clause();
        }
        true
    }

    /// A field lost focus while holding `text`.
    ///
    /// Writes `text` into the chain unless Escape suppressed this blur.
    /// Returns whether the text was committed.
    pub fn focus_lost(&mut self, slot: Slot, text: &str) -> bool {
        if self.suppressed_blur == Some(slot) {
            self.suppressed_blur = None;
            if self.state == SessionState::Editing(slot) {
                self.state = SessionState::Idle;
            }
            tracing::debug!(?slot, "Commit suppressed after revert");
            return false;
        }

        if self.state != SessionState::Editing(slot) {
            tracing::debug!(?slot, state = ?self.state, "Ignoring blur from an unfocused field");
            return false;
        }

        self.commit_text(slot, text);

        if slot.has_operator() && self.handoff.is_some() && self.handoff == slot.clause() {
            tracing::debug!(?slot, "Focus handed to operator popup");
            return true;
        }

        self.end_editing(slot);
        true
    }

    /// Record that focus is about to move to a cooperating surface.
    ///
    /// The following blur of the matching condition keeps the field in
    /// `Editing` instead of ending the edit.
    pub fn focus_transferred_to(&mut self, target: FocusTarget) {
        match target {
            FocusTarget::OperatorPopup { clause } => {
                tracing::debug!(clause, "Focus transfer to operator popup");
                self.handoff = Some(clause);
            }
        }
    }

    /// The operator popup closed.
    ///
    /// If the condition did not take focus back, the hand-off ends like an
    /// ordinary blur.
    pub fn popup_closed(&mut self) {
        self.close_popup();
        if let Some(clause) = self.handoff.take() {
            let slot = Slot::Condition(clause);
            if self.state == SessionState::Editing(slot) {
                self.end_editing(slot);
            }
        }
    }

    // === Input ===

    /// The text of a field changed. Returns the operator match for condition
    /// fields; the caller applies `rewritten` and sizes the affordance.
    ///
    /// Typed text only becomes part of the chain on blur.
    pub fn text_input(&mut self, slot: Slot, text: &str) -> Option<OperatorMatch> {
        if !slot.has_operator() {
            return None;
        }
        let detected = detect_operator(text, self.placeholder(slot).unwrap_or_default());
        self.services.popup.update_position();
        Some(detected)
    }

    /// Handle a key press. `text` is the focused field's current text.
    pub fn keydown(&mut self, key: &Key, modifiers: Modifiers, text: Option<&str>) -> KeydownResult {
        match key {
            Key::Tab if self.state != SessionState::Idle => KeydownResult::Handled,
            Key::Enter if !modifiers.shift => self.commit_and_close(text),
            Key::Escape if self.chain_focus.is_some() => {
                self.revert();
                KeydownResult::Blur
            }
            _ => KeydownResult::NotHandled,
        }
    }

    fn commit_and_close(&mut self, text: Option<&str>) -> KeydownResult {
        let editing = match self.state {
            SessionState::Editing(slot) => {
                self.handoff = None;
                if let Some(text) = text {
                    self.focus_lost(slot, text);
                }
                true
            }
            SessionState::Idle => false,
        };
        let closed = self.close_chain_focus(CaptureOutcome::Confirmed, true);
        match (editing, closed) {
            (true, _) => KeydownResult::Blur,
            (false, true) => KeydownResult::Handled,
            (false, false) => KeydownResult::NotHandled,
        }
    }

    // === Structure ===

    /// Add an empty clause just before the default value. Returns its index.
    pub fn insert_clause(&mut self) -> usize {
        self.enter_chain_focus();
        let clause = self.chain.insert_clause_before_default();
        let at = clause * 2;
        let condition = self.examples.condition();
        let value = self.examples.value();
        let at = at.min(self.placeholders.len());
        self.placeholders.splice(at..at, [condition, value]);
        tracing::debug!(clause, "Inserted clause");
        self.schedule_apply();
        clause
    }

    /// Remove clause `clause`. Labels of the remaining rows follow from the
    /// new chain length.
    pub fn remove_clause(&mut self, clause: usize) -> bool {
        let count = self.chain.clause_count();
        if clause >= count {
            self.contract_violation(ChainError::IndexOutOfRange {
                index: clause,
                len: count,
            });
            return false;
        }
        self.enter_chain_focus();
        if let Err(err) = self.chain.remove_clause_at(clause) {
            self.contract_violation(err);
            return false;
        }

        let start = clause * 2;
        if start + 2 <= self.placeholders.len() {
            self.placeholders.drain(start..start + 2);
        } else {
            self.regenerate_placeholders();
        }

        self.affordance = shift_after_removal(self.affordance, clause);
        self.handoff = shift_after_removal(self.handoff, clause);
        if self.popup_anchor == Some(clause) {
            self.close_popup();
        }
        self.popup_anchor = shift_after_removal(self.popup_anchor, clause);
        self.suppressed_blur = self
            .suppressed_blur
            .and_then(|slot| shift_slot_after_removal(slot, clause));
        self.state = match self.state {
            SessionState::Editing(slot) => shift_slot_after_removal(slot, clause)
                .map(SessionState::Editing)
                .unwrap_or(SessionState::Idle),
            SessionState::Idle => SessionState::Idle,
        };

        tracing::debug!(clause, remaining = self.chain.clause_count(), "Removed clause");
        self.schedule_apply();
        true
    }

    // === Operators ===

    /// Open the operator popup for the condition of `clause`.
    ///
    /// Returns the length of the operator prefix the host should select, or
    /// `None` when the affordance is not shown or the popup is already open
    /// for this clause.
    pub fn open_operator_popup(&mut self, clause: usize) -> Option<usize> {
        if self.affordance != Some(clause) || self.popup_anchor == Some(clause) {
            return None;
        }
        let slot = Slot::Condition(clause);
        let text = self.chain.text(slot)?;
        let len = detect_operator(text, self.placeholder(slot).unwrap_or_default()).len();
        self.services.popup.show(clause, false);
        self.popup_anchor = Some(clause);
        Some(len)
    }

    /// Replace the operator of clause `clause`'s condition with `op`.
    /// Returns the new condition text.
    pub fn apply_operator(&mut self, clause: usize, op: RelOp) -> Option<String> {
        let slot = Slot::Condition(clause);
        let Some(current) = self.chain.text(slot) else {
            tracing::warn!(clause, "Operator picked for a missing clause");
            return None;
        };
        let text = replace_operator(current, op);
        self.commit_text(slot, &text);
        Some(text)
    }

    // === Capture surface ===

    /// The outside-click capture surface resolved on its own.
    ///
    /// Only the first resolution of a chain focus counts; later ones (for
    /// example after Enter or Escape already closed the surface) are ignored.
    pub fn capture_resolved(&mut self, outcome: CaptureOutcome) -> bool {
        if !self.close_chain_focus(outcome, false) {
            tracing::debug!(?outcome, "Capture surface already released");
            return false;
        }
        true
    }

    // === Apply ===

    /// Take the pending chain write, if one is due.
    ///
    /// The host calls this once per turn of its event loop. The returned
    /// flat chain is the state at the time of the call, so every mutation
    /// and revert made during the turn is reflected in a single write.
    pub fn take_due_apply(&mut self) -> Option<Vec<String>> {
        let reason = self.apply.take_due()?;
        tracing::debug!(?reason, len = self.chain.len(), "Applying chain");
        Some(self.chain.encode())
    }

    // === Internals ===

    fn enter_chain_focus(&mut self) {
        if self.chain_focus.is_some() {
            return;
        }
        let lease = ChainFocusLease::acquire(
            &mut self.services.focus,
            &mut self.services.capture,
            &self.config.capture_key,
            &self.config.shortcut_context,
            self.config.capture_options(),
        );
        self.chain_focus = Some(ChainFocus {
            undo_snapshot: self.chain.clone(),
            lease,
        });
        tracing::debug!(len = self.chain.len(), "Chain focused");
    }

    /// Leave the focused super-state. Shared by Enter, Escape and capture
    /// resolution. Returns false when the chain was not focused.
    fn close_chain_focus(&mut self, outcome: CaptureOutcome, surface_open: bool) -> bool {
        let Some(focus) = self.chain_focus.take() else {
            return false;
        };
        focus
            .lease
            .release(&mut self.services.focus, &mut self.services.capture, surface_open);
        self.apply.schedule(ApplyReason::SessionClosed(outcome));
        tracing::debug!(?outcome, "Chain focus released");
        true
    }

    /// Restore the snapshot taken when the chain gained focus.
    fn revert(&mut self) {
        let Some(snapshot) = self.undo_snapshot().cloned() else {
            return;
        };
        // A field that handed focus to the popup has already blurred.
        if let (SessionState::Editing(slot), None) = (self.state, self.handoff) {
            self.suppressed_blur = Some(slot);
        }
        self.state = SessionState::Idle;
        self.handoff = None;
        self.affordance = None;
        self.close_popup();

        let relayout = snapshot.len() != self.chain.len();
        self.chain = snapshot;
        if relayout {
            self.regenerate_placeholders();
        }
        tracing::debug!(len = self.chain.len(), "Reverted chain to snapshot");
        self.close_chain_focus(CaptureOutcome::Cancelled, true);
    }

    fn end_editing(&mut self, slot: Slot) {
        self.state = SessionState::Idle;
        if slot.has_operator() && self.affordance == slot.clause() {
            self.affordance = None;
        }
        if self.popup_anchor.is_some() && self.popup_anchor == slot.clause() {
            self.close_popup();
        }
    }

    fn commit_text(&mut self, slot: Slot, text: &str) -> bool {
        let flat_index = slot.flat_index(self.chain.clause_count());
        match self.chain.update_text(flat_index, text) {
            Ok(true) => {
                tracing::debug!(flat_index, "Committed field text");
                self.schedule_apply();
                true
            }
            Ok(false) => false,
            Err(err) => {
                self.contract_violation(err);
                false
            }
        }
    }

    fn schedule_apply(&mut self) {
        self.apply.schedule(ApplyReason::Mutation);
    }

    fn close_popup(&mut self) {
        if self.popup_anchor.take().is_some() {
            self.services.popup.hide();
        }
    }

    fn regenerate_placeholders(&mut self) {
        let len = self.chain.len();
        self.placeholders.clear();
        for index in 0..len {
            let text = match Slot::from_flat_index(index, len) {
                Some(slot) if slot.has_operator() => self.examples.condition(),
                _ => self.examples.value(),
            };
            self.placeholders.push(text);
        }
    }

    fn contract_violation(&self, err: ChainError) {
        tracing::error!(%err, "Chain operation out of range");
        if cfg!(debug_assertions) {
            panic!("chain contract violated: {err}");
        }
    }
}

impl<F, C, P> Drop for EditSessionController<F, C, P>
where
    F: FocusSuspension,
    C: CaptureSurface,
    P: OperatorPopup,
{
    fn drop(&mut self) {
        if let Some(focus) = self.chain_focus.take() {
            focus
                .lease
                .release(&mut self.services.focus, &mut self.services.capture, true);
        }
    }
}

fn decode_or_default(flat: &[String]) -> FormulaChain {
    FormulaChain::decode(flat.iter().cloned()).unwrap_or_else(|err| {
        tracing::warn!(%err, "Falling back to an empty default value");
        FormulaChain::default()
    })
}

fn shift_after_removal(clause: Option<usize>, removed: usize) -> Option<usize> {
    match clause {
        Some(c) if c == removed => None,
        Some(c) if c > removed => Some(c - 1),
        other => other,
    }
}

fn shift_slot_after_removal(slot: Slot, removed: usize) -> Option<Slot> {
    match slot {
        Slot::Condition(c) => shift_after_removal(Some(c), removed).map(Slot::Condition),
        Slot::Value(c) => shift_after_removal(Some(c), removed).map(Slot::Value),
        Slot::Default => Some(Slot::Default),
    }
}
