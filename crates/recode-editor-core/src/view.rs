//! Render-ready view of a chain.
//!
//! The rendering layer draws one row per clause plus a final row for the
//! default value. Everything here is derived; nothing feeds back into the
//! chain.

use crate::chain::{ClauseLabel, FormulaChain, Slot, VALUE_PREFIX};
use crate::operator::detect_operator;

/// One editable field in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub slot: Slot,
    pub text: String,
    pub placeholder: String,
    /// Text drawn in front of the field.
    pub prefix: &'static str,
    /// Indent, in character cells, that keeps typed text clear of the prefix.
    pub indent_cells: usize,
}

impl FieldView {
    fn new(slot: Slot, text: &str, placeholder: &str, prefix: &'static str) -> Self {
        Self {
            slot,
            text: text.to_owned(),
            placeholder: placeholder.to_owned(),
            prefix,
            indent_cells: prefix.len() + 1,
        }
    }
}

/// Operator affordance on a condition field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordance {
    pub visible: bool,
    /// Width in character cells, `None` when the condition has no operator.
    pub cells: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseView {
    /// Clause index, `None` for the default row.
    pub clause: Option<usize>,
    pub label: ClauseLabel,
    /// Condition field, or the default value field on the last row.
    pub primary: FieldView,
    /// Value field of a conditional clause.
    pub value: Option<FieldView>,
    pub affordance: Option<Affordance>,
}

impl ClauseView {
    pub fn is_default(&self) -> bool {
        self.clause.is_none()
    }
}

/// Build one view per row. `placeholders` is aligned with the flat entries.
pub(crate) fn build_views(
    chain: &FormulaChain,
    placeholders: &[String],
    visible_affordance: Option<usize>,
) -> Vec<ClauseView> {
    let count = chain.clause_count();
    let placeholder = |index: usize| placeholders.get(index).map(String::as_str).unwrap_or("");

    let mut views: Vec<ClauseView> = chain
        .clauses()
        .map(|clause| {
            let condition_slot = Slot::Condition(clause.index);
            let value_slot = Slot::Value(clause.index);
            let condition_placeholder = placeholder(condition_slot.flat_index(count));
            let detected = detect_operator(clause.condition, condition_placeholder);
            ClauseView {
                clause: Some(clause.index),
                label: clause.label,
                primary: FieldView::new(
                    condition_slot,
                    clause.condition,
                    condition_placeholder,
                    clause.label.as_str(),
                ),
                value: Some(FieldView::new(
                    value_slot,
                    clause.value,
                    placeholder(value_slot.flat_index(count)),
                    VALUE_PREFIX,
                )),
                affordance: Some(Affordance {
                    visible: visible_affordance == Some(clause.index),
                    cells: detected.affordance_cells(),
                }),
            }
        })
        .collect();

    let label = chain.default_label();
    views.push(ClauseView {
        clause: None,
        label,
        primary: FieldView::new(
            Slot::Default,
            chain.default_value(),
            placeholder(Slot::Default.flat_index(count)),
            label.as_str(),
        ),
        value: None,
        affordance: None,
    });
    views
}
