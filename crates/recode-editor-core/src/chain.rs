//! Formula chain model: an ordered if / else-if / else recode rule.
//!
//! A chain is stored flat. Entry `2i` holds the condition text of clause `i`,
//! entry `2i + 1` its value text, and the final entry is the default value
//! used when no condition matches. The flat length is therefore always odd,
//! and a chain of length 1 has no conditions at all.
//!
//! Labels shown next to each clause are derived from position and chain
//! length; they are never stored.

use std::fmt;

use crate::error::{ChainError, Result};

/// Prefix shown before the value field of a conditional clause.
pub const VALUE_PREFIX: &str = "use";

/// Label shown in front of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseLabel {
    /// First conditional clause.
    IfValue,
    /// Later conditional clauses, and the default once any condition exists.
    ElseUse,
    /// The default value of a chain without conditions.
    Equals,
}

impl ClauseLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IfValue => "if value",
            Self::ElseUse => "else use",
            Self::Equals => "=",
        }
    }

    /// Text indent, in character cells, that keeps typed text clear of the label.
    pub fn indent_cells(&self) -> usize {
        self.as_str().len() + 1
    }
}

impl fmt::Display for ClauseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one editable text field within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Condition text of clause `i`.
    Condition(usize),
    /// Value text of clause `i`.
    Value(usize),
    /// The trailing default value.
    Default,
}

impl Slot {
    /// Position of this slot in the flat representation of a chain with
    /// `clause_count` conditional clauses.
    pub fn flat_index(self, clause_count: usize) -> usize {
        match self {
            Self::Condition(clause) => clause * 2,
            Self::Value(clause) => clause * 2 + 1,
            Self::Default => clause_count * 2,
        }
    }

    /// Inverse of [`Slot::flat_index`] for a chain whose flat length is `len`.
    pub fn from_flat_index(index: usize, len: usize) -> Option<Self> {
        if index >= len {
            None
        } else if index == len - 1 {
            Some(Self::Default)
        } else if index % 2 == 0 {
            Some(Self::Condition(index / 2))
        } else {
            Some(Self::Value(index / 2))
        }
    }

    /// Clause this slot belongs to, `None` for the default value.
    pub fn clause(self) -> Option<usize> {
        match self {
            Self::Condition(clause) | Self::Value(clause) => Some(clause),
            Self::Default => None,
        }
    }

    /// Only condition fields carry an operator affordance.
    pub fn has_operator(self) -> bool {
        matches!(self, Self::Condition(_))
    }
}

/// One conditional clause, borrowed from a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause<'a> {
    pub index: usize,
    pub condition: &'a str,
    pub value: &'a str,
    pub label: ClauseLabel,
}

/// Ordered condition/value pairs followed by a single default value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormulaChain {
    entries: Vec<String>,
}

impl Default for FormulaChain {
    /// A chain with no conditions and an empty default value.
    fn default() -> Self {
        Self {
            entries: vec![String::new()],
        }
    }
}

impl FormulaChain {
    /// Build a chain from its flat representation.
    ///
    /// Fails with [`ChainError::Malformed`] when `flat` is empty or has an
    /// even number of entries.
    pub fn decode<I, S>(flat: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = flat.into_iter().map(Into::into).collect();
        if entries.len() % 2 == 0 {
            return Err(ChainError::Malformed { len: entries.len() });
        }
        Ok(Self { entries })
    }

    /// Flat representation, always of odd length.
    pub fn encode(&self) -> Vec<String> {
        self.entries.clone()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    pub fn into_inner(self) -> Vec<String> {
        self.entries
    }

    /// Number of flat entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a chain holds at least its default value.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of conditional clauses, `N`.
    pub fn clause_count(&self) -> usize {
        self.entries.len() / 2
    }

    pub fn get(&self, flat_index: usize) -> Option<&str> {
        self.entries.get(flat_index).map(String::as_str)
    }

    /// Text stored in `slot`, if the slot exists in this chain.
    pub fn text(&self, slot: Slot) -> Option<&str> {
        if let Some(clause) = slot.clause() {
            if clause >= self.clause_count() {
                return None;
            }
        }
        self.get(slot.flat_index(self.clause_count()))
    }

    pub fn default_value(&self) -> &str {
        self.entries.last().map(String::as_str).unwrap_or_default()
    }

    pub fn clause(&self, index: usize) -> Option<Clause<'_>> {
        if index >= self.clause_count() {
            return None;
        }
        Some(Clause {
            index,
            condition: &self.entries[index * 2],
            value: &self.entries[index * 2 + 1],
            label: self.label_unchecked(index),
        })
    }

    pub fn clauses(&self) -> impl Iterator<Item = Clause<'_>> + '_ {
        (0..self.clause_count()).filter_map(|index| self.clause(index))
    }

    /// Insert an empty condition/value pair just before the default value.
    ///
    /// New branches always precede the final default, so the pair lands at
    /// the end of the conditional clauses. Returns the new clause index.
    pub fn insert_clause_before_default(&mut self) -> usize {
        let clause = self.clause_count();
        let at = self.entries.len() - 1;
        self.entries.splice(at..at, [String::new(), String::new()]);
        clause
    }

    /// Remove clause `clause` (condition and value), shifting later clauses down.
    pub fn remove_clause_at(&mut self, clause: usize) -> Result<()> {
        let count = self.clause_count();
        if clause >= count {
            return Err(ChainError::IndexOutOfRange {
                index: clause,
                len: count,
            });
        }
        let start = clause * 2;
        self.entries.drain(start..start + 2);
        Ok(())
    }

    /// Replace the text at `flat_index`. Returns whether the text changed.
    pub fn update_text(&mut self, flat_index: usize, text: impl Into<String>) -> Result<bool> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(flat_index)
            .ok_or(ChainError::IndexOutOfRange {
                index: flat_index,
                len,
            })?;
        let text = text.into();
        if *entry == text {
            return Ok(false);
        }
        *entry = text;
        Ok(true)
    }

    /// Label for clause `clause_index`, where index `N` names the default value.
    pub fn label_for(&self, clause_index: usize) -> Result<ClauseLabel> {
        let count = self.clause_count();
        if clause_index > count {
            return Err(ChainError::IndexOutOfRange {
                index: clause_index,
                len: count + 1,
            });
        }
        Ok(self.label_unchecked(clause_index))
    }

    /// Label of the default value.
    pub fn default_label(&self) -> ClauseLabel {
        self.label_unchecked(self.clause_count())
    }

    fn label_unchecked(&self, clause_index: usize) -> ClauseLabel {
        if self.clause_count() == 0 {
            ClauseLabel::Equals
        } else if clause_index == 0 {
            ClauseLabel::IfValue
        } else {
            ClauseLabel::ElseUse
        }
    }

    /// Whether `flat` has the same length and the same text at every position.
    pub fn matches_flat(&self, flat: &[String]) -> bool {
        self.entries.as_slice() == flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(flat: &[&str]) -> FormulaChain {
        FormulaChain::decode(flat.iter().copied()).unwrap()
    }

    #[test]
    fn test_decode_encode_round_trip() {
        for flat in [
            vec![""],
            vec!["", "", "'tom'"],
            vec!["A==5", "'x'", "> 3", "'y'", "'z'"],
        ] {
            let c = chain(&flat);
            assert_eq!(c.encode(), flat);
            assert_eq!(FormulaChain::decode(c.encode()).unwrap(), c);
            assert_eq!(c.len() % 2, 1);
        }
    }

    #[test]
    fn test_decode_rejects_even_and_empty() {
        assert_eq!(
            FormulaChain::decode(Vec::<String>::new()),
            Err(ChainError::Malformed { len: 0 })
        );
        assert_eq!(
            FormulaChain::decode(["", "'tom'"]),
            Err(ChainError::Malformed { len: 2 })
        );
    }

    #[test]
    fn test_default_chain() {
        let c = FormulaChain::default();
        assert_eq!(c.encode(), vec![String::new()]);
        assert_eq!(c.clause_count(), 0);
        assert_eq!(c.default_value(), "");
    }

    #[test]
    fn test_labels() {
        let c = chain(&["'tom'"]);
        assert_eq!(c.label_for(0), Ok(ClauseLabel::Equals));
        assert!(c.label_for(1).is_err());

        let c = chain(&["> 1", "a", "< 0", "b", "c"]);
        assert_eq!(c.label_for(0), Ok(ClauseLabel::IfValue));
        assert_eq!(c.label_for(1), Ok(ClauseLabel::ElseUse));
        assert_eq!(c.label_for(2), Ok(ClauseLabel::ElseUse));
        assert_eq!(c.default_label(), ClauseLabel::ElseUse);
        assert!(c.label_for(3).is_err());
    }

    #[test]
    fn test_insert_flips_default_label() {
        let mut c = chain(&["'tom'"]);
        assert_eq!(c.default_label(), ClauseLabel::Equals);

        let clause = c.insert_clause_before_default();
        assert_eq!(clause, 0);
        assert_eq!(c.encode(), vec!["", "", "'tom'"]);
        assert_eq!(c.label_for(0), Ok(ClauseLabel::IfValue));
        assert_eq!(c.default_label(), ClauseLabel::ElseUse);
    }

    #[test]
    fn test_insert_always_precedes_default() {
        let mut c = chain(&["A==5", "'x'", "'y'"]);
        assert_eq!(c.insert_clause_before_default(), 1);
        assert_eq!(c.encode(), vec!["A==5", "'x'", "", "", "'y'"]);
    }

    #[test]
    fn test_insert_then_remove_restores() {
        let original = chain(&["A==5", "'x'", "'y'"]);
        let mut c = original.clone();
        let clause = c.insert_clause_before_default();
        c.remove_clause_at(clause).unwrap();
        assert_eq!(c, original);
    }

    #[test]
    fn test_remove_flips_default_label() {
        let mut c = chain(&["A==5", "'x'", "'y'"]);
        c.remove_clause_at(0).unwrap();
        assert_eq!(c.encode(), vec!["'y'"]);
        assert_eq!(c.default_label(), ClauseLabel::Equals);
    }

    #[test]
    fn test_remove_shifts_later_clauses() {
        let mut c = chain(&["a", "1", "b", "2", "c", "3", "d"]);
        c.remove_clause_at(1).unwrap();
        assert_eq!(c.encode(), vec!["a", "1", "c", "3", "d"]);
        assert_eq!(c.clause(1).unwrap().condition, "c");
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut c = chain(&["a", "1", "d"]);
        assert_eq!(
            c.remove_clause_at(1),
            Err(ChainError::IndexOutOfRange { index: 1, len: 1 })
        );
        // The default value is not a removable clause.
        let mut c = chain(&["d"]);
        assert!(c.remove_clause_at(0).is_err());
    }

    #[test]
    fn test_update_text() {
        let mut c = chain(&["a", "1", "d"]);
        assert_eq!(c.update_text(2, "e"), Ok(true));
        assert_eq!(c.update_text(2, "e"), Ok(false));
        assert_eq!(c.default_value(), "e");
        assert_eq!(
            c.update_text(3, "x"),
            Err(ChainError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_slot_indices() {
        assert_eq!(Slot::Condition(1).flat_index(2), 2);
        assert_eq!(Slot::Value(1).flat_index(2), 3);
        assert_eq!(Slot::Default.flat_index(2), 4);

        for index in 0..5 {
            let slot = Slot::from_flat_index(index, 5).unwrap();
            assert_eq!(slot.flat_index(2), index);
        }
        assert_eq!(Slot::from_flat_index(5, 5), None);
        assert_eq!(Slot::from_flat_index(0, 1), Some(Slot::Default));
    }

    #[test]
    fn test_text_by_slot() {
        let c = chain(&["> 3", "'big'", "'small'"]);
        assert_eq!(c.text(Slot::Condition(0)), Some("> 3"));
        assert_eq!(c.text(Slot::Value(0)), Some("'big'"));
        assert_eq!(c.text(Slot::Default), Some("'small'"));
        assert_eq!(c.text(Slot::Condition(1)), None);
    }

    #[test]
    fn test_matches_flat() {
        let c = chain(&["a", "1", "d"]);
        assert!(c.matches_flat(&c.encode()));
        assert!(!c.matches_flat(&["a".into(), "1".into(), "e".into()]));
        assert!(!c.matches_flat(&["d".into()]));
    }
}
