//! Relational operator detection for condition text.
//!
//! A condition such as `> 2000` starts with an operator token. The editor
//! shows an operator affordance sized to that token and keeps exactly one
//! space between the operator and the operand.

use std::fmt;

/// Relational operators recognised at the start of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    /// `==`
    Equal,
    /// `=`
    Assign,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
}

impl RelOp {
    /// Match order. Longer tokens come before their own prefixes so `<=`
    /// wins over `<` and `==` wins over `=`.
    pub const ALL: [RelOp; 6] = [
        RelOp::Equal,
        RelOp::Assign,
        RelOp::LessEqual,
        RelOp::GreaterEqual,
        RelOp::Less,
        RelOp::Greater,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::Assign => "=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::Greater => ">",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }

    /// Token length in bytes (all tokens are ASCII).
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Longest operator that prefixes `text`.
    pub fn prefix_of(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| text.starts_with(op.as_str()))
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the detector over a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorMatch {
    /// Operator found at the start of the text, if any.
    pub op: Option<RelOp>,
    /// Replacement text when a space had to be inserted after the operator.
    pub rewritten: Option<String>,
}

impl OperatorMatch {
    const NONE: Self = Self {
        op: None,
        rewritten: None,
    };

    /// Length of the matched operator, 0 when none matched.
    ///
    /// Callers use this to select the operator text or size the affordance.
    pub fn len(&self) -> usize {
        self.op.map(|op| op.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.op.is_none()
    }

    /// Affordance width in character cells, `None` when no operator is present.
    pub fn affordance_cells(&self) -> Option<usize> {
        self.op.map(|op| op.len() + 1)
    }
}

/// Detect the operator at the start of `text`.
///
/// Leading and trailing whitespace is ignored. An empty condition is
/// measured against `placeholder` instead; placeholder text is never
/// rewritten. When the operator is directly followed by another character
/// the trimmed text is returned in `rewritten` with one space inserted after
/// the operator, so `>2000` becomes `> 2000`. Running the detector again on
/// the rewritten text reports the same operator and no rewrite.
pub fn detect_operator(text: &str, placeholder: &str) -> OperatorMatch {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        let op = RelOp::prefix_of(placeholder.trim());
        return OperatorMatch { op, rewritten: None };
    }

    let Some(op) = RelOp::prefix_of(trimmed) else {
        return OperatorMatch::NONE;
    };

    let rest = &trimmed[op.len()..];
    let rewritten = match rest.chars().next() {
        Some(next) if next != ' ' => {
            let spaced = format!("{op} {rest}");
            tracing::trace!(from = trimmed, to = %spaced, "Spacing operator prefix");
            Some(spaced)
        }
        _ => None,
    };

    OperatorMatch {
        op: Some(op),
        rewritten,
    }
}

/// Replace the operator prefix of `text` with `op`, or prefix `op` when the
/// text has none. The result always has one space between operator and operand.
pub fn replace_operator(text: &str, op: RelOp) -> String {
    let trimmed = text.trim();
    let operand = match RelOp::prefix_of(trimmed) {
        Some(current) => &trimmed[current.len()..],
        None => trimmed,
    };
    format!("{op} {}", operand.trim_start())
}
