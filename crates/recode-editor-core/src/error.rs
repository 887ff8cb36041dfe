//! Error types for formula chain operations.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by [`FormulaChain`](crate::FormulaChain) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ChainError {
    /// The flat representation is empty or has an even number of entries.
    #[error("malformed formula chain: expected an odd number of entries, got {len}")]
    #[diagnostic(
        code(recode::chain::malformed),
        help("a chain is N condition/value pairs followed by one default value")
    )]
    Malformed { len: usize },

    /// A flat index or clause index past the end of the chain.
    #[error("index {index} out of range (length {len})")]
    #[diagnostic(code(recode::chain::index_out_of_range))]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, ChainError>;
