//! Error types for store synchronization.

use miette::Diagnostic;
use thiserror::Error;

use crate::store::TransformId;

/// Errors reported by a [`TransformStore`](crate::TransformStore).
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[non_exhaustive]
pub enum StoreError {
    /// The store refused the update.
    #[error("store rejected update: {0}")]
    #[diagnostic(code(recode::store::rejected))]
    Rejected(String),

    /// No transform with this id exists.
    #[error("unknown transform {0}")]
    #[diagnostic(code(recode::store::unknown_transform))]
    UnknownTransform(TransformId),

    /// The update could not be delivered.
    #[error("store transport failed: {0}")]
    #[diagnostic(code(recode::store::transport))]
    Transport(String),

    /// No transform is selected for editing.
    #[error("no transform selected")]
    #[diagnostic(code(recode::store::no_selection))]
    NoSelection,
}
