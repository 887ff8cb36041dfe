//! Interface to the host's transform store.
//!
//! The store owns the authoritative copy of every transform. The editor
//! reads the selected transform from it and writes back partial updates.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identifier of a transform in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformId(pub u32);

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transform as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub id: TransformId,
    pub name: String,
    pub description: String,
    /// Flat formula chain. Not validated; the store may hold anything.
    pub formula: Vec<String>,
}

/// Partial update of a transform. Only fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<Vec<String>>,
}

impl TransformValues {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn formula(formula: Vec<String>) -> Self {
        Self {
            formula: Some(formula),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.formula.is_none()
    }

    /// Take fields this update leaves unset from an older one.
    pub fn fill_from(&mut self, older: TransformValues) {
        self.name = self.name.take().or(older.name);
        self.description = self.description.take().or(older.description);
        self.formula = self.formula.take().or(older.formula);
    }
}

/// One entry of a `set_transforms` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformUpdate {
    pub id: TransformId,
    pub values: TransformValues,
}

/// Change notifications the bridge subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// The transform selected for editing changed.
    EditingTransChanged,
    /// The whole data set was (re)loaded.
    DataSetLoaded,
}

/// The host's transform store.
///
/// Reads are synchronous snapshots. Writes resolve once the store has
/// normalized and persisted the change; the store may alter or reject the
/// written values.
pub trait TransformStore {
    /// Transform currently selected for editing.
    fn editing_transform(&self) -> Option<TransformId>;

    fn transform_by_id(&self, id: TransformId) -> Option<TransformRecord>;

    fn set_transforms(
        &self,
        updates: Vec<TransformUpdate>,
    ) -> impl Future<Output = Result<(), StoreError>>;
}
