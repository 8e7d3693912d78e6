//! The [`Engine`] that builds [`TreeModel`]s.

use invdyn_core::{Engine, ModelLoadError};

use crate::description::ModelDescription;
use crate::model::TreeModel;

/// Builds [`TreeModel`] replicas from a [`ModelDescription`].
///
/// Stateless: one engine value can serve any number of pools.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeEngine;

impl TreeEngine {
    /// Create an engine.
    pub fn new() -> Self {
        Self
    }
}

impl Engine for TreeEngine {
    type Description = ModelDescription;
    type Model = TreeModel;

    fn load_model(&self, description: &ModelDescription) -> Result<TreeModel, ModelLoadError> {
        let model = TreeModel::from_description(description)?;
        tracing::trace!(
            model = %description.name,
            bodies = description.bodies.len(),
            "tree model built"
        );
        Ok(model)
    }
}
