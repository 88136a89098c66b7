//! Renderer seam
//!
//! The live component that holds the assigned mesh and per-channel weights.

use std::sync::Arc;

use shapeforge_core::Mesh;

/// Host renderer driven by the facade
pub trait BlendShapeTarget {
    /// Currently assigned mesh
    fn shared_mesh(&self) -> Option<&Arc<Mesh>>;

    /// Swap in a new mesh
    fn assign_mesh(&mut self, mesh: Arc<Mesh>);

    /// Live weight of a channel
    fn blend_shape_weight(&self, index: usize) -> Option<f32>;

    /// Set the live weight of a channel, returning false if out of range
    fn set_blend_shape_weight(&mut self, index: usize, weight: f32) -> bool;
}

/// Renderer for a skinned mesh with blend shapes
#[derive(Debug, Clone, Default)]
pub struct SkinnedMeshRenderer {
    mesh: Option<Arc<Mesh>>,
    weights: Vec<f32>,
}

impl SkinnedMeshRenderer {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        let weights = vec![0.0; mesh.channel_count()];
        Self {
            mesh: Some(mesh),
            weights,
        }
    }

    /// Weights of every channel in mesh order
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl BlendShapeTarget for SkinnedMeshRenderer {
    fn shared_mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// Weights are kept by position; channels past the old count start at zero.
    fn assign_mesh(&mut self, mesh: Arc<Mesh>) {
        self.weights.resize(mesh.channel_count(), 0.0);
        self.mesh = Some(mesh);
    }

    fn blend_shape_weight(&self, index: usize) -> Option<f32> {
        self.weights.get(index).copied()
    }

    fn set_blend_shape_weight(&mut self, index: usize, weight: f32) -> bool {
        match self.weights.get_mut(index) {
            Some(slot) => {
                *slot = weight;
                true
            }
            None => false,
        }
    }
}
