//! # Shapeforge Core
//!
//! Mesh data model shared by the Shapeforge blend-shape tooling.
//!
//! ## Features
//! - Base geometry buffers (positions, normals, tangents, UV sets, colors, indices, bounds)
//! - Ordered blend-shape channel table addressable by name and by position
//! - Multi-frame channels with per-vertex position/normal/tangent deltas
//! - Process-unique mesh identities for copy-on-write publishing

pub mod blend_shape;
pub mod math;
pub mod mesh;

pub use blend_shape::{BlendShapeChannel, Frame};
pub use math::Aabb;
pub use mesh::{Mesh, MeshGeometry, MeshId, MAX_UV_SETS};

use thiserror::Error;

/// Blend-shape and mesh errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeKeyError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Blend shape not found: {0}")]
    ChannelNotFound(String),

    #[error("Blend shape already exists: {0}")]
    DuplicateChannelName(String),

    #[error("{what} index {index} out of range (count {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Vertex count mismatch: expected {expected}, found {found}")]
    VertexCountMismatch { expected: usize, found: usize },

    #[error("Frame weight {weight} on '{channel}' must be greater than previous weight {previous}")]
    FrameWeightOrder {
        channel: String,
        previous: f32,
        weight: f32,
    },
}

/// Result type for blend-shape operations
pub type ShapeKeyResult<T> = Result<T, ShapeKeyError>;
