//! # Shapeforge Ops
//!
//! Blend-shape rewriting engine.
//!
//! ## Features
//! - Read-only channel store over a source mesh
//! - Extended-range channels synthesized by scaling existing deltas
//! - Mesh rebuilds that insert, remove, merge and rename channels while
//!   copying base geometry unchanged
//! - Extended-key metadata scoped to the mesh it describes
//! - A facade that publishes rebuilt meshes to a renderer by reference swap

pub mod extended;
pub mod facade;
pub mod rebuild;
pub mod renderer;
pub mod store;
pub mod synth;

pub use extended::{ExtendedShapeKeyInfo, ExtendedShapeRegistry};
pub use facade::{BlendShapeFacade, OperationResult};
pub use renderer::{BlendShapeTarget, SkinnedMeshRenderer};
pub use store::MeshChannelStore;
