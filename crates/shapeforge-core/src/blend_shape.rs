//! Blend shapes
//!
//! Channels and the weighted delta frames they are made of.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{ShapeKeyError, ShapeKeyResult};

/// One weighted snapshot of per-vertex deltas within a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Weight (percent) at which the deltas are fully applied
    pub weight: f32,
    /// Per-vertex position deltas
    pub delta_positions: Vec<Vec3>,
    /// Per-vertex normal deltas
    #[serde(default)]
    pub delta_normals: Vec<Vec3>,
    /// Per-vertex tangent deltas
    #[serde(default)]
    pub delta_tangents: Vec<Vec3>,
}

impl Frame {
    /// Create a frame from full delta arrays
    pub fn new(
        weight: f32,
        delta_positions: Vec<Vec3>,
        delta_normals: Vec<Vec3>,
        delta_tangents: Vec<Vec3>,
    ) -> Self {
        Self {
            weight,
            delta_positions,
            delta_normals,
            delta_tangents,
        }
    }

    /// Create a frame that only moves positions
    pub fn from_positions(weight: f32, delta_positions: Vec<Vec3>) -> Self {
        let vertex_count = delta_positions.len();
        Self {
            weight,
            delta_positions,
            delta_normals: vec![Vec3::ZERO; vertex_count],
            delta_tangents: vec![Vec3::ZERO; vertex_count],
        }
    }

    /// Number of vertices covered by the position deltas
    pub fn vertex_count(&self) -> usize {
        self.delta_positions.len()
    }

    /// Check the delta arrays against a vertex count, zero-filling empty
    /// normal and tangent arrays.
    pub fn conform(mut self, vertex_count: usize) -> ShapeKeyResult<Self> {
        check_len(self.delta_positions.len(), vertex_count)?;

        for deltas in [&mut self.delta_normals, &mut self.delta_tangents] {
            if deltas.is_empty() {
                deltas.resize(vertex_count, Vec3::ZERO);
            } else {
                check_len(deltas.len(), vertex_count)?;
            }
        }

        Ok(self)
    }
}

fn check_len(found: usize, expected: usize) -> ShapeKeyResult<()> {
    if found != expected {
        return Err(ShapeKeyError::VertexCountMismatch { expected, found });
    }
    Ok(())
}

/// Named morph target made of one or more frames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendShapeChannel {
    frames: Vec<Frame>,
}

impl BlendShapeChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames in ascending weight order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get a frame by index
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Check if the channel has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Weight of the last frame, if any
    pub fn last_weight(&self) -> Option<f32> {
        self.frames.last().map(|f| f.weight)
    }

    /// Append a frame; `name` is only used for the error message.
    pub(crate) fn push_frame(&mut self, name: &str, frame: Frame) -> ShapeKeyResult<()> {
        if let Some(previous) = self.last_weight() {
            if frame.weight.is_nan() || frame.weight <= previous {
                return Err(ShapeKeyError::FrameWeightOrder {
                    channel: name.to_string(),
                    previous,
                    weight: frame.weight,
                });
            }
        }
        self.frames.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conform_fills_missing_normals() {
        let frame = Frame::new(100.0, vec![Vec3::X, Vec3::Y], Vec::new(), Vec::new());
        let frame = frame.conform(2).unwrap();
        assert_eq!(frame.delta_normals, vec![Vec3::ZERO; 2]);
        assert_eq!(frame.delta_tangents, vec![Vec3::ZERO; 2]);
    }

    #[test]
    fn test_conform_rejects_length_mismatch() {
        let frame = Frame::from_positions(100.0, vec![Vec3::X]);
        assert_eq!(
            frame.conform(3),
            Err(ShapeKeyError::VertexCountMismatch { expected: 3, found: 1 })
        );

        let frame = Frame::new(100.0, vec![Vec3::X, Vec3::Y], vec![Vec3::Z], Vec::new());
        assert!(matches!(
            frame.conform(2),
            Err(ShapeKeyError::VertexCountMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_frame_weights_must_increase() {
        let mut channel = BlendShapeChannel::new();
        channel.push_frame("Blink", Frame::from_positions(50.0, vec![Vec3::X])).unwrap();
        channel.push_frame("Blink", Frame::from_positions(100.0, vec![Vec3::Y])).unwrap();
        assert_eq!(channel.frame_count(), 2);
        assert_eq!(channel.last_weight(), Some(100.0));

        let err = channel
            .push_frame("Blink", Frame::from_positions(100.0, vec![Vec3::Z]))
            .unwrap_err();
        assert!(matches!(err, ShapeKeyError::FrameWeightOrder { .. }));
        assert_eq!(channel.frame_count(), 2);
    }
}
