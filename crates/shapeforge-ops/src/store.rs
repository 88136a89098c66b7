//! Channel store
//!
//! Read-only view over a mesh's blend-shape channel table with typed errors
//! for out-of-range and unknown-name lookups.

use shapeforge_core::{BlendShapeChannel, Frame, Mesh, ShapeKeyError, ShapeKeyResult};

/// Read adapter over a source mesh
#[derive(Debug, Clone, Copy)]
pub struct MeshChannelStore<'a> {
    mesh: &'a Mesh,
}

impl<'a> MeshChannelStore<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    /// The mesh being read
    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn channel_count(&self) -> usize {
        self.mesh.channel_count()
    }

    pub fn channel_name(&self, index: usize) -> ShapeKeyResult<&'a str> {
        self.mesh.channel_name(index).ok_or(ShapeKeyError::IndexOutOfRange {
            what: "channel",
            index,
            len: self.channel_count(),
        })
    }

    pub fn frame_count(&self, index: usize) -> ShapeKeyResult<usize> {
        self.channel(index).map(BlendShapeChannel::frame_count)
    }

    /// Read one frame; fails if either index is out of bounds
    pub fn read_frame(
        &self,
        channel_index: usize,
        frame_index: usize,
    ) -> ShapeKeyResult<&'a Frame> {
        let channel = self.channel(channel_index)?;
        channel.frame(frame_index).ok_or(ShapeKeyError::IndexOutOfRange {
            what: "frame",
            index: frame_index,
            len: channel.frame_count(),
        })
    }

    /// Exact, case-sensitive lookup
    pub fn find_channel_index(&self, name: &str) -> Option<usize> {
        self.mesh.channel_index(name)
    }

    /// Like [`find_channel_index`](Self::find_channel_index) but failing with
    /// `ChannelNotFound`
    pub fn require_channel_index(&self, name: &str) -> ShapeKeyResult<usize> {
        self.find_channel_index(name)
            .ok_or_else(|| ShapeKeyError::ChannelNotFound(name.to_string()))
    }

    /// All frames of a named channel
    pub fn frames_of(&self, name: &str) -> ShapeKeyResult<&'a [Frame]> {
        self.mesh
            .channel_by_name(name)
            .map(BlendShapeChannel::frames)
            .ok_or_else(|| ShapeKeyError::ChannelNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_channel_index(name).is_some()
    }

    /// Iterate channels in mesh order
    pub fn channels(&self) -> impl Iterator<Item = (&'a str, &'a BlendShapeChannel)> {
        self.mesh.channels()
    }

    fn channel(&self, index: usize) -> ShapeKeyResult<&'a BlendShapeChannel> {
        self.mesh.channel(index).ok_or(ShapeKeyError::IndexOutOfRange {
            what: "channel",
            index,
            len: self.channel_count(),
        })
    }
}
