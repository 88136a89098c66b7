//! Mesh and Geometry
//!
//! Host-side mesh representation: base geometry buffers plus an ordered
//! blend-shape channel table. Channels can only be appended, so a caller that
//! needs a particular order has to add them in that order.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Vec2, Vec3, Vec4};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::blend_shape::{BlendShapeChannel, Frame};
use crate::math::Aabb;
use crate::{ShapeKeyError, ShapeKeyResult};

/// Maximum number of UV sets a mesh carries
pub const MAX_UV_SETS: usize = 4;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique mesh identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for MeshId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// Base geometry buffers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex normals (empty or one per vertex)
    #[serde(default)]
    pub normals: Vec<Vec3>,
    /// Vertex tangents, w holds the handedness
    #[serde(default)]
    pub tangents: Vec<Vec4>,
    /// UV sets, at most [`MAX_UV_SETS`]
    #[serde(default)]
    pub uvs: Vec<Vec<Vec2>>,
    /// Vertex colors
    #[serde(default)]
    pub colors: Vec<Vec4>,
    /// Triangle list indices
    #[serde(default)]
    pub indices: Vec<u32>,
    /// Bounding volume
    #[serde(default)]
    pub bounds: Aabb,
}

impl MeshGeometry {
    /// Geometry with positions only; bounds are computed from the positions
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        let bounds = Aabb::from_points(&positions);
        Self {
            positions,
            bounds,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_tangents(mut self, tangents: Vec<Vec4>) -> Self {
        self.tangents = tangents;
        self
    }

    pub fn with_uv_set(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs.push(uvs);
        self
    }

    pub fn with_colors(mut self, colors: Vec<Vec4>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Check attribute lengths and index ranges
    pub fn validate(&self) -> ShapeKeyResult<()> {
        let vertex_count = self.vertex_count();

        let attribute_lens = [
            ("normals", self.normals.len()),
            ("tangents", self.tangents.len()),
            ("colors", self.colors.len()),
        ];
        for (attribute, len) in attribute_lens {
            if len != 0 && len != vertex_count {
                return Err(ShapeKeyError::InvalidArgument(format!(
                    "{attribute} has {len} entries for {vertex_count} vertices"
                )));
            }
        }

        if self.uvs.len() > MAX_UV_SETS {
            return Err(ShapeKeyError::InvalidArgument(format!(
                "{} UV sets exceed the maximum of {MAX_UV_SETS}",
                self.uvs.len()
            )));
        }
        for (set, uvs) in self.uvs.iter().enumerate() {
            if !uvs.is_empty() && uvs.len() != vertex_count {
                return Err(ShapeKeyError::InvalidArgument(format!(
                    "UV set {set} has {} entries for {vertex_count} vertices",
                    uvs.len()
                )));
            }
        }

        if self.indices.len() % 3 != 0 {
            return Err(ShapeKeyError::InvalidArgument(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ShapeKeyError::IndexOutOfRange {
                what: "vertex",
                index: *index as usize,
                len: vertex_count,
            });
        }

        Ok(())
    }
}

/// Mesh with blend-shape channels.
///
/// Cloning a mesh allocates a new [`MeshId`]: the copy has the same content but
/// is a different object as far as identity-keyed tables are concerned.
#[derive(Debug, Serialize, Deserialize)]
pub struct Mesh {
    #[serde(skip, default = "MeshId::next")]
    id: MeshId,
    name: String,
    geometry: MeshGeometry,
    #[serde(default)]
    channels: IndexMap<String, BlendShapeChannel>,
}

impl Mesh {
    /// Create a mesh without blend shapes
    pub fn new(name: impl Into<String>, geometry: MeshGeometry) -> ShapeKeyResult<Self> {
        geometry.validate()?;
        Ok(Self {
            id: MeshId::next(),
            name: name.into(),
            geometry,
            channels: IndexMap::new(),
        })
    }

    /// Get the mesh identity
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Get the mesh name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the base geometry
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    /// Number of blend-shape channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Get a channel name by position
    pub fn channel_name(&self, index: usize) -> Option<&str> {
        self.channels.get_index(index).map(|(name, _)| name.as_str())
    }

    /// Get a channel by position
    pub fn channel(&self, index: usize) -> Option<&BlendShapeChannel> {
        self.channels.get_index(index).map(|(_, channel)| channel)
    }

    /// Get a channel by name
    pub fn channel_by_name(&self, name: &str) -> Option<&BlendShapeChannel> {
        self.channels.get(name)
    }

    /// Position of a channel (exact, case-sensitive match)
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.get_index_of(name)
    }

    /// Number of frames in a channel
    pub fn frame_count(&self, index: usize) -> Option<usize> {
        self.channel(index).map(BlendShapeChannel::frame_count)
    }

    /// Get a frame of a channel
    pub fn frame(&self, channel: usize, frame: usize) -> Option<&Frame> {
        self.channel(channel).and_then(|c| c.frame(frame))
    }

    /// Iterate channels in order
    pub fn channels(&self) -> impl Iterator<Item = (&str, &BlendShapeChannel)> {
        self.channels.iter().map(|(name, channel)| (name.as_str(), channel))
    }

    /// Iterate channel names in order
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Append an empty channel, returning its position
    pub fn add_channel(&mut self, name: &str) -> ShapeKeyResult<usize> {
        check_channel_name(name)?;
        if self.channels.contains_key(name) {
            return Err(ShapeKeyError::DuplicateChannelName(name.to_string()));
        }
        let (index, _) = self.channels.insert_full(name.to_string(), BlendShapeChannel::new());
        Ok(index)
    }

    /// Append a frame to a channel, creating the channel at the end if needed
    pub fn add_frame(&mut self, name: &str, frame: Frame) -> ShapeKeyResult<()> {
        check_channel_name(name)?;
        let frame = frame.conform(self.vertex_count())?;

        match self.channels.get_mut(name) {
            Some(channel) => channel.push_frame(name, frame),
            None => {
                let mut channel = BlendShapeChannel::new();
                channel.push_frame(name, frame)?;
                self.channels.insert(name.to_string(), channel);
                Ok(())
            }
        }
    }

    /// Remove every channel
    pub fn clear_channels(&mut self) {
        self.channels.clear();
    }

    /// Check geometry and every frame against the vertex count.
    ///
    /// Meshes built through [`Mesh::new`] and [`Mesh::add_frame`] are always
    /// valid; this is for meshes that came from deserialization.
    pub fn validate(&self) -> ShapeKeyResult<()> {
        self.geometry.validate()?;

        let vertex_count = self.vertex_count();
        for (name, channel) in &self.channels {
            check_channel_name(name)?;
            let mut previous: Option<f32> = None;
            for frame in channel.frames() {
                frame.clone().conform(vertex_count)?;
                if let Some(previous) = previous {
                    if frame.weight.is_nan() || frame.weight <= previous {
                        return Err(ShapeKeyError::FrameWeightOrder {
                            channel: name.clone(),
                            previous,
                            weight: frame.weight,
                        });
                    }
                }
                previous = Some(frame.weight);
            }
        }
        Ok(())
    }

    /// Compare geometry and channel table, ignoring identity and name
    pub fn content_eq(&self, other: &Mesh) -> bool {
        self.geometry == other.geometry
            && self.channels.len() == other.channels.len()
            && self
                .channels
                .iter()
                .zip(other.channels.iter())
                .all(|(a, b)| a == b)
    }
}

impl Clone for Mesh {
    fn clone(&self) -> Self {
        Self {
            id: MeshId::next(),
            name: self.name.clone(),
            geometry: self.geometry.clone(),
            channels: self.channels.clone(),
        }
    }
}

fn check_channel_name(name: &str) -> ShapeKeyResult<()> {
    if name.is_empty() {
        return Err(ShapeKeyError::InvalidArgument(
            "blend shape name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        let geometry = MeshGeometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .with_normals(vec![Vec3::Z; 3])
            .with_uv_set(vec![Vec2::ZERO, Vec2::X, Vec2::Y])
            .with_indices(vec![0, 1, 2]);
        Mesh::new("Face", geometry).unwrap()
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = triangle();
        assert_eq!(mesh.name(), "Face");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.channel_count(), 0);
        assert_eq!(mesh.geometry().bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_invalid_geometry() {
        let geometry = MeshGeometry::from_positions(vec![Vec3::ZERO, Vec3::X])
            .with_normals(vec![Vec3::Z]);
        assert!(matches!(
            Mesh::new("Bad", geometry),
            Err(ShapeKeyError::InvalidArgument(_))
        ));

        let geometry = MeshGeometry::from_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y])
            .with_indices(vec![0, 1, 5]);
        assert!(matches!(
            Mesh::new("Bad", geometry),
            Err(ShapeKeyError::IndexOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn test_add_frame_appends_channels_in_order() {
        let mut mesh = triangle();
        mesh.add_frame("Smile", Frame::from_positions(100.0, vec![Vec3::X; 3])).unwrap();
        mesh.add_frame("Blink", Frame::from_positions(100.0, vec![Vec3::Y; 3])).unwrap();
        mesh.add_frame("Smile", Frame::from_positions(150.0, vec![Vec3::Z; 3])).unwrap();

        assert_eq!(mesh.channel_names().collect::<Vec<_>>(), vec!["Smile", "Blink"]);
        assert_eq!(mesh.frame_count(0), Some(2));
        assert_eq!(mesh.frame(0, 1).unwrap().weight, 150.0);
        assert_eq!(mesh.channel_index("Blink"), Some(1));
        assert_eq!(mesh.channel_index("blink"), None);
    }

    #[test]
    fn test_add_channel_duplicate() {
        let mut mesh = triangle();
        assert_eq!(mesh.add_channel("Empty").unwrap(), 0);
        assert_eq!(
            mesh.add_channel("Empty"),
            Err(ShapeKeyError::DuplicateChannelName("Empty".to_string()))
        );
        assert!(mesh.add_channel("").is_err());
    }

    #[test]
    fn test_add_frame_vertex_mismatch() {
        let mut mesh = triangle();
        let err = mesh
            .add_frame("Smile", Frame::from_positions(100.0, vec![Vec3::X; 2]))
            .unwrap_err();
        assert_eq!(err, ShapeKeyError::VertexCountMismatch { expected: 3, found: 2 });
        assert_eq!(mesh.channel_count(), 0);
    }

    #[test]
    fn test_clone_gets_new_identity() {
        let mut mesh = triangle();
        mesh.add_frame("Smile", Frame::from_positions(100.0, vec![Vec3::X; 3])).unwrap();

        let copy = mesh.clone();
        assert_ne!(copy.id(), mesh.id());
        assert!(copy.content_eq(&mesh));
    }

    #[test]
    fn test_clear_channels() {
        let mut mesh = triangle();
        mesh.add_frame("Smile", Frame::from_positions(100.0, vec![Vec3::X; 3])).unwrap();
        mesh.clear_channels();
        assert_eq!(mesh.channel_count(), 0);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_json_preserves_channel_order() {
        let mut mesh = triangle();
        for name in ["Zeta", "Alpha", "Mid"] {
            mesh.add_frame(name, Frame::from_positions(100.0, vec![Vec3::X; 3])).unwrap();
        }

        let json = serde_json::to_string(&mesh).unwrap();
        let loaded: Mesh = serde_json::from_str(&json).unwrap();

        loaded.validate().unwrap();
        assert_ne!(loaded.id(), mesh.id());
        assert_eq!(
            loaded.channel_names().collect::<Vec<_>>(),
            vec!["Zeta", "Alpha", "Mid"]
        );
    }
}
