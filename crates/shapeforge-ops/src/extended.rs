//! Extended shape keys
//!
//! An extended shape key remaps a base channel's 0-100 weight onto an
//! arbitrary `[min, max]` display range. When materialized into a mesh the
//! channel is named `"{original}_min:{min}_max:{max}"`.
//!
//! Records are kept in [`ExtendedShapeRegistry`], a side-table keyed by mesh
//! identity, so metadata for one mesh asset never leaks into another.

use ahash::AHashMap;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use shapeforge_core::{Mesh, MeshId};

use crate::synth;

const MIN_MARKER: &str = "_min:";
const MAX_MARKER: &str = "_max:";

/// Display-range metadata for a materialized channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtendedShapeKeyInfo {
    pub original_name: String,
    pub min_value: i32,
    pub max_value: i32,
}

impl ExtendedShapeKeyInfo {
    pub fn new(original_name: impl Into<String>, min_value: i32, max_value: i32) -> Self {
        Self {
            original_name: original_name.into(),
            min_value,
            max_value,
        }
    }

    /// Canonical channel name
    pub fn encoded_name(&self) -> String {
        format!(
            "{}{MIN_MARKER}{}{MAX_MARKER}{}",
            self.original_name, self.min_value, self.max_value
        )
    }

    /// Parse a canonical channel name.
    ///
    /// The original name is everything before the last `_min:` marker, so
    /// originals that themselves contain the marker still round-trip.
    pub fn parse(name: &str) -> Option<Self> {
        let min_at = name.rfind(MIN_MARKER)?;
        let original = &name[..min_at];
        let (min, max) = name[min_at + MIN_MARKER.len()..].split_once(MAX_MARKER)?;

        if original.is_empty() {
            return None;
        }

        let info = Self {
            original_name: original.to_string(),
            min_value: min.parse().ok()?,
            max_value: max.parse().ok()?,
        };
        // Only the spelling `encoded_name` produces is canonical
        (info.encoded_name() == name).then_some(info)
    }

    /// Delta scale of the materialized channel relative to the original
    pub fn scale_factor(&self) -> f32 {
        synth::scale_factor(self.min_value, self.max_value)
    }

    /// Map a 0-100 channel weight onto the display range
    pub fn to_display(&self, normalized: f32) -> f32 {
        self.min_value as f32 + normalized / 100.0 * self.range()
    }

    /// Map a display value back onto the 0-100 channel weight
    pub fn to_normalized(&self, display: f32) -> f32 {
        let range = self.range();
        if range == 0.0 {
            return 0.0;
        }
        (display - self.min_value as f32) / range * 100.0
    }

    fn range(&self) -> f32 {
        self.max_value as f32 - self.min_value as f32
    }
}

/// Extended-key records per mesh, keyed by channel name
#[derive(Default)]
pub struct ExtendedShapeRegistry {
    entries: RwLock<AHashMap<MeshId, IndexMap<String, ExtendedShapeKeyInfo>>>,
}

impl ExtendedShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metadata for a channel of a mesh
    pub fn register(&self, mesh: MeshId, channel: impl Into<String>, info: ExtendedShapeKeyInfo) {
        self.entries
            .write()
            .entry(mesh)
            .or_default()
            .insert(channel.into(), info);
    }

    pub fn get(&self, mesh: MeshId, channel: &str) -> Option<ExtendedShapeKeyInfo> {
        self.entries
            .read()
            .get(&mesh)
            .and_then(|infos| infos.get(channel))
            .cloned()
    }

    /// All records of a mesh in registration order
    pub fn infos(&self, mesh: MeshId) -> Vec<(String, ExtendedShapeKeyInfo)> {
        self.entries
            .read()
            .get(&mesh)
            .map(|infos| infos.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Register every channel of `mesh` whose name is a canonical encoding.
    /// Returns the number of channels registered.
    pub fn discover(&self, mesh: &Mesh) -> usize {
        let found: Vec<_> = mesh
            .channel_names()
            .filter_map(|name| {
                ExtendedShapeKeyInfo::parse(name).map(|info| (name.to_string(), info))
            })
            .collect();

        let count = found.len();
        if count > 0 {
            let mut entries = self.entries.write();
            let infos = entries.entry(mesh.id()).or_default();
            for (name, info) in found {
                infos.insert(name, info);
            }
        }
        count
    }

    /// Copy the records of `from` whose channel still exists in `to`
    pub fn carry_over(&self, from: MeshId, to: &Mesh) {
        if from == to.id() {
            return;
        }

        let mut entries = self.entries.write();
        let Some(previous) = entries.get(&from) else {
            return;
        };
        let surviving: IndexMap<_, _> = previous
            .iter()
            .filter(|(name, _)| to.channel_index(name).is_some())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if !surviving.is_empty() {
            entries.entry(to.id()).or_default().extend(surviving);
        }
    }

    /// Drop every record of a mesh
    pub fn forget(&self, mesh: MeshId) {
        self.entries.write().remove(&mesh);
    }

    /// Number of meshes with records
    pub fn mesh_count(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rebuild::remove_channels;
    use crate::test_support::mesh_with_channels;

    #[test]
    fn test_encoded_name() {
        let info = ExtendedShapeKeyInfo::new("Smile", -50, 150);
        assert_eq!(info.encoded_name(), "Smile_min:-50_max:150");
        assert_eq!(info.scale_factor(), 2.0);
    }

    #[test]
    fn test_parse_round_trip() {
        let cases = [
            ("Smile", -50, 150),
            ("Blink_L", 0, 100),
            ("eye_min:ish", -200, -100),
            ("mouth a", i32::MIN, i32::MAX),
        ];
        for (original, min, max) in cases {
            let info = ExtendedShapeKeyInfo::new(original, min, max);
            assert_eq!(ExtendedShapeKeyInfo::parse(&info.encoded_name()), Some(info));
        }
    }

    #[test]
    fn test_parse_rejects_other_names() {
        assert_eq!(ExtendedShapeKeyInfo::parse("Smile"), None);
        assert_eq!(ExtendedShapeKeyInfo::parse("Smile_min:a_max:3"), None);
        assert_eq!(ExtendedShapeKeyInfo::parse("Smile_min:1"), None);
        assert_eq!(ExtendedShapeKeyInfo::parse("Smile_min:1_max:2x"), None);
        assert_eq!(ExtendedShapeKeyInfo::parse("_min:1_max:2"), None);
    }

    #[test]
    fn test_parse_rejects_non_canonical_numbers() {
        assert_eq!(ExtendedShapeKeyInfo::parse("S_min:007_max:+8"), None);
        assert_eq!(ExtendedShapeKeyInfo::parse("S_min:-0_max:10"), None);
        assert!(ExtendedShapeKeyInfo::parse("S_min:7_max:8").is_some());
    }

    #[test]
    fn test_display_mapping() {
        let info = ExtendedShapeKeyInfo::new("Smile", -50, 150);
        assert_eq!(info.to_display(0.0), -50.0);
        assert_eq!(info.to_display(100.0), 150.0);
        assert_eq!(info.to_display(25.0), 0.0);
        assert_eq!(info.to_normalized(0.0), 25.0);
        assert!((info.to_normalized(info.to_display(70.0)) - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_registry_is_scoped_by_mesh() {
        let registry = ExtendedShapeRegistry::new();
        let a = mesh_with_channels(&["Smile"]);
        let b = mesh_with_channels(&["Smile"]);

        let info = ExtendedShapeKeyInfo::new("Smile", 0, 200);
        registry.register(a.id(), "Smile_min:0_max:200", info);

        assert!(registry.get(a.id(), "Smile_min:0_max:200").is_some());
        assert!(registry.get(b.id(), "Smile_min:0_max:200").is_none());
        assert_eq!(registry.mesh_count(), 1);

        registry.forget(a.id());
        assert_eq!(registry.mesh_count(), 0);
    }

    #[test]
    fn test_discover() {
        let mesh = mesh_with_channels(&["Smile", "Smile_min:-50_max:150", "Blink"]);
        let registry = ExtendedShapeRegistry::new();

        assert_eq!(registry.discover(&mesh), 1);
        assert_eq!(registry.discover(&mesh_with_channels(&["Smile_min:+0_max:100"])), 0);
        let infos = registry.infos(mesh.id());
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].0, "Smile_min:-50_max:150");
        assert_eq!(infos[0].1, ExtendedShapeKeyInfo::new("Smile", -50, 150));
    }

    #[test]
    fn test_carry_over_drops_removed_channels() {
        let mesh = mesh_with_channels(&["A_min:0_max:200", "B_min:0_max:300"]);
        let registry = ExtendedShapeRegistry::new();
        registry.discover(&mesh);

        let rebuilt = remove_channels(&mesh, ["A_min:0_max:200"]).unwrap();
        registry.carry_over(mesh.id(), &rebuilt);

        assert!(registry.get(rebuilt.id(), "A_min:0_max:200").is_none());
        assert!(registry.get(rebuilt.id(), "B_min:0_max:300").is_some());
        assert_eq!(registry.infos(mesh.id()).len(), 2);
    }
}
