//! Blend-shape facade
//!
//! Operation surface for editor front-ends. Every structural operation reads
//! the renderer's current mesh, builds a new one and swaps it in; the shared
//! source mesh is never modified, so other renderers using it are unaffected.
//! Failures come back as an [`OperationResult`] and leave the renderer as it
//! was.

use std::sync::Arc;

use ahash::AHashMap;
use indexmap::IndexMap;
use log::{info, warn};

use shapeforge_core::{Mesh, ShapeKeyError, ShapeKeyResult};

use crate::extended::{ExtendedShapeKeyInfo, ExtendedShapeRegistry};
use crate::renderer::BlendShapeTarget;
use crate::store::MeshChannelStore;
use crate::{rebuild, synth};

/// Outcome of a facade operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<ShapeKeyResult<String>> for OperationResult {
    fn from(result: ShapeKeyResult<String>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

/// Entry point for blend-shape edits on a renderer
#[derive(Default)]
pub struct BlendShapeFacade {
    registry: ExtendedShapeRegistry,
}

impl BlendShapeFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register extended keys already materialized in a mesh (e.g. one loaded
    /// from disk). Returns how many were found.
    pub fn track_mesh(&self, mesh: &Mesh) -> usize {
        self.registry.discover(mesh)
    }

    /// Add a channel with deltas scaled by `(max - min) / 100`, placed right
    /// after `original_name`
    pub fn create_extended<R>(
        &self,
        renderer: &mut R,
        original_name: &str,
        extended_name: &str,
        min_value: i32,
        max_value: i32,
    ) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
    {
        let result =
            self.try_create_extended(renderer, original_name, extended_name, min_value, max_value);
        report("create extended", result)
    }

    /// [`create_extended`](Self::create_extended) with the canonical
    /// `"{original}_min:{min}_max:{max}"` channel name
    pub fn create_extended_default<R>(
        &self,
        renderer: &mut R,
        original_name: &str,
        min_value: i32,
        max_value: i32,
    ) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
    {
        let name = ExtendedShapeKeyInfo::new(original_name, min_value, max_value).encoded_name();
        self.create_extended(renderer, original_name, &name, min_value, max_value)
    }

    pub fn remove_one<R>(&self, renderer: &mut R, name: &str) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
    {
        self.remove_many(renderer, &[name])
    }

    /// Remove channels by name; absent names are ignored
    pub fn remove_many<R, S>(&self, renderer: &mut R, names: &[S]) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
        S: AsRef<str>,
    {
        let result = self.try_remove_many(renderer, names);
        report("remove", result)
    }

    /// Append a channel that is the weighted sum of `weights`' channels
    pub fn merge<R>(
        &self,
        renderer: &mut R,
        new_name: &str,
        weights: &IndexMap<String, f32>,
    ) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
    {
        let result = self.try_merge(renderer, new_name, weights);
        report("merge", result)
    }

    /// Rename a channel in place, keeping its live weight
    pub fn rename<R>(&self, renderer: &mut R, old_name: &str, new_name: &str) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
    {
        let result = self.try_rename(renderer, old_name, new_name);
        report("rename", result)
    }

    /// Set a live weight by channel position. No mesh is rebuilt.
    pub fn apply_weight<R>(&self, renderer: &mut R, index: usize, weight: f32) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
    {
        let Some(mesh) = renderer.shared_mesh() else {
            return OperationResult::failure(no_mesh().to_string());
        };
        let len = mesh.channel_count();

        if renderer.set_blend_shape_weight(index, weight) {
            OperationResult::ok(String::new())
        } else {
            let err = ShapeKeyError::IndexOutOfRange { what: "channel", index, len };
            OperationResult::failure(err.to_string())
        }
    }

    /// Set the weight of an extended channel from a value in its display range
    pub fn apply_extended_value<R>(
        &self,
        renderer: &mut R,
        name: &str,
        display_value: f32,
    ) -> OperationResult
    where
        R: BlendShapeTarget + ?Sized,
    {
        match self.try_apply_extended_value(renderer, name, display_value) {
            Ok(weight) => {
                OperationResult::ok(format!("Set '{name}' to {display_value} (weight {weight})"))
            }
            Err(err) => {
                warn!("set extended value failed: {}", err);
                OperationResult::failure(err.to_string())
            }
        }
    }

    /// Metadata of an extended channel on the renderer's current mesh
    pub fn extended_info<R>(&self, renderer: &R, name: &str) -> Option<ExtendedShapeKeyInfo>
    where
        R: BlendShapeTarget + ?Sized,
    {
        let mesh = renderer.shared_mesh()?;
        self.registry.get(mesh.id(), name)
    }

    fn try_create_extended<R>(
        &self,
        renderer: &mut R,
        original_name: &str,
        extended_name: &str,
        min_value: i32,
        max_value: i32,
    ) -> ShapeKeyResult<String>
    where
        R: BlendShapeTarget + ?Sized,
    {
        let source = source_mesh(renderer)?;
        if min_value >= max_value {
            return Err(ShapeKeyError::InvalidArgument(format!(
                "minimum {min_value} must be less than maximum {max_value}"
            )));
        }

        let frames = MeshChannelStore::new(&source).frames_of(original_name)?;
        let scale = synth::scale_factor(min_value, max_value);
        let derived = synth::derive_scaled(frames, scale);
        let rebuilt =
            rebuild::insert_channel_after(&source, original_name, extended_name, derived)?;

        let id = rebuilt.id();
        self.publish(renderer, &source, rebuilt);
        self.registry.register(
            id,
            extended_name,
            ExtendedShapeKeyInfo::new(original_name, min_value, max_value),
        );

        Ok(format!(
            "Created '{extended_name}' from '{original_name}' (range {min_value} to {max_value})"
        ))
    }

    fn try_remove_many<R, S>(&self, renderer: &mut R, names: &[S]) -> ShapeKeyResult<String>
    where
        R: BlendShapeTarget + ?Sized,
        S: AsRef<str>,
    {
        let source = source_mesh(renderer)?;
        let rebuilt = rebuild::remove_channels(&source, names)?;
        let removed = source.channel_count() - rebuilt.channel_count();
        self.publish(renderer, &source, rebuilt);
        Ok(format!("Removed {removed} blend shape(s)"))
    }

    fn try_merge<R>(
        &self,
        renderer: &mut R,
        new_name: &str,
        weights: &IndexMap<String, f32>,
    ) -> ShapeKeyResult<String>
    where
        R: BlendShapeTarget + ?Sized,
    {
        let source = source_mesh(renderer)?;
        let rebuilt = rebuild::merge_weighted(&source, new_name, weights)?;
        let store = MeshChannelStore::new(&source);
        let merged = weights.keys().filter(|name| store.contains(name)).count();
        self.publish(renderer, &source, rebuilt);
        Ok(format!("Merged {merged} blend shape(s) into '{new_name}'"))
    }

    fn try_rename<R>(
        &self,
        renderer: &mut R,
        old_name: &str,
        new_name: &str,
    ) -> ShapeKeyResult<String>
    where
        R: BlendShapeTarget + ?Sized,
    {
        let source = source_mesh(renderer)?;
        let index = MeshChannelStore::new(&source).require_channel_index(old_name)?;
        let weight = renderer.blend_shape_weight(index).unwrap_or(0.0);

        let rebuilt = rebuild::rename_channel(&source, old_name, new_name)?;
        let info = self.registry.get(source.id(), old_name);
        let id = rebuilt.id();
        self.publish(renderer, &source, rebuilt);

        renderer.set_blend_shape_weight(index, weight);
        if let Some(info) = info {
            self.registry.register(id, new_name, info);
        }
        Ok(format!("Renamed '{old_name}' to '{new_name}'"))
    }

    fn try_apply_extended_value<R>(
        &self,
        renderer: &mut R,
        name: &str,
        display_value: f32,
    ) -> ShapeKeyResult<f32>
    where
        R: BlendShapeTarget + ?Sized,
    {
        let mesh = source_mesh(renderer)?;
        let index = MeshChannelStore::new(&mesh).require_channel_index(name)?;
        let info = self.registry.get(mesh.id(), name).ok_or_else(|| {
            ShapeKeyError::InvalidArgument(format!("'{name}' is not an extended shape key"))
        })?;

        let weight = info.to_normalized(display_value);
        renderer.set_blend_shape_weight(index, weight);
        Ok(weight)
    }

    /// Swap `rebuilt` into the renderer. Live weights follow their channel
    /// name; channels new to the mesh start at zero. Extended-key records
    /// move to the new mesh, and the source's records are dropped once the
    /// renderer was its last holder.
    fn publish<R>(&self, renderer: &mut R, source: &Arc<Mesh>, rebuilt: Mesh)
    where
        R: BlendShapeTarget + ?Sized,
    {
        let weights: AHashMap<&str, f32> = source
            .channel_names()
            .enumerate()
            .filter_map(|(i, name)| renderer.blend_shape_weight(i).map(|w| (name, w)))
            .collect();

        self.registry.carry_over(source.id(), &rebuilt);
        // The renderer and `source` are the only holders
        if Arc::strong_count(source) == 2 {
            self.registry.forget(source.id());
        }

        let rebuilt = Arc::new(rebuilt);
        renderer.assign_mesh(Arc::clone(&rebuilt));
        for (index, name) in rebuilt.channel_names().enumerate() {
            let weight = weights.get(name).copied().unwrap_or(0.0);
            renderer.set_blend_shape_weight(index, weight);
        }
    }
}

fn source_mesh<R>(renderer: &R) -> ShapeKeyResult<Arc<Mesh>>
where
    R: BlendShapeTarget + ?Sized,
{
    renderer.shared_mesh().cloned().ok_or_else(no_mesh)
}

fn no_mesh() -> ShapeKeyError {
    ShapeKeyError::InvalidArgument("renderer has no mesh assigned".to_string())
}

fn report(operation: &str, result: ShapeKeyResult<String>) -> OperationResult {
    match &result {
        Ok(message) => info!("{}", message),
        Err(err) => warn!("{} failed: {}", operation, err),
    }
    result.into()
}
