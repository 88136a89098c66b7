//! Mesh rebuilder
//!
//! Produces new meshes with a transformed channel list. Base geometry is copied
//! unchanged and surviving channels keep their source order and frames. The
//! host mesh has no insert-at-position primitive, so every output is built by
//! appending channels in their final order.

use ahash::AHashSet;
use glam::Vec3;
use indexmap::IndexMap;
use log::{debug, warn};

use shapeforge_core::{BlendShapeChannel, Frame, Mesh, ShapeKeyError, ShapeKeyResult};

use crate::store::MeshChannelStore;

/// Copy `source` and place a new channel right after `after`.
///
/// Fails with `ChannelNotFound` if the anchor is missing and with
/// `DuplicateChannelName` if `new_name` is already taken.
pub fn insert_channel_after(
    source: &Mesh,
    after: &str,
    new_name: &str,
    frames: Vec<Frame>,
) -> ShapeKeyResult<Mesh> {
    let store = MeshChannelStore::new(source);
    let anchor = store.require_channel_index(after)?;
    ensure_absent(&store, new_name)?;

    let mut mesh = empty_copy(source)?;
    let mut pending = Some(frames);
    for (name, channel) in store.channels() {
        copy_channel(&mut mesh, name, channel)?;
        if name == after {
            if let Some(frames) = pending.take() {
                append_channel(&mut mesh, new_name, frames)?;
            }
        }
    }

    debug!(
        "Inserted '{}' at {} in {} ({} channels)",
        new_name,
        anchor + 1,
        mesh.id(),
        mesh.channel_count()
    );
    Ok(mesh)
}

/// Copy `source` without the named channels. Names that are not present are
/// ignored.
pub fn remove_channels<I, S>(source: &Mesh, names: I) -> ShapeKeyResult<Mesh>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: AHashSet<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
    let store = MeshChannelStore::new(source);

    let mut mesh = empty_copy(source)?;
    let mut removed = 0;
    for (name, channel) in store.channels() {
        if names.contains(name) {
            removed += 1;
            continue;
        }
        copy_channel(&mut mesh, name, channel)?;
    }

    debug!(
        "Removed {} of {} requested channels, {} left in {}",
        removed,
        names.len(),
        mesh.channel_count(),
        mesh.id()
    );
    Ok(mesh)
}

/// Copy `source` and append a channel that is the weighted sum of others.
///
/// For every frame index up to the largest frame count among the named
/// channels, deltas are summed as `delta * weight` over the channels that have
/// that frame, and the frame weight is `sum(frame_weight * weight)` divided by
/// the number of contributing channels. Channels with fewer frames simply stop
/// contributing. Names that are not channels of the mesh are skipped.
pub fn merge_weighted(
    source: &Mesh,
    new_name: &str,
    weights: &IndexMap<String, f32>,
) -> ShapeKeyResult<Mesh> {
    if weights.is_empty() {
        return Err(ShapeKeyError::InvalidArgument(
            "no blend shapes selected for merge".to_string(),
        ));
    }

    let store = MeshChannelStore::new(source);
    ensure_absent(&store, new_name)?;

    let mut contributors = Vec::with_capacity(weights.len());
    for (name, &weight) in weights {
        match store.frames_of(name) {
            Ok(frames) => contributors.push((frames, weight)),
            Err(_) => warn!("Blend shape '{}' not found, skipped in merge", name),
        }
    }

    let merged = merge_frames(&contributors, store.vertex_count());
    if merged.is_empty() {
        return Err(ShapeKeyError::InvalidArgument(format!(
            "merge into '{new_name}' produced no frames"
        )));
    }

    let mut mesh = empty_copy(source)?;
    for (name, channel) in store.channels() {
        copy_channel(&mut mesh, name, channel)?;
    }
    let frame_count = merged.len();
    append_channel(&mut mesh, new_name, merged)?;

    debug!(
        "Merged {} channels into '{}' ({} frames) in {}",
        contributors.len(),
        new_name,
        frame_count,
        mesh.id()
    );
    Ok(mesh)
}

/// Copy `source` with one channel renamed in place
pub fn rename_channel(source: &Mesh, old_name: &str, new_name: &str) -> ShapeKeyResult<Mesh> {
    let store = MeshChannelStore::new(source);
    store.require_channel_index(old_name)?;
    if old_name != new_name {
        ensure_absent(&store, new_name)?;
    }

    let mut mesh = empty_copy(source)?;
    for (name, channel) in store.channels() {
        let name = if name == old_name { new_name } else { name };
        copy_channel(&mut mesh, name, channel)?;
    }

    debug!("Renamed '{}' to '{}' in {}", old_name, new_name, mesh.id());
    Ok(mesh)
}

fn merge_frames(contributors: &[(&[Frame], f32)], vertex_count: usize) -> Vec<Frame> {
    let frame_count = contributors
        .iter()
        .map(|(frames, _)| frames.len())
        .max()
        .unwrap_or(0);

    let mut merged = Vec::with_capacity(frame_count);
    for index in 0..frame_count {
        let mut positions = vec![Vec3::ZERO; vertex_count];
        let mut normals = vec![Vec3::ZERO; vertex_count];
        let mut tangents = vec![Vec3::ZERO; vertex_count];
        let mut weight_sum = 0.0;
        let mut valid_shape_count = 0usize;

        for (frames, weight) in contributors {
            let Some(frame) = frames.get(index) else {
                continue;
            };
            accumulate(&mut positions, &frame.delta_positions, *weight);
            accumulate(&mut normals, &frame.delta_normals, *weight);
            accumulate(&mut tangents, &frame.delta_tangents, *weight);
            weight_sum += frame.weight * weight;
            valid_shape_count += 1;
        }

        if valid_shape_count > 0 {
            merged.push(Frame::new(
                weight_sum / valid_shape_count as f32,
                positions,
                normals,
                tangents,
            ));
        }
    }
    merged
}

fn accumulate(target: &mut [Vec3], deltas: &[Vec3], weight: f32) {
    for (sum, delta) in target.iter_mut().zip(deltas) {
        *sum += *delta * weight;
    }
}

fn ensure_absent(store: &MeshChannelStore<'_>, name: &str) -> ShapeKeyResult<()> {
    if store.contains(name) {
        return Err(ShapeKeyError::DuplicateChannelName(name.to_string()));
    }
    Ok(())
}

fn empty_copy(source: &Mesh) -> ShapeKeyResult<Mesh> {
    Mesh::new(source.name(), source.geometry().clone())
}

fn copy_channel(mesh: &mut Mesh, name: &str, channel: &BlendShapeChannel) -> ShapeKeyResult<()> {
    append_channel(mesh, name, channel.frames().to_vec())
}

fn append_channel(mesh: &mut Mesh, name: &str, frames: Vec<Frame>) -> ShapeKeyResult<()> {
    mesh.add_channel(name)?;
    for frame in frames {
        mesh.add_frame(name, frame)?;
    }
    Ok(())
}
