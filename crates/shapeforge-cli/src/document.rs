//! Mesh documents
//!
//! JSON file holding a mesh and the live weights of its channels by name.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use shapeforge_core::Mesh;
use shapeforge_ops::{BlendShapeTarget, SkinnedMeshRenderer};

use crate::CliResult;

/// Mesh plus renderer weights
#[derive(Debug, Serialize, Deserialize)]
pub struct MeshDocument {
    pub mesh: Mesh,
    #[serde(default)]
    pub weights: IndexMap<String, f32>,
}

#[derive(Serialize)]
struct DocumentView<'a> {
    mesh: &'a Mesh,
    weights: IndexMap<&'a str, f32>,
}

impl MeshDocument {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let document = Self::from_json(&text)?;
        log::debug!(
            "Loaded {} ({} vertices, {} blend shapes)",
            path.display(),
            document.mesh.vertex_count(),
            document.mesh.channel_count()
        );
        Ok(document)
    }

    /// Parse and validate a document
    pub fn from_json(text: &str) -> CliResult<Self> {
        let document: Self = serde_json::from_str(text)?;
        document.mesh.validate()?;
        Ok(document)
    }

    /// Renderer with this document's mesh and weights. Weights for unknown
    /// channels are dropped.
    pub fn into_renderer(self) -> SkinnedMeshRenderer {
        let mesh = Arc::new(self.mesh);
        let mut renderer = SkinnedMeshRenderer::new(Arc::clone(&mesh));
        for (name, weight) in &self.weights {
            match mesh.channel_index(name) {
                Some(index) => {
                    renderer.set_blend_shape_weight(index, *weight);
                }
                None => log::warn!("Ignoring weight for unknown blend shape '{}'", name),
            }
        }
        renderer
    }
}

/// Serialize a renderer's mesh and weights
pub fn renderer_to_json(renderer: &SkinnedMeshRenderer, pretty: bool) -> CliResult<String> {
    let Some(mesh) = renderer.shared_mesh() else {
        return Err(crate::CliError::Operation("renderer has no mesh assigned".to_string()));
    };

    let weights = mesh
        .channel_names()
        .zip(renderer.weights().iter().copied())
        .collect();
    let view = DocumentView { mesh, weights };

    let text = if pretty {
        serde_json::to_string_pretty(&view)?
    } else {
        serde_json::to_string(&view)?
    };
    Ok(text)
}

/// Write a renderer's mesh and weights to `path`
pub fn save_renderer(renderer: &SkinnedMeshRenderer, path: &Path, pretty: bool) -> CliResult<()> {
    let text = renderer_to_json(renderer, pretty)?;
    std::fs::write(path, text)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}
