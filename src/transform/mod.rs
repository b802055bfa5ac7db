pub mod coordinates;

use tracing::debug;

use crate::types::{BoundingBox, Mesh};

use coordinates::{center_on_origin, compute_bounding_box};

/// Outcome of re-centering a mesh.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct NormalizeResult {
    /// Bounds before translation; `None` for a mesh without vertices.
    pub bounds: Option<BoundingBox>,
    /// Offset added to every vertex.
    pub offset: [f64; 3],
}

/// Translate `mesh` so its bounding box is centred on the origin.
///
/// No rescaling, reorientation or vertex merging happens here. An empty mesh
/// is left untouched.
pub fn normalize(mesh: &mut Mesh) -> NormalizeResult {
    let Some(bounds) = compute_bounding_box(mesh) else {
        debug!("Mesh has no vertices, skipping normalization");
        return NormalizeResult {
            bounds: None,
            offset: [0.0; 3],
        };
    };

    let offset = center_on_origin(mesh, &bounds);
    debug!(
        dx = offset[0],
        dy = offset[1],
        dz = offset[2],
        diagonal = bounds.diagonal(),
        "Centered mesh"
    );

    NormalizeResult {
        bounds: Some(bounds),
        offset,
    }
}
