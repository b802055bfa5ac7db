use crate::types::{BoundingBox, Mesh};

/// Scan all vertex positions and return the axis-aligned bounding box.
///
/// A mesh without vertices has no box.
pub fn compute_bounding_box(mesh: &Mesh) -> Option<BoundingBox> {
    let mut vertices = mesh.vertices().iter();
    let mut bounds = BoundingBox::from_point(vertices.next()?.to_array());
    for v in vertices {
        bounds.include(v.to_array());
    }
    Some(bounds)
}

/// Translate `mesh` so the centre of `bounds` lands on the origin and return
/// the offset that was applied.
pub fn center_on_origin(mesh: &mut Mesh, bounds: &BoundingBox) -> [f64; 3] {
    let offset = bounds.center().map(|c| -c);
    mesh.translate(offset);
    offset
}
