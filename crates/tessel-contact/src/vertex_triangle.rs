//! Vertex-triangle proximity test.
//!
//! For a candidate pair of triangles, tests every vertex of one against
//! the other and vice versa. A vertex shared by both triangles is
//! skipped: it touches the other triangle by construction.

use tessel_math::proximity::{closest_point_on_triangle, triangle_normal, TriangleProjection};
use tessel_math::Vec3;

use crate::contact::{CandidatePair, ExactPair};
use crate::device_mesh::DeviceMesh;

/// Closest point of `p` on triangle `corners` if it is closer than
/// `threshold`. Degenerate triangles never produce a contact.
#[inline]
pub fn point_triangle_proximity(
    p: Vec3,
    corners: [Vec3; 3],
    threshold: f32,
) -> Option<TriangleProjection> {
    let [a, b, c] = corners;
    triangle_normal(a, b, c)?;
    let projection = closest_point_on_triangle(p, a, b, c);
    (projection.distance(p) < threshold).then_some(projection)
}

/// Calls `emit` for every near vertex-triangle contact within `pair`.
pub fn pair_contacts(
    mesh: &DeviceMesh,
    pair: CandidatePair,
    threshold: f32,
    mut emit: impl FnMut(ExactPair),
) {
    let tri_a = mesh.triangle(pair.a);
    let tri_b = mesh.triangle(pair.b);
    let corners_a = tri_a.map(|v| mesh.position(v));
    let corners_b = tri_b.map(|v| mesh.position(v));

    for (vertices, face, face_corners) in [
        (tri_a, tri_b, corners_b),
        (tri_b, tri_a, corners_a),
    ] {
        for vertex in vertices {
            if face.contains(&vertex) {
                continue;
            }
            if point_triangle_proximity(mesh.position(vertex), face_corners, threshold).is_some() {
                emit(ExactPair::new(vertex, face));
            }
        }
    }
}
