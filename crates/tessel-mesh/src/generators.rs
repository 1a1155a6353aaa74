//! Procedural mesh generators for collision scenarios and tests.
//!
//! All generators are deterministic: the same arguments (and seed)
//! always produce bitwise-identical meshes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessel_math::Vec3;

use crate::mesh::TriangleMesh;

/// Generates a flat rectangular quad grid in the XY plane.
///
/// The grid spans `[-width/2, width/2]` in X and `[-height/2, height/2]` in Y,
/// centered at the origin at Z=0.
///
/// # Example
/// ```
/// use tessel_mesh::generators::quad_grid;
/// let mesh = quad_grid(2, 2, 1.0, 1.0);
/// assert_eq!(mesh.vertex_count(), 9);  // 3×3 vertices
/// assert_eq!(mesh.triangle_count(), 8); // 2×2 quads × 2 tris each
/// ```
pub fn quad_grid(cols: usize, rows: usize, width: f32, height: f32) -> TriangleMesh {
    let verts_x = cols + 1;
    let verts_y = rows + 1;
    let mut mesh = TriangleMesh::with_capacity(verts_x * verts_y, cols * rows * 2);

    let half_w = width / 2.0;
    let half_h = height / 2.0;

    for j in 0..verts_y {
        for i in 0..verts_x {
            let u = i as f32 / cols as f32;
            let v = j as f32 / rows as f32;
            mesh.push_vertex(Vec3::new(-half_w + u * width, half_h - v * height, 0.0));
        }
    }

    for j in 0..rows {
        for i in 0..cols {
            let top_left = (j * verts_x + i) as u32;
            let top_right = top_left + 1;
            let bot_left = top_left + verts_x as u32;
            let bot_right = bot_left + 1;

            mesh.push_triangle([top_left, bot_left, top_right]);
            mesh.push_triangle([top_right, bot_left, bot_right]);
        }
    }

    mesh
}

/// Generates a UV sphere centered at the origin.
///
/// # Arguments
/// - `radius`: Sphere radius in meters.
/// - `stacks`: Number of horizontal slices (latitude divisions).
/// - `slices`: Number of vertical slices (longitude divisions).
pub fn uv_sphere(radius: f32, stacks: usize, slices: usize) -> TriangleMesh {
    let mut mesh = TriangleMesh::with_capacity((stacks + 1) * (slices + 1), stacks * slices * 2);

    for i in 0..=stacks {
        let phi = std::f32::consts::PI * i as f32 / stacks as f32;
        for j in 0..=slices {
            let theta = 2.0 * std::f32::consts::PI * j as f32 / slices as f32;
            mesh.push_vertex(Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            ));
        }
    }

    for i in 0..stacks {
        for j in 0..slices {
            let a = (i * (slices + 1) + j) as u32;
            let b = a + (slices + 1) as u32;

            // Skip degenerate triangles at poles
            if i != 0 {
                mesh.push_triangle([a, b, a + 1]);
            }
            if i != stacks - 1 {
                mesh.push_triangle([a + 1, b, b + 1]);
            }
        }
    }

    mesh
}

/// Generates `count` independent triangles scattered in a cube.
///
/// Triangle centers are uniform in `[-extent, extent]^3`; each corner is
/// offset from its center by up to `size` per axis. Vertices are never
/// shared, so every triangle owns three consecutive vertex indices.
pub fn random_triangle_soup(count: usize, extent: f32, size: f32, seed: u64) -> TriangleMesh {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut mesh = TriangleMesh::with_capacity(count * 3, count);

    for _ in 0..count {
        let center = Vec3::new(
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
        );
        let mut corner = || {
            center
                + Vec3::new(
                    rng.gen_range(-size..=size),
                    rng.gen_range(-size..=size),
                    rng.gen_range(-size..=size),
                )
        };
        let a = mesh.push_vertex(corner());
        let b = mesh.push_vertex(corner());
        let c = mesh.push_vertex(corner());
        mesh.push_triangle([a, b, c]);
    }

    mesh
}

/// Two stacked copies of a quad grid separated by `gap` along Z, as if
/// the sheet had been folded flat onto itself.
pub fn folded_sheet(cols: usize, rows: usize, size: f32, gap: f32) -> TriangleMesh {
    let mut mesh = quad_grid(cols, rows, size, size);
    let mut upper = quad_grid(cols, rows, size, size);
    upper.translate(Vec3::new(0.0, 0.0, gap));
    mesh.append(&upper);
    mesh
}

/// `count` triangles whose corners all sit on the same `point`.
///
/// Every triangle has three distinct vertex indices, so the mesh is
/// topologically valid while being geometrically fully degenerate.
pub fn coincident_cluster(count: usize, point: Vec3) -> TriangleMesh {
    let mut mesh = TriangleMesh::with_capacity(count * 3, count);
    for _ in 0..count {
        let a = mesh.push_vertex(point);
        let b = mesh.push_vertex(point);
        let c = mesh.push_vertex(point);
        mesh.push_triangle([a, b, c]);
    }
    mesh
}

/// A single unit right triangle in the XY plane, lifted to `z`, shifted by `x`.
pub fn unit_triangle(x: f32, z: f32) -> TriangleMesh {
    let mut mesh = TriangleMesh::with_capacity(3, 1);
    let a = mesh.push_vertex(Vec3::new(x, 0.0, z));
    let b = mesh.push_vertex(Vec3::new(x + 1.0, 0.0, z));
    let c = mesh.push_vertex(Vec3::new(x, 1.0, z));
    mesh.push_triangle([a, b, c]);
    mesh
}
