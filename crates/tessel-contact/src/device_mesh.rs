//! Device-resident copy of the simulated mesh.
//!
//! Topology is uploaded once per session; positions are re-uploaded at
//! the start of every detection cycle and are read-only on the device.

use tessel_gpu::StorageBuffer;
use tessel_math::aabb::AABB_LANES;
use tessel_math::{Aabb, Vec3};
use tessel_mesh::TriangleMesh;
use tessel_solver::SimulationState;
use tessel_types::{TesselError, TesselResult};

/// SoA vertex positions and flat triangle indices in storage buffers.
pub struct DeviceMesh {
    vertices: usize,
    triangles: usize,
    pos_x: StorageBuffer<f32>,
    pos_y: StorageBuffer<f32>,
    pos_z: StorageBuffer<f32>,
    indices: StorageBuffer<u32>,
}

impl DeviceMesh {
    pub fn new(mesh: &TriangleMesh) -> Self {
        Self {
            vertices: mesh.vertex_count(),
            triangles: mesh.triangle_count(),
            pos_x: StorageBuffer::from_slice("pos_x", &mesh.pos_x),
            pos_y: StorageBuffer::from_slice("pos_y", &mesh.pos_y),
            pos_z: StorageBuffer::from_slice("pos_z", &mesh.pos_z),
            indices: StorageBuffer::from_slice("indices", &mesh.indices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles
    }

    /// Copies the current positions of `state` to the device.
    pub fn upload(&self, state: &SimulationState) -> TesselResult<()> {
        if state.vertex_count != self.vertices
            || state.pos_x.len() != self.vertices
            || state.pos_y.len() != self.vertices
            || state.pos_z.len() != self.vertices
        {
            return Err(TesselError::InvalidMesh(format!(
                "state has {} vertices, session was built for {}",
                state.vertex_count, self.vertices
            )));
        }
        self.pos_x.write_from(0, &state.pos_x);
        self.pos_y.write_from(0, &state.pos_y);
        self.pos_z.write_from(0, &state.pos_z);
        Ok(())
    }

    #[inline]
    pub fn position(&self, v: u32) -> Vec3 {
        let v = v as usize;
        Vec3::new(self.pos_x.load(v), self.pos_y.load(v), self.pos_z.load(v))
    }

    #[inline]
    pub fn triangle(&self, t: u32) -> [u32; 3] {
        let base = t as usize * 3;
        [
            self.indices.load(base),
            self.indices.load(base + 1),
            self.indices.load(base + 2),
        ]
    }

    /// Corner positions of triangle `t`.
    #[inline]
    pub fn corners(&self, t: u32) -> [Vec3; 3] {
        self.triangle(t).map(|v| self.position(v))
    }
}

/// Reads box `i` from a buffer of [`AABB_LANES`]-wide entries.
#[inline]
pub(crate) fn load_aabb(buffer: &StorageBuffer<f32>, i: usize) -> Aabb {
    let base = i * AABB_LANES;
    Aabb::from_lanes(std::array::from_fn(|k| buffer.load(base + k)))
}

#[inline]
pub(crate) fn store_aabb(buffer: &StorageBuffer<f32>, i: usize, aabb: &Aabb) {
    buffer.write_from(i * AABB_LANES, &aabb.to_lanes());
}

/// Host readback of every box in `buffer`.
pub(crate) fn read_aabbs(buffer: &StorageBuffer<f32>, count: usize) -> Vec<Aabb> {
    (0..count).map(|i| load_aabb(buffer, i)).collect()
}
