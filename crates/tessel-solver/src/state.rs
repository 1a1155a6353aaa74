//! Simulation state: SoA buffers for all per-vertex data.
//!
//! This is the primary mutable data structure during simulation.
//! The integrator and the contact response write these buffers each
//! substep; collision detection only reads positions.

use tessel_math::Vec3;
use tessel_mesh::TriangleMesh;
use tessel_types::{TesselError, TesselResult};

/// SoA simulation state buffers.
///
/// # Layout
///
/// All arrays have length `vertex_count`. Channels are stored contiguously:
/// ```text
/// pos_x: [x0, x1, x2, ...]
/// pos_y: [y0, y1, y2, ...]
/// ...
/// ```
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Number of vertices.
    pub vertex_count: usize,

    // ─── Position (current) ───
    pub pos_x: Vec<f32>,
    pub pos_y: Vec<f32>,
    pub pos_z: Vec<f32>,

    // ─── Velocity ───
    pub vel_x: Vec<f32>,
    pub vel_y: Vec<f32>,
    pub vel_z: Vec<f32>,

    // ─── Previous position (start of the substep) ───
    pub prev_x: Vec<f32>,
    pub prev_y: Vec<f32>,
    pub prev_z: Vec<f32>,

    // ─── Inverse mass (0 = pinned) ───
    pub inv_mass: Vec<f32>,
}

impl SimulationState {
    /// Initialize simulation state from a mesh and per-vertex mass.
    ///
    /// Copies positions from the mesh. Velocities initialized to zero.
    /// Pinned vertices get `inv_mass = 0.0` (infinite mass).
    pub fn from_mesh(mesh: &TriangleMesh, vertex_mass: f32, pinned: &[bool]) -> TesselResult<Self> {
        let n = mesh.vertex_count();

        if pinned.len() != n {
            return Err(TesselError::InvalidMesh(format!(
                "Pinned array length ({}) != vertex count ({})",
                pinned.len(),
                n
            )));
        }
        if !(vertex_mass.is_finite() && vertex_mass > 0.0) {
            return Err(TesselError::InvalidConfig(format!(
                "vertex mass must be positive, got {vertex_mass}"
            )));
        }

        let inv_mass = pinned
            .iter()
            .map(|&p| if p { 0.0 } else { 1.0 / vertex_mass })
            .collect();

        Ok(Self {
            vertex_count: n,
            pos_x: mesh.pos_x.clone(),
            pos_y: mesh.pos_y.clone(),
            pos_z: mesh.pos_z.clone(),
            vel_x: vec![0.0; n],
            vel_y: vec![0.0; n],
            vel_z: vec![0.0; n],
            prev_x: mesh.pos_x.clone(),
            prev_y: mesh.pos_y.clone(),
            prev_z: mesh.pos_z.clone(),
            inv_mass,
        })
    }

    /// Returns the current position of vertex `i`.
    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }

    #[inline]
    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.pos_x[i] = p.x;
        self.pos_y[i] = p.y;
        self.pos_z[i] = p.z;
    }

    #[inline]
    pub fn velocity(&self, i: usize) -> Vec3 {
        Vec3::new(self.vel_x[i], self.vel_y[i], self.vel_z[i])
    }

    /// Explicit prediction: `v += dt * g`, `x += dt * v` for free vertices.
    ///
    /// Saves the pre-step positions first so [`Self::update_velocities`]
    /// can difference against them.
    pub fn predict(&mut self, dt: f32, gravity: [f32; 3]) {
        self.save_previous();
        for i in 0..self.vertex_count {
            if self.inv_mass[i] == 0.0 {
                continue;
            }
            self.vel_x[i] += dt * gravity[0];
            self.vel_y[i] += dt * gravity[1];
            self.vel_z[i] += dt * gravity[2];
            self.pos_x[i] += dt * self.vel_x[i];
            self.pos_y[i] += dt * self.vel_y[i];
            self.pos_z[i] += dt * self.vel_z[i];
        }
    }

    /// Update velocities from position change: v = (p_new - p_old) / dt.
    pub fn update_velocities(&mut self, dt: f32) {
        let inv_dt = 1.0 / dt;
        for i in 0..self.vertex_count {
            self.vel_x[i] = (self.pos_x[i] - self.prev_x[i]) * inv_dt;
            self.vel_y[i] = (self.pos_y[i] - self.prev_y[i]) * inv_dt;
            self.vel_z[i] = (self.pos_z[i] - self.prev_z[i]) * inv_dt;
        }
    }

    /// Save current positions as "previous" for the next substep.
    pub fn save_previous(&mut self) {
        self.prev_x.copy_from_slice(&self.pos_x);
        self.prev_y.copy_from_slice(&self.pos_y);
        self.prev_z.copy_from_slice(&self.pos_z);
    }

    /// Apply velocity damping: v *= (1 - damping).
    pub fn damp_velocities(&mut self, damping: f32) {
        let factor = 1.0 - damping;
        for i in 0..self.vertex_count {
            self.vel_x[i] *= factor;
            self.vel_y[i] *= factor;
            self.vel_z[i] *= factor;
        }
    }

    /// Compute total kinetic energy: 0.5 * Σ m_i * ||v_i||² (free vertices only).
    pub fn kinetic_energy(&self) -> f64 {
        let mut energy = 0.0f64;
        for i in 0..self.vertex_count {
            let w = self.inv_mass[i] as f64;
            if w > 0.0 {
                let v = self.velocity(i);
                energy += 0.5 / w * v.length_squared() as f64;
            }
        }
        energy
    }
}
