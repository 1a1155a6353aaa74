//! XPBD vertex-triangle distance constraint.
//!
//! For an exact pair `(p; x0, x1, x2)` with closest point
//! `q = Σ bᵢ xᵢ` and face normal `n` oriented towards the vertex:
//!
//! ```text
//! C   = n · (p - q) - d                      (violated when C < 0)
//! w   = w_p + Σ bᵢ² wᵢ
//! Δλ  = -C / (w + α / Δt²)
//! p  += w_p Δλ n
//! xᵢ -= wᵢ bᵢ Δλ n
//! ```
//!
//! The vertex side is taken from the start-of-substep positions, so a
//! vertex that crossed the face during the substep is pushed back to
//! where it came from.

use tessel_math::proximity::{closest_point_on_triangle, triangle_normal};
use tessel_math::Vec3;
use tessel_solver::SimulationState;
use tessel_types::{TesselError, TesselResult};

use crate::contact::ExactPair;
use crate::response::{ContactResponse, ContactResult};

/// XPBD projection of vertex-triangle separation constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpbdCollisionResponse {
    /// Target separation `d` (meters).
    pub thickness: f32,
    /// Compliance `α` (inverse stiffness); 0.0 is rigid.
    pub compliance: f32,
}

impl XpbdCollisionResponse {
    pub fn new(thickness: f32, compliance: f32) -> Self {
        Self {
            thickness,
            compliance,
        }
    }
}

impl ContactResponse for XpbdCollisionResponse {
    fn resolve(
        &self,
        contacts: &[ExactPair],
        state: &mut SimulationState,
        dt: f32,
    ) -> TesselResult<ContactResult> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(TesselError::InvalidConfig(format!(
                "substep dt must be positive, got {dt}"
            )));
        }
        let alpha_tilde = self.compliance / (dt * dt);
        let mut result = ContactResult::default();

        for contact in contacts {
            let v = contact.vertex as usize;
            let face = contact.face.map(|i| i as usize);
            if v >= state.vertex_count || face.iter().any(|&i| i >= state.vertex_count) {
                return Err(TesselError::InvalidMesh(format!(
                    "contact {contact:?} references a vertex outside the state"
                )));
            }

            let p = state.position(v);
            let [a, b, c] = face.map(|i| state.position(i));
            let Some(mut normal) = triangle_normal(a, b, c) else {
                continue;
            };
            let projection = closest_point_on_triangle(p, a, b, c);
            let bary = projection.barycentric;

            // Orient the normal towards the side the vertex started on.
            let prev = |i: usize| Vec3::new(state.prev_x[i], state.prev_y[i], state.prev_z[i]);
            let prev_q = prev(face[0]) * bary[0] + prev(face[1]) * bary[1] + prev(face[2]) * bary[2];
            let mut side = normal.dot(prev(v) - prev_q);
            if side == 0.0 {
                side = normal.dot(p - projection.point);
            }
            if side < 0.0 {
                normal = -normal;
            }

            let constraint = normal.dot(p - projection.point) - self.thickness;
            if constraint >= 0.0 {
                continue;
            }
            result.max_penetration = result.max_penetration.max(-constraint);

            let w_p = state.inv_mass[v];
            let w_face = face.map(|i| state.inv_mass[i]);
            let w = w_p
                + bary[0] * bary[0] * w_face[0]
                + bary[1] * bary[1] * w_face[1]
                + bary[2] * bary[2] * w_face[2];
            if w <= 0.0 {
                continue;
            }
            let delta_lambda = -constraint / (w + alpha_tilde);

            let correction = normal * (w_p * delta_lambda);
            state.set_position(v, p + correction);
            let mut moved = correction.length();
            for k in 0..3 {
                let dx = normal * (w_face[k] * bary[k] * delta_lambda);
                let x = state.position(face[k]);
                state.set_position(face[k], x - dx);
                moved += dx.length();
            }

            result.total_correction += moved;
            result.resolved_count += 1;
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "xpbd_collision_response"
    }
}
