//! Contact response trait.
//!
//! Consumes the exact pairs of the latest detection cycle and moves
//! vertex positions to resolve them.

use tessel_solver::SimulationState;
use tessel_types::TesselResult;

use crate::contact::ExactPair;

/// Result of contact response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactResult {
    /// Constraints that moved at least one vertex.
    pub resolved_count: u32,
    /// Deepest constraint violation before projection (meters).
    pub max_penetration: f32,
    /// Sum of the magnitudes of all position corrections (meters).
    pub total_correction: f32,
}

/// Trait for contact response strategies.
///
/// # Implementations
/// - [`crate::XpbdCollisionResponse`]: XPBD vertex-triangle distance constraint
/// - [`NullContactResponse`]: leaves positions untouched
pub trait ContactResponse: Send {
    /// Resolve `contacts` by modifying vertex positions.
    ///
    /// Called once per solver substep with the substep length `dt`.
    fn resolve(
        &self,
        contacts: &[ExactPair],
        state: &mut SimulationState,
        dt: f32,
    ) -> TesselResult<ContactResult>;

    /// Returns the response strategy name.
    fn name(&self) -> &str;
}

/// No-op contact response for collision-free scenarios.
pub struct NullContactResponse;

impl ContactResponse for NullContactResponse {
    fn resolve(
        &self,
        _contacts: &[ExactPair],
        _state: &mut SimulationState,
        _dt: f32,
    ) -> TesselResult<ContactResult> {
        Ok(ContactResult::default())
    }

    fn name(&self) -> &str {
        "null_contact_response"
    }
}
