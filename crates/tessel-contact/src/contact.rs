//! Collision pair data types.
//!
//! [`CandidatePair`] is what the broad phase emits; [`ExactPair`] is the
//! vertex-triangle near contact the narrow phase hands to the solver.

use serde::{Deserialize, Serialize};

/// Triangle pair whose inflated AABBs overlap.
///
/// `a != b` always holds. The broad phase emits each unordered pair at
/// most once, with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    pub a: u32,
    pub b: u32,
}

impl CandidatePair {
    /// Device lanes per entry.
    pub const LANES: usize = 2;

    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    pub fn from_lanes(lanes: &[u32]) -> Self {
        Self {
            a: lanes[0],
            b: lanes[1],
        }
    }

    /// The pair with its triangles in ascending order.
    pub fn normalized(self) -> Self {
        if self.a <= self.b {
            self
        } else {
            Self { a: self.b, b: self.a }
        }
    }
}

/// A vertex within `collision_minimal_dist` of a triangle it does not
/// belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExactPair {
    pub vertex: u32,
    /// Vertex indices of the face, in mesh winding order.
    pub face: [u32; 3],
}

impl ExactPair {
    /// Device lanes per entry.
    pub const LANES: usize = 4;

    pub fn new(vertex: u32, face: [u32; 3]) -> Self {
        Self { vertex, face }
    }

    pub fn from_lanes(lanes: &[u32]) -> Self {
        Self {
            vertex: lanes[0],
            face: [lanes[1], lanes[2], lanes[3]],
        }
    }

    pub fn to_lanes(&self) -> [u32; 4] {
        [self.vertex, self.face[0], self.face[1], self.face[2]]
    }
}
