//! # tessel-mesh
//!
//! Triangle mesh representation with Structure-of-Arrays (SoA) layout
//! for GPU-friendly memory access patterns.
//!
//! ## Key Types
//!
//! - [`TriangleMesh`]: Positions in contiguous per-axis buffers plus
//!   flat triangle index triples. Topology is static for the lifetime
//!   of a simulated object.
//! - Procedural generators for collision scenarios (quad grids, UV
//!   spheres, seeded triangle soups, folded sheets, coincident clusters).

pub mod generators;
pub mod mesh;

pub use mesh::TriangleMesh;
