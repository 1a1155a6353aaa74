//! # tessel-contact
//!
//! The collision-detection core. Each detection cycle runs, on a
//! [`tessel_gpu::GpuBackend`]:
//!
//! 1. **Bounds**: per-triangle AABBs, parallel reduction to a global bound
//! 2. **Indexing**: 64-bit Morton code of every centroid inside that bound
//! 3. **Sort**: stable 2-bit radix sort of `(code, triangle)` records
//! 4. **Hierarchy**: Karras LBVH over the sorted codes, bottom-up refit
//! 5. **Broad phase**: per-triangle stackful traversal into candidate pairs
//! 6. **Narrow phase**: vertex-triangle proximity into exact pairs
//!
//! Pair buffers have a fixed capacity and drop overflowing appends
//! (reported, never an error). [`CollisionDetector`] owns the session's
//! buffers and orchestrates a cycle; [`XpbdCollisionResponse`] consumes
//! the exact pairs.

pub mod aabb_reduce;
pub mod broad;
pub mod collision_pipeline;
pub mod config;
pub mod contact;
pub mod device_mesh;
pub mod lbvh;
pub mod morton;
pub mod narrow;
pub mod pairs;
pub mod response;
pub mod vertex_triangle;
pub mod xpbd;

pub use aabb_reduce::AabbReducer;
pub use broad::LbvhBroadPhase;
pub use collision_pipeline::{CollisionDetector, DetectionReport};
pub use config::CollisionConfig;
pub use contact::{CandidatePair, ExactPair};
pub use lbvh::{Lbvh, LbvhNode, LbvhSnapshot};
pub use morton::MortonIndexer;
pub use narrow::NarrowPhase;
pub use pairs::{AppendBuffer, AppendCount};
pub use response::{ContactResponse, ContactResult, NullContactResponse};
pub use xpbd::XpbdCollisionResponse;
