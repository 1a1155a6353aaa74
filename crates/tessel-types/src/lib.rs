//! # tessel-types
//!
//! Shared error types and dispatch constants
//! for the tessel collision-detection core.
//!
//! This crate has zero domain logic: it defines the vocabulary
//! that all other tessel crates share.

pub mod constants;
pub mod error;

pub use error::{TesselError, TesselResult};
