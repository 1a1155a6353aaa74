//! # tessel-solver
//!
//! Simulation state management and time-integration parameters.
//!
//! ## Key Types
//!
//! - [`SimulationState`]: SoA buffers for positions, velocities, masses
//! - [`SolverConfig`]: Timestep, substep count, gravity, damping
//!
//! The collision core reads positions from [`SimulationState`] once per
//! detection cycle and never mutates them; contact responses do.

pub mod config;
pub mod state;

pub use config::SolverConfig;
pub use state::SimulationState;
