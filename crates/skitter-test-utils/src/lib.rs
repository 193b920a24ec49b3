//! Shared test fixtures and utilities for skitter crates.
//!
//! Provides height-field terrains that implement
//! [`GroundQuery`](skitter_core::traits::GroundQuery), body fixtures that
//! spawn standing on them, and deterministic RNG setup.

pub mod fixtures;
pub mod rng;
pub mod terrain;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{forward_motion, run_ticks, standing_body, standing_quadruped};
pub use rng::seeded_rng;
pub use terrain::{FlatGround, PitGround, StepGround, seeded_pit};
