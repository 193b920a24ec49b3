//! Inverse kinematics for skitter legs.
//!
//! Provides a [`KinematicChain`] of fixed-length segments and a
//! Forward-And-Backward Reaching IK ([`FabrikSolver`]) that bends the chain
//! so its last joint reaches a target while every segment keeps its length.
//!
//! # Architecture
//!
//! ```text
//! LegPlan segments ──► KinematicChain ──► FabrikSolver ──► joint positions
//! ```
//!
//! The chain's root is driven from outside every tick (it follows the leg's
//! attachment point on the body). Joint positions are warm-started from the
//! previous solve, so a bent pose persists between ticks.

pub mod chain;
pub mod solver;

pub use chain::{ChainSegment, KinematicChain};
pub use solver::{FabrikConfig, FabrikResult, FabrikSolver};
