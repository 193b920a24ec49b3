//! Forward-And-Backward Reaching Inverse Kinematics (FABRIK).
//!
//! Each iteration pins the end-effector to the target and pulls every joint
//! back toward its successor at the segment length, then re-anchors the
//! first joint at the root and pushes every joint forward again. The forward
//! pass runs last, so segment lengths are exact after every solve even when
//! the target is out of reach.

use nalgebra::Vector3;

use skitter_core::geometry::normalize_or;

use crate::chain::KinematicChain;

/// Configuration for the FABRIK solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FabrikConfig {
    /// Maximum backward/forward iterations per solve.
    pub max_iterations: u32,
    /// End-effector distance from target that counts as reached.
    pub tolerance: f64,
}

impl Default for FabrikConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.01,
        }
    }
}

/// Result of a FABRIK solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FabrikResult {
    /// Whether the end-effector ended within tolerance of the target.
    pub converged: bool,
    /// Number of iterations used.
    pub iterations: u32,
    /// Final end-effector distance from the target.
    pub error: f64,
}

/// FABRIK solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct FabrikSolver {
    config: FabrikConfig,
}

impl FabrikSolver {
    /// Create a new solver with the given configuration.
    pub const fn new(config: FabrikConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FabrikConfig::default())
    }

    pub const fn config(&self) -> &FabrikConfig {
        &self.config
    }

    /// Bend `chain` so its end-effector approaches `target`.
    ///
    /// Joint positions are warm-started from their current values. Failing
    /// to converge is not an error: the chain keeps its best approximation.
    pub fn solve(&self, chain: &mut KinematicChain, target: &Vector3<f64>) -> FabrikResult {
        if chain.is_empty() {
            return FabrikResult {
                converged: false,
                iterations: 0,
                error: (chain.root() - target).norm(),
            };
        }

        for iteration in 0..self.config.max_iterations {
            let error = (chain.end_effector() - target).norm();
            if error < self.config.tolerance {
                return FabrikResult {
                    converged: true,
                    iterations: iteration,
                    error,
                };
            }
            backward_pass(chain, target);
            forward_pass(chain);
        }

        let error = (chain.end_effector() - target).norm();
        FabrikResult {
            converged: error < self.config.tolerance,
            iterations: self.config.max_iterations,
            error,
        }
    }
}

/// Pin the last joint to `target` and pull each earlier joint toward its
/// successor.
fn backward_pass(chain: &mut KinematicChain, target: &Vector3<f64>) {
    let (_, segments) = chain.parts_mut();
    let last = segments.len() - 1;
    segments[last].position = *target;

    for i in (0..last).rev() {
        let next = segments[i + 1].position;
        let length = segments[i + 1].length;
        let fallback = -segments[i + 1].direction;
        let pull = normalize_or(&(segments[i].position - next), &fallback);
        segments[i].position = next + pull * length;
        segments[i + 1].direction = -pull;
    }
}

/// Re-anchor at the root and push each joint out to its segment length.
fn forward_pass(chain: &mut KinematicChain) {
    let (root, segments) = chain.parts_mut();
    let mut previous = root;
    for segment in segments.iter_mut() {
        let direction = normalize_or(&(segment.position - previous), &segment.direction);
        segment.position = previous + direction * segment.length;
        segment.direction = direction;
        previous = segment.position;
    }
}
