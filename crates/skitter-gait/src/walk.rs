//! Diagonal-alternation walk.

use skitter_core::config::Gait;

use crate::status::LegStatus;
use crate::topology::LegTopology;
use crate::GaitContext;

/// Walk step policy.
///
/// A leg with no ground target may always step. Otherwise it must be
/// motivated to step, its adjacent legs must be planted, its diagonal
/// partners must be past the cooldown, and some other leg (or the body
/// itself) must be bearing weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkPolicy {
    /// Ticks a diagonal partner blocks this leg after it begins a step.
    pub cooldown: u32,
}

impl WalkPolicy {
    pub const fn new(cooldown: u32) -> Self {
        Self { cooldown }
    }

    pub const fn from_gait(gait: &Gait) -> Self {
        Self::new(gait.walk_cooldown)
    }

    pub fn can_move_leg<L: LegStatus>(
        &self,
        legs: &[L],
        leg: usize,
        topology: &LegTopology,
        context: &GaitContext,
    ) -> bool {
        let Some(this) = legs.get(leg) else {
            return false;
        };
        if this.is_moving() {
            return false;
        }
        if !this.target_grounded() {
            return true;
        }

        let adjacent_stepping = topology.adjacent(leg).into_iter().any(|other| {
            let other = &legs[other];
            other.is_moving() && other.has_footing()
        });
        if adjacent_stepping {
            return false;
        }

        let diagonal_cooling = topology
            .diagonal(leg)
            .into_iter()
            .any(|other| legs[other].time_since_begin_move() < self.cooldown);
        if diagonal_cooling {
            return false;
        }

        if !this.wants_to_move() {
            return false;
        }

        context.body_on_ground
            || legs
                .iter()
                .enumerate()
                .any(|(i, other)| i != leg && other.is_grounded())
    }
}
