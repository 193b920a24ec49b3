//! Left/right paired gallop.

use skitter_core::config::Gait;

use crate::status::LegStatus;
use crate::topology::LegTopology;
use crate::walk::WalkPolicy;
use crate::GaitContext;

/// Gallop step policy.
///
/// Each left/right pair has a primary leg that steps once it leaves its
/// trigger zone, and a secondary leg that trails the primary by a short
/// delay. Below `min_speed` the walk rules apply instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GallopPolicy {
    pub walk: WalkPolicy,
    /// Ticks a diagonal neighbour blocks a primary leg after it begins a step.
    pub vertical_cooldown: u32,
    /// Ticks a secondary leg trails its primary.
    pub horizontal_cooldown: u32,
    pub min_speed: f64,
}

impl GallopPolicy {
    pub const fn from_gait(gait: &Gait) -> Self {
        Self {
            walk: WalkPolicy::from_gait(gait),
            vertical_cooldown: gait.gallop_vertical_cooldown,
            horizontal_cooldown: gait.gallop_horizontal_cooldown,
            min_speed: gait.gallop_min_speed,
        }
    }

    pub fn can_move_leg<L: LegStatus>(
        &self,
        legs: &[L],
        leg: usize,
        topology: &LegTopology,
        context: &GaitContext,
    ) -> bool {
        if context.speed < self.min_speed {
            return self.walk.can_move_leg(legs, leg, topology, context);
        }
        let Some(this) = legs.get(leg) else {
            return false;
        };
        if this.is_moving() {
            return false;
        }
        if !this.target_grounded() {
            return true;
        }

        if this.is_primary() {
            return this.outside_trigger_zone()
                && !this.at_target()
                && topology
                    .diagonal(leg)
                    .into_iter()
                    .all(|other| legs[other].time_since_begin_move() >= self.vertical_cooldown);
        }

        let Some(pair) = topology.horizontal(leg).map(|h| &legs[h]) else {
            return false;
        };
        pair.is_primary()
            && pair.is_moving()
            && pair.time_since_begin_move() > self.horizontal_cooldown
            && !this.at_target()
    }
}

/// Gallop roles for this tick.
///
/// The left leg of each pair leads unless the opposite leg has lost its
/// footing, in which case the leg that still has footing leads. Unpaired
/// legs always lead.
pub fn assign_primaries<L: LegStatus>(legs: &[L], topology: &LegTopology) -> Vec<bool> {
    (0..legs.len())
        .map(|leg| match topology.horizontal(leg) {
            None => true,
            Some(pair) => {
                if !legs[pair].has_footing() {
                    true
                } else if !legs[leg].has_footing() {
                    false
                } else {
                    LegTopology::is_left(leg)
                }
            }
        })
        .collect()
}
