//! Per-leg state machine.
//!
//! Each tick a leg runs, in order:
//!
//! 1. [`Leg::update_memo`]: rest, look-ahead and scan geometry plus zones.
//! 2. [`Leg::update_target`]: ground scan and target selection.
//! 3. [`Leg::follow_body`]: an idle airborne foot rides along with the body
//!    and snaps to ground on contact.
//! 4. [`Leg::begin_move`], when the gait policy allows it.
//! 5. [`Leg::advance_step`]: a stepping foot arcs toward its target.
//! 6. [`Leg::solve_chain`]: the kinematic chain reaches for the foot.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use skitter_core::config::{Gait, LegPlan};
use skitter_core::geometry::{
    EPSILON, SplitDistanceZone, down, flatten, horizontal_distance, lerp, move_towards,
    normalize_or, rotate_about, up, yaw_rotation,
};
use skitter_core::traits::GroundQuery;
use skitter_core::types::SpiderEvent;
use skitter_gait::LegStatus;
use skitter_ik::KinematicChain;

/// Distance from the target below which a step is complete.
const STEP_COMPLETE_DISTANCE: f64 = 1e-4;

/// Squared distance from the target within which a foot counts as on it.
const AT_TARGET_DISTANCE_SQ: f64 = 0.01;

/// Half-height of the probe that snaps an idle airborne foot to ground.
const GROUND_SNAP_DISTANCE: f64 = 0.1;

/// Offsets, in scan cells, of the fallback candidate rays.
const CANDIDATE_OFFSETS: [(f64, f64); 8] = [
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 1.0),
    (0.0, 1.0),
    (1.0, 1.0),
];

// ---------------------------------------------------------------------------
// BodyFrame
// ---------------------------------------------------------------------------

/// Body pose and motion for the current tick, as seen by its legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFrame {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    /// Actual displacement this tick, after collision.
    pub displacement: Vector3<f64>,
    pub yaw: f64,
    pub yaw_velocity: f64,
    /// Full orientation (yaw, pitch, roll).
    pub orientation: UnitQuaternion<f64>,
}

impl BodyFrame {
    /// A body at rest.
    pub fn at_rest(position: Vector3<f64>, yaw: f64) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            displacement: Vector3::zeros(),
            yaw,
            yaw_velocity: 0.0,
            orientation: yaw_rotation(yaw),
        }
    }
}

// ---------------------------------------------------------------------------
// LegTarget
// ---------------------------------------------------------------------------

/// Where a leg is trying to put its foot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegTarget {
    pub position: Vector3<f64>,
    /// Whether `position` is a ground foothold.
    pub is_grounded: bool,
}

impl LegTarget {
    pub const fn grounded(position: Vector3<f64>) -> Self {
        Self {
            position,
            is_grounded: true,
        }
    }

    pub const fn airborne(position: Vector3<f64>) -> Self {
        Self {
            position,
            is_grounded: false,
        }
    }
}

/// Coarse leg state, derived from the leg's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegState {
    Grounded,
    Moving,
    /// No valid ground target.
    Stranded,
    Disabled,
    /// Idle in the air with a ground target it has not stepped to yet.
    Airborne,
}

/// Per-leg input to the body stabilizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegContact {
    pub foot: Vector3<f64>,
    pub target: Vector3<f64>,
    pub grounded: bool,
}

// ---------------------------------------------------------------------------
// Leg
// ---------------------------------------------------------------------------

/// Runtime state of one leg.
#[derive(Debug, Clone)]
pub struct Leg {
    index: usize,
    plan: LegPlan,
    chain: KinematicChain,

    attachment_position: Vector3<f64>,
    rest_position: Vector3<f64>,
    look_ahead_position: Vector3<f64>,
    scan_start: Vector3<f64>,
    scan_vector: Vector3<f64>,
    /// Horizontal unit direction of travel, or zero when still.
    heading: Vector3<f64>,
    trigger_zone: SplitDistanceZone,
    comfort_zone: SplitDistanceZone,

    end_effector: Vector3<f64>,
    target: LegTarget,
    last_ground_y: f64,

    touching_ground: bool,
    is_moving: bool,
    is_disabled: bool,
    is_primary: bool,
    time_since_begin_move: u32,
    time_since_stop_move: u32,
}

impl Leg {
    /// Build a leg standing at its rest position under `frame`.
    pub fn new(index: usize, plan: &LegPlan, frame: &BodyFrame, gait: &Gait) -> Self {
        let attachment_position = frame.position + frame.orientation * plan.attachment;
        let rest_position = frame.position + yaw_rotation(frame.yaw) * plan.rest;

        let mut chain = KinematicChain::new(attachment_position, knee_bend_pose(plan));
        chain.straighten_direction(&frame.orientation);

        let trigger = gait.trigger_zone(0.0);
        Self {
            index,
            plan: plan.clone(),
            chain,
            attachment_position,
            rest_position,
            look_ahead_position: rest_position,
            scan_start: rest_position + up() * gait.scan_height,
            scan_vector: down() * (gait.scan_height + gait.scan_depth),
            heading: Vector3::zeros(),
            trigger_zone: SplitDistanceZone::new(rest_position, trigger),
            comfort_zone: SplitDistanceZone::new(rest_position, gait.comfort_zone),
            end_effector: rest_position,
            target: LegTarget::airborne(rest_position),
            last_ground_y: rest_position.y,
            touching_ground: false,
            is_moving: false,
            is_disabled: false,
            is_primary: false,
            time_since_begin_move: u32::MAX,
            time_since_stop_move: u32::MAX,
        }
    }

    // ---- accessors ----

    pub const fn index(&self) -> usize {
        self.index
    }

    pub const fn plan(&self) -> &LegPlan {
        &self.plan
    }

    pub const fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    pub const fn end_effector(&self) -> Vector3<f64> {
        self.end_effector
    }

    pub const fn target(&self) -> &LegTarget {
        &self.target
    }

    pub const fn attachment_position(&self) -> Vector3<f64> {
        self.attachment_position
    }

    pub const fn rest_position(&self) -> Vector3<f64> {
        self.rest_position
    }

    pub const fn look_ahead_position(&self) -> Vector3<f64> {
        self.look_ahead_position
    }

    /// Scan ray origin and full ray vector.
    pub const fn scan_ray(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.scan_start, self.scan_vector)
    }

    pub const fn trigger_zone(&self) -> &SplitDistanceZone {
        &self.trigger_zone
    }

    pub const fn comfort_zone(&self) -> &SplitDistanceZone {
        &self.comfort_zone
    }

    pub const fn time_since_stop_move(&self) -> u32 {
        self.time_since_stop_move
    }

    /// No ground target and not parked by command.
    pub const fn is_stranded(&self) -> bool {
        !self.target.is_grounded && !self.is_disabled
    }

    /// Foot outside its comfort zone.
    pub fn is_uncomfortable(&self) -> bool {
        !self.comfort_zone.contains(&self.end_effector)
    }

    pub fn state(&self) -> LegState {
        if self.is_disabled {
            LegState::Disabled
        } else if self.is_moving {
            LegState::Moving
        } else if !self.target.is_grounded {
            LegState::Stranded
        } else if self.touching_ground {
            LegState::Grounded
        } else {
            LegState::Airborne
        }
    }

    pub fn contact(&self) -> LegContact {
        LegContact {
            foot: self.end_effector,
            target: self.target.position,
            grounded: self.is_grounded(),
        }
    }

    // ---- commands ----

    pub fn set_disabled(&mut self, disabled: bool) {
        self.is_disabled = disabled;
    }

    pub fn set_primary(&mut self, primary: bool) {
        self.is_primary = primary;
    }

    /// Start a step toward the current target.
    pub fn begin_move(&mut self) {
        self.is_moving = true;
        self.touching_ground = false;
        self.time_since_begin_move = 0;
    }

    // ---- per-tick passes ----

    /// Advance the begin/stop counters by one tick.
    pub fn tick_counters(&mut self) {
        self.time_since_begin_move = self.time_since_begin_move.saturating_add(1);
        self.time_since_stop_move = self.time_since_stop_move.saturating_add(1);
    }

    /// Recompute rest, look-ahead and scan geometry and both zones.
    pub fn update_memo(&mut self, frame: &BodyFrame, gait: &Gait, speed_fraction: f64) {
        self.attachment_position = frame.position + frame.orientation * self.plan.attachment;

        let lead = yaw_rotation(frame.yaw + frame.yaw_velocity * gait.rotational_lead);
        self.rest_position = frame.position + lead * self.plan.rest;

        let trigger = gait.trigger_zone(speed_fraction);
        self.heading = normalize_or(&flatten(&frame.velocity), &Vector3::zeros());
        self.look_ahead_position =
            self.rest_position + self.heading * trigger.horizontal * speed_fraction;

        self.scan_start = self.look_ahead_position + up() * gait.scan_height;
        self.scan_vector = down() * (gait.scan_height + gait.scan_depth);

        self.trigger_zone = SplitDistanceZone::new(self.rest_position, trigger);
        self.comfort_zone = SplitDistanceZone::new(self.rest_position, gait.comfort_zone);
    }

    /// Scan for a foothold near the look-ahead position.
    ///
    /// The primary ray is accepted when its hit lies within the plausible
    /// band around the look-ahead height. Otherwise the hits of eight
    /// surrounding rays compete, and the one closest to the preferred
    /// position wins. Hits outside the comfort zone never qualify.
    pub fn scan_ground<G: GroundQuery + ?Sized>(&self, ground: &G, gait: &Gait) -> Option<Vector3<f64>> {
        let reach = self.scan_vector.norm();
        let direction = down();
        let cast = |origin: Vector3<f64>| {
            ground
                .raycast(&origin, &direction, reach)
                .map(|hit| hit.position)
                .filter(|p| self.comfort_zone.contains(p))
        };

        let primary = cast(self.scan_start);
        if let Some(hit) = primary
            && (hit.y - self.look_ahead_position.y).abs() <= gait.scan_plausible_band
        {
            return Some(hit);
        }

        let preferred = self.preferred_position(ground, gait);
        let cell = gait.scan_cell_size;
        CANDIDATE_OFFSETS
            .iter()
            .filter_map(|&(dx, dz)| cast(self.scan_start + Vector3::new(dx * cell, 0.0, dz * cell)))
            .chain(primary)
            .min_by(|a, b| {
                (a - preferred)
                    .norm_squared()
                    .total_cmp(&(b - preferred).norm_squared())
            })
    }

    /// Look-ahead position, lifted when something solid sits just ahead.
    fn preferred_position<G: GroundQuery + ?Sized>(&self, ground: &G, gait: &Gait) -> Vector3<f64> {
        let probe_origin = self.look_ahead_position + up() * (gait.scan_cell_size * 0.5);
        let blocked = self.heading.norm() > EPSILON
            && ground
                .resolve_collision(&probe_origin, &(self.heading * gait.scan_cell_size))
                .is_some();
        if blocked {
            self.look_ahead_position + up() * gait.obstacle_lift_bias
        } else {
            self.look_ahead_position
        }
    }

    /// Choose this tick's target.
    pub fn update_target<G: GroundQuery + ?Sized>(&mut self, ground: &G, gait: &Gait) {
        if self.is_disabled {
            self.target = LegTarget::airborne(Vector3::new(
                self.rest_position.x,
                self.last_ground_y + gait.disabled_leg_lift,
                self.rest_position.z,
            ));
            return;
        }

        // Scan hits are already limited to the comfort zone. Without one, a
        // grounded target still inside the comfort zone is kept; anything
        // else strands the leg at its look-ahead position.
        self.target = match self.scan_ground(ground, gait) {
            Some(hit) => {
                self.last_ground_y = hit.y;
                LegTarget::grounded(hit)
            }
            None if self.target.is_grounded && self.comfort_zone.contains(&self.target.position) => {
                self.target
            }
            None => LegTarget::airborne(self.look_ahead_position),
        };
    }

    /// Carry an idle airborne foot with the body and snap it to ground.
    pub fn follow_body<G: GroundQuery + ?Sized>(
        &mut self,
        ground: &G,
        frame: &BodyFrame,
        events: &mut Vec<SpiderEvent>,
    ) {
        if self.touching_ground || self.is_moving {
            return;
        }

        let carried = rotate_about(
            &(self.end_effector + frame.displacement),
            &frame.position,
            &yaw_rotation(frame.yaw_velocity),
        );

        let motion = carried - self.end_effector;
        let landed = ground
            .resolve_collision(&self.end_effector, &motion)
            .map(|hit| hit.position)
            .or_else(|| {
                ground
                    .raycast(
                        &(carried + up() * GROUND_SNAP_DISTANCE),
                        &down(),
                        2.0 * GROUND_SNAP_DISTANCE,
                    )
                    .map(|hit| hit.position)
            });

        match landed {
            Some(position) => {
                self.end_effector = position;
                self.last_ground_y = position.y;
                self.land(events);
            }
            None => self.end_effector = carried,
        }
    }

    /// Move a stepping foot one tick toward its target.
    pub fn advance_step(&mut self, gait: &Gait, speed_fraction: f64, events: &mut Vec<SpiderEvent>) {
        if !self.is_moving {
            return;
        }

        let target = self.target.position;
        let mut next = move_towards(&self.end_effector, &target, gait.leg_speed(speed_fraction));
        if horizontal_distance(&next, &target) > gait.leg_drop_distance {
            next.y = lerp(next.y, target.y + gait.leg_lift_height, gait.leg_lift_lerp);
        }
        self.end_effector = next;

        if (self.end_effector - target).norm() < STEP_COMPLETE_DISTANCE {
            self.is_moving = false;
            self.time_since_stop_move = 0;
            if self.target.is_grounded {
                self.last_ground_y = target.y;
                self.land(events);
            }
        }
    }

    fn land(&mut self, events: &mut Vec<SpiderEvent>) {
        if self.touching_ground {
            return;
        }
        self.touching_ground = true;
        trace!(leg = self.index, y = self.end_effector.y, "leg step");
        events.push(SpiderEvent::LegStep {
            leg: self.index,
            position: self.end_effector,
        });
    }

    /// Re-root the chain at the attachment and reach for the foot.
    pub fn solve_chain(&mut self, frame: &BodyFrame, gait: &Gait) {
        self.chain.set_root(self.attachment_position);
        if gait.straighten_stranded_legs && self.is_stranded() {
            self.chain.straighten_direction(&frame.orientation);
        } else {
            self.chain.fabrik(&self.end_effector);
        }
    }
}

impl LegStatus for Leg {
    fn is_moving(&self) -> bool {
        self.is_moving
    }

    fn is_disabled(&self) -> bool {
        self.is_disabled
    }

    fn target_grounded(&self) -> bool {
        self.target.is_grounded
    }

    fn touching_ground(&self) -> bool {
        self.touching_ground
    }

    fn outside_trigger_zone(&self) -> bool {
        !self.trigger_zone.contains(&self.end_effector)
    }

    fn time_since_begin_move(&self) -> u32 {
        self.time_since_begin_move
    }

    fn is_primary(&self) -> bool {
        self.is_primary
    }

    fn at_target(&self) -> bool {
        (self.end_effector - self.target.position).norm_squared() < AT_TARGET_DISTANCE_SQ
    }
}

/// Body-frame rest directions: the first segment rises outward, later
/// segments drop outward toward the foot.
fn knee_bend_pose(plan: &LegPlan) -> impl Iterator<Item = (f64, Vector3<f64>)> + '_ {
    let side = if plan.rest.x >= plan.attachment.x { 1.0 } else { -1.0 };
    let outward = normalize_or(&flatten(&(plan.rest - plan.attachment)), &(Vector3::x() * side));
    plan.segments.iter().enumerate().map(move |(i, segment)| {
        let direction = if i == 0 {
            outward + up()
        } else {
            outward * 0.5 + down()
        };
        (segment.length, direction)
    })
}
