//! The per-tick body orchestrator.

use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, warn};

use skitter_core::config::{BodyPlan, Gait, GaitKind, SpiderConfig};
use skitter_core::error::ConfigError;
use skitter_core::geometry::{
    EPSILON, flatten, horizontal_length, move_towards, move_towards_scalar, wrap_angle, yaw_of,
};
use skitter_core::traits::GroundQuery;
use skitter_core::types::{DesiredMotion, SpiderEvent};
use skitter_gait::{GaitContext, GaitPolicy, LegStatus, LegTopology, assign_primaries};

use crate::behaviour::Behaviour;
use crate::leg::{BodyFrame, Leg, LegContact};
use crate::snapshot::{BodySnapshot, LegSnapshot};
use crate::stabilizer::{BodyStabilizer, NormalInfo};

/// A legged body and everything it needs between ticks.
///
/// A body owns its legs, its stabilizer state and its event queue. Nothing
/// is shared between bodies: callers tick each body in turn against the
/// same ground.
#[derive(Debug, Clone)]
pub struct SpiderBody {
    body_plan: BodyPlan,
    walk: Gait,
    gallop: Gait,
    /// Legs are rebuilt from `body_plan` at the start of the next tick.
    plan_changed: bool,
    warned_empty: bool,

    legs: Vec<Leg>,
    topology: LegTopology,
    stabilizer: BodyStabilizer,
    normal_info: Option<NormalInfo>,
    /// Support acceleration computed last tick, applied this tick.
    pending_correction: Vector3<f64>,

    position: Vector3<f64>,
    velocity: Vector3<f64>,
    yaw: f64,
    yaw_velocity: f64,
    orientation: UnitQuaternion<f64>,
    on_ground: bool,

    galloping: bool,
    cloaked: bool,
    events: Vec<SpiderEvent>,
    tick: u64,
}

impl SpiderBody {
    /// Spawn a body at `position` facing +Z. The configuration is used as is.
    pub fn new(config: SpiderConfig, position: Vector3<f64>) -> Self {
        let mut body = Self {
            body_plan: config.body_plan,
            walk: config.walk,
            gallop: config.gallop,
            plan_changed: true,
            warned_empty: false,
            legs: Vec::new(),
            topology: LegTopology::new(0),
            stabilizer: BodyStabilizer::new(),
            normal_info: None,
            pending_correction: Vector3::zeros(),
            position,
            velocity: Vector3::zeros(),
            yaw: 0.0,
            yaw_velocity: 0.0,
            orientation: UnitQuaternion::identity(),
            on_ground: false,
            galloping: false,
            cloaked: false,
            events: Vec::new(),
            tick: 0,
        };
        body.rebuild_legs();
        body
    }

    /// Validate `config` and spawn a body.
    pub fn from_config(config: SpiderConfig, position: Vector3<f64>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, position))
    }

    // ---- accessors ----

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub const fn topology(&self) -> &LegTopology {
        &self.topology
    }

    pub const fn body_plan(&self) -> &BodyPlan {
        &self.body_plan
    }

    pub const fn position(&self) -> Vector3<f64> {
        self.position
    }

    pub const fn velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    pub const fn yaw(&self) -> f64 {
        self.yaw
    }

    pub const fn yaw_velocity(&self) -> f64 {
        self.yaw_velocity
    }

    pub const fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    pub const fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub const fn is_cloaked(&self) -> bool {
        self.cloaked
    }

    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Support data from the last tick.
    pub const fn normal_info(&self) -> Option<&NormalInfo> {
        self.normal_info.as_ref()
    }

    /// The gait in effect this tick.
    pub const fn active_gait(&self) -> &Gait {
        if self.galloping { &self.gallop } else { &self.walk }
    }

    pub const fn gait_kind(&self) -> GaitKind {
        self.active_gait().kind
    }

    /// Whether any leg's foot has strayed out of its comfort zone.
    pub fn is_uncomfortable(&self) -> bool {
        self.legs.iter().any(Leg::is_uncomfortable)
    }

    // ---- commands ----

    /// Replace the body plan. Legs are rebuilt on the next tick.
    pub fn set_body_plan(&mut self, plan: BodyPlan) {
        if plan != self.body_plan {
            self.body_plan = plan;
            self.plan_changed = true;
        }
    }

    /// Replace both gaits after validating them.
    pub fn set_gaits(&mut self, walk: Gait, gallop: Gait) -> Result<(), ConfigError> {
        walk.validate()?;
        gallop.validate()?;
        self.walk = walk;
        self.gallop = gallop;
        Ok(())
    }

    pub fn set_gallop(&mut self, galloping: bool) {
        self.galloping = galloping;
    }

    /// Force a leg up (or release it). Returns false for an unknown leg.
    ///
    /// Indices refer to the current body plan; a pending plan change is
    /// applied first so the flag lands on the legs that will tick.
    pub fn set_leg_disabled(&mut self, leg: usize, disabled: bool) -> bool {
        if self.plan_changed {
            self.rebuild_legs();
        }
        self.legs
            .get_mut(leg)
            .map(|l| l.set_disabled(disabled))
            .is_some()
    }

    /// Knock the body by `velocity`.
    pub fn apply_impulse(&mut self, velocity: Vector3<f64>) {
        self.velocity += velocity;
        self.events.push(SpiderEvent::ExternalImpact { velocity });
    }

    pub fn set_cloaked(&mut self, cloaked: bool) {
        if self.cloaked != cloaked {
            self.cloaked = cloaked;
            self.events.push(SpiderEvent::CloakToggled { enabled: cloaked });
        }
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<SpiderEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            tick: self.tick,
            position: self.position,
            velocity: self.velocity,
            orientation: self.orientation,
            yaw: self.yaw,
            on_ground: self.on_ground,
            cloaked: self.cloaked,
            gait: self.gait_kind(),
            legs: self.legs.iter().map(LegSnapshot::from).collect(),
            normal: self.normal_info.clone(),
        }
    }

    // ---- tick ----

    /// Run one tick of a behaviour.
    pub fn tick_behaviour<G: GroundQuery + ?Sized>(&mut self, behaviour: &Behaviour, ground: &G) {
        let motion = behaviour.desired_motion(&self.position, self.active_gait());
        self.tick(&motion, ground);
    }

    /// Advance the body by one tick.
    pub fn tick<G: GroundQuery + ?Sized>(&mut self, motion: &DesiredMotion, ground: &G) {
        self.tick += 1;
        if self.plan_changed {
            self.rebuild_legs();
        }
        if self.legs.is_empty() {
            if !self.warned_empty {
                warn!(tick = self.tick, "body plan has no legs; skipping locomotion");
                self.warned_empty = true;
            }
            return;
        }

        let gait = self.active_gait().clone();

        self.steer(motion, &gait);
        let previous = self.position;
        self.integrate(ground, &gait);

        let contacts = self.contacts();
        self.stabilizer.update_orientation(&contacts, &self.topology, &gait);
        self.orientation = self.stabilizer.orientation(self.yaw);

        let frame = BodyFrame {
            position: self.position,
            velocity: self.velocity,
            displacement: self.position - previous,
            yaw: self.yaw,
            yaw_velocity: self.yaw_velocity,
            orientation: self.orientation,
        };
        let speed = horizontal_length(&self.velocity);
        let speed_fraction = gait.speed_fraction(speed);

        for leg in &mut self.legs {
            leg.tick_counters();
            leg.update_memo(&frame, &gait, speed_fraction);
        }

        for (leg, primary) in assign_primaries(&self.legs, &self.topology)
            .into_iter()
            .enumerate()
        {
            self.legs[leg].set_primary(primary);
        }

        self.step_legs(ground, &frame, &gait, speed, speed_fraction);

        for leg in &mut self.legs {
            leg.solve_chain(&frame, &gait);
        }

        self.stabilize(&gait);
    }

    fn rebuild_legs(&mut self) {
        let frame = BodyFrame::at_rest(self.position, self.yaw);
        let gait = self.active_gait().clone();
        self.legs = self
            .body_plan
            .legs
            .iter()
            .enumerate()
            .map(|(index, plan)| Leg::new(index, plan, &frame, &gait))
            .collect();
        self.topology = LegTopology::new(self.legs.len());
        self.stabilizer.reset();
        self.normal_info = None;
        self.pending_correction = Vector3::zeros();
        self.plan_changed = false;
        self.warned_empty = false;
        debug!(legs = self.legs.len(), "rebuilt legs from body plan");
    }

    /// Approach the desired horizontal velocity and heading.
    fn steer(&mut self, motion: &DesiredMotion, gait: &Gait) {
        let mut wanted = flatten(&motion.target_velocity);
        let wanted_speed = wanted.norm();
        if wanted_speed > gait.max_speed {
            wanted *= gait.max_speed / wanted_speed;
        }
        let horizontal = move_towards(&flatten(&self.velocity), &wanted, gait.acceleration);
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;

        // Fastest rate that can still brake to a stop on the target heading.
        let desired_rate = yaw_of(&motion.target_direction).map_or(0.0, |target| {
            let remaining = wrap_angle(target - self.yaw);
            let braking = (2.0 * gait.rotate_acceleration * remaining.abs()).sqrt();
            braking.min(gait.max_rotate_speed).copysign(remaining)
        });
        self.yaw_velocity =
            move_towards_scalar(self.yaw_velocity, desired_rate, gait.rotate_acceleration);
        if self.is_uncomfortable() {
            let cap = gait.uncomfortable_rotate_speed;
            self.yaw_velocity = self.yaw_velocity.clamp(-cap, cap);
        }
        self.yaw = wrap_angle(self.yaw + self.yaw_velocity);
    }

    /// Drag, gravity, last tick's support, then collision.
    fn integrate<G: GroundQuery + ?Sized>(&mut self, ground: &G, gait: &Gait) {
        self.velocity.y *= 1.0 - gait.air_drag;
        self.velocity.y -= gait.gravity;
        self.velocity += self.pending_correction;
        self.pending_correction = Vector3::zeros();

        let was_on_ground = self.on_ground;
        let Some(hit) = ground.resolve_collision(&self.position, &self.velocity) else {
            self.position += self.velocity;
            self.on_ground = false;
            return;
        };

        self.position = hit.position;
        let impact_speed = -self.velocity.y;
        self.on_ground = hit.offset.y > EPSILON;
        for axis in 0..3 {
            if hit.offset[axis].abs() > EPSILON {
                self.velocity[axis] = 0.0;
            }
        }
        if self.on_ground {
            let keep = 1.0 - gait.ground_drag;
            self.velocity.x *= keep;
            self.velocity.z *= keep;
            if !was_on_ground {
                debug!(speed = impact_speed, "body hit ground");
                self.events.push(SpiderEvent::HitGround {
                    position: self.position,
                    speed: impact_speed,
                });
            }
        }
    }

    /// Per-leg target, motion and step decisions in diagonal-group order.
    fn step_legs<G: GroundQuery + ?Sized>(
        &mut self,
        ground: &G,
        frame: &BodyFrame,
        gait: &Gait,
        speed: f64,
        speed_fraction: f64,
    ) {
        let policy = GaitPolicy::from_gait(gait);
        let context = GaitContext {
            speed,
            body_on_ground: self.on_ground,
        };

        for index in self.topology.update_order() {
            let leg = &mut self.legs[index];
            leg.update_target(ground, gait);
            leg.follow_body(ground, frame, &mut self.events);

            if !self.legs[index].is_moving()
                && policy.can_move_leg(&self.legs, index, &self.topology, &context)
            {
                self.legs[index].begin_move();
            }
            self.legs[index].advance_step(gait, speed_fraction, &mut self.events);
        }
    }

    fn contacts(&self) -> Vec<LegContact> {
        self.legs.iter().map(Leg::contact).collect()
    }

    fn stabilize(&mut self, gait: &Gait) {
        let contacts = self.contacts();
        self.normal_info = self
            .stabilizer
            .support(&contacts, &self.topology, &self.position, gait);
        self.pending_correction = self
            .normal_info
            .as_ref()
            .and_then(|info| {
                self.stabilizer
                    .correction(info, &contacts, &self.position, &self.velocity, gait)
            })
            .unwrap_or_else(Vector3::zeros);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use skitter_core::types::{CollisionHit, RayHit};

    /// Plane at y = 0.
    struct Floor;

    impl GroundQuery for Floor {
        fn raycast(&self, origin: &Vector3<f64>, direction: &Vector3<f64>, max: f64) -> Option<RayHit> {
            if direction.y >= 0.0 || origin.y < 0.0 {
                return None;
            }
            let distance = origin.y / -direction.y;
            (distance <= max).then(|| RayHit::new(origin + direction * distance, distance))
        }

        fn resolve_collision(&self, position: &Vector3<f64>, motion: &Vector3<f64>) -> Option<CollisionHit> {
            let end = position + motion;
            (end.y < 0.0).then(|| {
                let stop = Vector3::new(end.x, 0.0, end.z);
                CollisionHit::new(stop, stop - end)
            })
        }
    }

    fn standing() -> SpiderBody {
        SpiderBody::new(SpiderConfig::default(), Vector3::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn spawns_legs_from_plan() {
        let body = standing();
        assert_eq!(body.legs().len(), 4);
        assert_eq!(body.topology().leg_count(), 4);
        assert_eq!(body.gait_kind(), GaitKind::Walk);
    }

    #[test]
    fn from_config_validates() {
        let config = SpiderConfig {
            tick_rate_hz: -1.0,
            ..SpiderConfig::default()
        };
        assert!(SpiderBody::from_config(config, Vector3::zeros()).is_err());
    }

    #[test]
    fn first_tick_plants_every_foot() {
        let mut body = standing();
        body.tick(&DesiredMotion::still(), &Floor);
        assert!(body.legs().iter().all(LegStatus::touching_ground));
        let steps = body
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SpiderEvent::LegStep { .. }))
            .count();
        assert_eq!(steps, 4);
        assert!(body.normal_info().is_some());
    }

    #[test]
    fn empty_plan_skips_locomotion() {
        let mut body = standing();
        body.set_body_plan(BodyPlan::new(Vec::new()));
        let before = body.position();
        body.tick(&DesiredMotion::still(), &Floor);
        body.tick(&DesiredMotion::still(), &Floor);
        assert!(body.legs().is_empty());
        assert_eq!(body.position(), before);
        assert_eq!(body.tick_count(), 2);
    }

    #[test]
    fn plan_change_rebuilds_lazily() {
        let mut body = standing();
        body.set_body_plan(BodyPlan::hexapod());
        assert_eq!(body.legs().len(), 4);
        body.tick(&DesiredMotion::still(), &Floor);
        assert_eq!(body.legs().len(), 6);
        assert_eq!(body.topology().leg_count(), 6);
    }

    #[test]
    fn set_gaits_rejects_invalid() {
        let mut body = standing();
        let bad = Gait {
            max_speed: 0.0,
            ..Gait::walk()
        };
        assert!(body.set_gaits(bad, Gait::gallop()).is_err());
        assert!(body.set_gaits(Gait::walk(), Gait::gallop()).is_ok());
    }

    #[test]
    fn gallop_switches_active_gait() {
        let mut body = standing();
        body.set_gallop(true);
        assert_eq!(body.gait_kind(), GaitKind::Gallop);
        assert_relative_eq!(body.active_gait().max_speed, Gait::gallop().max_speed);
    }

    #[test]
    fn velocity_respects_acceleration_and_cap() {
        let mut body = standing();
        let motion = DesiredMotion::new(Vector3::new(0.0, 0.0, 5.0), Vector3::zeros());
        let gait = Gait::walk();
        body.tick(&motion, &Floor);
        assert_relative_eq!(body.velocity().z, gait.acceleration, epsilon = 1e-12);
        for _ in 0..30 {
            body.tick(&motion, &Floor);
        }
        assert!((body.velocity().z - gait.max_speed).abs() < 0.03);
    }

    #[test]
    fn yaw_turns_toward_target_direction() {
        let mut body = standing();
        let motion = DesiredMotion::new(Vector3::zeros(), Vector3::x());
        body.tick(&motion, &Floor);
        assert!(body.yaw_velocity() > 0.0);
        assert!(body.yaw_velocity() <= Gait::walk().rotate_acceleration + 1e-12);
    }

    #[test]
    fn impulse_and_cloak_queue_events() {
        let mut body = standing();
        body.apply_impulse(Vector3::new(0.0, 0.5, 0.0));
        body.set_cloaked(true);
        body.set_cloaked(true);
        let events = body.drain_events();
        assert_eq!(
            events,
            vec![
                SpiderEvent::ExternalImpact {
                    velocity: Vector3::new(0.0, 0.5, 0.0)
                },
                SpiderEvent::CloakToggled { enabled: true },
            ]
        );
        assert!(body.drain_events().is_empty());
        assert!(body.is_cloaked());
    }

    #[test]
    fn falling_body_hits_ground_once() {
        let mut body = SpiderBody::new(SpiderConfig::default(), Vector3::new(0.0, 3.0, 0.0));
        // Disabled legs bear no weight.
        for leg in 0..4 {
            body.set_leg_disabled(leg, true);
        }
        for _ in 0..40 {
            body.tick(&DesiredMotion::still(), &Floor);
        }
        let hits = body
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SpiderEvent::HitGround { .. }))
            .count();
        assert_eq!(hits, 1);
        assert!(body.on_ground());
        assert_relative_eq!(body.position().y, 0.0);
    }

    #[test]
    fn disable_unknown_leg_is_reported() {
        let mut body = standing();
        assert!(body.set_leg_disabled(1, true));
        assert!(body.legs()[1].is_disabled());
        assert!(!body.set_leg_disabled(9, true));
    }

    #[test]
    fn disable_after_plan_change_targets_new_legs() {
        let mut body = standing();
        body.set_body_plan(BodyPlan::hexapod());
        assert!(body.set_leg_disabled(5, true));
        assert_eq!(body.legs().len(), 6);

        body.tick(&DesiredMotion::still(), &Floor);
        assert_eq!(body.legs().len(), 6);
        assert!(body.legs()[5].is_disabled());
        assert!(body.legs()[..5].iter().all(|l| !l.is_disabled()));
    }

    #[test]
    fn snapshot_mirrors_state() {
        let mut body = standing();
        body.tick(&DesiredMotion::still(), &Floor);
        let snap = body.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.legs.len(), 4);
        assert_eq!(snap.legs[0].joints.len(), 3);
        assert_eq!(snap.grounded_legs(), 4);
        assert_eq!(snap.moving_legs().count(), 0);
    }
}
