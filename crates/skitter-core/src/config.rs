use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PlanError};
use crate::geometry::SplitDistance;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_tick_rate_hz() -> f64 {
    20.0
}

// ---------------------------------------------------------------------------
// GaitKind
// ---------------------------------------------------------------------------

/// Which leg-lift policy a [`Gait`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaitKind {
    /// Diagonal alternation gated by adjacency and cooldowns.
    #[default]
    Walk,
    /// Left/right pairs with a primary leg and a trailing secondary leg.
    Gallop,
}

// ---------------------------------------------------------------------------
// Gait
// ---------------------------------------------------------------------------

/// Locomotion tunables. Distances are world units, speeds and accelerations
/// are per tick, cooldowns are tick counts.
///
/// Missing fields in a TOML table fall back to the [`Gait::walk`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gait {
    pub kind: GaitKind,

    /// Maximum horizontal body speed.
    pub max_speed: f64,
    /// Maximum change in horizontal velocity per tick.
    pub acceleration: f64,
    /// Maximum yaw rate (rad/tick).
    pub max_rotate_speed: f64,
    /// Maximum change in yaw rate per tick.
    pub rotate_acceleration: f64,
    /// Yaw rate cap while any leg is outside its comfort zone.
    pub uncomfortable_rotate_speed: f64,

    /// End-effector speed while the body is standing still.
    pub stationary_leg_speed: f64,
    /// End-effector speed at full body speed.
    pub moving_leg_speed: f64,
    /// Height above the target a stepping foot arcs toward.
    pub leg_lift_height: f64,
    /// Horizontal distance from target below which the foot stops lifting.
    pub leg_drop_distance: f64,
    /// Per-tick lerp factor toward the lift height.
    pub leg_lift_lerp: f64,

    pub stationary_trigger_zone: SplitDistance,
    pub moving_trigger_zone: SplitDistance,
    pub comfort_zone: SplitDistance,

    /// How many ticks of yaw rate the rest positions lead by.
    pub rotational_lead: f64,

    /// Scan ray origin height above the look-ahead position.
    pub scan_height: f64,
    /// Scan ray reach below the look-ahead position.
    pub scan_depth: f64,
    /// Spacing of the fallback scan candidates around the look-ahead position.
    pub scan_cell_size: f64,
    /// A primary hit further than this from the look-ahead height is
    /// considered implausible and triggers the candidate fan-out.
    pub scan_plausible_band: f64,
    /// Upward bias of the preferred foothold when something solid is ahead.
    pub obstacle_lift_bias: f64,
    /// How far above the last known ground a disabled leg parks.
    pub disabled_leg_lift: f64,

    /// Ticks a diagonal partner must have been moving before a walking leg may lift.
    pub walk_cooldown: u32,
    /// Gallop primary leg cooldown against its diagonal neighbours.
    pub gallop_vertical_cooldown: u32,
    /// Gallop secondary leg delay behind its primary.
    pub gallop_horizontal_cooldown: u32,
    /// Below this horizontal speed the gallop policy defers to walk.
    pub gallop_min_speed: f64,

    pub gravity: f64,
    /// Fraction of vertical velocity lost per tick.
    pub air_drag: f64,
    /// Fraction of horizontal velocity lost per tick while resting on the body.
    pub ground_drag: f64,

    /// Preferred body height above the average grounded foot target.
    pub body_height: f64,
    /// Fraction of the height error turned into vertical velocity per tick.
    pub height_correction_gain: f64,
    /// Normal acceleration cap with every leg grounded.
    pub max_normal_acceleration: f64,
    /// Per-tick lerp of the centre-of-mass estimate toward the body position.
    pub centre_of_mass_smoothing: f64,
    /// Distance from the support polygon within which the centre of mass is
    /// pulled back over the edge.
    pub stabilization_leeway: f64,
    pub stabilization_factor: f64,
    /// Per-tick lerp of pitch and roll toward the terrain slope.
    pub orientation_lerp: f64,

    /// Pose stranded legs from their rest directions instead of reaching.
    pub straighten_stranded_legs: bool,
    /// Support only from grounded diagonal pairs.
    pub use_legacy_normal_force: bool,
}

impl Default for Gait {
    fn default() -> Self {
        Self::walk()
    }
}

impl Gait {
    /// Default walking gait.
    pub fn walk() -> Self {
        Self {
            kind: GaitKind::Walk,
            max_speed: 0.12,
            acceleration: 0.02,
            max_rotate_speed: 0.12,
            rotate_acceleration: 0.02,
            uncomfortable_rotate_speed: 0.01,
            stationary_leg_speed: 0.25,
            moving_leg_speed: 0.6,
            leg_lift_height: 0.4,
            leg_drop_distance: 0.3,
            leg_lift_lerp: 0.4,
            stationary_trigger_zone: SplitDistance::new(0.25, 1.2),
            moving_trigger_zone: SplitDistance::new(0.7, 1.2),
            comfort_zone: SplitDistance::new(1.6, 1.8),
            rotational_lead: 3.0,
            scan_height: 1.5,
            scan_depth: 2.0,
            scan_cell_size: 0.75,
            scan_plausible_band: 0.6,
            obstacle_lift_bias: 1.0,
            disabled_leg_lift: 1.2,
            walk_cooldown: 3,
            gallop_vertical_cooldown: 2,
            gallop_horizontal_cooldown: 1,
            gallop_min_speed: 0.1,
            gravity: 0.08,
            air_drag: 0.02,
            ground_drag: 0.3,
            body_height: 1.0,
            height_correction_gain: 0.25,
            max_normal_acceleration: 0.3,
            centre_of_mass_smoothing: 0.5,
            stabilization_leeway: 0.4,
            stabilization_factor: 0.6,
            orientation_lerp: 0.3,
            straighten_stranded_legs: false,
            use_legacy_normal_force: false,
        }
    }

    /// Default galloping gait: faster body, faster legs, wider trigger zone.
    pub fn gallop() -> Self {
        Self {
            kind: GaitKind::Gallop,
            max_speed: 0.35,
            acceleration: 0.04,
            moving_leg_speed: 1.2,
            moving_trigger_zone: SplitDistance::new(1.0, 1.2),
            comfort_zone: SplitDistance::new(1.8, 1.8),
            leg_lift_height: 0.6,
            ..Self::walk()
        }
    }

    /// Fraction of `max_speed` that `speed` represents, clamped to `[0, 1]`.
    pub fn speed_fraction(&self, speed: f64) -> f64 {
        if self.max_speed <= 0.0 {
            return 0.0;
        }
        (speed / self.max_speed).clamp(0.0, 1.0)
    }

    /// Trigger zone blended between stationary and moving by speed fraction.
    pub fn trigger_zone(&self, speed_fraction: f64) -> SplitDistance {
        self.stationary_trigger_zone
            .lerp(&self.moving_trigger_zone, speed_fraction)
    }

    /// Leg speed blended between stationary and moving by speed fraction.
    pub fn leg_speed(&self, speed_fraction: f64) -> f64 {
        crate::geometry::lerp(
            self.stationary_leg_speed,
            self.moving_leg_speed,
            speed_fraction,
        )
    }

    /// Scale every distance-valued tunable by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            max_speed: self.max_speed * factor,
            acceleration: self.acceleration * factor,
            stationary_leg_speed: self.stationary_leg_speed * factor,
            moving_leg_speed: self.moving_leg_speed * factor,
            leg_lift_height: self.leg_lift_height * factor,
            leg_drop_distance: self.leg_drop_distance * factor,
            stationary_trigger_zone: self.stationary_trigger_zone.scaled(factor),
            moving_trigger_zone: self.moving_trigger_zone.scaled(factor),
            comfort_zone: self.comfort_zone.scaled(factor),
            scan_height: self.scan_height * factor,
            scan_depth: self.scan_depth * factor,
            scan_cell_size: self.scan_cell_size * factor,
            scan_plausible_band: self.scan_plausible_band * factor,
            obstacle_lift_bias: self.obstacle_lift_bias * factor,
            disabled_leg_lift: self.disabled_leg_lift * factor,
            gallop_min_speed: self.gallop_min_speed * factor,
            gravity: self.gravity * factor,
            body_height: self.body_height * factor,
            max_normal_acceleration: self.max_normal_acceleration * factor,
            stabilization_leeway: self.stabilization_leeway * factor,
            ..self.clone()
        }
    }

    /// Validate tunables. Returns Err on the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("stationary_leg_speed", self.stationary_leg_speed),
            ("moving_leg_speed", self.moving_leg_speed),
            ("scan_cell_size", self.scan_cell_size),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, format!("{value} must be > 0")));
            }
        }

        let non_negative = [
            ("max_rotate_speed", self.max_rotate_speed),
            ("rotate_acceleration", self.rotate_acceleration),
            ("uncomfortable_rotate_speed", self.uncomfortable_rotate_speed),
            ("leg_lift_height", self.leg_lift_height),
            ("leg_drop_distance", self.leg_drop_distance),
            ("rotational_lead", self.rotational_lead),
            ("scan_height", self.scan_height),
            ("scan_depth", self.scan_depth),
            ("scan_plausible_band", self.scan_plausible_band),
            ("obstacle_lift_bias", self.obstacle_lift_bias),
            ("disabled_leg_lift", self.disabled_leg_lift),
            ("gallop_min_speed", self.gallop_min_speed),
            ("gravity", self.gravity),
            ("body_height", self.body_height),
            ("max_normal_acceleration", self.max_normal_acceleration),
            ("stabilization_leeway", self.stabilization_leeway),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(field, format!("{value} must be >= 0")));
            }
        }

        let fractions = [
            ("leg_lift_lerp", self.leg_lift_lerp),
            ("air_drag", self.air_drag),
            ("ground_drag", self.ground_drag),
            ("height_correction_gain", self.height_correction_gain),
            ("centre_of_mass_smoothing", self.centre_of_mass_smoothing),
            ("stabilization_factor", self.stabilization_factor),
            ("orientation_lerp", self.orientation_lerp),
        ];
        for (field, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(
                    field,
                    format!("{value} must be within [0, 1]"),
                ));
            }
        }

        for (field, zone) in [
            ("stationary_trigger_zone", self.stationary_trigger_zone),
            ("moving_trigger_zone", self.moving_trigger_zone),
            ("comfort_zone", self.comfort_zone),
        ] {
            if !(zone.horizontal >= 0.0 && zone.vertical >= 0.0) {
                return Err(ConfigError::invalid(field, "radii must be >= 0"));
            }
        }

        let widest_trigger = self
            .stationary_trigger_zone
            .horizontal
            .max(self.moving_trigger_zone.horizontal);
        if self.comfort_zone.horizontal < widest_trigger {
            return Err(ConfigError::Incompatible(format!(
                "comfort zone ({}) is narrower than the trigger zone ({widest_trigger})",
                self.comfort_zone.horizontal
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BodyPlan
// ---------------------------------------------------------------------------

/// One rigid segment of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlan {
    pub length: f64,
}

impl SegmentPlan {
    pub const fn new(length: f64) -> Self {
        Self { length }
    }
}

/// Static layout of one leg in the body frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegPlan {
    /// Where the leg joins the body, relative to the body origin.
    pub attachment: Vector3<f64>,
    /// Where the foot rests when the body stands still, relative to the body origin.
    pub rest: Vector3<f64>,
    pub segments: Vec<SegmentPlan>,
}

impl LegPlan {
    /// Sum of the segment lengths.
    pub fn reach(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }
}

/// Ordered leg layout of a body.
///
/// Legs alternate left/right and run front to back: index parity encodes the
/// side (even = left, odd = right) and `index / 2` is the front-to-back row.
/// Gait adjacency and the support polygon ordering both rely on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPlan {
    pub legs: Vec<LegPlan>,
}

impl BodyPlan {
    pub const fn new(legs: Vec<LegPlan>) -> Self {
        Self { legs }
    }

    /// Build a left/right symmetric plan from one row per leg pair, front
    /// first. Each row is `(attachment_x, attachment_z, rest_x, rest_z)` for
    /// the left leg; the right leg mirrors it across x.
    pub fn symmetric(rows: &[(f64, f64, f64, f64)], rest_height: f64, segments: &[f64]) -> Self {
        let segments: Vec<SegmentPlan> = segments.iter().copied().map(SegmentPlan::new).collect();
        let legs = rows
            .iter()
            .flat_map(|&(ax, az, rx, rz)| {
                [1.0, -1.0].map(|side| LegPlan {
                    attachment: Vector3::new(ax * side, 0.0, az),
                    rest: Vector3::new(rx * side, -rest_height, rz),
                    segments: segments.clone(),
                })
            })
            .collect();
        Self { legs }
    }

    /// Four legs: left-front, right-front, left-back, right-back.
    pub fn quadruped() -> Self {
        Self::symmetric(
            &[(0.3, 0.3, 1.1, 1.1), (0.3, -0.3, 1.1, -1.1)],
            1.0,
            &[1.2, 1.3],
        )
    }

    pub fn hexapod() -> Self {
        Self::symmetric(
            &[
                (0.3, 0.5, 1.1, 1.3),
                (0.35, 0.0, 1.3, 0.0),
                (0.3, -0.5, 1.1, -1.3),
            ],
            1.0,
            &[1.2, 1.3],
        )
    }

    pub fn octopod() -> Self {
        Self::symmetric(
            &[
                (0.3, 0.6, 1.1, 1.5),
                (0.35, 0.2, 1.3, 0.5),
                (0.35, -0.2, 1.3, -0.5),
                (0.3, -0.6, 1.1, -1.5),
            ],
            1.0,
            &[0.9, 0.9, 0.9],
        )
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Uniformly scaled copy of this plan.
    pub fn scaled(&self, factor: f64) -> Result<Self, PlanError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(PlanError::InvalidScale(factor));
        }
        let legs = self
            .legs
            .iter()
            .map(|leg| LegPlan {
                attachment: leg.attachment * factor,
                rest: leg.rest * factor,
                segments: leg
                    .segments
                    .iter()
                    .map(|s| SegmentPlan::new(s.length * factor))
                    .collect(),
            })
            .collect();
        Ok(Self { legs })
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.legs.is_empty() {
            return Err(PlanError::NoLegs);
        }
        for (leg, plan) in self.legs.iter().enumerate() {
            if plan.segments.is_empty() {
                return Err(PlanError::NoSegments { leg });
            }
            for (segment, s) in plan.segments.iter().enumerate() {
                if !(s.length.is_finite() && s.length > 0.0) {
                    return Err(PlanError::NonPositiveSegment {
                        leg,
                        segment,
                        length: s.length,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for BodyPlan {
    fn default() -> Self {
        Self::quadruped()
    }
}

// ---------------------------------------------------------------------------
// SpiderConfig
// ---------------------------------------------------------------------------

/// Complete body configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpiderConfig {
    #[serde(default)]
    pub body_plan: BodyPlan,
    #[serde(default = "Gait::walk")]
    pub walk: Gait,
    #[serde(default = "Gait::gallop")]
    pub gallop: Gait,
    /// Simulation tick rate in Hz (default: 20).
    ///
    /// Gait tunables are per tick, so bodies never read this; callers use it
    /// to put ticks on a time axis.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: f64,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            body_plan: BodyPlan::default(),
            walk: Gait::walk(),
            gallop: Gait::gallop(),
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

impl SpiderConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(ConfigError::invalid(
                "tick_rate_hz",
                format!("{} must be > 0", self.tick_rate_hz),
            ));
        }
        self.body_plan.validate()?;
        self.walk.validate()?;
        self.gallop.validate()?;
        Ok(())
    }

    /// Uniformly scale the body plan and both gaits.
    pub fn scaled(&self, factor: f64) -> Result<Self, PlanError> {
        Ok(Self {
            body_plan: self.body_plan.scaled(factor)?,
            walk: self.walk.scaled(factor),
            gallop: self.gallop.scaled(factor),
            tick_rate_hz: self.tick_rate_hz,
        })
    }

    /// Tick duration in seconds.
    pub fn tick_dt(&self) -> f64 {
        1.0 / self.tick_rate_hz
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ---- Gait ----

    #[test]
    fn default_gaits_validate() {
        Gait::walk().validate().unwrap();
        Gait::gallop().validate().unwrap();
        assert_eq!(Gait::default(), Gait::walk());
        assert_eq!(Gait::gallop().kind, GaitKind::Gallop);
    }

    #[test]
    fn gallop_is_faster_than_walk() {
        assert!(Gait::gallop().max_speed > Gait::walk().max_speed);
        assert!(Gait::gallop().moving_leg_speed > Gait::walk().moving_leg_speed);
    }

    #[test]
    fn speed_fraction_clamps() {
        let gait = Gait::walk();
        assert_relative_eq!(gait.speed_fraction(0.0), 0.0);
        assert_relative_eq!(gait.speed_fraction(gait.max_speed * 0.5), 0.5);
        assert_relative_eq!(gait.speed_fraction(gait.max_speed * 3.0), 1.0);
    }

    #[test]
    fn trigger_zone_blends_by_speed() {
        let gait = Gait::walk();
        assert_eq!(gait.trigger_zone(0.0), gait.stationary_trigger_zone);
        assert_eq!(gait.trigger_zone(1.0), gait.moving_trigger_zone);
        let mid = gait.trigger_zone(0.5).horizontal;
        assert!(mid > gait.stationary_trigger_zone.horizontal);
        assert!(mid < gait.moving_trigger_zone.horizontal);
    }

    #[test]
    fn gait_validate_rejects_negative_gravity() {
        let gait = Gait {
            gravity: -1.0,
            ..Gait::walk()
        };
        let err = gait.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "gravity"));
    }

    #[test]
    fn gait_validate_rejects_bad_fraction() {
        let gait = Gait {
            orientation_lerp: 1.5,
            ..Gait::walk()
        };
        assert!(gait.validate().is_err());
    }

    #[test]
    fn gait_validate_rejects_narrow_comfort_zone() {
        let gait = Gait {
            comfort_zone: SplitDistance::new(0.1, 1.0),
            ..Gait::walk()
        };
        assert!(matches!(
            gait.validate().unwrap_err(),
            ConfigError::Incompatible(_)
        ));
    }

    #[test]
    fn gait_scaling_keeps_cooldowns() {
        let gait = Gait::walk().scaled(2.0);
        assert_relative_eq!(gait.body_height, 2.0);
        assert_relative_eq!(gait.comfort_zone.horizontal, 3.2);
        assert_eq!(gait.walk_cooldown, Gait::walk().walk_cooldown);
        assert_relative_eq!(gait.orientation_lerp, Gait::walk().orientation_lerp);
    }

    // ---- BodyPlan ----

    #[test]
    fn quadruped_layout_alternates_sides() {
        let plan = BodyPlan::quadruped();
        assert_eq!(plan.leg_count(), 4);
        for (i, leg) in plan.legs.iter().enumerate() {
            let left = i % 2 == 0;
            assert_eq!(leg.attachment.x > 0.0, left, "leg {i} on wrong side");
        }
        // Front row ahead of the back row.
        assert!(plan.legs[0].rest.z > plan.legs[2].rest.z);
        plan.validate().unwrap();
    }

    #[test]
    fn presets_have_expected_leg_counts() {
        assert_eq!(BodyPlan::hexapod().leg_count(), 6);
        assert_eq!(BodyPlan::octopod().leg_count(), 8);
        BodyPlan::hexapod().validate().unwrap();
        BodyPlan::octopod().validate().unwrap();
    }

    #[test]
    fn rest_positions_are_reachable() {
        for plan in [BodyPlan::quadruped(), BodyPlan::hexapod(), BodyPlan::octopod()] {
            for leg in &plan.legs {
                assert!((leg.rest - leg.attachment).norm() < leg.reach());
            }
        }
    }

    #[test]
    fn scaled_plan() {
        let plan = BodyPlan::quadruped().scaled(2.0).unwrap();
        assert_relative_eq!(plan.legs[0].segments[0].length, 2.4);
        assert_relative_eq!(plan.legs[0].rest.x, 2.2);
        assert_eq!(
            BodyPlan::quadruped().scaled(0.0).unwrap_err(),
            PlanError::InvalidScale(0.0)
        );
    }

    #[test]
    fn validate_empty_plan() {
        assert_eq!(BodyPlan::new(Vec::new()).validate(), Err(PlanError::NoLegs));
    }

    #[test]
    fn validate_bad_segments() {
        let mut plan = BodyPlan::quadruped();
        plan.legs[1].segments.clear();
        assert_eq!(plan.validate(), Err(PlanError::NoSegments { leg: 1 }));

        let mut plan = BodyPlan::quadruped();
        plan.legs[2].segments[1].length = 0.0;
        assert_eq!(
            plan.validate(),
            Err(PlanError::NonPositiveSegment {
                leg: 2,
                segment: 1,
                length: 0.0
            })
        );
    }

    // ---- SpiderConfig ----

    #[test]
    fn spider_config_defaults() {
        let cfg = SpiderConfig::default();
        cfg.validate().unwrap();
        assert_relative_eq!(cfg.tick_rate_hz, 20.0);
        assert_relative_eq!(cfg.tick_dt(), 0.05);
    }

    #[test]
    fn spider_config_from_partial_toml() {
        let cfg = SpiderConfig::from_toml_str(
            r#"
            tick_rate_hz = 40.0

            [walk]
            max_speed = 0.2
            walk_cooldown = 5
            "#,
        )
        .unwrap();
        assert_relative_eq!(cfg.tick_rate_hz, 40.0);
        assert_relative_eq!(cfg.walk.max_speed, 0.2);
        assert_eq!(cfg.walk.walk_cooldown, 5);
        assert_relative_eq!(cfg.walk.gravity, Gait::walk().gravity);
        assert_eq!(cfg.gallop, Gait::gallop());
        assert_eq!(cfg.body_plan, BodyPlan::quadruped());
    }

    #[test]
    fn spider_config_with_custom_plan() {
        let cfg = SpiderConfig::from_toml_str(
            r"
            [[body_plan.legs]]
            attachment = [0.2, 0.0, 0.0]
            rest = [1.0, -1.0, 0.0]
            segments = [{ length = 1.0 }, { length = 1.0 }]

            [[body_plan.legs]]
            attachment = [-0.2, 0.0, 0.0]
            rest = [-1.0, -1.0, 0.0]
            segments = [{ length = 1.0 }, { length = 1.0 }]
            ",
        )
        .unwrap();
        assert_eq!(cfg.body_plan.leg_count(), 2);
        assert_relative_eq!(cfg.body_plan.legs[1].rest.x, -1.0);
    }

    #[test]
    fn spider_config_rejects_empty_plan() {
        let err = SpiderConfig::from_toml_str("body_plan = { legs = [] }").unwrap_err();
        assert!(matches!(err, ConfigError::Plan(PlanError::NoLegs)));
    }

    #[test]
    fn spider_config_rejects_bad_tick_rate() {
        let err = SpiderConfig::from_toml_str("tick_rate_hz = 0.0").unwrap_err();
        assert!(err.to_string().contains("tick_rate_hz"));
    }

    #[test]
    fn spider_config_from_missing_file() {
        let err = SpiderConfig::from_file("/nonexistent/skitter.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
