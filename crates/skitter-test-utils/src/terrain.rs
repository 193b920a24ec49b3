//! Height-field terrains for driving bodies in tests.
//!
//! Every terrain here is a single-valued height field: a column at `(x, z)`
//! is solid from its surface down, or bottomless. Queries are exact for
//! vertical rays and marched for everything else.

use nalgebra::Vector3;
use rand::Rng;

use skitter_core::geometry::EPSILON;
use skitter_core::traits::GroundQuery;
use skitter_core::types::{CollisionHit, RayHit};

use crate::rng::seeded_rng;

/// March step for non-vertical rays.
const RAY_STEP: f64 = 0.05;

/// Bisection rounds refining a marched hit.
const REFINE_ROUNDS: usize = 24;

// ---------------------------------------------------------------------------
// Height-field helpers
// ---------------------------------------------------------------------------

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn cast_height_field(
    height: impl Fn(f64, f64) -> Option<f64>,
    origin: &Vector3<f64>,
    direction: &Vector3<f64>,
    max_distance: f64,
) -> Option<RayHit> {
    let below = |p: &Vector3<f64>| height(p.x, p.z).is_some_and(|h| p.y <= h);
    if below(origin) {
        return None;
    }

    if direction.x.abs() < EPSILON && direction.z.abs() < EPSILON {
        if direction.y >= 0.0 {
            return None;
        }
        let surface = height(origin.x, origin.z)?;
        let distance = (origin.y - surface) / -direction.y;
        return (distance <= max_distance)
            .then(|| RayHit::new(Vector3::new(origin.x, surface, origin.z), distance));
    }

    let steps = (max_distance / RAY_STEP).ceil().max(1.0) as usize;
    let mut previous = 0.0;
    for i in 1..=steps {
        let t = (i as f64 * RAY_STEP).min(max_distance);
        if below(&(origin + direction * t)) {
            let (mut lo, mut hi) = (previous, t);
            for _ in 0..REFINE_ROUNDS {
                let mid = 0.5 * (lo + hi);
                if below(&(origin + direction * mid)) {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }
            return Some(RayHit::new(origin + direction * hi, hi));
        }
        previous = t;
    }
    None
}

/// Motion ending under the surface either lands on it (started above the
/// destination surface) or runs into a riser (started below it), in which
/// case only the horizontal part is cancelled.
fn collide_height_field(
    height: impl Fn(f64, f64) -> Option<f64>,
    position: &Vector3<f64>,
    motion: &Vector3<f64>,
) -> Option<CollisionHit> {
    let end = position + motion;
    let surface = height(end.x, end.z)?;
    if end.y >= surface {
        return None;
    }

    let stop = if position.y + EPSILON >= surface {
        Vector3::new(end.x, surface, end.z)
    } else {
        let floor = height(position.x, position.z).unwrap_or(f64::NEG_INFINITY);
        Vector3::new(position.x, end.y.max(floor), position.z)
    };
    Some(CollisionHit::new(stop, stop - end))
}

// ---------------------------------------------------------------------------
// FlatGround
// ---------------------------------------------------------------------------

/// Infinite horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatGround {
    pub height: f64,
}

impl FlatGround {
    pub const fn new(height: f64) -> Self {
        Self { height }
    }
}

impl Default for FlatGround {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl GroundQuery for FlatGround {
    fn raycast(
        &self,
        origin: &Vector3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        cast_height_field(|_, _| Some(self.height), origin, direction, max_distance)
    }

    fn resolve_collision(
        &self,
        position: &Vector3<f64>,
        motion: &Vector3<f64>,
    ) -> Option<CollisionHit> {
        collide_height_field(|_, _| Some(self.height), position, motion)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "flat"
    }
}

// ---------------------------------------------------------------------------
// PitGround
// ---------------------------------------------------------------------------

/// A plane with a bottomless rectangular pit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitGround {
    pub height: f64,
    /// Pit extent along x as `(min, max)`.
    pub x: (f64, f64),
    /// Pit extent along z as `(min, max)`.
    pub z: (f64, f64),
}

impl PitGround {
    pub const fn new(height: f64, x: (f64, f64), z: (f64, f64)) -> Self {
        Self { height, x, z }
    }

    /// Whether the column under `p` is open.
    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        p.x > self.x.0 && p.x < self.x.1 && p.z > self.z.0 && p.z < self.z.1
    }

    /// Whether the whole horizontal square of half-size `half` around
    /// `centre` is open.
    pub fn covers_square(&self, centre: &Vector3<f64>, half: f64) -> bool {
        centre.x - half > self.x.0
            && centre.x + half < self.x.1
            && centre.z - half > self.z.0
            && centre.z + half < self.z.1
    }

    fn height_at(&self, x: f64, z: f64) -> Option<f64> {
        (!self.contains(&Vector3::new(x, 0.0, z))).then_some(self.height)
    }
}

impl GroundQuery for PitGround {
    fn raycast(
        &self,
        origin: &Vector3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        cast_height_field(|x, z| self.height_at(x, z), origin, direction, max_distance)
    }

    fn resolve_collision(
        &self,
        position: &Vector3<f64>,
        motion: &Vector3<f64>,
    ) -> Option<CollisionHit> {
        collide_height_field(|x, z| self.height_at(x, z), position, motion)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "pit"
    }
}

/// A pit of random size somewhere ahead (+Z) of the origin.
///
/// The near edge always lies beyond z = 1, so a body spawned at the origin
/// starts with every foot on solid ground.
pub fn seeded_pit(seed: u64) -> PitGround {
    let mut rng = seeded_rng(seed);
    let half_x = rng.gen_range(0.8..2.0);
    let half_z = rng.gen_range(0.8..2.0);
    let centre_x = rng.gen_range(-1.5..1.5);
    let near_z = rng.gen_range(1.5..3.0);
    PitGround::new(
        0.0,
        (centre_x - half_x, centre_x + half_x),
        (near_z, near_z + 2.0 * half_z),
    )
}

// ---------------------------------------------------------------------------
// StepGround
// ---------------------------------------------------------------------------

/// Two plateaus split at `step_z`: `low` behind it, `high` from it onward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepGround {
    pub low: f64,
    pub high: f64,
    pub step_z: f64,
}

impl StepGround {
    pub const fn new(low: f64, high: f64, step_z: f64) -> Self {
        Self { low, high, step_z }
    }

    pub fn height_at(&self, z: f64) -> f64 {
        if z >= self.step_z { self.high } else { self.low }
    }
}

impl GroundQuery for StepGround {
    fn raycast(
        &self,
        origin: &Vector3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        cast_height_field(|_, z| Some(self.height_at(z)), origin, direction, max_distance)
    }

    fn resolve_collision(
        &self,
        position: &Vector3<f64>,
        motion: &Vector3<f64>,
    ) -> Option<CollisionHit> {
        collide_height_field(|_, z| Some(self.height_at(z)), position, motion)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "steps"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn down() -> Vector3<f64> {
        -Vector3::y()
    }

    // ---- FlatGround ----

    #[test]
    fn flat_vertical_ray_is_exact() {
        let hit = FlatGround::new(0.5)
            .raycast(&Vector3::new(1.0, 2.0, -3.0), &down(), 5.0)
            .unwrap();
        assert_eq!(hit.position, Vector3::new(1.0, 0.5, -3.0));
        assert_relative_eq!(hit.distance, 1.5);
    }

    #[test]
    fn flat_ray_respects_range_and_direction() {
        let ground = FlatGround::default();
        assert!(ground.raycast(&Vector3::new(0.0, 2.0, 0.0), &down(), 1.0).is_none());
        assert!(ground.raycast(&Vector3::new(0.0, 2.0, 0.0), &Vector3::y(), 5.0).is_none());
        assert!(ground.raycast(&Vector3::new(0.0, -1.0, 0.0), &down(), 5.0).is_none());
    }

    #[test]
    fn slanted_ray_is_marched_to_the_surface() {
        let direction = Vector3::new(1.0, -1.0, 0.0).normalize();
        let hit = FlatGround::default()
            .raycast(&Vector3::new(0.0, 1.0, 0.0), &direction, 3.0)
            .unwrap();
        assert_relative_eq!(hit.position, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(hit.distance, 2.0_f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn flat_collision_lands_on_surface() {
        let hit = FlatGround::default()
            .resolve_collision(&Vector3::new(0.0, 0.2, 0.0), &Vector3::new(0.3, -0.5, 0.0))
            .unwrap();
        assert_relative_eq!(hit.position, Vector3::new(0.3, 0.0, 0.0));
        assert_relative_eq!(hit.offset, Vector3::new(0.0, 0.3, 0.0), epsilon = 1e-12);
        assert!(
            FlatGround::default()
                .resolve_collision(&Vector3::new(0.0, 1.0, 0.0), &Vector3::new(0.0, -0.5, 0.0))
                .is_none()
        );
    }

    // ---- PitGround ----

    #[test]
    fn pit_is_bottomless() {
        let pit = PitGround::new(0.0, (-1.0, 1.0), (2.0, 4.0));
        assert!(pit.raycast(&Vector3::new(0.0, 1.0, 3.0), &down(), 100.0).is_none());
        assert!(pit.raycast(&Vector3::new(0.0, 1.0, 1.0), &down(), 100.0).is_some());
        assert!(
            pit.resolve_collision(&Vector3::new(0.0, 0.1, 3.0), &Vector3::new(0.0, -1.0, 0.0))
                .is_none()
        );
    }

    #[test]
    fn pit_square_coverage() {
        let pit = PitGround::new(0.0, (-1.0, 1.0), (2.0, 4.0));
        assert!(pit.covers_square(&Vector3::new(0.0, 0.0, 3.0), 0.9));
        assert!(!pit.covers_square(&Vector3::new(0.0, 0.0, 3.0), 1.1));
        assert!(!pit.covers_square(&Vector3::new(0.5, 0.0, 3.0), 0.6));
    }

    #[test]
    fn seeded_pit_is_reproducible_and_ahead() {
        assert_eq!(seeded_pit(7), seeded_pit(7));
        assert_ne!(seeded_pit(7), seeded_pit(8));
        for seed in 0..32 {
            let pit = seeded_pit(seed);
            assert!(pit.z.0 >= 1.5);
            assert!(pit.x.1 - pit.x.0 >= 1.6);
        }
    }

    // ---- StepGround ----

    #[test]
    fn step_heights() {
        let steps = StepGround::new(0.0, 0.5, 2.0);
        let low = steps.raycast(&Vector3::new(0.0, 3.0, 1.9), &down(), 5.0).unwrap();
        let high = steps.raycast(&Vector3::new(0.0, 3.0, 2.1), &down(), 5.0).unwrap();
        assert_relative_eq!(low.position.y, 0.0);
        assert_relative_eq!(high.position.y, 0.5);
    }

    #[test]
    fn running_into_a_riser_blocks_horizontally() {
        let steps = StepGround::new(0.0, 0.5, 2.0);
        let hit = steps
            .resolve_collision(&Vector3::new(0.0, 0.2, 1.8), &Vector3::new(0.0, 0.0, 0.4))
            .unwrap();
        assert_relative_eq!(hit.position, Vector3::new(0.0, 0.2, 1.8));
        assert_relative_eq!(hit.offset, Vector3::new(0.0, 0.0, -0.4), epsilon = 1e-12);
    }

    #[test]
    fn dropping_onto_the_upper_step_lands() {
        let steps = StepGround::new(0.0, 0.5, 2.0);
        let hit = steps
            .resolve_collision(&Vector3::new(0.0, 0.8, 1.9), &Vector3::new(0.0, -0.5, 0.2))
            .unwrap();
        assert_relative_eq!(hit.position, Vector3::new(0.0, 0.5, 2.1), epsilon = 1e-12);
    }

    #[test]
    fn names() {
        assert_eq!(FlatGround::default().name(), "flat");
        assert_eq!(seeded_pit(0).name(), "pit");
        assert_eq!(StepGround::new(0.0, 1.0, 1.0).name(), "steps");
    }
}
