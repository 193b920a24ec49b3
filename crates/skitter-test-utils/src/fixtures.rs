//! Body fixtures and tick-loop helpers.

use nalgebra::Vector3;

use skitter_core::config::{BodyPlan, Gait, SpiderConfig};
use skitter_core::geometry::forward_from_yaw;
use skitter_core::traits::GroundQuery;
use skitter_core::types::DesiredMotion;
use skitter_locomotion::body::SpiderBody;
use skitter_locomotion::snapshot::BodySnapshot;

/// Spawn a body with the default gaits, standing at its rest height above
/// a floor at `ground_height`.
pub fn standing_body(plan: BodyPlan, ground_height: f64) -> SpiderBody {
    let config = SpiderConfig {
        body_plan: plan,
        ..SpiderConfig::default()
    };
    let height = ground_height + config.walk.body_height;
    SpiderBody::new(config, Vector3::new(0.0, height, 0.0))
}

/// Default quadruped standing on a floor at y = 0.
pub fn standing_quadruped() -> SpiderBody {
    standing_body(BodyPlan::quadruped(), 0.0)
}

/// Full speed along the heading `yaw`, facing it.
pub fn forward_motion(gait: &Gait, yaw: f64) -> DesiredMotion {
    let forward = forward_from_yaw(yaw);
    DesiredMotion::new(forward * gait.max_speed, forward)
}

/// Tick `body` `ticks` times with a constant command and collect a snapshot
/// after each tick.
pub fn run_ticks<G: GroundQuery + ?Sized>(
    body: &mut SpiderBody,
    motion: &DesiredMotion,
    ground: &G,
    ticks: usize,
) -> Vec<BodySnapshot> {
    (0..ticks)
        .map(|_| {
            body.tick(motion, ground);
            body.snapshot()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
