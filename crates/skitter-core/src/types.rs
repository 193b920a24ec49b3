use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// World query results
// ---------------------------------------------------------------------------

/// Where a ray met solid ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    pub position: Vector3<f64>,
    /// Distance travelled along the ray.
    pub distance: f64,
}

impl RayHit {
    pub const fn new(position: Vector3<f64>, distance: f64) -> Self {
        Self { position, distance }
    }
}

/// Where an intended motion was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionHit {
    /// Resolved position after the obstruction.
    pub position: Vector3<f64>,
    /// Correction applied to the unobstructed end point. Non-zero axes are
    /// the axes the obstruction blocked.
    pub offset: Vector3<f64>,
}

impl CollisionHit {
    pub const fn new(position: Vector3<f64>, offset: Vector3<f64>) -> Self {
        Self { position, offset }
    }
}

// ---------------------------------------------------------------------------
// DesiredMotion
// ---------------------------------------------------------------------------

/// What the decision layer wants the body to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesiredMotion {
    /// Horizontal velocity to approach (per tick).
    pub target_velocity: Vector3<f64>,
    /// Direction the body should face. Zero keeps the current heading.
    pub target_direction: Vector3<f64>,
}

impl DesiredMotion {
    /// Stand still, keep heading.
    pub fn still() -> Self {
        Self {
            target_velocity: Vector3::zeros(),
            target_direction: Vector3::zeros(),
        }
    }

    pub const fn new(target_velocity: Vector3<f64>, target_direction: Vector3<f64>) -> Self {
        Self {
            target_velocity,
            target_direction,
        }
    }
}

impl Default for DesiredMotion {
    fn default() -> Self {
        Self::still()
    }
}

// ---------------------------------------------------------------------------
// SpiderEvent
// ---------------------------------------------------------------------------

/// Something that happened during a tick, for sound/particle/UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpiderEvent {
    /// A foot touched ground after being in the air.
    LegStep { leg: usize, position: Vector3<f64> },
    /// The body itself landed on the ground.
    HitGround {
        position: Vector3<f64>,
        /// Downward speed at impact.
        speed: f64,
    },
    /// An external push was applied.
    ExternalImpact { velocity: Vector3<f64> },
    /// The cloak was switched on or off.
    CloakToggled { enabled: bool },
}
