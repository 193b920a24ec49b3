//! Read-only per-tick views for renderers and telemetry.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use skitter_core::config::GaitKind;
use skitter_gait::LegStatus;

use crate::leg::{Leg, LegState};
use crate::stabilizer::NormalInfo;

/// One leg's pose and flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegSnapshot {
    pub index: usize,
    pub state: LegState,
    /// Chain root followed by every joint; the last joint is the foot.
    pub joints: Vec<Vector3<f64>>,
    pub end_effector: Vector3<f64>,
    pub target: Vector3<f64>,
    pub target_grounded: bool,
    pub touching_ground: bool,
    pub moving: bool,
    pub disabled: bool,
    pub primary: bool,
    pub uncomfortable: bool,
}

impl From<&Leg> for LegSnapshot {
    fn from(leg: &Leg) -> Self {
        Self {
            index: leg.index(),
            state: leg.state(),
            joints: leg.chain().joints(),
            end_effector: leg.end_effector(),
            target: leg.target().position,
            target_grounded: leg.target().is_grounded,
            touching_ground: leg.touching_ground(),
            moving: leg.is_moving(),
            disabled: leg.is_disabled(),
            primary: leg.is_primary(),
            uncomfortable: leg.is_uncomfortable(),
        }
    }
}

/// Whole-body pose, legs and support data after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub tick: u64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub yaw: f64,
    pub on_ground: bool,
    pub cloaked: bool,
    pub gait: GaitKind,
    pub legs: Vec<LegSnapshot>,
    pub normal: Option<NormalInfo>,
}

impl BodySnapshot {
    pub fn grounded_legs(&self) -> usize {
        self.legs.iter().filter(|l| l.state == LegState::Grounded).count()
    }

    pub fn moving_legs(&self) -> impl Iterator<Item = usize> + '_ {
        self.legs.iter().filter(|l| l.moving).map(|l| l.index)
    }
}
