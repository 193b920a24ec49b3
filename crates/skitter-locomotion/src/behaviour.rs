//! Simple decision layer producing a [`DesiredMotion`] each tick.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use skitter_core::config::Gait;
use skitter_core::geometry::flatten;
use skitter_core::types::DesiredMotion;

/// What a body is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Behaviour {
    /// Stop and keep the current heading.
    #[default]
    StayStill,
    /// Walk toward `target`, facing it, and stop within `stop_distance`.
    MoveTo {
        target: Vector3<f64>,
        stop_distance: f64,
    },
    /// Turn on the spot to face `direction`.
    FaceDirection { direction: Vector3<f64> },
}

impl Behaviour {
    pub fn desired_motion(&self, position: &Vector3<f64>, gait: &Gait) -> DesiredMotion {
        match *self {
            Self::StayStill => DesiredMotion::still(),
            Self::MoveTo {
                target,
                stop_distance,
            } => {
                let offset = flatten(&(target - position));
                let remaining = offset.norm() - stop_distance;
                if remaining <= 0.0 {
                    return DesiredMotion::still();
                }
                // Slow down over the final stretch instead of overshooting.
                let speed = gait.max_speed.min(remaining);
                DesiredMotion::new(offset.normalize() * speed, offset)
            }
            Self::FaceDirection { direction } => {
                DesiredMotion::new(Vector3::zeros(), flatten(&direction))
            }
        }
    }
}
