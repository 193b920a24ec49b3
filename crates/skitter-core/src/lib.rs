// skitter-core: Geometry, configuration, errors and world interfaces for
// skitter legged locomotion.

pub mod config;
pub mod error;
pub mod geometry;
pub mod traits;
pub mod types;

pub mod prelude {
    pub use crate::config::{BodyPlan, Gait, GaitKind, LegPlan, SegmentPlan, SpiderConfig};
    pub use crate::error::{ConfigError, PlanError, SkitterError};
    pub use crate::geometry::{SplitDistance, SplitDistanceZone};
    pub use crate::traits::GroundQuery;
    pub use crate::types::{CollisionHit, DesiredMotion, RayHit, SpiderEvent};
}
