use nalgebra::Vector3;

use crate::types::{CollisionHit, RayHit};

// ---------------------------------------------------------------------------
// GroundQuery
// ---------------------------------------------------------------------------

/// Synchronous read-only access to the terrain a body walks on.
///
/// Implementations decide how terrain is represented (voxels, height fields,
/// planes). Results must reflect the current world state; callers never cache
/// them across ticks.
pub trait GroundQuery {
    /// Cast a ray from `origin` along unit `direction` up to `max_distance`.
    fn raycast(
        &self,
        origin: &Vector3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit>;

    /// Move from `position` by `motion`, stopping at the first solid
    /// obstruction. Returns `None` when the whole motion is free.
    fn resolve_collision(
        &self,
        position: &Vector3<f64>,
        motion: &Vector3<f64>,
    ) -> Option<CollisionHit>;

    /// Human-readable name for this terrain.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T: GroundQuery + ?Sized> GroundQuery for &T {
    fn raycast(
        &self,
        origin: &Vector3<f64>,
        direction: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        (**self).raycast(origin, direction, max_distance)
    }

    fn resolve_collision(
        &self,
        position: &Vector3<f64>,
        motion: &Vector3<f64>,
    ) -> Option<CollisionHit> {
        (**self).resolve_collision(position, motion)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
