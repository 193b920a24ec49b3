//! Vector, rotation and polygon helpers shared by every skitter crate.
//!
//! All positions are `Vector3<f64>` values in a Y-up world. Helpers never
//! mutate their inputs; "move toward" style operations return a new vector.
//!
//! Horizontal projections drop the Y axis and keep `(x, z)` as a
//! `Vector2 { x, y: z }`.

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Lengths below this are treated as zero when normalizing.
pub const EPSILON: f64 = 1e-9;

/// World up (+Y).
pub fn up() -> Vector3<f64> {
    Vector3::y()
}

/// World down (-Y).
pub fn down() -> Vector3<f64> {
    -Vector3::y()
}

/// Project onto the horizontal (x, z) plane.
pub fn horizontal(v: &Vector3<f64>) -> Vector2<f64> {
    Vector2::new(v.x, v.z)
}

/// Same vector with its vertical component zeroed.
pub fn flatten(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, 0.0, v.z)
}

pub fn horizontal_length(v: &Vector3<f64>) -> f64 {
    horizontal(v).norm()
}

pub fn horizontal_distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    horizontal(&(b - a)).norm()
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

pub fn lerp_vec(a: &Vector3<f64>, b: &Vector3<f64>, t: f64) -> Vector3<f64> {
    a + (b - a) * t
}

/// Step from `from` toward `to` by at most `max_step`.
///
/// Lands exactly on `to` once it is within reach.
pub fn move_towards(from: &Vector3<f64>, to: &Vector3<f64>, max_step: f64) -> Vector3<f64> {
    let delta = to - from;
    let distance = delta.norm();
    if distance <= max_step || distance < EPSILON {
        return *to;
    }
    from + delta * (max_step / distance)
}

/// Scalar counterpart of [`move_towards`].
pub fn move_towards_scalar(from: f64, to: f64, max_step: f64) -> f64 {
    let delta = to - from;
    if delta.abs() <= max_step {
        to
    } else {
        from + max_step.copysign(delta)
    }
}

/// Normalize `v`, or return `fallback` when `v` is (near) zero length.
pub fn normalize_or(v: &Vector3<f64>, fallback: &Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm < EPSILON || !norm.is_finite() {
        *fallback
    } else {
        v / norm
    }
}

/// Rotation of `yaw` radians about world up.
pub fn yaw_rotation(yaw: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
}

/// Horizontal unit direction for a yaw angle. Yaw 0 faces +Z.
pub fn forward_from_yaw(yaw: f64) -> Vector3<f64> {
    Vector3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Yaw angle of a direction's horizontal projection, if it has one.
pub fn yaw_of(direction: &Vector3<f64>) -> Option<f64> {
    if horizontal_length(direction) < EPSILON {
        return None;
    }
    Some(direction.x.atan2(direction.z))
}

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Rotate `point` about `pivot`.
pub fn rotate_about(
    point: &Vector3<f64>,
    pivot: &Vector3<f64>,
    rotation: &UnitQuaternion<f64>,
) -> Vector3<f64> {
    pivot + rotation * (point - pivot)
}

/// Arithmetic mean of a set of points.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Vector3<f64>>) -> Option<Vector3<f64>> {
    let mut sum = Vector3::zeros();
    let mut count = 0_u32;
    for p in points {
        sum += p;
        count += 1;
    }
    (count > 0).then(|| sum / f64::from(count))
}

// ---------------------------------------------------------------------------
// SplitDistance
// ---------------------------------------------------------------------------

/// A zone size measured separately in the horizontal plane and vertically.
///
/// A point is inside when its horizontal distance from the centre is within
/// `horizontal` and its height difference is within `vertical`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitDistance {
    pub horizontal: f64,
    pub vertical: f64,
}

impl SplitDistance {
    pub const fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn contains(&self, center: &Vector3<f64>, point: &Vector3<f64>) -> bool {
        horizontal_distance(center, point) <= self.horizontal
            && (point.y - center.y).abs() <= self.vertical
    }

    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            horizontal: lerp(self.horizontal, other.horizontal, t),
            vertical: lerp(self.vertical, other.vertical, t),
        }
    }

    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            horizontal: self.horizontal * factor,
            vertical: self.vertical * factor,
        }
    }
}

/// A [`SplitDistance`] anchored at a centre point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitDistanceZone {
    pub center: Vector3<f64>,
    pub size: SplitDistance,
}

impl SplitDistanceZone {
    pub const fn new(center: Vector3<f64>, size: SplitDistance) -> Self {
        Self { center, size }
    }

    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        self.size.contains(&self.center, point)
    }

    pub fn horizontal_distance(&self, point: &Vector3<f64>) -> f64 {
        horizontal_distance(&self.center, point)
    }
}

// ---------------------------------------------------------------------------
// Polygons
// ---------------------------------------------------------------------------

/// Even-odd point-in-polygon test. Polygons with fewer than three vertices
/// have no interior.
pub fn point_in_polygon(point: &Vector2<f64>, polygon: &[Vector2<f64>]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Closest point on segment `a..b` and its interpolation parameter.
pub fn nearest_point_on_segment(
    point: &Vector2<f64>,
    a: &Vector2<f64>,
    b: &Vector2<f64>,
) -> (Vector2<f64>, f64) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < EPSILON {
        return (*a, 0.0);
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Where a point projects onto a polygon boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonProjection {
    /// Closest boundary point.
    pub point: Vector2<f64>,
    /// Index of the edge's first vertex; the edge runs to `edge + 1` (wrapping).
    pub edge: usize,
    /// Position along the edge in `[0, 1]`.
    pub t: f64,
    /// Distance from the query point.
    pub distance: f64,
}

/// Nearest point on the boundary of a closed polygon.
///
/// A single vertex projects onto itself, two vertices form one segment.
pub fn nearest_point_on_polygon(
    point: &Vector2<f64>,
    polygon: &[Vector2<f64>],
) -> Option<PolygonProjection> {
    match polygon.len() {
        0 => None,
        1 => Some(PolygonProjection {
            point: polygon[0],
            edge: 0,
            t: 0.0,
            distance: (point - polygon[0]).norm(),
        }),
        n => {
            let edge_count = if n == 2 { 1 } else { n };
            (0..edge_count)
                .map(|i| {
                    let (nearest, t) =
                        nearest_point_on_segment(point, &polygon[i], &polygon[(i + 1) % n]);
                    PolygonProjection {
                        point: nearest,
                        edge: i,
                        t,
                        distance: (point - nearest).norm(),
                    }
                })
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        }
    }
}

/// Nearest point on a polygon, or the point itself when it lies inside.
pub fn nearest_point_in_polygon(point: &Vector2<f64>, polygon: &[Vector2<f64>]) -> Option<Vector2<f64>> {
    if point_in_polygon(point, polygon) {
        return Some(*point);
    }
    nearest_point_on_polygon(point, polygon).map(|p| p.point)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
