//! Kinematic chain of fixed-length segments.
//!
//! A [`KinematicChain`] is a root point followed by an ordered list of
//! segments. Each segment stores the position of its distal joint, so the
//! last segment's position is the end-effector.

use nalgebra::{UnitQuaternion, Vector3};

use skitter_core::geometry::{EPSILON, normalize_or};

use crate::solver::{FabrikResult, FabrikSolver};

/// A single rigid segment in the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSegment {
    /// Fixed segment length.
    pub length: f64,
    /// Distal joint position (world frame).
    pub position: Vector3<f64>,
    /// Unit rest direction in the body frame, used by
    /// [`KinematicChain::straighten_direction`] and
    /// [`KinematicChain::rotations`].
    pub initial_direction: Vector3<f64>,
    /// Last well-defined direction from the previous joint to this one.
    pub(crate) direction: Vector3<f64>,
}

impl ChainSegment {
    /// Current unit direction from the previous joint to this one.
    pub fn direction(&self) -> Vector3<f64> {
        self.direction
    }
}

/// An ordered chain from a root point to an end-effector.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicChain {
    root: Vector3<f64>,
    segments: Vec<ChainSegment>,
}

impl KinematicChain {
    /// Build a chain laid out from `root` along each segment's rest direction.
    ///
    /// Zero rest directions fall back to straight down.
    pub fn new(root: Vector3<f64>, segments: impl IntoIterator<Item = (f64, Vector3<f64>)>) -> Self {
        let down = -Vector3::y();
        let mut previous = root;
        let segments = segments
            .into_iter()
            .map(|(length, direction)| {
                let direction = normalize_or(&direction, &down);
                let position = previous + direction * length;
                previous = position;
                ChainSegment {
                    length,
                    position,
                    initial_direction: direction,
                    direction,
                }
            })
            .collect();
        Self { root, segments }
    }

    /// Build a straight chain with every segment pointing along `direction`.
    pub fn straight(root: Vector3<f64>, lengths: &[f64], direction: Vector3<f64>) -> Self {
        Self::new(root, lengths.iter().map(|&length| (length, direction)))
    }

    pub fn root(&self) -> Vector3<f64> {
        self.root
    }

    /// Move the fixed root. Joint positions are left in place until the next
    /// solve.
    pub fn set_root(&mut self, root: Vector3<f64>) {
        self.root = root;
    }

    pub fn segments(&self) -> &[ChainSegment] {
        &self.segments
    }

    pub(crate) fn parts_mut(&mut self) -> (Vector3<f64>, &mut [ChainSegment]) {
        (self.root, &mut self.segments)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sum of segment lengths.
    pub fn reach(&self) -> f64 {
        self.segments.iter().map(|s| s.length).sum()
    }

    /// Position of the last joint, or the root for an empty chain.
    pub fn end_effector(&self) -> Vector3<f64> {
        self.segments.last().map_or(self.root, |s| s.position)
    }

    /// Root followed by every joint position.
    pub fn joints(&self) -> Vec<Vector3<f64>> {
        std::iter::once(self.root)
            .chain(self.segments.iter().map(|s| s.position))
            .collect()
    }

    /// Largest deviation of any joint-to-joint distance from its segment length.
    pub fn max_length_error(&self) -> f64 {
        let mut previous = self.root;
        self.segments
            .iter()
            .map(|s| {
                let error = ((s.position - previous).norm() - s.length).abs();
                previous = s.position;
                error
            })
            .fold(0.0, f64::max)
    }

    /// Solve toward `target` with the default solver (10 iterations, 0.01 tolerance).
    pub fn fabrik(&mut self, target: &Vector3<f64>) -> FabrikResult {
        FabrikSolver::with_defaults().solve(self, target)
    }

    /// Lay the chain out from the root along each rest direction rotated by
    /// `rotation`, bypassing the solver.
    pub fn straighten_direction(&mut self, rotation: &UnitQuaternion<f64>) {
        let mut previous = self.root;
        for segment in &mut self.segments {
            let direction = rotation * segment.initial_direction;
            segment.position = previous + direction * segment.length;
            segment.direction = direction;
            previous = segment.position;
        }
    }

    /// Per-segment world rotation that orients a model built along the rest
    /// direction (under `pivot`) with the segment's current direction.
    ///
    /// Collapsed segments keep the previous segment's rotation.
    pub fn rotations(&self, pivot: &UnitQuaternion<f64>) -> Vec<UnitQuaternion<f64>> {
        let mut previous_joint = self.root;
        let mut previous_rotation = *pivot;
        self.segments
            .iter()
            .map(|segment| {
                let offset = segment.position - previous_joint;
                previous_joint = segment.position;
                if offset.norm() < EPSILON {
                    return previous_rotation;
                }
                let from = pivot * segment.initial_direction;
                let to = offset.normalize();
                let rotation = rotation_between(&from, &to) * pivot;
                previous_rotation = rotation;
                rotation
            })
            .collect()
    }
}

/// Shortest-arc rotation, including the antiparallel case.
fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        let axis = from.cross(&Vector3::x());
        let axis = if axis.norm() < EPSILON {
            from.cross(&Vector3::y())
        } else {
            axis
        };
        UnitQuaternion::from_axis_angle(
            &nalgebra::Unit::new_normalize(axis),
            std::f64::consts::PI,
        )
    })
}
