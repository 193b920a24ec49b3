//! Support polygon, normal force and preferred orientation.

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use skitter_core::config::Gait;
use skitter_core::geometry::{
    EPSILON, centroid, horizontal, horizontal_length, lerp, lerp_vec, nearest_point_on_polygon,
    normalize_or, point_in_polygon, up, yaw_rotation,
};
use skitter_gait::LegTopology;

use crate::leg::LegContact;

/// Support direction and pivot for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalInfo {
    /// Unit direction of the support acceleration.
    pub normal: Vector3<f64>,
    /// Point on or inside the support polygon the support acts through.
    pub origin: Vector3<f64>,
    /// Grounded feet in outline order.
    pub contact_polygon: Vec<Vector3<f64>>,
    pub centre_of_mass: Vector3<f64>,
}

/// Balances a body over its grounded legs.
///
/// Holds the smoothed centre of mass and the smoothed pitch/roll between
/// ticks; everything else is recomputed each tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyStabilizer {
    centre_of_mass: Option<Vector3<f64>>,
    pitch: f64,
    roll: f64,
}

impl BodyStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn pitch(&self) -> f64 {
        self.pitch
    }

    pub const fn roll(&self) -> f64 {
        self.roll
    }

    pub const fn centre_of_mass(&self) -> Option<Vector3<f64>> {
        self.centre_of_mass
    }

    /// Forget smoothed state, e.g. after the legs were rebuilt.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Compute this tick's support normal.
    ///
    /// Returns `None` when nothing supports the body.
    pub fn support(
        &mut self,
        contacts: &[LegContact],
        topology: &LegTopology,
        body_position: &Vector3<f64>,
        gait: &Gait,
    ) -> Option<NormalInfo> {
        let previous = self.centre_of_mass.unwrap_or(*body_position);
        let centre_of_mass = lerp_vec(&previous, body_position, gait.centre_of_mass_smoothing);
        self.centre_of_mass = Some(centre_of_mass);

        if gait.use_legacy_normal_force {
            return legacy_support(contacts, topology, centre_of_mass);
        }

        let polygon: Vec<Vector3<f64>> = topology
            .outline_order()
            .into_iter()
            .filter_map(|leg| contacts.get(leg).filter(|c| c.grounded).map(|c| c.foot))
            .collect();

        match polygon.len() {
            0 => None,
            1 => {
                trace!("single contact support");
                let origin = polygon[0];
                Some(NormalInfo {
                    normal: normalize_or(&(centre_of_mass - origin), &up()),
                    origin,
                    contact_polygon: polygon,
                    centre_of_mass,
                })
            }
            _ => Some(self.polygon_support(polygon, centre_of_mass, gait)),
        }
    }

    fn polygon_support(
        &mut self,
        polygon: Vec<Vector3<f64>>,
        mut centre_of_mass: Vector3<f64>,
        gait: &Gait,
    ) -> NormalInfo {
        let outline: Vec<Vector2<f64>> = polygon.iter().map(horizontal).collect();
        let com_2d = horizontal(&centre_of_mass);

        if point_in_polygon(&com_2d, &outline) {
            trace!(contacts = polygon.len(), "centre of mass inside support");
            let height = centroid(&polygon).map_or(centre_of_mass.y, |c| c.y);
            return NormalInfo {
                normal: up(),
                origin: Vector3::new(centre_of_mass.x, height, centre_of_mass.z),
                contact_polygon: polygon,
                centre_of_mass,
            };
        }

        let mut origin = centre_of_mass;
        if let Some(projection) = nearest_point_on_polygon(&com_2d, &outline) {
            let n = polygon.len();
            let a = polygon[projection.edge];
            let b = polygon[(projection.edge + 1) % n];
            let height = lerp(a.y, b.y, projection.t);
            origin = Vector3::new(projection.point.x, height, projection.point.y);

            if projection.distance <= gait.stabilization_leeway {
                let above_edge = Vector3::new(origin.x, centre_of_mass.y, origin.z);
                centre_of_mass = lerp_vec(&centre_of_mass, &above_edge, gait.stabilization_factor);
                self.centre_of_mass = Some(centre_of_mass);
            }
            trace!(distance = projection.distance, "centre of mass outside support");
        }

        NormalInfo {
            normal: normalize_or(&(centre_of_mass - origin), &up()),
            origin,
            contact_polygon: polygon,
            centre_of_mass,
        }
    }

    /// Support acceleration to apply on the next tick.
    ///
    /// Aims the vertical velocity after drag and gravity at a fraction of the
    /// height error, pushes only along `info.normal`, caps the push by the
    /// grounded fraction of legs, and gives up when the push would be more
    /// sideways than upward.
    pub fn correction(
        &self,
        info: &NormalInfo,
        contacts: &[LegContact],
        body_position: &Vector3<f64>,
        body_velocity: &Vector3<f64>,
        gait: &Gait,
    ) -> Option<Vector3<f64>> {
        let grounded: Vec<&LegContact> = contacts.iter().filter(|c| c.grounded).collect();
        if grounded.is_empty() || info.normal.y <= EPSILON {
            return None;
        }

        let ground_height = grounded.iter().map(|c| c.target.y).sum::<f64>() / grounded.len() as f64;
        let target_height = ground_height + gait.body_height;
        let desired_vy = (target_height - body_position.y) * gait.height_correction_gain;
        let next_vy = body_velocity.y * (1.0 - gait.air_drag) - gait.gravity;
        let needed = desired_vy - next_vy;

        let cap = gait.max_normal_acceleration * grounded.len() as f64 / contacts.len() as f64;
        let magnitude = (needed / info.normal.y).clamp(0.0, cap);
        let correction = info.normal * magnitude;

        if horizontal_length(&correction) > correction.y.abs() {
            return None;
        }
        Some(correction)
    }

    /// Ease pitch and roll toward the slope under the grounded feet.
    pub fn update_orientation(&mut self, contacts: &[LegContact], topology: &LegTopology, gait: &Gait) {
        let grounded = |pick: &dyn Fn(usize) -> bool| {
            centroid(
                contacts
                    .iter()
                    .enumerate()
                    .filter(|(leg, c)| c.grounded && pick(*leg))
                    .map(|(_, c)| &c.foot),
            )
        };

        let front = grounded(&|leg| topology.is_front_half(leg));
        let back = grounded(&|leg| topology.is_back_half(leg));
        if let (Some(front), Some(back)) = (front, back) {
            let along = front - back;
            let run = horizontal_length(&along);
            if run > EPSILON {
                let target = -along.y.atan2(run);
                self.pitch = lerp(self.pitch, target, gait.orientation_lerp);
            }
        }

        let left = grounded(&LegTopology::is_left);
        let right = grounded(&|leg| !LegTopology::is_left(leg));
        if let (Some(left), Some(right)) = (left, right) {
            let across = left - right;
            let run = horizontal_length(&across);
            if run > EPSILON {
                let target = across.y.atan2(run);
                self.roll = lerp(self.roll, target, gait.orientation_lerp);
            }
        }
    }

    /// Body orientation for a heading plus the smoothed pitch and roll.
    pub fn orientation(&self, yaw: f64) -> UnitQuaternion<f64> {
        yaw_rotation(yaw)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.pitch)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.roll)
    }
}

/// Support only from a grounded diagonal pair, straight up at its midpoint.
fn legacy_support(
    contacts: &[LegContact],
    topology: &LegTopology,
    centre_of_mass: Vector3<f64>,
) -> Option<NormalInfo> {
    let grounded = |leg: usize| contacts.get(leg).is_some_and(|c| c.grounded);
    (0..contacts.len()).filter(|&leg| grounded(leg)).find_map(|leg| {
        let partner = topology.diagonal(leg).into_iter().find(|&d| grounded(d))?;
        let (a, b) = (contacts[leg].foot, contacts[partner].foot);
        Some(NormalInfo {
            normal: up(),
            origin: (a + b) * 0.5,
            contact_polygon: vec![a, b],
            centre_of_mass,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contact(x: f64, y: f64, z: f64, grounded: bool) -> LegContact {
        let foot = Vector3::new(x, y, z);
        LegContact {
            foot,
            target: foot,
            grounded,
        }
    }

    /// Quadruped feet at the corners of a 2x2 square, all grounded.
    fn square() -> Vec<LegContact> {
        vec![
            contact(1.0, 0.0, 1.0, true),
            contact(-1.0, 0.0, 1.0, true),
            contact(1.0, 0.0, -1.0, true),
            contact(-1.0, 0.0, -1.0, true),
        ]
    }

    fn instant() -> Gait {
        Gait {
            centre_of_mass_smoothing: 1.0,
            ..Gait::walk()
        }
    }

    #[test]
    fn no_contacts_no_support() {
        let mut s = BodyStabilizer::new();
        let mut contacts = square();
        for c in &mut contacts {
            c.grounded = false;
        }
        assert!(s.support(&contacts, &LegTopology::new(4), &Vector3::y(), &instant()).is_none());
    }

    #[test]
    fn inside_polygon_normal_is_exactly_up() {
        let mut s = BodyStabilizer::new();
        let body = Vector3::new(0.2, 1.0, -0.3);
        let info = s.support(&square(), &LegTopology::new(4), &body, &instant()).unwrap();
        assert_eq!(info.normal, Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(info.origin, Vector3::new(0.2, 0.0, -0.3));
        assert_eq!(info.contact_polygon.len(), 4);
    }

    #[test]
    fn polygon_is_outline_ordered() {
        let mut s = BodyStabilizer::new();
        let contacts = square();
        let info = s.support(&contacts, &LegTopology::new(4), &Vector3::y(), &instant()).unwrap();
        // Left front, left back, right back, right front.
        let expected: Vec<_> = [0, 2, 3, 1].iter().map(|&i| contacts[i].foot).collect();
        assert_eq!(info.contact_polygon, expected);
    }

    #[test]
    fn single_contact_points_at_centre_of_mass() {
        let mut s = BodyStabilizer::new();
        let mut contacts = square();
        for c in contacts.iter_mut().skip(1) {
            c.grounded = false;
        }
        let body = Vector3::new(0.0, 1.0, 0.0);
        let info = s.support(&contacts, &LegTopology::new(4), &body, &instant()).unwrap();
        let expected = (info.centre_of_mass - contacts[0].foot).normalize();
        assert_relative_eq!(info.normal, expected, epsilon = 1e-12);
        assert_relative_eq!(info.normal.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(info.origin, contacts[0].foot);
    }

    #[test]
    fn outside_polygon_tilts_away_from_edge() {
        let mut s = BodyStabilizer::new();
        let gait = Gait {
            stabilization_leeway: 0.0,
            ..instant()
        };
        // Centre of mass past the front edge (z = 1).
        let body = Vector3::new(0.0, 1.0, 2.0);
        let info = s.support(&square(), &LegTopology::new(4), &body, &gait).unwrap();
        assert_relative_eq!(info.origin, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(info.normal, Vector3::new(0.0, 1.0, 1.0).normalize(), epsilon = 1e-12);
    }

    #[test]
    fn near_edge_pulls_centre_of_mass_back() {
        let mut s = BodyStabilizer::new();
        let body = Vector3::new(0.0, 1.0, 1.2);
        let gait = instant();
        let info = s.support(&square(), &LegTopology::new(4), &body, &gait).unwrap();
        // 0.2 past the edge, within leeway: moved 60% of the way back.
        assert_relative_eq!(info.centre_of_mass.z, 1.2 - 0.2 * gait.stabilization_factor, epsilon = 1e-12);
        assert_relative_eq!(s.centre_of_mass().unwrap(), info.centre_of_mass);
    }

    #[test]
    fn edge_height_is_interpolated() {
        let mut s = BodyStabilizer::new();
        let contacts = vec![contact(0.0, 0.0, 0.0, true), contact(0.0, 1.0, 2.0, true)];
        // Two legs form one segment; project the body onto its middle.
        let body = Vector3::new(1.0, 3.0, 1.0);
        let gait = Gait {
            stabilization_leeway: 0.0,
            ..instant()
        };
        let info = s.support(&contacts, &LegTopology::new(2), &body, &gait).unwrap();
        assert_relative_eq!(info.origin, Vector3::new(0.0, 0.5, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn centre_of_mass_is_smoothed() {
        let mut s = BodyStabilizer::new();
        let gait = Gait::walk();
        let t = LegTopology::new(4);
        s.support(&square(), &t, &Vector3::new(0.0, 1.0, 0.0), &gait);
        let info = s.support(&square(), &t, &Vector3::new(0.4, 1.0, 0.0), &gait).unwrap();
        assert_relative_eq!(info.centre_of_mass.x, 0.4 * gait.centre_of_mass_smoothing, epsilon = 1e-12);
    }

    #[test]
    fn legacy_mode_needs_diagonal_pair() {
        let mut s = BodyStabilizer::new();
        let gait = Gait {
            use_legacy_normal_force: true,
            ..instant()
        };
        let t = LegTopology::new(4);
        let mut contacts = square();
        contacts[3].grounded = false;
        contacts[1].grounded = false;
        // Legs 0 and 2 share a side: no diagonal pair.
        assert!(s.support(&contacts, &t, &Vector3::y(), &gait).is_none());

        contacts[3].grounded = true;
        let info = s.support(&contacts, &t, &Vector3::y(), &gait).unwrap();
        assert_eq!(info.normal, up());
        assert_relative_eq!(info.origin, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn correction_holds_height() {
        let mut s = BodyStabilizer::new();
        let gait = instant();
        let body = Vector3::new(0.0, gait.body_height, 0.0);
        let info = s.support(&square(), &LegTopology::new(4), &body, &gait).unwrap();
        let a = s.correction(&info, &square(), &body, &Vector3::zeros(), &gait).unwrap();
        // Exactly cancels gravity.
        assert_relative_eq!(a, Vector3::new(0.0, gait.gravity, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn correction_scales_with_grounded_fraction() {
        let mut s = BodyStabilizer::new();
        let gait = instant();
        let mut contacts = square();
        contacts[0].grounded = false;
        contacts[3].grounded = false;
        // Far too low: the push saturates at half the cap.
        let body = Vector3::new(0.0, -5.0, 0.0);
        let info = NormalInfo {
            normal: up(),
            origin: Vector3::zeros(),
            contact_polygon: Vec::new(),
            centre_of_mass: body,
        };
        let a = s.correction(&info, &contacts, &body, &Vector3::zeros(), &gait).unwrap();
        assert_relative_eq!(a.y, gait.max_normal_acceleration * 0.5, epsilon = 1e-12);
        s.reset();
        assert!(s.centre_of_mass().is_none());
    }

    #[test]
    fn correction_never_pulls_down() {
        let s = BodyStabilizer::new();
        let gait = instant();
        let body = Vector3::new(0.0, 10.0, 0.0);
        let info = NormalInfo {
            normal: up(),
            origin: Vector3::zeros(),
            contact_polygon: Vec::new(),
            centre_of_mass: body,
        };
        let a = s.correction(&info, &square(), &body, &Vector3::zeros(), &gait).unwrap();
        assert_relative_eq!(a.y, 0.0);
    }

    #[test]
    fn sideways_correction_is_discarded() {
        let s = BodyStabilizer::new();
        let gait = instant();
        let body = Vector3::new(0.0, 0.5, 0.0);
        let info = NormalInfo {
            normal: Vector3::new(1.0, 0.5, 0.0).normalize(),
            origin: Vector3::zeros(),
            contact_polygon: Vec::new(),
            centre_of_mass: body,
        };
        assert!(s.correction(&info, &square(), &body, &Vector3::zeros(), &gait).is_none());
    }

    #[test]
    fn orientation_follows_slope() {
        let mut s = BodyStabilizer::new();
        let gait = Gait {
            orientation_lerp: 1.0,
            ..Gait::walk()
        };
        // Front feet 1 higher over a 2 unit run, left feet level with right.
        let contacts = vec![
            contact(1.0, 1.0, 1.0, true),
            contact(-1.0, 1.0, 1.0, true),
            contact(1.0, 0.0, -1.0, true),
            contact(-1.0, 0.0, -1.0, true),
        ];
        s.update_orientation(&contacts, &LegTopology::new(4), &gait);
        assert_relative_eq!(s.pitch(), -(0.5_f64).atan(), epsilon = 1e-12);
        assert_relative_eq!(s.roll(), 0.0, epsilon = 1e-12);

        // Nose up: forward tips toward +Y.
        let forward = s.orientation(0.0) * Vector3::z();
        assert!(forward.y > 0.0);
    }

    #[test]
    fn roll_raises_higher_side() {
        let mut s = BodyStabilizer::new();
        let gait = Gait {
            orientation_lerp: 1.0,
            ..Gait::walk()
        };
        let contacts = vec![
            contact(1.0, 0.5, 1.0, true),
            contact(-1.0, 0.0, 1.0, true),
            contact(1.0, 0.5, -1.0, true),
            contact(-1.0, 0.0, -1.0, true),
        ];
        s.update_orientation(&contacts, &LegTopology::new(4), &gait);
        assert!(s.roll() > 0.0);
        let left = s.orientation(0.0) * Vector3::x();
        assert!(left.y > 0.0);
    }

    #[test]
    fn orientation_is_smoothed() {
        let mut s = BodyStabilizer::new();
        let gait = Gait::walk();
        let contacts = vec![
            contact(1.0, 2.0, 1.0, true),
            contact(-1.0, 2.0, 1.0, true),
            contact(1.0, 0.0, -1.0, true),
            contact(-1.0, 0.0, -1.0, true),
        ];
        s.update_orientation(&contacts, &LegTopology::new(4), &gait);
        let target = -(1.0_f64).atan();
        assert_relative_eq!(s.pitch(), target * gait.orientation_lerp, epsilon = 1e-12);
    }
}
