//! Kinematic quantities derived from raw navigation samples.
//!
//! Everything in this module is a pure function of one or two [`SampleStore`]s: attitude as
//! Euler angles, positions projected onto the local-level frame, per-sample position error,
//! and angle of attack. Nothing here is cached or mutated; callers recompute a [`DerivedFrame`]
//! whenever the inputs or the anchor change.
//!
//! # Attitude convention
//!
//! Stored quaternions rotate body-frame vectors into the NED frame. Euler angles follow the
//! aerospace ZYX (yaw, pitch, roll) sequence:
//!
//! $$
//! \phi = \operatorname{atan2}\left(2(q_w q_x + q_y q_z),\ 1 - 2(q_x^2 + q_y^2)\right)
//! $$
//! $$
//! \theta = \arcsin\left(\operatorname{clamp}(2(q_w q_y - q_z q_x), -1, 1)\right)
//! $$
//! $$
//! \psi = \operatorname{atan2}\left(2(q_w q_z + q_x q_y),\ 1 - 2(q_y^2 + q_z^2)\right)
//! $$
//!
//! Quaternions are *not* renormalized before conversion. A non-unit quaternion is reported by
//! the plausibility checks in [`crate::analysis`] rather than silently corrected here.
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt::{self, Display};

use crate::earth::{GeodeticPosition, flat_earth_error, geodetic_to_local_tangent};
use crate::samples::SampleStore;

/// Roll, pitch, and yaw in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerAngles {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        EulerAngles { roll, pitch, yaw }
    }
    /// Rebuild the body to NED rotation described by these angles.
    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(
            self.roll.to_radians(),
            self.pitch.to_radians(),
            self.yaw.to_radians(),
        )
    }
}

impl Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.2} deg, {:.2} deg, {:.2} deg]",
            self.roll, self.pitch, self.yaw
        )
    }
}

/// Convert a body to NED quaternion to Euler angles in degrees.
///
/// At the gimbal pole, where $|2(q_w q_y - q_z q_x)| \geq 1$, pitch is exactly $\pm 90$ degrees
/// and yaw is underdetermined.
///
/// # Example
/// ```rust
/// use nalgebra::Quaternion;
/// use navcompare::kinematics::quaternion_to_euler;
/// let euler = quaternion_to_euler(&Quaternion::new(1.0, 0.0, 0.0, 0.0));
/// assert_eq!(euler.roll, 0.0);
/// assert_eq!(euler.pitch, 0.0);
/// assert_eq!(euler.yaw, 0.0);
/// ```
pub fn quaternion_to_euler(attitude: &Quaternion<f64>) -> EulerAngles {
    let (w, x, y, z) = (attitude.w, attitude.i, attitude.j, attitude.k);
    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    let sin_pitch = 2.0 * (w * y - z * x);
    let pitch = if sin_pitch.abs() >= 1.0 {
        FRAC_PI_2.copysign(sin_pitch)
    } else {
        sin_pitch.asin()
    };
    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
    EulerAngles {
        roll: roll.to_degrees(),
        pitch: pitch.to_degrees(),
        yaw: yaw.to_degrees(),
    }
}

/// Per-sample position error of a test trajectory against a reference, in meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionError {
    pub north: f64,
    pub east: f64,
    pub down: f64,
    /// $\sqrt{e_n^2 + e_e^2}$
    pub horizontal: f64,
    /// $\sqrt{e_n^2 + e_e^2 + e_d^2}$
    pub total: f64,
}

impl From<Vector3<f64>> for PositionError {
    fn from(ned: Vector3<f64>) -> Self {
        let horizontal = (ned[0] * ned[0] + ned[1] * ned[1]).sqrt();
        PositionError {
            north: ned[0],
            east: ned[1],
            down: ned[2],
            horizontal,
            total: ned.norm(),
        }
    }
}

/// Position error over the overlapping samples of two trajectories.
///
/// Exactly `min(reference.len(), test.len())` entries are produced; trailing samples of the
/// longer trajectory are ignored. Entry `i` depends only on sample `i` of each store.
pub fn error_series(reference: &SampleStore, test: &SampleStore) -> Vec<PositionError> {
    reference
        .iter()
        .zip(test.iter())
        .map(|(r, t)| PositionError::from(flat_earth_error(&r.position, &t.position)))
        .collect()
}

/// Angle of attack in degrees.
///
/// `absolute` folds into [0, 180] via `acos` and so carries no sign; `alpha` and `beta` keep
/// theirs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleOfAttack {
    /// Angle between the velocity vector and the body x axis
    pub absolute: f64,
    /// Pitch-plane angle of attack, $\operatorname{atan2}(v_z, v_x)$
    pub alpha: f64,
    /// Yaw-plane angle (sideslip), $\operatorname{atan2}(v_y, v_x)$
    pub beta: f64,
}

/// Rotate an NED velocity into the body frame using the inverse of the body to NED rotation.
pub fn body_velocity(velocity_ned: &Vector3<f64>, attitude: &Quaternion<f64>) -> Vector3<f64> {
    UnitQuaternion::new_unchecked(*attitude).inverse_transform_vector(velocity_ned)
}

/// Angle of attack of a single sample.
///
/// Returns all zeros when the body-frame speed is below `min_speed` (m/s).
pub fn angle_of_attack(
    velocity_ned: &Vector3<f64>,
    attitude: &Quaternion<f64>,
    min_speed: f64,
) -> AngleOfAttack {
    let v_body = body_velocity(velocity_ned, attitude);
    let speed = v_body.norm();
    if speed < min_speed {
        return AngleOfAttack::default();
    }
    AngleOfAttack {
        absolute: (v_body[0] / speed).clamp(-1.0, 1.0).acos().to_degrees(),
        alpha: v_body[2].atan2(v_body[0]).to_degrees(),
        beta: v_body[1].atan2(v_body[0]).to_degrees(),
    }
}

/// Quantities derived from one trajectory for display: attitude, local-level position, and
/// angle of attack at every sample.
#[derive(Clone, Debug, Default)]
pub struct DerivedFrame {
    /// Origin of the local-level frame
    pub anchor: GeodeticPosition,
    pub euler: Vec<EulerAngles>,
    /// NED offsets from the anchor, meters
    pub local: Vec<Vector3<f64>>,
    pub angle_of_attack: Vec<AngleOfAttack>,
}

impl DerivedFrame {
    pub fn len(&self) -> usize {
        self.euler.len()
    }
    pub fn is_empty(&self) -> bool {
        self.euler.is_empty()
    }
}

/// Compute the [`DerivedFrame`] of `store` relative to `anchor`.
pub fn derive_frame(
    store: &SampleStore,
    anchor: &GeodeticPosition,
    min_aoa_speed: f64,
) -> DerivedFrame {
    let mut frame = DerivedFrame {
        anchor: *anchor,
        euler: Vec::with_capacity(store.len()),
        local: Vec::with_capacity(store.len()),
        angle_of_attack: Vec::with_capacity(store.len()),
    };
    for sample in store {
        frame.euler.push(quaternion_to_euler(&sample.attitude));
        frame
            .local
            .push(geodetic_to_local_tangent(anchor, &sample.position));
        frame.angle_of_attack.push(angle_of_attack(
            &sample.velocity,
            &sample.attitude,
            min_aoa_speed,
        ));
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::NavSample;
    use crate::wrap_to_180;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sample(time: f64, lat: f64, lon: f64, alt: f64) -> NavSample {
        NavSample {
            time,
            position: GeodeticPosition::new(lat, lon, alt),
            velocity: Vector3::new(10.0, 0.0, 0.0),
            attitude: Quaternion::identity(),
            accel_bias: Vector3::zeros(),
            gyro: Vector3::zeros(),
        }
    }

    #[test]
    fn identity_is_level() {
        let euler = quaternion_to_euler(&Quaternion::identity());
        assert_eq!(euler, EulerAngles::default());
    }
    #[test]
    fn single_axis_rotations() {
        let roll = UnitQuaternion::from_euler_angles(0.3, 0.0, 0.0);
        assert_approx_eq!(quaternion_to_euler(roll.quaternion()).roll, 0.3f64.to_degrees(), 1e-9);
        let pitch = UnitQuaternion::from_euler_angles(0.0, -0.4, 0.0);
        assert_approx_eq!(
            quaternion_to_euler(pitch.quaternion()).pitch,
            -0.4f64.to_degrees(),
            1e-9
        );
        let yaw = UnitQuaternion::from_euler_angles(0.0, 0.0, 2.5);
        assert_approx_eq!(quaternion_to_euler(yaw.quaternion()).yaw, 2.5f64.to_degrees(), 1e-9);
    }
    #[test]
    fn gimbal_pole_clamps_pitch() {
        // Slightly over-unit quaternion pointing the nose straight up
        let half = FRAC_PI_2 / 2.0;
        let q = Quaternion::new(half.cos() * 1.001, 0.0, half.sin() * 1.001, 0.0);
        assert_approx_eq!(quaternion_to_euler(&q).pitch, 90.0, 1e-12);
        let q = Quaternion::new(half.cos() * 1.001, 0.0, -half.sin() * 1.001, 0.0);
        assert_approx_eq!(quaternion_to_euler(&q).pitch, -90.0, 1e-12);
    }
    #[test]
    fn euler_round_trip_random_quaternions() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let axis: Vector3<f64> = Vector3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if axis.norm() < 1e-3 {
                continue;
            }
            let angle: f64 = rng.random_range(-3.0..3.0);
            let q = UnitQuaternion::from_scaled_axis(axis.normalize() * angle);
            let euler = quaternion_to_euler(q.quaternion());
            if euler.pitch.abs() > 89.0 {
                // yaw is underdetermined near the pole
                continue;
            }
            let rebuilt = quaternion_to_euler(euler.to_quaternion().quaternion());
            assert_approx_eq!(wrap_to_180(rebuilt.roll - euler.roll), 0.0, 1e-6);
            assert_approx_eq!(rebuilt.pitch, euler.pitch, 1e-6);
            assert_approx_eq!(wrap_to_180(rebuilt.yaw - euler.yaw), 0.0, 1e-6);
            // and the rebuilt rotation is the original one
            assert!(euler.to_quaternion().angle_to(&q) < 1e-6);
        }
    }
    #[test]
    fn error_series_uses_overlap_only() {
        let reference = SampleStore::from_samples(vec![
            sample(0.0, 0.0, 0.0, 100.0),
            sample(1.0, 0.0, 0.0, 100.0),
            sample(2.0, 0.0, 0.0, 100.0),
        ]);
        let test = SampleStore::from_samples(vec![
            sample(0.0, 0.0, 0.0, 103.0),
            sample(1.0, 1e-6, 0.0, 100.0),
        ]);
        let errors = error_series(&reference, &test);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].down, -3.0);
        assert_eq!(errors[0].horizontal, 0.0);
        assert_eq!(errors[0].total, 3.0);
        assert_approx_eq!(errors[1].north, 6.378137, 1e-9);
        assert_approx_eq!(errors[1].horizontal, 6.378137, 1e-9);
    }
    #[test]
    fn error_is_index_local() {
        let reference = SampleStore::from_samples(vec![
            sample(0.0, 0.0, 0.0, 0.0),
            sample(1.0, 0.1, 0.1, 0.0),
        ]);
        let a =
            SampleStore::from_samples(vec![sample(0.0, 0.0, 0.0, 5.0), sample(1.0, 0.1, 0.1, 0.0)]);
        let b =
            SampleStore::from_samples(vec![sample(0.0, 0.0, 0.0, 5.0), sample(1.0, 0.2, 0.3, 9.0)]);
        assert_eq!(error_series(&reference, &a)[0], error_series(&reference, &b)[0]);
    }
    #[test]
    fn level_flight_has_zero_angle_of_attack() {
        let aoa = angle_of_attack(&Vector3::new(50.0, 0.0, 0.0), &Quaternion::identity(), 1e-3);
        assert_eq!(aoa, AngleOfAttack::default());
    }
    #[test]
    fn nose_up_level_flight_has_positive_alpha_magnitude() {
        // Pitched up 10 degrees while flying level: velocity is below the nose
        let attitude = UnitQuaternion::from_euler_angles(0.0, 10f64.to_radians(), 0.0);
        let aoa = angle_of_attack(&Vector3::new(50.0, 0.0, 0.0), attitude.quaternion(), 1e-3);
        assert_approx_eq!(aoa.absolute, 10.0, 1e-9);
        assert_approx_eq!(aoa.alpha, 10.0, 1e-9);
        assert_approx_eq!(aoa.beta, 0.0, 1e-9);
    }
    #[test]
    fn sideslip_sign_is_kept_but_absolute_is_folded() {
        let attitude = UnitQuaternion::from_euler_angles(0.0, 0.0, -5f64.to_radians());
        let aoa = angle_of_attack(&Vector3::new(50.0, 0.0, 0.0), attitude.quaternion(), 1e-3);
        assert_approx_eq!(aoa.beta, 5.0, 1e-9);
        let attitude = UnitQuaternion::from_euler_angles(0.0, 0.0, 5f64.to_radians());
        let mirrored = angle_of_attack(&Vector3::new(50.0, 0.0, 0.0), attitude.quaternion(), 1e-3);
        assert_approx_eq!(mirrored.beta, -5.0, 1e-9);
        assert_approx_eq!(aoa.absolute, mirrored.absolute, 1e-12);
    }
    #[test]
    fn stationary_angle_of_attack_is_zero() {
        let attitude = UnitQuaternion::from_euler_angles(0.2, 0.3, 0.4);
        let aoa = angle_of_attack(&Vector3::new(0.0005, 0.0, 0.0), attitude.quaternion(), 1e-3);
        assert_eq!(aoa, AngleOfAttack::default());
    }
    #[test]
    fn derived_frame_is_anchored() {
        let store = SampleStore::from_samples(vec![
            sample(0.0, 0.0, 0.0, 100.0),
            sample(1.0, 0.0, 0.0, 105.0),
        ]);
        let anchor = store.first().unwrap().position;
        let frame = derive_frame(&store, &anchor, 1e-3);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.local[0], Vector3::zeros());
        assert_eq!(frame.local[1], Vector3::new(0.0, 0.0, -5.0));
        assert_eq!(frame.euler[1], EulerAngles::default());
    }
}
