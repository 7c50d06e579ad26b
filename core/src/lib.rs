//! Navigation trajectory comparison toolbox
//!
//! This crate compares two navigation trajectories: a *reference* (typically a high-grade INS or
//! post-processed truth) and a *test* (typically the output of a navigation filter under
//! evaluation). Both are read from whitespace-delimited text logs into [`samples::SampleStore`]s
//! and then analyzed and replayed side by side. The crate does not draw anything itself; it
//! produces the numbers, chart series, camera poses, and per-frame records that a host
//! application hands to its rendering and charting libraries.
//!
//! This crate is primarily built off of a small set of dependencies:
//! - [`nalgebra`](https://crates.io/crates/nalgebra): Provides the vector and quaternion math.
//! - [`csv`](https://crates.io/crates/csv) and [`serde`](https://crates.io/crates/serde): Provide
//!   reading and writing of derived records, reports, and configuration files.
//! - [`log`](https://crates.io/crates/log): Provides logging facades; binaries pick the backend.
//!
//! ## Crate overview
//!
//! This crate is organized into several modules:
//! - [earth]: Earth constants and the flat-Earth local-level projection.
//! - [samples]: The navigation sample type, the log row parser, and the immutable sample store.
//! - [kinematics]: Attitude conversion, position error, and angle-of-attack calculations.
//! - [analysis]: Summary statistics, plausibility checks, and the comparison report.
//! - [playback]: The shared playback state machine.
//! - [camera]: The chase camera that orbits the test vehicle.
//! - [zoom]: Per-chart zoom and pan history.
//! - [chart]: Data series handed to the charting library.
//! - [view]: Output contracts toward the rendering engine and overlays.
//! - [session]: The context object that wires all of the above together.
//! - [config]: Serializable configuration with sensible defaults.
//! - [error]: The crate error type.
//!
//! ## Coordinate conventions
//!
//! Geodetic positions are WGS84 latitude and longitude in *radians* and altitude in meters.
//! Velocities are North-East-Down (NED) in meters per second. Attitude is the body to NED
//! rotation stored as a quaternion $q = [w, x, y, z]$ and is *not* assumed to be unit norm; the
//! quaternion norm is itself one of the plausibility checks.
//!
//! Euler angles are reported in degrees using the aerospace ZYX (yaw-pitch-roll) sequence:
//!
//! $$
//! \phi = \operatorname{atan2}\left(2(wx + yz), 1 - 2(x^2 + y^2)\right), \quad
//! \theta = \arcsin\left(2(wy - zx)\right), \quad
//! \psi = \operatorname{atan2}\left(2(wz + xy), 1 - 2(y^2 + z^2)\right)
//! $$
//!
//! with the pitch argument clamped so gimbal lock yields exactly $\pm 90$ degrees.
//!
//! ## Threading
//!
//! Everything in this crate is single-threaded and synchronous. The host owns one
//! [`session::Session`] and routes its input and per-frame callbacks into it.
pub mod analysis;
pub mod camera;
pub mod chart;
pub mod config;
pub mod earth;
pub mod error;
pub mod kinematics;
pub mod playback;
pub mod samples;
pub mod session;
pub mod view;
pub mod zoom;

pub use error::{NavCompareError, Result};
pub use samples::{NavSample, SampleStore};
pub use session::Session;

/// Wrap an angle to the range -180 to 180 degrees
///
/// This function is generic and can be used with any type that implements the necessary traits.
///
/// # Arguments
/// * `angle` - The angle to be wrapped, which can be of any type that implements the necessary traits.
/// # Returns
/// * The wrapped angle, which will be in the range -180 to 180 degrees.
/// # Example
/// ```rust
/// use navcompare::wrap_to_180;
/// let angle = 190.0;
/// let wrapped_angle = wrap_to_180(angle);
/// assert_eq!(wrapped_angle, -170.0);
/// ```
pub fn wrap_to_180<T>(angle: T) -> T
where
    T: PartialOrd + Copy + std::ops::SubAssign + std::ops::AddAssign + From<f64>,
{
    let mut wrapped: T = angle;
    while wrapped > T::from(180.0) {
        wrapped -= T::from(360.0);
    }
    while wrapped < T::from(-180.0) {
        wrapped += T::from(360.0);
    }
    wrapped
}
/// Wrap an angle to the range $\pm\pi$ radians
///
/// # Example
/// ```rust
/// use navcompare::wrap_to_pi;
/// use std::f64::consts::PI;
/// let wrapped_angle = wrap_to_pi(3.0 * PI / 2.0);
/// assert!((wrapped_angle + PI / 2.0).abs() < 1e-12);
/// ```
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: PartialOrd + Copy + std::ops::SubAssign + std::ops::AddAssign + From<f64>,
{
    let mut wrapped: T = angle;
    while wrapped > T::from(std::f64::consts::PI) {
        wrapped -= T::from(2.0 * std::f64::consts::PI);
    }
    while wrapped < T::from(-std::f64::consts::PI) {
        wrapped += T::from(2.0 * std::f64::consts::PI);
    }
    wrapped
}
