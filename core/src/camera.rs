//! Chase camera that orbits a moving, rotating target.
//!
//! The camera is parameterized by spherical coordinates (distance, azimuth, elevation) defined
//! in the *target's* local frame. Pointer drags change azimuth and elevation, the wheel and
//! two-finger pinches change distance. Each frame the world-space pose is re-derived from
//! those three numbers and the target's current position and attitude:
//!
//! $$
//! o = d \begin{bmatrix} \cos e \cos a \\\\ \sin e \\\\ \cos e \sin a \end{bmatrix}, \qquad
//! p_{cam} = p + q \, o \, q^{*}, \qquad u_{cam} = q \, \hat{y} \, q^{*}
//! $$
//!
//! The scene is y-up, so the camera's up vector is the world up axis rotated with the target and
//! the horizon rolls with the vehicle. No pose is cached between frames.
//!
//! Input handling is a pure transition on [`ChaseCamera`]: the host translates its pointer,
//! wheel, and touch callbacks into [`CameraInput`] values and feeds them to
//! [`ChaseCamera::handle`].
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt::{self, Display};

use crate::config::CameraConfig;
use crate::wrap_to_pi;

/// A single touch contact in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        TouchPoint { x, y }
    }
    fn distance_to(&self, other: &TouchPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Input events understood by the chase camera.
///
/// Touch events carry every contact still on the surface after the event.
#[derive(Clone, Debug, PartialEq)]
pub enum CameraInput {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    /// Positive deltas move the camera away from the target
    Wheel { delta: f64 },
    TouchStart(Vec<TouchPoint>),
    TouchMove(Vec<TouchPoint>),
    TouchEnd(Vec<TouchPoint>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Rotating {
        last_x: f64,
        last_y: f64,
    },
    Pinching {
        span: f64,
    },
}

/// World-space camera pose for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vector3<f64>,
    pub look_at: Vector3<f64>,
    pub up: Vector3<f64>,
}

impl Display for CameraPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CameraPose {{ pos: [{:.2}, {:.2}, {:.2}], look_at: [{:.2}, {:.2}, {:.2}], up: [{:.3}, {:.3}, {:.3}] }}",
            self.position[0],
            self.position[1],
            self.position[2],
            self.look_at[0],
            self.look_at[1],
            self.look_at[2],
            self.up[0],
            self.up[1],
            self.up[2]
        )
    }
}

/// Orbiting viewpoint locked to a target.
#[derive(Clone, Debug)]
pub struct ChaseCamera {
    distance: f64,
    azimuth: f64,
    elevation: f64,
    gesture: Gesture,
    config: CameraConfig,
}

impl Default for ChaseCamera {
    fn default() -> Self {
        ChaseCamera::new(CameraConfig::default())
    }
}

impl ChaseCamera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = ChaseCamera {
            distance: config.distance,
            azimuth: config.azimuth,
            elevation: config.elevation,
            gesture: Gesture::Idle,
            config,
        };
        camera.distance = camera.clamp_distance(camera.distance);
        camera.elevation = camera.clamp_elevation(camera.elevation);
        camera
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }
    /// Azimuth in radians; unbounded.
    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }
    pub fn elevation(&self) -> f64 {
        self.elevation
    }
    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Rotating { .. })
    }

    // inverted bounds resolve to max_distance
    fn clamp_distance(&self, distance: f64) -> f64 {
        distance
            .max(self.config.min_distance)
            .min(self.config.max_distance)
    }

    fn clamp_elevation(&self, elevation: f64) -> f64 {
        let limit = (FRAC_PI_2 - self.config.pole_margin).max(0.0);
        elevation.max(-limit).min(limit)
    }

    fn rotate(&mut self, dx: f64, dy: f64) {
        self.azimuth += dx * self.config.rotate_sensitivity;
        self.elevation = self.clamp_elevation(self.elevation + dy * self.config.rotate_sensitivity);
    }

    fn zoom(&mut self, delta: f64) {
        self.distance = self.clamp_distance(self.distance + delta);
    }

    /// Begin tracking the gesture implied by the contacts currently on the surface.
    fn track_touches(&mut self, touches: &[TouchPoint]) {
        self.gesture = match touches {
            [one] => Gesture::Rotating {
                last_x: one.x,
                last_y: one.y,
            },
            [a, b, ..] => Gesture::Pinching {
                span: a.distance_to(b),
            },
            [] => Gesture::Idle,
        };
    }

    /// Apply one input event.
    pub fn handle(&mut self, input: &CameraInput) {
        match input {
            CameraInput::PointerDown { x, y } => {
                self.gesture = Gesture::Rotating {
                    last_x: *x,
                    last_y: *y,
                };
            }
            CameraInput::PointerMove { x, y } => {
                if let Gesture::Rotating { last_x, last_y } = self.gesture {
                    self.rotate(x - last_x, y - last_y);
                    self.gesture = Gesture::Rotating {
                        last_x: *x,
                        last_y: *y,
                    };
                }
            }
            CameraInput::PointerUp | CameraInput::PointerLeave => {
                self.gesture = Gesture::Idle;
            }
            CameraInput::Wheel { delta } => {
                self.zoom(delta * self.config.wheel_sensitivity);
            }
            CameraInput::TouchStart(touches) | CameraInput::TouchEnd(touches) => {
                self.track_touches(touches);
            }
            CameraInput::TouchMove(touches) => match (self.gesture, touches.as_slice()) {
                (Gesture::Rotating { last_x, last_y }, [one]) => {
                    self.rotate(one.x - last_x, one.y - last_y);
                    self.track_touches(touches);
                }
                (Gesture::Pinching { span }, [a, b, ..]) => {
                    let new_span = a.distance_to(b);
                    // fingers spreading apart moves the camera in
                    self.zoom(-(new_span - span) * self.config.pinch_sensitivity);
                    self.gesture = Gesture::Pinching { span: new_span };
                }
                _ => self.track_touches(touches),
            },
        }
    }

    /// Offset from the target in the target's local frame.
    pub fn local_offset(&self) -> Vector3<f64> {
        let horizontal = self.distance * self.elevation.cos();
        Vector3::new(
            horizontal * self.azimuth.cos(),
            self.distance * self.elevation.sin(),
            horizontal * self.azimuth.sin(),
        )
    }

    /// World-space pose for a target at `position` with attitude `orientation`.
    pub fn pose(&self, position: &Vector3<f64>, orientation: &UnitQuaternion<f64>) -> CameraPose {
        CameraPose {
            position: position + orientation.transform_vector(&self.local_offset()),
            look_at: *position,
            up: orientation.transform_vector(&Vector3::y()),
        }
    }
}

impl Display for ChaseCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChaseCamera {{ distance: {:.2}, azimuth: {:.2} deg, elevation: {:.2} deg }}",
            self.distance,
            wrap_to_pi(self.azimuth).to_degrees(),
            self.elevation.to_degrees()
        )
    }
}
