//! Output contracts toward the rendering engine and text overlays.
//!
//! The library never draws anything itself. Each rendering tick (or scrub) the session builds
//! one immutable [`Frame`] from a single playback index and hands the *same* frame to every
//! [`FrameSink`]. The 3D view, the chart cursor, and the numeric readout therefore always
//! agree on the sample being shown.
//!
//! # Scene frame
//!
//! Rendering engines are usually y-up, so local-level NED coordinates are mapped as
//! `scene = (north, -down, east)`. This mapping is a proper rotation (+90 degrees about the
//! north axis), which lets body attitudes be carried into the scene by conjugation.
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::camera::CameraPose;

/// Map a local-level NED position into the y-up scene frame.
pub fn ned_to_scene(ned: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(ned[0], -ned[2], ned[1])
}

fn ned_to_scene_rotation() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2)
}

/// Express a body to NED attitude as a scene-frame orientation.
///
/// The quaternion is normalized here since rendering engines expect unit orientations; the
/// stored sample is left untouched. A (near) zero quaternion has no orientation and is shown
/// as level.
pub fn attitude_to_scene(attitude: &Quaternion<f64>) -> UnitQuaternion<f64> {
    let frame = ned_to_scene_rotation();
    let body =
        UnitQuaternion::try_new(*attitude, f64::EPSILON).unwrap_or_else(UnitQuaternion::identity);
    frame * body * frame.inverse()
}

/// Capabilities the core needs from a 3D rendering engine.
pub trait SceneRenderer {
    fn set_object_position(&mut self, position: &Vector3<f64>);
    fn set_object_orientation(&mut self, orientation: &UnitQuaternion<f64>);
    fn set_camera(&mut self, pose: &CameraPose);
    fn render(&mut self);
}

/// Everything shown for one playback index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    /// Test trajectory time at `index`, seconds
    pub time: f64,
    /// Vehicle position in the scene frame
    pub vehicle_position: Vector3<f64>,
    /// Vehicle orientation in the scene frame
    pub vehicle_orientation: UnitQuaternion<f64>,
    pub camera: CameraPose,
    pub readout: String,
    pub playing: bool,
}

/// Receiver of published frames (3D view, chart cursor, readout, recorders).
pub trait FrameSink {
    fn present(&mut self, frame: &Frame);
}

/// Adapts a [`SceneRenderer`] to receive frames.
pub struct RendererSink<R: SceneRenderer> {
    renderer: R,
}

impl<R: SceneRenderer> RendererSink<R> {
    pub fn new(renderer: R) -> Self {
        RendererSink { renderer }
    }
    pub fn renderer(&self) -> &R {
        &self.renderer
    }
    pub fn into_inner(self) -> R {
        self.renderer
    }
}

impl<R: SceneRenderer> FrameSink for RendererSink<R> {
    fn present(&mut self, frame: &Frame) {
        self.renderer.set_object_position(&frame.vehicle_position);
        self.renderer.set_object_orientation(&frame.vehicle_orientation);
        self.renderer.set_camera(&frame.camera);
        self.renderer.render();
    }
}

/// Text overlay updated in place each frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayLabel {
    text: String,
}

impl OverlayLabel {
    pub fn new() -> Self {
        OverlayLabel::default()
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    /// Replace the label text, reusing the buffer. Returns `true` if the text changed.
    pub fn update(&mut self, text: &str) -> bool {
        if self.text == text {
            return false;
        }
        self.text.clear();
        self.text.push_str(text);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<&'static str>,
        position: Vector3<f64>,
    }

    impl SceneRenderer for RecordingRenderer {
        fn set_object_position(&mut self, position: &Vector3<f64>) {
            self.position = *position;
            self.calls.push("position");
        }
        fn set_object_orientation(&mut self, _orientation: &UnitQuaternion<f64>) {
            self.calls.push("orientation");
        }
        fn set_camera(&mut self, _pose: &CameraPose) {
            self.calls.push("camera");
        }
        fn render(&mut self) {
            self.calls.push("render");
        }
    }

    #[test]
    fn ned_maps_to_y_up() {
        let scene = ned_to_scene(&Vector3::new(1.0, 2.0, -3.0));
        assert_eq!(scene, Vector3::new(1.0, 3.0, 2.0));
    }
    #[test]
    fn scene_attitude_agrees_with_position_mapping() {
        let attitude = UnitQuaternion::from_euler_angles(0.1, -0.2, 1.3);
        let body_forward = Vector3::new(1.0, 0.0, 0.0);
        let ned_forward = attitude.transform_vector(&body_forward);
        let scene_attitude = attitude_to_scene(attitude.quaternion());
        let scene_forward = scene_attitude.transform_vector(&ned_to_scene(&body_forward));
        let expected = ned_to_scene(&ned_forward);
        assert_approx_eq!(scene_forward[0], expected[0], 1e-12);
        assert_approx_eq!(scene_forward[1], expected[1], 1e-12);
        assert_approx_eq!(scene_forward[2], expected[2], 1e-12);
    }
    #[test]
    fn level_attitude_keeps_scene_up() {
        let up = attitude_to_scene(&Quaternion::identity()).transform_vector(&Vector3::y());
        assert_approx_eq!(up[1], 1.0, 1e-12);
    }
    #[test]
    fn zero_quaternion_is_shown_level() {
        let orientation = attitude_to_scene(&Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert!(orientation.coords.iter().all(|c| c.is_finite()));
        assert_approx_eq!(orientation.w.abs(), 1.0, 1e-12);
    }
    #[test]
    fn renderer_sink_sets_pose_then_renders() {
        let mut sink = RendererSink::new(RecordingRenderer::default());
        let frame = Frame {
            index: 0,
            time: 0.0,
            vehicle_position: Vector3::new(1.0, 2.0, 3.0),
            vehicle_orientation: UnitQuaternion::identity(),
            camera: CameraPose {
                position: Vector3::zeros(),
                look_at: Vector3::zeros(),
                up: Vector3::y(),
            },
            readout: String::new(),
            playing: false,
        };
        sink.present(&frame);
        let renderer = sink.into_inner();
        assert_eq!(renderer.calls, vec!["position", "orientation", "camera", "render"]);
        assert_eq!(renderer.position, Vector3::new(1.0, 2.0, 3.0));
    }
    #[test]
    fn overlay_label_reports_changes() {
        let mut label = OverlayLabel::new();
        assert!(label.update("t = 1.00 s"));
        assert!(!label.update("t = 1.00 s"));
        assert!(label.update("t = 2.00 s"));
        assert_eq!(label.text(), "t = 2.00 s");
    }
}
