//! Comparison session: the explicit context object owned by the host application.
//!
//! A [`Session`] holds the loaded trajectories, their derived frames, and the single instances
//! of the playback controller, chase camera, zoom history, and readout overlay. The host routes
//! its input callbacks and its per-frame rendering callback into the session's entry points;
//! there is no process-wide state.
//!
//! All work runs on the host's one thread. Each state object has exactly one writer (the
//! session entry point handling the event) and is read by [`Session::on_frame`] on the same
//! thread, so no locking is involved.
use log::{info, warn};
use std::path::Path;

use crate::analysis::{ComparisonReport, DerivedRecord};
use crate::camera::{CameraInput, ChaseCamera};
use crate::chart::{ChartData, ChartInputs, ChartKind, build_chart};
use crate::config::NavCompareConfig;
use crate::earth::GeodeticPosition;
use crate::error::{NavCompareError, Result};
use crate::kinematics::{DerivedFrame, derive_frame, error_series};
use crate::playback::{PlaybackController, PlaybackState};
use crate::samples::{SampleStore, TrajectoryRole};
use crate::view::{Frame, FrameSink, OverlayLabel, attitude_to_scene, ned_to_scene};
use crate::zoom::{UndoOutcome, ViewRanges, ZoomHistory};

pub struct Session {
    config: NavCompareConfig,
    reference: Option<SampleStore>,
    test: Option<SampleStore>,
    reference_frame: DerivedFrame,
    test_frame: DerivedFrame,
    playback: PlaybackController,
    camera: ChaseCamera,
    zoom: ZoomHistory,
    overlay: OverlayLabel,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(NavCompareConfig::default())
    }
}

impl Session {
    pub fn new(config: NavCompareConfig) -> Self {
        Session {
            playback: PlaybackController::new(0, config.playback.step_per_tick),
            camera: ChaseCamera::new(config.camera.clone()),
            zoom: ZoomHistory::new(config.zoom.capacity),
            reference: None,
            test: None,
            reference_frame: DerivedFrame::default(),
            test_frame: DerivedFrame::default(),
            overlay: OverlayLabel::new(),
            config,
        }
    }

    /// Convenience constructor that reads both trajectories from text logs.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        reference: P,
        test: Q,
        config: NavCompareConfig,
    ) -> Result<Self> {
        let mut session = Session::new(config);
        session.load_reference(SampleStore::from_file(reference)?);
        session.load_test(SampleStore::from_file(test)?);
        Ok(session)
    }

    pub fn config(&self) -> &NavCompareConfig {
        &self.config
    }
    pub fn reference(&self) -> Option<&SampleStore> {
        self.reference.as_ref()
    }
    pub fn test(&self) -> Option<&SampleStore> {
        self.test.as_ref()
    }
    pub fn reference_frame(&self) -> &DerivedFrame {
        &self.reference_frame
    }
    pub fn test_frame(&self) -> &DerivedFrame {
        &self.test_frame
    }
    pub fn playback(&self) -> PlaybackState {
        self.playback.state()
    }
    pub fn camera(&self) -> &ChaseCamera {
        &self.camera
    }
    pub fn zoom(&self) -> &ZoomHistory {
        &self.zoom
    }
    pub fn overlay(&self) -> &OverlayLabel {
        &self.overlay
    }

    /// Origin of the local-level frame: the first reference sample, or the first test sample
    /// while no reference is loaded.
    pub fn anchor(&self) -> Option<GeodeticPosition> {
        self.reference
            .as_ref()
            .and_then(|s| s.first())
            .or_else(|| self.test.as_ref().and_then(|s| s.first()))
            .map(|s| s.position)
    }

    fn rebuild_frames(&mut self) {
        let anchor = self.anchor().unwrap_or_default();
        let min_speed = self.config.plausibility.min_aoa_speed;
        self.reference_frame = self
            .reference
            .as_ref()
            .map(|s| derive_frame(s, &anchor, min_speed))
            .unwrap_or_default();
        self.test_frame = self
            .test
            .as_ref()
            .map(|s| derive_frame(s, &anchor, min_speed))
            .unwrap_or_default();
        self.register_charts();
    }

    /// Register every chart's full range with the zoom history, discarding old history.
    fn register_charts(&mut self) {
        for kind in ChartKind::ALL {
            self.zoom.unregister(kind.view_name());
            if let Ok(chart) = self.chart_data(kind)
                && let Some(full) = chart.full_ranges()
            {
                self.zoom.register(kind.view_name(), full);
            }
        }
    }

    pub fn load_reference(&mut self, store: SampleStore) {
        info!("Loaded reference trajectory with {} samples", store.len());
        self.reference = Some(store);
        self.rebuild_frames();
    }

    /// Load a new test trajectory. Playback returns to paused at index 0.
    pub fn load_test(&mut self, store: SampleStore) {
        info!("Loaded test trajectory with {} samples", store.len());
        self.playback.reset(store.len());
        self.test = Some(store);
        self.rebuild_frames();
    }

    fn loaded(&self) -> Result<(&SampleStore, &SampleStore)> {
        let reference = self
            .reference
            .as_ref()
            .ok_or(NavCompareError::MissingTrajectory(TrajectoryRole::Reference))?;
        let test = self
            .test
            .as_ref()
            .ok_or(NavCompareError::MissingTrajectory(TrajectoryRole::Test))?;
        Ok((reference, test))
    }

    /// Run the comparison. Requires both trajectories; never touches playback or camera state.
    pub fn analyze(&self) -> Result<ComparisonReport> {
        let (reference, test) = self.loaded().inspect_err(|e| warn!("Cannot analyze: {e}"))?;
        ComparisonReport::new(reference, test, &self.config.plausibility)
            .inspect_err(|e| warn!("Analysis failed: {e}"))
    }

    /// Per-sample derived table over the overlapping samples.
    pub fn derived_records(&self) -> Result<Vec<DerivedRecord>> {
        let (reference, test) = self.loaded()?;
        DerivedRecord::build(reference, test, &self.config.plausibility)
    }

    /// Data for one chart. Requires both trajectories.
    pub fn chart_data(&self, kind: ChartKind) -> Result<ChartData> {
        let (reference, test) = self.loaded()?;
        let errors = error_series(reference, test);
        Ok(build_chart(
            kind,
            &ChartInputs {
                reference,
                test,
                reference_frame: &self.reference_frame,
                test_frame: &self.test_frame,
                errors: &errors,
            },
        ))
    }

    pub fn toggle_play(&mut self) -> PlaybackState {
        self.playback.toggle_play()
    }

    /// Move playback to `index` (clamped, pausing playback) and publish the resulting frame.
    pub fn scrub(&mut self, index: usize, sinks: &mut [&mut dyn FrameSink]) -> Option<Frame> {
        self.test.as_ref()?;
        self.playback.scrub(index);
        let frame = self.current_frame()?;
        publish(&frame, sinks);
        Some(frame)
    }

    pub fn camera_input(&mut self, input: &CameraInput) {
        self.camera.handle(input);
    }

    /// Rendering-loop callback: advance playback if playing, then publish one frame built from
    /// a single index to every sink.
    pub fn on_frame(&mut self, timestamp: f64, sinks: &mut [&mut dyn FrameSink]) -> Option<Frame> {
        self.playback.tick(timestamp);
        let frame = self.current_frame()?;
        publish(&frame, sinks);
        Some(frame)
    }

    /// Frame for the current playback index, updating the readout overlay.
    pub fn current_frame(&mut self) -> Option<Frame> {
        let test = self.test.as_ref()?;
        let state = self.playback.state();
        let sample = test.get(state.index)?;
        let local = self.test_frame.local.get(state.index)?;
        let vehicle_position = ned_to_scene(local);
        let vehicle_orientation = attitude_to_scene(&sample.attitude);
        let camera = self.camera.pose(&vehicle_position, &vehicle_orientation);
        let readout = format!(
            "t = {:.2} s | sample {}/{} | {}",
            sample.time,
            state.index + 1,
            test.len(),
            if state.is_playing() { "playing" } else { "paused" }
        );
        self.overlay.update(&readout);
        Some(Frame {
            index: state.index,
            time: sample.time,
            vehicle_position,
            vehicle_orientation,
            camera,
            readout,
            playing: state.is_playing(),
        })
    }

    /// Snapshot `view`'s ranges before a zoom or drag-zoom gesture begins.
    pub fn begin_zoom(&mut self, view: &str) -> Result<()> {
        self.zoom.begin_zoom(view)
    }
    /// Record the ranges reported by the charting library after a zoom, drag, or pan.
    pub fn apply_zoom(&mut self, view: &str, ranges: ViewRanges) -> Result<()> {
        self.zoom.apply(view, ranges)
    }
    pub fn undo_zoom(&mut self, view: &str) -> Result<UndoOutcome> {
        let outcome = self.zoom.undo(view)?;
        if outcome == UndoOutcome::NothingToUndo {
            info!("Nothing to undo for view '{}'", view);
        }
        Ok(outcome)
    }
    pub fn reset_zoom(&mut self, view: &str) -> Result<ViewRanges> {
        self.zoom.reset(view)
    }
}

fn publish(frame: &Frame, sinks: &mut [&mut dyn FrameSink]) {
    for sink in sinks.iter_mut() {
        sink.present(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earth::GeodeticPosition;
    use crate::samples::NavSample;
    use crate::zoom::AxisRange;
    use nalgebra::{Quaternion, Vector3};

    #[derive(Default)]
    struct Collector {
        frames: Vec<Frame>,
    }

    impl FrameSink for Collector {
        fn present(&mut self, frame: &Frame) {
            self.frames.push(frame.clone());
        }
    }

    fn store(len: usize) -> SampleStore {
        SampleStore::from_samples((0..len).map(|i| NavSample {
            time: i as f64 * 0.1,
            position: GeodeticPosition::new(0.0, 0.0, 100.0 + i as f64),
            velocity: Vector3::new(10.0, 0.0, 0.0),
            attitude: Quaternion::identity(),
            accel_bias: Vector3::zeros(),
            gyro: Vector3::zeros(),
        }))
    }

    #[test]
    fn analyze_requires_both_trajectories() {
        let mut session = Session::default();
        assert!(matches!(
            session.analyze(),
            Err(NavCompareError::MissingTrajectory(TrajectoryRole::Reference))
        ));
        session.load_reference(store(3));
        assert!(matches!(
            session.analyze(),
            Err(NavCompareError::MissingTrajectory(TrajectoryRole::Test))
        ));
        session.load_test(store(3));
        assert!(session.analyze().is_ok());
    }
    #[test]
    fn failed_analysis_leaves_playback_alone() {
        let mut session = Session::default();
        session.load_test(store(20));
        session.scrub(7, &mut []);
        session.toggle_play();
        assert!(session.analyze().is_err());
        assert_eq!(session.playback().index, 7);
        assert!(session.playback().is_playing());
    }
    #[test]
    fn every_sink_sees_the_same_frame() {
        let mut session = Session::default();
        session.load_reference(store(30));
        session.load_test(store(30));
        session.toggle_play();
        let mut a = Collector::default();
        let mut b = Collector::default();
        for tick in 0..3 {
            session.on_frame(tick as f64 / 60.0, &mut [&mut a, &mut b]);
        }
        assert_eq!(a.frames, b.frames);
        assert_eq!(
            a.frames.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![5, 10, 15]
        );
        assert_eq!(a.frames[2].time, session.test().unwrap().get(15).unwrap().time);
        assert_eq!(session.overlay().text(), a.frames[2].readout);
    }
    #[test]
    fn loading_a_test_trajectory_resets_playback() {
        let mut session = Session::default();
        session.load_test(store(30));
        session.toggle_play();
        session.on_frame(0.0, &mut []);
        session.load_test(store(10));
        assert_eq!(session.playback(), PlaybackState::default());
    }
    #[test]
    fn scrub_without_test_is_a_no_op() {
        let mut session = Session::default();
        let mut sink = Collector::default();
        assert!(session.scrub(3, &mut [&mut sink]).is_none());
        assert!(sink.frames.is_empty());
        assert!(session.on_frame(0.0, &mut [&mut sink]).is_none());
    }
    #[test]
    fn zero_step_playback_still_finishes() {
        let mut config = NavCompareConfig::default();
        config.playback.step_per_tick = 0;
        let mut session = Session::new(config);
        session.load_test(store(10));
        session.toggle_play();
        for tick in 0..100 {
            session.on_frame(tick as f64, &mut []);
        }
        assert_eq!(session.playback().index, 9);
        assert!(!session.playback().is_playing());
    }
    #[test]
    fn zero_quaternion_yields_finite_poses() {
        let mut sample = store(1).first().copied().unwrap();
        sample.attitude = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        let mut session = Session::default();
        session.load_test(SampleStore::from_samples([sample]));
        let frame = session.scrub(0, &mut []).unwrap();
        assert!(frame.camera.position.iter().all(|c| c.is_finite()));
        assert!(frame.camera.up.iter().all(|c| c.is_finite()));
        assert!(frame.vehicle_orientation.coords.iter().all(|c| c.is_finite()));
    }
    #[test]
    fn frame_altitude_appears_as_scene_height() {
        let mut session = Session::default();
        session.load_reference(store(10));
        session.load_test(store(10));
        let frame = session.scrub(4, &mut []).unwrap();
        assert_eq!(frame.vehicle_position, Vector3::new(0.0, 4.0, 0.0));
        assert_eq!(frame.camera.look_at, frame.vehicle_position);
    }
    #[test]
    fn charts_are_registered_for_zoom() {
        let mut session = Session::default();
        session.load_reference(store(10));
        session.load_test(store(10));
        let view = ChartKind::Altitude.view_name();
        let full = session.zoom().current(view).unwrap();
        session.begin_zoom(view).unwrap();
        let zoomed = ViewRanges::new(AxisRange::new(0.2, 0.4), AxisRange::new(101.0, 103.0));
        session.apply_zoom(view, zoomed).unwrap();
        assert_eq!(session.undo_zoom(view).unwrap(), UndoOutcome::Restored(full));
        assert_eq!(session.reset_zoom(view).unwrap(), full);
        assert_eq!(session.undo_zoom(view).unwrap(), UndoOutcome::NothingToUndo);
    }
}
