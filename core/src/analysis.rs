//! Summary statistics, plausibility checks, and comparison reports.
//!
//! This module turns a pair of [`SampleStore`]s into the records surfaced to an analyst:
//! - a [`TrajectorySummary`] per trajectory (speed and quaternion-norm statistics, drift, and
//!   three advisory plausibility checks rolled into a [`Verdict`]),
//! - an [`ErrorSummary`] over the overlapping samples,
//! - the combined [`ComparisonReport`], which renders as plain-text analysis cards and
//!   serializes to JSON,
//! - a per-sample [`DerivedRecord`] table that can be exported to CSV.
//!
//! Plausibility checks never reject data. A failed check only adds an issue to the verdict.
//! Empty trajectories report "no data" instead of statistics.
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::path::Path;

use crate::config::PlausibilityLimits;
use crate::earth::{GeodeticPosition, geodetic_to_local_tangent};
use crate::error::{NavCompareError, Result};
use crate::kinematics::{PositionError, angle_of_attack, error_series, quaternion_to_euler};
use crate::samples::{SampleStore, TrajectoryRole};

/// Mean, extrema, and population standard deviation of a series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl Statistics {
    /// Statistics of `values`, or `None` when the series is empty.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        Some(Statistics {
            count,
            mean,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_dev: variance.sqrt(),
        })
    }
    fn is_finite(&self) -> bool {
        self.mean.is_finite()
            && self.min.is_finite()
            && self.max.is_finite()
            && self.std_dev.is_finite()
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean {:.4}, min {:.4}, max {:.4}, std {:.4}",
            self.mean, self.min, self.max, self.std_dev
        )
    }
}

/// Change in local-level position between the first and last sample, meters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Drift {
    pub north: f64,
    pub east: f64,
    /// Altitude change, positive up
    pub altitude: f64,
    /// Euclidean distance between first and last position
    pub total: f64,
}

/// Outcome of the three advisory plausibility checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlausibilityChecks {
    /// Every altitude lies within the configured band
    pub altitude_ok: bool,
    /// Maximum speed is below the configured limit
    pub speed_ok: bool,
    /// Every quaternion norm is within tolerance of one
    pub quaternion_ok: bool,
}

impl PlausibilityChecks {
    pub fn evaluate(store: &SampleStore, limits: &PlausibilityLimits) -> Self {
        PlausibilityChecks {
            altitude_ok: store.iter().all(|s| {
                s.position.altitude >= limits.min_altitude
                    && s.position.altitude <= limits.max_altitude
            }),
            speed_ok: store.iter().all(|s| s.speed() < limits.max_speed),
            quaternion_ok: store
                .iter()
                .all(|s| (s.quaternion_norm() - 1.0).abs() <= limits.quaternion_tolerance),
        }
    }
    /// Human-readable issue for every failed check.
    pub fn issues(&self, limits: &PlausibilityLimits) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.altitude_ok {
            issues.push(format!(
                "altitude outside [{}, {}] m",
                limits.min_altitude, limits.max_altitude
            ));
        }
        if !self.speed_ok {
            issues.push(format!("speed reaches or exceeds {} m/s", limits.max_speed));
        }
        if !self.quaternion_ok {
            issues.push(format!(
                "quaternion norm deviates from 1 by more than {}",
                limits.quaternion_tolerance
            ));
        }
        issues
    }
}

/// Overall plausibility verdict of one trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "issues", rename_all = "snake_case")]
pub enum Verdict {
    NoData,
    Reasonable,
    Issues(Vec<String>),
}

impl Verdict {
    pub fn is_reasonable(&self) -> bool {
        matches!(self, Verdict::Reasonable)
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::NoData => write!(f, "NO DATA"),
            Verdict::Reasonable => write!(f, "PHYSICALLY REASONABLE"),
            Verdict::Issues(issues) => write!(f, "ISSUES DETECTED: {}", issues.join("; ")),
        }
    }
}

/// Analysis card for one trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub role: TrajectoryRole,
    pub samples: usize,
    /// Seconds between the first and last sample
    pub duration: f64,
    pub speed: Option<Statistics>,
    pub quaternion_norm: Option<Statistics>,
    pub drift: Option<Drift>,
    pub checks: PlausibilityChecks,
    pub verdict: Verdict,
}

impl TrajectorySummary {
    /// Summarize `store`; drift is measured in the local-level frame anchored at `anchor`.
    pub fn new(
        role: TrajectoryRole,
        store: &SampleStore,
        anchor: &GeodeticPosition,
        limits: &PlausibilityLimits,
    ) -> Self {
        let checks = PlausibilityChecks::evaluate(store, limits);
        let verdict = if store.is_empty() {
            Verdict::NoData
        } else {
            let issues = checks.issues(limits);
            if issues.is_empty() {
                Verdict::Reasonable
            } else {
                warn!("{} trajectory failed plausibility checks: {}", role, issues.join("; "));
                Verdict::Issues(issues)
            }
        };
        let drift = match (store.first(), store.last()) {
            (Some(first), Some(last)) => {
                let start = geodetic_to_local_tangent(anchor, &first.position);
                let end = geodetic_to_local_tangent(anchor, &last.position);
                let delta = end - start;
                Some(Drift {
                    north: delta[0],
                    east: delta[1],
                    altitude: -delta[2],
                    total: delta.norm(),
                })
            }
            _ => None,
        };
        TrajectorySummary {
            role,
            samples: store.len(),
            duration: store.duration(),
            speed: Statistics::from_values(store.iter().map(|s| s.speed())),
            quaternion_norm: Statistics::from_values(store.iter().map(|s| s.quaternion_norm())),
            drift,
            checks,
            verdict,
        }
    }
}

impl Display for TrajectorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pass = |ok: bool| if ok { "PASS" } else { "FAIL" };
        writeln!(f, "=== {} trajectory ===", self.role.to_string().to_uppercase())?;
        if self.samples == 0 {
            return writeln!(f, "No data");
        }
        writeln!(f, "Samples:        {}", self.samples)?;
        writeln!(f, "Duration:       {:.3} s", self.duration)?;
        if let Some(speed) = &self.speed {
            writeln!(f, "Speed (m/s):    {speed}")?;
        }
        if let Some(norm) = &self.quaternion_norm {
            writeln!(f, "|q|:            {norm}")?;
        }
        if let Some(drift) = &self.drift {
            writeln!(
                f,
                "Drift:          N {:.3} m, E {:.3} m, Alt {:.3} m (total {:.3} m)",
                drift.north, drift.east, drift.altitude, drift.total
            )?;
        }
        writeln!(f, "Altitude check: {}", pass(self.checks.altitude_ok))?;
        writeln!(f, "Speed check:    {}", pass(self.checks.speed_ok))?;
        writeln!(f, "|q| check:      {}", pass(self.checks.quaternion_ok))?;
        writeln!(f, "Verdict:        {}", self.verdict)
    }
}

/// Statistics of the position error over the overlapping samples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Number of overlapping samples, `min(N_ref, N_test)`
    pub overlap: usize,
    pub horizontal: Option<Statistics>,
    pub total: Option<Statistics>,
    /// Error at the last overlapping sample
    pub final_error: Option<PositionError>,
}

impl ErrorSummary {
    pub fn new(errors: &[PositionError]) -> Self {
        ErrorSummary {
            overlap: errors.len(),
            horizontal: Statistics::from_values(errors.iter().map(|e| e.horizontal)),
            total: Statistics::from_values(errors.iter().map(|e| e.total)),
            final_error: errors.last().copied(),
        }
    }
}

impl Display for ErrorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== POSITION ERROR ===")?;
        if self.overlap == 0 {
            return writeln!(f, "No data");
        }
        writeln!(f, "Overlap:        {} samples", self.overlap)?;
        if let Some(horizontal) = &self.horizontal {
            writeln!(f, "Horizontal (m): {horizontal}")?;
        }
        if let Some(total) = &self.total {
            writeln!(f, "3D (m):         {total}")?;
        }
        if let Some(last) = &self.final_error {
            writeln!(
                f,
                "Final:          N {:.3} m, E {:.3} m, D {:.3} m",
                last.north, last.east, last.down
            )?;
        }
        Ok(())
    }
}

/// Full comparison of a test trajectory against a reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Origin of the local-level frame, the first reference position
    pub anchor: GeodeticPosition,
    pub reference: TrajectorySummary,
    pub test: TrajectorySummary,
    pub error: ErrorSummary,
    /// Per-sample error over the overlap
    #[serde(skip)]
    pub errors: Vec<PositionError>,
}

impl ComparisonReport {
    /// Compare two trajectories. The reference must not be empty, since its first sample anchors
    /// the local-level frame.
    pub fn new(
        reference: &SampleStore,
        test: &SampleStore,
        limits: &PlausibilityLimits,
    ) -> Result<Self> {
        let anchor = reference
            .first()
            .map(|s| s.position)
            .ok_or(NavCompareError::MissingTrajectory(TrajectoryRole::Reference))?;
        let errors = error_series(reference, test);
        let report = ComparisonReport {
            anchor,
            reference: TrajectorySummary::new(
                TrajectoryRole::Reference,
                reference,
                &anchor,
                limits,
            ),
            test: TrajectorySummary::new(TrajectoryRole::Test, test, &anchor, limits),
            error: ErrorSummary::new(&errors),
            errors,
        };
        report.check_finite()?;
        info!(
            "Compared {} reference and {} test samples over {} overlapping samples",
            report.reference.samples, report.test.samples, report.error.overlap
        );
        Ok(report)
    }

    fn check_finite(&self) -> Result<()> {
        let checks = [
            ("reference speed", self.reference.speed),
            ("reference quaternion norm", self.reference.quaternion_norm),
            ("test speed", self.test.speed),
            ("test quaternion norm", self.test.quaternion_norm),
            ("horizontal error", self.error.horizontal),
            ("3D error", self.error.total),
        ];
        for (quantity, stats) in checks {
            if let Some(stats) = stats
                && !stats.is_finite()
            {
                return Err(NavCompareError::NonFinite {
                    quantity: quantity.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Write the report as pretty-printed JSON.
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| NavCompareError::Io(std::io::Error::other(e)))
    }
}

impl Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Anchor: {}", self.anchor)?;
        writeln!(f)?;
        write!(f, "{}", self.reference)?;
        writeln!(f)?;
        write!(f, "{}", self.test)?;
        writeln!(f)?;
        write!(f, "{}", self.error)
    }
}

/// One row of the per-sample derived table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedRecord {
    pub time: f64,
    pub ref_roll_deg: f64,
    pub ref_pitch_deg: f64,
    pub ref_yaw_deg: f64,
    pub test_roll_deg: f64,
    pub test_pitch_deg: f64,
    pub test_yaw_deg: f64,
    pub north_m: f64,
    pub east_m: f64,
    pub down_m: f64,
    pub error_north_m: f64,
    pub error_east_m: f64,
    pub error_down_m: f64,
    pub error_horizontal_m: f64,
    pub error_3d_m: f64,
    pub aoa_deg: f64,
    pub alpha_deg: f64,
    pub beta_deg: f64,
}

impl DerivedRecord {
    /// Derived rows over the overlapping samples, using the test trajectory's time stamps.
    pub fn build(
        reference: &SampleStore,
        test: &SampleStore,
        limits: &PlausibilityLimits,
    ) -> Result<Vec<Self>> {
        let anchor = reference
            .first()
            .map(|s| s.position)
            .ok_or(NavCompareError::MissingTrajectory(TrajectoryRole::Reference))?;
        let errors = error_series(reference, test);
        let records = reference
            .iter()
            .zip(test.iter())
            .zip(errors)
            .map(|((r, t), error)| {
                let ref_euler = quaternion_to_euler(&r.attitude);
                let test_euler = quaternion_to_euler(&t.attitude);
                let local = geodetic_to_local_tangent(&anchor, &t.position);
                let aoa = angle_of_attack(&t.velocity, &t.attitude, limits.min_aoa_speed);
                DerivedRecord {
                    time: t.time,
                    ref_roll_deg: ref_euler.roll,
                    ref_pitch_deg: ref_euler.pitch,
                    ref_yaw_deg: ref_euler.yaw,
                    test_roll_deg: test_euler.roll,
                    test_pitch_deg: test_euler.pitch,
                    test_yaw_deg: test_euler.yaw,
                    north_m: local[0],
                    east_m: local[1],
                    down_m: local[2],
                    error_north_m: error.north,
                    error_east_m: error.east,
                    error_down_m: error.down,
                    error_horizontal_m: error.horizontal,
                    error_3d_m: error.total,
                    aoa_deg: aoa.absolute,
                    alpha_deg: aoa.alpha,
                    beta_deg: aoa.beta,
                }
            })
            .collect();
        Ok(records)
    }

    /// Writes derived records to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads derived records back from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Self>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in reader.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }
}
