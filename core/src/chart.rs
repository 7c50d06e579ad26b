//! Data series handed to the 2D charting library.
//!
//! A chart is an ordered set of x labels (sample times) and one or more named datasets with
//! display hints. Axis rendering, legends, and tooltips belong to the charting library; the
//! core only supplies the numbers and consumes zoom/pan callbacks through
//! [`crate::zoom::ZoomHistory`].
use serde::{Deserialize, Serialize};

use crate::kinematics::{DerivedFrame, EulerAngles, PositionError};
use crate::samples::SampleStore;
use crate::zoom::{AxisRange, ViewRanges};

/// Charts offered by the comparison view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    PositionError,
    Attitude,
    Altitude,
    Speed,
    AngleOfAttack,
    Bias,
    Gyro,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::PositionError,
        ChartKind::Attitude,
        ChartKind::Altitude,
        ChartKind::Speed,
        ChartKind::AngleOfAttack,
        ChartKind::Bias,
        ChartKind::Gyro,
    ];

    /// Name used to address the chart's zoom history.
    pub fn view_name(&self) -> &'static str {
        match self {
            ChartKind::PositionError => "position_error",
            ChartKind::Attitude => "attitude",
            ChartKind::Altitude => "altitude",
            ChartKind::Speed => "speed",
            ChartKind::AngleOfAttack => "angle_of_attack",
            ChartKind::Bias => "bias",
            ChartKind::Gyro => "gyro",
        }
    }
}

/// One named series with display hints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    /// CSS-style color string
    pub color: String,
    pub dashed: bool,
    pub hidden: bool,
}

impl Dataset {
    pub fn new(label: &str, data: Vec<f64>, color: &str) -> Self {
        Dataset {
            label: label.to_string(),
            data,
            color: color.to_string(),
            dashed: false,
            hidden: false,
        }
    }
    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Labels plus datasets for one chart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<f64>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// Full data-driven ranges over labels and every visible dataset.
    ///
    /// Returns `None` when there is nothing finite to show. Flat series get a unit-wide y range
    /// so the axis never collapses.
    pub fn full_ranges(&self) -> Option<ViewRanges> {
        let x = finite_range(self.labels.iter().copied())?;
        let y = finite_range(
            self.datasets
                .iter()
                .filter(|d| !d.hidden)
                .flat_map(|d| d.data.iter().copied()),
        )?;
        let y = if y.span() == 0.0 {
            AxisRange::new(y.min - 0.5, y.max + 0.5)
        } else {
            y
        };
        Some(ViewRanges::new(x, y))
    }
}

fn finite_range<I: Iterator<Item = f64>>(values: I) -> Option<AxisRange> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |range: Option<AxisRange>, v| match range {
            None => Some(AxisRange::new(v, v)),
            Some(r) => Some(AxisRange::new(r.min.min(v), r.max.max(v))),
        })
}

/// Inputs needed to build any chart.
pub struct ChartInputs<'a> {
    pub reference: &'a SampleStore,
    pub test: &'a SampleStore,
    pub reference_frame: &'a DerivedFrame,
    pub test_frame: &'a DerivedFrame,
    pub errors: &'a [PositionError],
}

fn axis_series<F: Fn(usize) -> f64>(len: usize, f: F) -> Vec<f64> {
    (0..len).map(f).collect()
}

/// Build the datasets for `kind`.
///
/// Comparison charts use the test trajectory's times over the overlapping samples; the
/// auxiliary bias and gyro charts use the full test trajectory.
pub fn build_chart(kind: ChartKind, inputs: &ChartInputs<'_>) -> ChartData {
    let overlap = inputs.errors.len();
    let test_times: Vec<f64> = inputs.test.times();
    let overlap_times = test_times.iter().copied().take(overlap).collect::<Vec<f64>>();
    match kind {
        ChartKind::PositionError => ChartData {
            labels: overlap_times,
            datasets: vec![
                Dataset::new(
                    "Horizontal error (m)",
                    inputs.errors.iter().map(|e| e.horizontal).collect(),
                    "#1f77b4",
                ),
                Dataset::new(
                    "3D error (m)",
                    inputs.errors.iter().map(|e| e.total).collect(),
                    "#d62728",
                ),
                Dataset::new(
                    "North error (m)",
                    inputs.errors.iter().map(|e| e.north).collect(),
                    "#2ca02c",
                )
                .hidden(),
                Dataset::new(
                    "East error (m)",
                    inputs.errors.iter().map(|e| e.east).collect(),
                    "#9467bd",
                )
                .hidden(),
                Dataset::new(
                    "Down error (m)",
                    inputs.errors.iter().map(|e| e.down).collect(),
                    "#8c564b",
                )
                .hidden(),
            ],
        },
        ChartKind::Attitude => {
            let reference = &inputs.reference_frame.euler;
            let test = &inputs.test_frame.euler;
            let angles: [(&str, fn(&EulerAngles) -> f64, &str); 3] = [
                ("roll", |e| e.roll, "#1f77b4"),
                ("pitch", |e| e.pitch, "#ff7f0e"),
                ("yaw", |e| e.yaw, "#2ca02c"),
            ];
            ChartData {
                labels: overlap_times,
                datasets: angles
                    .iter()
                    .flat_map(|(name, angle, color)| {
                        [
                            Dataset::new(
                                &format!("Ref {name} (deg)"),
                                axis_series(overlap, |i| angle(&reference[i])),
                                color,
                            )
                            .dashed(),
                            Dataset::new(
                                &format!("Test {name} (deg)"),
                                axis_series(overlap, |i| angle(&test[i])),
                                color,
                            ),
                        ]
                    })
                    .collect(),
            }
        }
        ChartKind::Altitude => ChartData {
            labels: overlap_times,
            datasets: vec![
                Dataset::new(
                    "Ref altitude (m)",
                    inputs.reference.iter().take(overlap).map(|s| s.position.altitude).collect(),
                    "#7f7f7f",
                )
                .dashed(),
                Dataset::new(
                    "Test altitude (m)",
                    inputs.test.iter().take(overlap).map(|s| s.position.altitude).collect(),
                    "#17becf",
                ),
            ],
        },
        ChartKind::Speed => ChartData {
            labels: overlap_times,
            datasets: vec![
                Dataset::new(
                    "Ref speed (m/s)",
                    inputs.reference.iter().take(overlap).map(|s| s.speed()).collect(),
                    "#7f7f7f",
                )
                .dashed(),
                Dataset::new(
                    "Test speed (m/s)",
                    inputs.test.iter().take(overlap).map(|s| s.speed()).collect(),
                    "#e377c2",
                ),
            ],
        },
        ChartKind::AngleOfAttack => {
            let aoa = &inputs.test_frame.angle_of_attack;
            ChartData {
                labels: test_times,
                datasets: vec![
                    Dataset::new("AoA (deg)", aoa.iter().map(|a| a.absolute).collect(), "#bcbd22"),
                    Dataset::new("Alpha (deg)", aoa.iter().map(|a| a.alpha).collect(), "#1f77b4"),
                    Dataset::new("Beta (deg)", aoa.iter().map(|a| a.beta).collect(), "#ff7f0e"),
                ],
            }
        }
        ChartKind::Bias => ChartData {
            labels: test_times,
            datasets: ["x", "y", "z"]
                .iter()
                .enumerate()
                .zip(["#1f77b4", "#ff7f0e", "#2ca02c"])
                .map(|((axis, name), color)| {
                    Dataset::new(
                        &format!("Accel bias {name}"),
                        inputs.test.iter().map(|s| s.accel_bias[axis]).collect(),
                        color,
                    )
                })
                .collect(),
        },
        ChartKind::Gyro => ChartData {
            labels: test_times,
            datasets: ["x", "y", "z"]
                .iter()
                .enumerate()
                .zip(["#1f77b4", "#ff7f0e", "#2ca02c"])
                .map(|((axis, name), color)| {
                    Dataset::new(
                        &format!("Gyro {name}"),
                        inputs.test.iter().map(|s| s.gyro[axis]).collect(),
                        color,
                    )
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earth::GeodeticPosition;
    use crate::kinematics::{derive_frame, error_series};
    use crate::samples::NavSample;
    use nalgebra::{Quaternion, Vector3};

    fn store(alts: &[f64]) -> SampleStore {
        SampleStore::from_samples(alts.iter().enumerate().map(|(i, alt)| NavSample {
            time: i as f64,
            position: GeodeticPosition::new(0.0, 0.0, *alt),
            velocity: Vector3::new(10.0, 0.0, 0.0),
            attitude: Quaternion::identity(),
            accel_bias: Vector3::new(0.1, 0.2, 0.3),
            gyro: Vector3::zeros(),
        }))
    }

    fn with_inputs<T>(
        reference: &SampleStore,
        test: &SampleStore,
        f: impl FnOnce(&ChartInputs<'_>) -> T,
    ) -> T {
        let anchor = reference.first().unwrap().position;
        let reference_frame = derive_frame(reference, &anchor, 1e-3);
        let test_frame = derive_frame(test, &anchor, 1e-3);
        let errors = error_series(reference, test);
        f(&ChartInputs {
            reference,
            test,
            reference_frame: &reference_frame,
            test_frame: &test_frame,
            errors: &errors,
        })
    }

    #[test]
    fn comparison_charts_cover_the_overlap() {
        let reference = store(&[100.0, 101.0, 102.0]);
        let test = store(&[100.0, 102.0, 104.0, 106.0]);
        with_inputs(&reference, &test, |inputs| {
            for kind in [
                ChartKind::PositionError,
                ChartKind::Attitude,
                ChartKind::Altitude,
                ChartKind::Speed,
            ] {
                let chart = build_chart(kind, inputs);
                assert_eq!(chart.labels.len(), 3, "{kind:?}");
                assert!(chart.datasets.iter().all(|d| d.data.len() == 3), "{kind:?}");
            }
            let gyro = build_chart(ChartKind::Gyro, inputs);
            assert_eq!(gyro.labels.len(), 4);
            let bias = build_chart(ChartKind::Bias, inputs);
            assert_eq!(bias.datasets[2].data, vec![0.3; 4]);
        });
    }
    #[test]
    fn full_ranges_ignore_hidden_series() {
        let reference = store(&[100.0, 100.0]);
        let test = store(&[100.0, 104.0]);
        with_inputs(&reference, &test, |inputs| {
            let chart = build_chart(ChartKind::PositionError, inputs);
            let ranges = chart.full_ranges().unwrap();
            assert_eq!(ranges.x, AxisRange::new(0.0, 1.0));
            // down error (-4) is hidden, so the y range is driven by the 3D error
            assert_eq!(ranges.y, AxisRange::new(0.0, 4.0));
        });
    }
    #[test]
    fn flat_series_get_a_non_empty_range() {
        let chart = ChartData {
            labels: vec![0.0, 1.0],
            datasets: vec![Dataset::new("flat", vec![2.0, 2.0], "#000000")],
        };
        assert_eq!(chart.full_ranges().unwrap().y, AxisRange::new(1.5, 2.5));
    }
    #[test]
    fn empty_chart_has_no_range() {
        assert!(ChartData::default().full_ranges().is_none());
    }
}
