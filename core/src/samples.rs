//! Sample storage and text-log loading for a single navigation trajectory.
//!
//! A [`SampleStore`] is the parsed, immutable time series for one trajectory, either the
//! *reference* (truth-like) trajectory or the *test* trajectory produced by an estimator. It is
//! created once from a log and never modified afterwards.
//!
//! # Log format
//!
//! Logs are plain text with one sample per line and whitespace-delimited numeric fields:
//!
//! ```text
//! time lat lon alt vn ve vd qw qx qy qz bias_x bias_y bias_z gyro_x gyro_y gyro_z
//! ```
//!
//! Latitude and longitude are in radians, altitude in meters, velocity in NED m/s, and the
//! attitude quaternion rotates body-frame vectors into the NED frame. The six trailing
//! auxiliary channels are carried through for display only.
//!
//! Blank lines and lines starting with `#` or `%` are skipped. Any other line that does not
//! hold at least [`REQUIRED_FIELDS`] finite numbers, or whose time does not strictly increase,
//! is dropped without raising an error; the store's length reflects only well-formed rows.
use log::{debug, info};
use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::earth::GeodeticPosition;
use crate::error::{NavCompareError, Result};

/// Minimum number of numeric fields in a well-formed log row.
pub const REQUIRED_FIELDS: usize = 17;

/// Which side of the comparison a trajectory is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryRole {
    Reference,
    Test,
}

impl Display for TrajectoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrajectoryRole::Reference => write!(f, "reference"),
            TrajectoryRole::Test => write!(f, "test"),
        }
    }
}

/// One time-indexed navigation sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavSample {
    /// Time in seconds
    pub time: f64,
    /// Geodetic position (radians, radians, meters)
    pub position: GeodeticPosition,
    /// Velocity in the NED frame, m/s
    pub velocity: Vector3<f64>,
    /// Body to NED attitude quaternion (w, x, y, z); not renormalized
    pub attitude: Quaternion<f64>,
    /// Auxiliary accelerometer bias channel
    pub accel_bias: Vector3<f64>,
    /// Auxiliary gyro channel
    pub gyro: Vector3<f64>,
}

impl NavSample {
    /// Ground-relative speed, the norm of the NED velocity in m/s.
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
    /// Norm of the stored attitude quaternion.
    pub fn quaternion_norm(&self) -> f64 {
        self.attitude.norm()
    }
    fn is_finite(&self) -> bool {
        self.time.is_finite()
            && self.position.is_finite()
            && self.velocity.iter().all(|v| v.is_finite())
            && self.attitude.coords.iter().all(|v| v.is_finite())
            && self.accel_bias.iter().all(|v| v.is_finite())
            && self.gyro.iter().all(|v| v.is_finite())
    }
}

impl Display for NavSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NavSample {{ t: {:.3} s, pos: {}, v_ned: [{:.3}, {:.3}, {:.3}] m/s, q: [{:.4}, {:.4}, {:.4}, {:.4}] }}",
            self.time,
            self.position,
            self.velocity[0],
            self.velocity[1],
            self.velocity[2],
            self.attitude.w,
            self.attitude.i,
            self.attitude.j,
            self.attitude.k
        )
    }
}

impl TryFrom<&[f64]> for NavSample {
    type Error = NavCompareError;

    fn try_from(fields: &[f64]) -> Result<Self> {
        if fields.len() < REQUIRED_FIELDS {
            return Err(NavCompareError::MalformedRow(format!(
                "expected at least {} fields, found {}",
                REQUIRED_FIELDS,
                fields.len()
            )));
        }
        let sample = NavSample {
            time: fields[0],
            position: GeodeticPosition::new(fields[1], fields[2], fields[3]),
            velocity: Vector3::new(fields[4], fields[5], fields[6]),
            attitude: Quaternion::new(fields[7], fields[8], fields[9], fields[10]),
            accel_bias: Vector3::new(fields[11], fields[12], fields[13]),
            gyro: Vector3::new(fields[14], fields[15], fields[16]),
        };
        if !sample.is_finite() {
            return Err(NavCompareError::MalformedRow(
                "row contains a non-finite value".to_string(),
            ));
        }
        Ok(sample)
    }
}

impl From<&NavSample> for Vec<f64> {
    fn from(sample: &NavSample) -> Self {
        vec![
            sample.time,
            sample.position.latitude,
            sample.position.longitude,
            sample.position.altitude,
            sample.velocity[0],
            sample.velocity[1],
            sample.velocity[2],
            sample.attitude.w,
            sample.attitude.i,
            sample.attitude.j,
            sample.attitude.k,
            sample.accel_bias[0],
            sample.accel_bias[1],
            sample.accel_bias[2],
            sample.gyro[0],
            sample.gyro[1],
            sample.gyro[2],
        ]
    }
}

/// Parse a single whitespace-delimited log row.
///
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_row(line: &str) -> Result<Option<NavSample>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
        return Ok(None);
    }
    let fields = trimmed
        .split_whitespace()
        .map(|field| {
            field
                .parse::<f64>()
                .map_err(|e| NavCompareError::MalformedRow(format!("'{field}': {e}")))
        })
        .collect::<Result<Vec<f64>>>()?;
    NavSample::try_from(fields.as_slice()).map(Some)
}

/// Immutable, time-ordered samples for one trajectory.
#[derive(Clone, Debug, Default)]
pub struct SampleStore {
    samples: Vec<NavSample>,
}

impl SampleStore {
    /// Build a store from already-parsed samples.
    ///
    /// Samples with non-finite values or non-increasing time are dropped, matching the
    /// behavior of the text reader.
    pub fn from_samples<I: IntoIterator<Item = NavSample>>(samples: I) -> Self {
        let mut accepted: Vec<NavSample> = Vec::new();
        for sample in samples {
            if !sample.is_finite() {
                debug!("Dropping sample with non-finite values at t = {}", sample.time);
                continue;
            }
            if let Some(last) = accepted.last()
                && sample.time <= last.time
            {
                debug!(
                    "Dropping sample at t = {} (previous accepted t = {})",
                    sample.time, last.time
                );
                continue;
            }
            accepted.push(sample);
        }
        SampleStore { samples: accepted }
    }

    /// Read a store from any buffered reader holding a text log.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut parsed = Vec::new();
        let mut dropped = 0usize;
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            match parse_row(&line) {
                Ok(Some(sample)) => parsed.push(sample),
                Ok(None) => {}
                Err(e) => {
                    dropped += 1;
                    debug!("Dropping line {}: {}", number + 1, e);
                }
            }
        }
        let well_formed = parsed.len();
        let store = SampleStore::from_samples(parsed);
        dropped += well_formed - store.len();
        if dropped > 0 {
            debug!("Dropped {} malformed rows", dropped);
        }
        Ok(store)
    }

    /// Read a store from a text log on disk.
    ///
    /// # Example
    /// ```no_run
    /// use navcompare::samples::SampleStore;
    /// let store = SampleStore::from_file("./data/reference.txt").expect("Failed to read log");
    /// println!("Loaded {} samples", store.len());
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = SampleStore::from_reader(BufReader::new(file))?;
        info!("Read {} samples from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&NavSample> {
        self.samples.get(index)
    }
    pub fn first(&self) -> Option<&NavSample> {
        self.samples.first()
    }
    pub fn last(&self) -> Option<&NavSample> {
        self.samples.last()
    }
    pub fn samples(&self) -> &[NavSample] {
        &self.samples
    }
    pub fn iter(&self) -> std::slice::Iter<'_, NavSample> {
        self.samples.iter()
    }
    /// Time stamps of every sample, in seconds.
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }
    /// Elapsed time between the first and last sample; zero for stores with fewer than two samples.
    pub fn duration(&self) -> f64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }
}

impl<'a> IntoIterator for &'a SampleStore {
    type Item = &'a NavSample;
    type IntoIter = std::slice::Iter<'a, NavSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
