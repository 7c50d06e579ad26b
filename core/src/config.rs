//! Runtime tunables for playback, the chase camera, zoom history, and plausibility checks.
//!
//! Every field has a default, so a configuration file only needs to name the values it
//! changes. Files may be JSON, YAML, or TOML; the format is chosen by file extension.
//!
//! ```toml
//! [playback]
//! step_per_tick = 10
//!
//! [camera]
//! distance = 50.0
//!
//! [plausibility]
//! max_speed = 300.0
//! ```
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{NavCompareError, Result};

/// Playback advancement settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Samples advanced per rendering tick while playing
    pub step_per_tick: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig { step_per_tick: 5 }
    }
}

/// Chase camera limits, sensitivities, and initial pose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial distance from the target
    pub distance: f64,
    /// Initial azimuth, radians
    pub azimuth: f64,
    /// Initial elevation, radians
    pub elevation: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Radians per pixel of pointer drag
    pub rotate_sensitivity: f64,
    /// Distance units per wheel delta unit
    pub wheel_sensitivity: f64,
    /// Distance units per pixel of pinch span change
    pub pinch_sensitivity: f64,
    /// Elevation stays this far (radians) from the poles
    pub pole_margin: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            distance: 30.0,
            azimuth: std::f64::consts::PI,
            elevation: 0.3,
            min_distance: 5.0,
            max_distance: 200.0,
            rotate_sensitivity: 0.01,
            wheel_sensitivity: 0.05,
            pinch_sensitivity: 0.1,
            pole_margin: 0.01,
        }
    }
}

/// Zoom and pan history settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    /// Maximum undo entries kept per view
    pub capacity: usize,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        ZoomConfig { capacity: 20 }
    }
}

/// Bounds used by the advisory plausibility checks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityLimits {
    /// Lowest plausible altitude, meters
    pub min_altitude: f64,
    /// Highest plausible altitude, meters
    pub max_altitude: f64,
    /// Speeds at or above this (m/s) are implausible
    pub max_speed: f64,
    /// Allowed deviation of the quaternion norm from one
    pub quaternion_tolerance: f64,
    /// Below this speed (m/s) angle of attack is reported as zero
    pub min_aoa_speed: f64,
}

impl Default for PlausibilityLimits {
    fn default() -> Self {
        PlausibilityLimits {
            min_altitude: -1000.0,
            max_altitude: 50000.0,
            max_speed: 500.0,
            quaternion_tolerance: 0.01,
            min_aoa_speed: 1e-3,
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavCompareConfig {
    pub playback: PlaybackConfig,
    pub camera: CameraConfig,
    pub zoom: ZoomConfig,
    pub plausibility: PlausibilityLimits,
}

fn config_error<E: std::fmt::Display>(e: E) -> NavCompareError {
    NavCompareError::Config(e.to_string())
}

impl NavCompareConfig {
    /// Write the configuration to a JSON file (pretty-printed).
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(config_error)
    }
    /// Read the configuration from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(file).map_err(config_error)
    }
    /// Write the configuration as YAML.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let s = serde_yaml::to_string(self).map_err(config_error)?;
        file.write_all(s.as_bytes())?;
        Ok(())
    }
    /// Read the configuration from YAML.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        serde_yaml::from_reader(file).map_err(config_error)
    }
    /// Write the configuration as TOML.
    pub fn to_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let s = toml::to_string(self).map_err(config_error)?;
        file.write_all(s.as_bytes())?;
        Ok(())
    }
    /// Read the configuration from TOML.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut s = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut s)?;
        toml::from_str(&s).map_err(config_error)
    }
    /// Generic write: choose format by file extension (.json/.yaml/.yml/.toml)
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        match extension(p).as_deref() {
            Some("json") => self.to_json(p),
            Some("yaml") | Some("yml") => self.to_yaml(p),
            Some("toml") => self.to_toml(p),
            _ => Err(unsupported(p)),
        }
    }
    /// Generic read: choose format by file extension (.json/.yaml/.yml/.toml)
    ///
    /// The loaded configuration is checked with [`NavCompareConfig::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let config = match extension(p).as_deref() {
            Some("json") => Self::from_json(p),
            Some("yaml") | Some("yml") => Self::from_yaml(p),
            Some("toml") => Self::from_toml(p),
            _ => Err(unsupported(p)),
        }?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall playback or leave the camera without a valid range.
    pub fn validate(&self) -> Result<()> {
        if self.playback.step_per_tick == 0 {
            return Err(invalid("playback.step_per_tick must be at least 1"));
        }
        let camera = &self.camera;
        let finite = [
            ("camera.distance", camera.distance),
            ("camera.azimuth", camera.azimuth),
            ("camera.elevation", camera.elevation),
            ("camera.min_distance", camera.min_distance),
            ("camera.max_distance", camera.max_distance),
            ("camera.rotate_sensitivity", camera.rotate_sensitivity),
            ("camera.wheel_sensitivity", camera.wheel_sensitivity),
            ("camera.pinch_sensitivity", camera.pinch_sensitivity),
            ("camera.pole_margin", camera.pole_margin),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(invalid(&format!("{name} must be finite")));
        }
        if camera.min_distance <= 0.0 || camera.max_distance <= 0.0 {
            return Err(invalid("camera distance bounds must be positive"));
        }
        if camera.min_distance > camera.max_distance {
            return Err(invalid(&format!(
                "camera.min_distance ({}) exceeds camera.max_distance ({})",
                camera.min_distance, camera.max_distance
            )));
        }
        if camera.distance < camera.min_distance || camera.distance > camera.max_distance {
            return Err(invalid(&format!(
                "camera.distance ({}) is outside [{}, {}]",
                camera.distance, camera.min_distance, camera.max_distance
            )));
        }
        if camera.pole_margin <= 0.0 || camera.pole_margin >= FRAC_PI_2 {
            return Err(invalid("camera.pole_margin must lie in (0, pi/2)"));
        }
        let limit = FRAC_PI_2 - camera.pole_margin;
        if camera.elevation.abs() > limit {
            return Err(invalid(&format!(
                "camera.elevation ({}) is outside [-{limit}, {limit}]",
                camera.elevation
            )));
        }
        let limits = &self.plausibility;
        if limits.min_altitude > limits.max_altitude {
            return Err(invalid("plausibility.min_altitude exceeds plausibility.max_altitude"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> NavCompareError {
    NavCompareError::Config(message.to_string())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

fn unsupported(path: &Path) -> NavCompareError {
    NavCompareError::Config(format!(
        "unsupported file extension for '{}' (expected .json, .yaml, .yml, or .toml)",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = NavCompareConfig::default();
        assert_eq!(config.playback.step_per_tick, 5);
        assert_eq!(config.zoom.capacity, 20);
        assert_eq!(config.camera.min_distance, 5.0);
        assert_eq!(config.camera.max_distance, 200.0);
        assert_eq!(config.camera.rotate_sensitivity, 0.01);
        assert_eq!(config.plausibility.max_altitude, 50000.0);
    }
    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: NavCompareConfig =
            toml::from_str("[playback]\nstep_per_tick = 12\n").expect("valid toml");
        assert_eq!(config.playback.step_per_tick, 12);
        assert_eq!(config.camera, CameraConfig::default());
    }
    #[test]
    fn file_round_trip_each_format() {
        let mut config = NavCompareConfig::default();
        config.camera.distance = 42.0;
        config.plausibility.max_speed = 321.0;
        for ext in ["json", "yaml", "toml"] {
            let path = std::env::temp_dir().join(format!("navcompare_config_test.{ext}"));
            config.to_file(&path).expect("write config");
            let read = NavCompareConfig::from_file(&path).expect("read config");
            assert_eq!(read, config, "round trip through .{ext}");
            let _ = std::fs::remove_file(&path);
        }
    }
    #[test]
    fn defaults_are_valid() {
        assert!(NavCompareConfig::default().validate().is_ok());
    }
    #[test]
    fn validate_rejects_unusable_values() {
        let cases: [fn(&mut NavCompareConfig); 6] = [
            |c| c.playback.step_per_tick = 0,
            |c| c.camera.min_distance = 300.0,
            |c| c.camera.max_distance = f64::NAN,
            |c| c.camera.pole_margin = 2.0,
            |c| c.camera.distance = 1.0,
            |c| c.camera.elevation = 1.6,
        ];
        for (i, mutate) in cases.iter().enumerate() {
            let mut config = NavCompareConfig::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(NavCompareError::Config(_))),
                "case {i} should be rejected"
            );
        }
    }
    #[test]
    fn from_file_rejects_inverted_distance_bounds() {
        let path = std::env::temp_dir().join("navcompare_config_inverted.toml");
        std::fs::write(&path, "[camera]\nmin_distance = 300.0\n").expect("write config");
        let result = NavCompareConfig::from_file(&path);
        assert!(matches!(result, Err(NavCompareError::Config(_))));
        let _ = std::fs::remove_file(&path);
    }
    #[test]
    fn unsupported_extension_is_rejected() {
        let result = NavCompareConfig::from_file("config.ini");
        assert!(matches!(result, Err(NavCompareError::Config(_))));
    }
}
