//! Error type shared by the library.
//!
//! Malformed log rows and numerically degenerate samples are *not* errors: rows are dropped
//! while reading and degenerate quantities are clamped or guarded where they are computed.
//! The variants below cover I/O, configuration, operations requested on absent data, and
//! analysis results that come out non-finite.
use thiserror::Error;

use crate::samples::TrajectoryRole;

#[derive(Debug, Error)]
pub enum NavCompareError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("malformed row: {0}")]
    MalformedRow(String),

    #[error("no {0} trajectory is loaded")]
    MissingTrajectory(TrajectoryRole),

    #[error("derived quantity '{quantity}' is not finite")]
    NonFinite { quantity: String },

    #[error("unknown view '{0}'")]
    UnknownView(String),
}

pub type Result<T> = std::result::Result<T, NavCompareError>;
