use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// Everything that can go wrong between opening a file and writing a PNG.
///
/// Variants fall into three groups: configuration errors abort the run,
/// data-lookup and domain errors only skip the station, section or variable
/// being processed.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("station {0} not found in PROFILE")]
    StationNotFound(i32),

    #[error("no station left in selection {start}-{end}")]
    EmptySelection { start: i32, end: i32 },

    #[error("missing variable: {0}")]
    MissingVariable(String),

    #[error("invalid data in {key}: {message}")]
    InvalidData { key: String, message: String },

    #[error("requested depth {requested} exceeds available {key} data (deepest sample {deepest})")]
    DepthOutOfRange { key: String, requested: f64, deepest: f64 },

    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("rendering failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, PlotError>;

impl PlotError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_data(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidData { key: key.into(), message: message.into() }
    }

    /// Configuration errors terminate the process; anything else only costs
    /// the current unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl<E> From<DrawingAreaErrorKind<E>> for PlotError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        Self::Render(err.to_string())
    }
}
