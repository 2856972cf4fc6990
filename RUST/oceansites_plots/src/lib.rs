//! Profile, section and scatter charts from OceanSITES NetCDF files.
//!
//! The crate reads a whole file into a [`store::Dataset`], resolves station
//! numbers to rows, slices or grids the requested variables and renders one
//! PNG per station, section or variable group. The binaries only turn their
//! command line into a [`config::PlotConfig`] and hand it to [`run`].

pub mod config;
pub mod error;
pub mod profile;
pub mod render;
pub mod run;
pub mod scale;
pub mod scatter;
pub mod section;
pub mod station;
pub mod store;
pub mod timefmt;

#[cfg(test)]
mod lib_tests;

use std::path::PathBuf;
use std::time::Instant;

use glob::glob;
use log::warn;

pub use config::{FileDefaults, Instrument, PlotConfig};
pub use error::{PlotError, Result};
pub use run::RunSummary;
pub use store::Dataset;

// ─────────────────────────────────────────────────────────────────────
// Simple timing helper
// ─────────────────────────────────────────────────────────────────────
pub fn timeit<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let t0 = Instant::now();
    let out = f();
    log::debug!("{label:<20}{:?}", t0.elapsed());
    out
}

// ─────────────────────────────────────────────────────────────────────
// Input files
// ─────────────────────────────────────────────────────────────────────

/// Expand shell-style patterns, keeping their order. A pattern that matches
/// nothing is reported and dropped.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched: Vec<PathBuf> = glob(pattern)
            .map_err(|e| PlotError::config(format!("bad file pattern \"{pattern}\": {e}")))?
            .filter_map(std::result::Result::ok)
            .collect();
        if matched.is_empty() {
            warn!("{pattern}: no such file");
            continue;
        }
        matched.sort();
        files.extend(matched);
    }
    Ok(files)
}
