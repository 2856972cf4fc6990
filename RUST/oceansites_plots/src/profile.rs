//! Single-station slices for profile charts. No interpolation here: values
//! are plotted as sampled.

use crate::error::{PlotError, Result};
use crate::store::{valid_len, Dataset, VarMeta};

#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub key:    String,
    pub values: Vec<f64>,
    pub meta:   VarMeta,
}

impl Trace {
    /// Declared valid range, or the trace's own extent when the file has none.
    pub fn x_range(&self) -> (f64, f64) {
        if let Some(r) = self.meta.valid_range() {
            return r;
        }
        let (lo, hi) = self
            .values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        match (lo.is_finite(), hi.is_finite()) {
            (true, true) if lo < hi => (lo, hi),
            (true, true)            => (lo - 0.5, hi + 0.5),
            _                       => (0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationProfile {
    pub number:    i32,
    pub index:     usize,
    /// Vertical axis, the first key.
    pub y:         Trace,
    /// Physical variables in key order; the first one owns the main x axis.
    pub traces:    Vec<Trace>,
    pub time:      Option<f64>,
    pub latitude:  Option<f64>,
    pub longitude: Option<f64>,
}

impl StationProfile {
    pub fn y_range(&self) -> (f64, f64) {
        let (lo, hi) = self
            .y
            .values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if lo < hi { (lo, hi) } else { (lo.min(0.0), hi.max(1.0)) }
    }
}

/// Slice `keys` for the station at row `index`. `keys[0]` is the vertical
/// axis; its valid length, capped at `max_depth`, trims every trace.
pub fn extract(ds: &Dataset, index: usize, keys: &[String], max_depth: Option<f64>) -> Result<StationProfile> {
    if keys.len() < 2 {
        return Err(PlotError::config("profiles need a vertical key and at least one variable"));
    }
    let number = ds
        .profiles
        .get(index)
        .copied()
        .flatten()
        .ok_or_else(|| PlotError::invalid_data("PROFILE", format!("no station number on row {index}")))?;

    let ykey = &keys[0];
    let yvar = ds.var(ykey)?;
    let depth = yvar.row(ykey, index)?.to_vec();
    let n = valid_len(&depth, max_depth);
    if n == 0 {
        return Err(PlotError::invalid_data(ykey.as_str(), format!("profile {number} is empty")));
    }

    let traces = keys[1..]
        .iter()
        .map(|key| {
            let var = ds.var(key)?;
            let row = var.row(key, index)?;
            Ok(Trace {
                key:    key.clone(),
                values: row.iter().take(n).copied().collect(),
                meta:   var.meta.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StationProfile {
        number,
        index,
        y: Trace { key: ykey.clone(), values: depth[..n].to_vec(), meta: yvar.meta.clone() },
        traces,
        time:      ds.station_value("TIME", index),
        latitude:  ds.station_value("LATITUDE", index),
        longitude: ds.station_value("LONGITUDE", index),
    })
}
