//! Regular (horizontal × depth) grids for section contouring.
//!
//! Profiles are ragged in valid depth and sampled independently, so a section
//! is built in two passes: every station is interpolated onto a common depth
//! axis `yi`, then the stacked columns are optionally resampled onto a regular
//! horizontal axis `xi`.

use std::fmt;

use clap::ValueEnum;
use log::debug;
use ndarray::{s, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::scale::{linspace, Autoscale, ColorScale, YScale};
use crate::store::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum XAxis {
    Latitude,
    Longitude,
    Time,
}

impl XAxis {
    pub fn key(&self) -> &'static str {
        match self {
            XAxis::Latitude  => "LATITUDE",
            XAxis::Longitude => "LONGITUDE",
            XAxis::Time      => "TIME",
        }
    }
}

impl fmt::Display for XAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Horizontal resolution of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XPoints {
    /// One column per station, at the station coordinate.
    #[default]
    Native,
    Count(usize),
}

/// Everything `build` needs besides the data.
#[derive(Debug, Clone)]
pub struct SectionRequest<'a> {
    pub yaxis:     &'a str,
    pub variable:  &'a str,
    pub xaxis:     XAxis,
    pub yscale:    &'a YScale,
    pub xpoints:   XPoints,
    pub ystep:     f64,
    pub autoscale: Autoscale,
    pub clevels:   usize,
}

#[derive(Debug, Clone)]
pub struct SectionGrid {
    /// Horizontal axis, `zi.nrows()` long.
    pub xi:        Vec<f64>,
    /// Depth axis, `zi.ncols()` long, increasing.
    pub yi:        Vec<f64>,
    /// Horizontal sample × depth sample, `NaN` where undefined.
    pub zi:        Array2<f64>,
    /// Coordinates of the input stations, for station markers.
    pub station_x: Vec<f64>,
    pub scale:     ColorScale,
    pub levels:    Vec<f64>,
    pub major:     Vec<f64>,
}

/// Column at which the section stops: for each station the first sample with
/// depth ≥ `ymax`, the deepest of those over all stations.
pub fn cutoff_column<'a, I>(key: &str, depths: I, ymax: f64) -> Result<usize>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut deepest = f64::NEG_INFINITY;
    let mut cutoff: Option<usize> = None;
    for row in depths {
        deepest = row.iter().copied().filter(|d| d.is_finite()).fold(deepest, f64::max);
        if let Some(i) = row.iter().position(|&d| d >= ymax) {
            cutoff = Some(cutoff.map_or(i, |c| c.max(i)));
        }
    }
    cutoff.ok_or(PlotError::DepthOutOfRange { key: key.to_string(), requested: ymax, deepest })
}

/// `round(min)` to `ceil(max)` by `step`.
pub fn depth_axis(min: f64, max: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) || !step.is_finite() {
        return Err(PlotError::config(format!("vertical step must be positive, got {step}")));
    }
    let start = min.round_ties_even();
    let stop = max.ceil();
    if !(start.is_finite() && stop.is_finite()) || stop < start {
        return Err(PlotError::config(format!("empty depth axis [{min}, {max}]")));
    }
    // absorb float noise so 100/10 gives 11 points, not 10
    let n = ((stop - start) / step + 1e-9).floor() as usize + 1;
    Ok((0..n).map(|i| start + step * i as f64).collect())
}

/// Piecewise-linear interpolation of one cast onto `yi`.
///
/// Undefined samples are dropped before interpolating so they cannot leak
/// into their neighbours; outside the cast the nearest valid endpoint is
/// repeated. A cast without any valid sample gives an undefined row.
pub fn interp_profile(yi: &[f64], depth: &[f64], values: &[f64]) -> Vec<f64> {
    let mut pts: Vec<(f64, f64)> = depth
        .iter()
        .zip(values)
        .filter(|(d, v)| d.is_finite() && v.is_finite())
        .map(|(&d, &v)| (d, v))
        .collect();
    if pts.is_empty() {
        return vec![f64::NAN; yi.len()];
    }
    pts.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (first, last) = (pts[0], pts[pts.len() - 1]);
    yi.iter()
        .map(|&y| {
            if y <= first.0 {
                return first.1;
            }
            if y >= last.0 {
                return last.1;
            }
            let i = pts.partition_point(|p| p.0 <= y);
            let (lo, hi) = (pts[i - 1], pts[i]);
            if hi.0 == lo.0 {
                lo.1
            } else {
                lo.1 + (hi.1 - lo.1) * (y - lo.0) / (hi.0 - lo.0)
            }
        })
        .collect()
}

/// Make a longitude track continuous across the ±180° seam.
pub fn unwrap_longitudes(x: &mut [f64]) {
    let mut shift = 0.0;
    for i in 1..x.len() {
        let prev = x[i - 1];
        let mut cur = x[i] + shift;
        if !(prev.is_finite() && cur.is_finite()) {
            x[i] = cur;
            continue;
        }
        while cur - prev > 180.0 {
            cur -= 360.0;
            shift -= 360.0;
        }
        while cur - prev < -180.0 {
            cur += 360.0;
            shift += 360.0;
        }
        x[i] = cur;
    }
}

/// Resample station columns (`rows`: station × depth) onto `n` regular
/// horizontal points spanning the first to the last station.
///
/// All columns share `yi`, so linear interpolation over the scattered set
/// reduces to linear interpolation along x for each depth. Points outside the
/// station hull or next to an undefined sample are undefined.
pub fn regrid_horizontal(x: &[f64], rows: &Array2<f64>, n: usize) -> (Vec<f64>, Array2<f64>) {
    let ny = rows.ncols();
    if x.is_empty() || n == 0 {
        return (Vec::new(), Array2::from_elem((0, ny), f64::NAN));
    }
    let xi = linspace(x[0], x[x.len() - 1], n);

    let mut order: Vec<usize> = (0..x.len()).filter(|&i| x[i].is_finite()).collect();
    order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
    let xs: Vec<f64> = order.iter().map(|&i| x[i]).collect();

    let mut zi = Array2::from_elem((n, ny), f64::NAN);
    if xs.is_empty() {
        return (xi, zi);
    }
    let (lo_x, hi_x) = (xs[0], xs[xs.len() - 1]);

    for (k, &xv) in xi.iter().enumerate() {
        if xv < lo_x || xv > hi_x {
            continue;
        }
        let i = xs.partition_point(|&v| v < xv);
        for j in 0..ny {
            zi[[k, j]] = if i < xs.len() && xs[i] == xv {
                rows[[order[i], j]]
            } else {
                let (a, b) = (order[i - 1], order[i]);
                let (za, zb) = (rows[[a, j]], rows[[b, j]]);
                za + (zb - za) * (xv - xs[i - 1]) / (xs[i] - xs[i - 1])
            };
        }
    }
    (xi, zi)
}

/// Build the section grid of `req.variable` for the stations at `indices`.
pub fn build(ds: &Dataset, indices: &[usize], req: &SectionRequest<'_>) -> Result<SectionGrid> {
    if indices.is_empty() {
        return Err(PlotError::invalid_data(req.variable, "no station to grid"));
    }
    let depth_var = ds.var(req.yaxis)?;
    let depth = depth_var.as_profiles(req.yaxis)?;
    let zvar = ds.var(req.variable)?;
    let z = zvar.as_profiles(req.variable)?;
    if depth.dim() != z.dim() {
        return Err(PlotError::invalid_data(
            req.variable,
            format!("shape {:?} does not match {} {:?}", z.dim(), req.yaxis, depth.dim()),
        ));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i >= depth.nrows()) {
        return Err(PlotError::invalid_data(req.variable, format!("no row {bad}")));
    }

    let mut station_x: Vec<f64> = {
        let xs = ds.var(req.xaxis.key())?.as_series(req.xaxis.key())?;
        indices.iter().map(|&i| xs.get(i).copied().unwrap_or(f64::NAN)).collect()
    };
    if req.xaxis == XAxis::Longitude {
        unwrap_longitudes(&mut station_x);
    }

    // 1. truncate every cast at the requested depth
    let depth_rows: Vec<Vec<f64>> = indices.iter().map(|&i| depth.row(i).to_vec()).collect();
    let cutoff = cutoff_column(req.variable, depth_rows.iter().map(Vec::as_slice), req.yscale.max())?;
    let d_cut: Vec<Vec<f64>> = depth_rows.iter().map(|r| r[..=cutoff].to_vec()).collect();
    let z_cut: Vec<Vec<f64>> = indices
        .iter()
        .map(|&i| z.row(i).slice(s![..=cutoff]).to_vec())
        .collect();
    debug!("{}: cutoff column {cutoff} for {} m/dbar", req.variable, req.yscale.max());

    // 2. common depth axis
    let (dmin, dmax) = d_cut
        .iter()
        .flatten()
        .copied()
        .filter(|d| d.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));
    let yi = depth_axis(dmin, dmax, req.ystep)?;

    // 3. vertical interpolation, one station per task
    let columns: Vec<Vec<f64>> = d_cut
        .par_iter()
        .zip(z_cut.par_iter())
        .map(|(d, v)| interp_profile(&yi, d, v))
        .collect();
    let stacked = Array2::from_shape_vec(
        (columns.len(), yi.len()),
        columns.into_iter().flatten().collect(),
    )
    .map_err(|e| PlotError::invalid_data(req.variable, e.to_string()))?;

    // 4. horizontal axis
    let (xi, zi) = match req.xpoints {
        XPoints::Native => (station_x.clone(), stacked),
        XPoints::Count(n) => regrid_horizontal(&station_x, &stacked, n),
    };

    // 5-6. colour scale and levels
    let scale = ColorScale::resolve(
        req.autoscale,
        req.variable,
        &zvar.meta,
        z_cut.iter().flatten().copied(),
    )?;
    let levels = scale.levels(req.clevels);
    let major = scale.major_levels(req.clevels);

    Ok(SectionGrid { xi, yi, zi, station_x, scale, levels, major })
}
