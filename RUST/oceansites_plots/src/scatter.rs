//! Surface maps of underway series (TSG): one panel per variable, positions
//! coloured by value.

use crate::error::{PlotError, Result};
use crate::scale::{Autoscale, ColorScale};
use crate::store::{Dataset, VarMeta};

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPanel {
    pub key:    String,
    pub meta:   VarMeta,
    /// (longitude, latitude, value), only fully defined samples inside the extent.
    pub points: Vec<(f64, f64, f64)>,
    pub scale:  ColorScale,
    pub xlabel: String,
    pub ylabel: String,
}

/// Collect the samples of `key` that fall inside `extent`
/// (`[lon_min, lon_max, lat_min, lat_max]`).
pub fn extract(ds: &Dataset, key: &str, autoscale: Autoscale, extent: [f64; 4]) -> Result<ScatterPanel> {
    let lon_var = ds.var("LONGITUDE")?;
    let lat_var = ds.var("LATITUDE")?;
    let lon = lon_var.as_series("LONGITUDE")?;
    let lat = lat_var.as_series("LATITUDE")?;
    let var = ds.var(key)?;
    let values = var.as_series(key)?;
    if values.len() != lon.len() || values.len() != lat.len() {
        return Err(PlotError::invalid_data(
            key,
            format!("{} samples for {} positions", values.len(), lon.len().min(lat.len())),
        ));
    }

    let [x0, x1, y0, y1] = extent;
    let points: Vec<(f64, f64, f64)> = lon
        .iter()
        .zip(lat)
        .zip(values)
        .map(|((&x, &y), &v)| (x, y, v))
        .filter(|(x, y, v)| x.is_finite() && y.is_finite() && v.is_finite())
        .filter(|&(x, y, _)| (x0..=x1).contains(&x) && (y0..=y1).contains(&y))
        .collect();
    if points.is_empty() {
        return Err(PlotError::invalid_data(key, "no defined sample inside the map extent"));
    }

    let scale = ColorScale::resolve(autoscale, key, &var.meta, points.iter().map(|p| p.2))?;
    Ok(ScatterPanel {
        key:    key.to_string(),
        meta:   var.meta.clone(),
        points,
        scale,
        xlabel: lon_var.meta.axis_name("LONGITUDE").to_string(),
        ylabel: lat_var.meta.axis_name("LATITUDE").to_string(),
    })
}
