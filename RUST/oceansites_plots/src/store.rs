//! In-memory key/value view of an OceanSITES NetCDF file.
//!
//! The file is read once: every numeric 1-D or 2-D variable is copied into a
//! [`Variable`] with its metadata, and fill values are turned into `NaN` so
//! the numeric code never has to know about sentinels.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use ndarray::{Array2, ArrayView1};
use netcdf::AttributeValue;

use crate::error::{PlotError, Result};

/// Anything this large is a NetCDF default fill (≈9.97e36), not a measurement.
pub const FILL_LIMIT: f64 = 1.0e30;

pub const PROFILE_KEY: &str = "PROFILE";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarMeta {
    pub long_name:     Option<String>,
    pub standard_name: Option<String>,
    pub units:         Option<String>,
    pub valid_min:     Option<f64>,
    pub valid_max:     Option<f64>,
    pub fill_value:    Option<f64>,
}

impl VarMeta {
    pub fn valid_range(&self) -> Option<(f64, f64)> {
        match (self.valid_min, self.valid_max) {
            (Some(lo), Some(hi)) if lo < hi => Some((lo, hi)),
            _ => None,
        }
    }

    /// `"long name [units]"`, falling back to the key when the file is terse.
    pub fn label(&self, key: &str) -> String {
        let name = self.long_name.as_deref().unwrap_or(key);
        match self.units.as_deref() {
            Some(u) => format!("{name} [{u}]"),
            None    => name.to_string(),
        }
    }

    pub fn axis_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.standard_name.as_deref().unwrap_or(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// One value per station (LATITUDE, TIME, ...) or per record for series files.
    Series(Vec<f64>),
    /// Station × level.
    Profiles(Array2<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub values: Values,
    pub meta:   VarMeta,
}

impl Variable {
    pub fn series(values: Vec<f64>, meta: VarMeta) -> Self {
        Self { values: Values::Series(values), meta }
    }

    pub fn profiles(values: Array2<f64>, meta: VarMeta) -> Self {
        Self { values: Values::Profiles(values), meta }
    }

    pub fn as_series(&self, key: &str) -> Result<&[f64]> {
        match &self.values {
            Values::Series(v)   => Ok(v),
            Values::Profiles(_) => Err(PlotError::invalid_data(key, "expected a 1-D variable")),
        }
    }

    pub fn as_profiles(&self, key: &str) -> Result<&Array2<f64>> {
        match &self.values {
            Values::Profiles(a) => Ok(a),
            Values::Series(_)   => Err(PlotError::invalid_data(key, "expected a station × level variable")),
        }
    }

    pub fn row(&self, key: &str, station: usize) -> Result<ArrayView1<'_, f64>> {
        let a = self.as_profiles(key)?;
        if station >= a.nrows() {
            return Err(PlotError::invalid_data(key, format!("no row {station}")));
        }
        Ok(a.row(station))
    }
}

/// Labelled array store: cruise id, station numbers and `key → Variable`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub cycle_mesure: String,
    /// Station number of each data row, `None` where PROFILE is undefined.
    pub profiles:     Vec<Option<i32>>,
    vars:             BTreeMap<String, Variable>,
}

impl Dataset {
    pub fn new(cycle_mesure: impl Into<String>, profiles: Vec<i32>) -> Self {
        Self {
            cycle_mesure: cycle_mesure.into(),
            profiles:     profiles.into_iter().map(Some).collect(),
            vars:         BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, var: Variable) {
        self.vars.insert(key.into(), var);
    }

    pub fn var(&self, key: &str) -> Result<&Variable> {
        self.vars.get(key).ok_or_else(|| PlotError::MissingVariable(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Value of a per-station series at `index`, `None` when absent or undefined.
    pub fn station_value(&self, key: &str, index: usize) -> Option<f64> {
        self.vars
            .get(key)
            .and_then(|v| v.as_series(key).ok())
            .and_then(|s| s.get(index).copied())
            .filter(|v| v.is_finite())
    }

    /// Read every numeric 1-D and 2-D variable of an OceanSITES file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = netcdf::open(path).map_err(|e| PlotError::Open {
            path:    path.to_path_buf(),
            message: e.to_string(),
        })?;

        let cycle_mesure = file
            .attribute("cycle_mesure")
            .and_then(|a| a.value().ok())
            .and_then(attr_string)
            .unwrap_or_else(|| {
                path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown").to_string()
            });

        let mut ds = Dataset::new(cycle_mesure.trim(), Vec::new());

        for var in file.variables() {
            let name = var.name();
            let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
            if dims.is_empty() || dims.len() > 2 {
                debug!("skipping {name}: {} dimension(s)", dims.len());
                continue;
            }

            let raw: Vec<f64> = match var.get_values::<f64, _>(..) {
                Ok(v)  => v,
                Err(e) => {
                    debug!("skipping {name}: {e}");
                    continue;
                }
            };

            let meta = VarMeta {
                long_name:     var.attribute_value("long_name").and_then(|r| r.ok()).and_then(attr_string),
                standard_name: var.attribute_value("standard_name").and_then(|r| r.ok()).and_then(attr_string),
                units:         var.attribute_value("units").and_then(|r| r.ok()).and_then(attr_string),
                valid_min:     var.attribute_value("valid_min").and_then(|r| r.ok()).and_then(attr_f64),
                valid_max:     var.attribute_value("valid_max").and_then(|r| r.ok()).and_then(attr_f64),
                fill_value:    var.attribute_value("_FillValue").and_then(|r| r.ok()).and_then(attr_f64),
            };
            let values = mask_fill(raw, meta.fill_value);

            let variable = if dims.len() == 1 {
                Variable::series(values, meta)
            } else {
                let arr = Array2::from_shape_vec((dims[0], dims[1]), values)
                    .map_err(|e| PlotError::invalid_data(&name, e.to_string()))?;
                Variable::profiles(arr, meta)
            };
            ds.insert(name, variable);
        }

        if let Ok(var) = ds.var(PROFILE_KEY) {
            ds.profiles = station_numbers(var.as_series(PROFILE_KEY)?);
        }

        debug!(
            "{}: cycle_mesure={} stations={} variables={}",
            path.display(),
            ds.cycle_mesure,
            ds.profiles.len(),
            ds.vars.len()
        );
        Ok(ds)
    }
}

/// PROFILE values as station numbers, one per data row.
pub fn station_numbers(values: &[f64]) -> Vec<Option<i32>> {
    values
        .iter()
        .map(|v| v.is_finite().then(|| v.round() as i32))
        .collect()
}

/// Replace fill values with `NaN`.
pub fn mask_fill(mut values: Vec<f64>, fill: Option<f64>) -> Vec<f64> {
    for v in values.iter_mut() {
        let is_fill = fill.map_or(false, |f| *v == f);
        if is_fill || !v.is_finite() || v.abs() >= FILL_LIMIT {
            *v = f64::NAN;
        }
    }
    values
}

/// Number of leading samples that belong to the cast: up to the last defined
/// depth, and never past the first sample deeper than `max_depth`.
pub fn valid_len(depth: &[f64], max_depth: Option<f64>) -> usize {
    let defined = depth.iter().rposition(|d| d.is_finite()).map_or(0, |i| i + 1);
    match max_depth {
        Some(max) => depth[..defined].iter().position(|d| *d > max).unwrap_or(defined),
        None      => defined,
    }
}

fn attr_f64(value: AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Double(d)  => Some(d),
        AttributeValue::Float(f)   => Some(f as f64),
        AttributeValue::Int(i)     => Some(i as f64),
        AttributeValue::Short(s)   => Some(s as f64),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v)  => v.first().map(|f| *f as f64),
        _ => None,
    }
}

fn attr_string(value: AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Str(s)  => Some(s),
        AttributeValue::Strs(v) => v.into_iter().next(),
        _ => None,
    }
}
