//! Vertical ranges, colour scales and contour levels.

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::store::VarMeta;

/// `n` evenly spaced values from `a` to `b` inclusive.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let step = (b - a) / (n - 1) as f64;
            (0..n).map(|i| if i == n - 1 { b } else { a + step * i as f64 }).collect()
        }
    }
}

/// Colour-scale policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Autoscale {
    /// Declared `valid_min`/`valid_max` of the variable.
    #[default]
    Valid,
    /// Observed data min/max.
    Data,
    Explicit(f64, f64),
}

impl FromStr for Autoscale {
    type Err = PlotError;

    /// `valid`/`false`, `data`/`true`, or `MIN,MAX`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || PlotError::config(format!("invalid autoscale value \"{s}\", use valid, data or MIN,MAX"));
        match s.trim().to_ascii_lowercase().as_str() {
            "valid" | "false" => Ok(Autoscale::Valid),
            "data" | "true"   => Ok(Autoscale::Data),
            pair => {
                let parts: Vec<&str> = pair.split(',').map(str::trim).collect();
                if parts.len() != 2 {
                    return Err(bad());
                }
                let lo: f64 = parts[0].parse().map_err(|_| bad())?;
                let hi: f64 = parts[1].parse().map_err(|_| bad())?;
                if !(lo < hi) {
                    return Err(bad());
                }
                Ok(Autoscale::Explicit(lo, hi))
            }
        }
    }
}

impl TryFrom<String> for Autoscale {
    type Error = PlotError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Autoscale> for String {
    fn from(a: Autoscale) -> String {
        a.to_string()
    }
}

impl fmt::Display for Autoscale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Autoscale::Valid => write!(f, "valid"),
            Autoscale::Data  => write!(f, "data"),
            Autoscale::Explicit(lo, hi) => write!(f, "{lo},{hi}"),
        }
    }
}

/// One or more vertical windows, e.g. `[0,2000]` or `[[0,250],[250,2000]]`.
/// Each window becomes one panel of a section chart.
#[derive(Debug, Clone, PartialEq)]
pub struct YScale(Vec<(f64, f64)>);

impl YScale {
    pub fn single(top: f64, bottom: f64) -> Result<Self> {
        Self::from_flat(&[top, bottom])
    }

    /// Flat `top bottom [top bottom ...]` list as given on the command line.
    pub fn from_flat(values: &[f64]) -> Result<Self> {
        if values.is_empty() || values.len() % 2 != 0 {
            return Err(PlotError::config(format!(
                "invalid scale list shape: expected TOP BOTTOM pairs, got {} value(s)",
                values.len()
            )));
        }
        let ranges = values.chunks(2).map(|c| (c[0], c[1])).collect();
        Self::from_ranges(ranges)
    }

    pub fn from_ranges(ranges: Vec<(f64, f64)>) -> Result<Self> {
        if ranges.is_empty() {
            return Err(PlotError::config("invalid scale list shape: no vertical range"));
        }
        for &(top, bottom) in &ranges {
            if !(top.is_finite() && bottom.is_finite() && top < bottom) {
                return Err(PlotError::config(format!(
                    "invalid vertical range [{top}, {bottom}]"
                )));
            }
        }
        Ok(YScale(ranges))
    }

    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.0
    }

    /// Deepest requested value over all windows.
    pub fn max(&self) -> f64 {
        self.0.iter().map(|r| r.1).fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.0.iter().map(|r| r.0).fold(f64::INFINITY, f64::min)
    }
}

impl FromStr for YScale {
    type Err = PlotError;

    /// `"0,2000"` or `"0,250;250,2000"`.
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(|c| c == ',' || c == ';')
            .map(|p| {
                p.trim()
                    .parse::<f64>()
                    .map_err(|_| PlotError::config(format!("invalid scale list \"{s}\"")))
            })
            .collect::<Result<Vec<f64>>>()?;
        Self::from_flat(&values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Pick the bounds according to `autoscale`. The declared range falls back
    /// to the data when the variable does not carry one.
    pub fn resolve<I>(autoscale: Autoscale, key: &str, meta: &VarMeta, data: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = match autoscale {
            Autoscale::Explicit(lo, hi) => (lo, hi),
            Autoscale::Valid => match meta.valid_range() {
                Some(r) => r,
                None => {
                    warn!("{key} has no valid_min/valid_max, scaling on data");
                    data_range(key, data)?
                }
            },
            Autoscale::Data => data_range(key, data)?,
        };
        Ok(ColorScale { min, max })
    }

    /// `clevels + 1` uniform levels between min and max.
    pub fn levels(&self, clevels: usize) -> Vec<f64> {
        linspace(self.min, self.max, clevels + 1)
    }

    /// Sparser set drawn with heavier lines: `round(clevels / 5) + 1` levels.
    pub fn major_levels(&self, clevels: usize) -> Vec<f64> {
        let n = (clevels as f64 / 5.0).round_ties_even() as usize;
        linspace(self.min, self.max, n + 1)
    }

    /// Position of `v` in the scale, clamped to [0, 1].
    pub fn normalize(&self, v: f64) -> f64 {
        if self.max > self.min {
            ((v - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }
}

fn data_range<I: IntoIterator<Item = f64>>(key: &str, data: I) -> Result<(f64, f64)> {
    let (lo, hi) = data
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return Err(PlotError::invalid_data(key, "no defined value to scale on"));
    }
    if lo == hi {
        return Ok((lo - 0.5, hi + 0.5));
    }
    Ok((lo, hi))
}
