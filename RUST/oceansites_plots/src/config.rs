//! Options handed to the plotting core.
//!
//! The command line fills a [`PlotConfig`]; a TOML file can provide the
//! defaults a cruise keeps reusing (colours, scales, output directory). Values
//! given on the command line always win.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::debug;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::scale::{Autoscale, YScale};
use crate::section::{XAxis, XPoints};
use crate::station::Selection;

pub const DEFAULT_OUTPUT: &str = "plots";
pub const DEFAULT_COLORS: [&str; 5] = ["k-", "b-", "r-", "m-", "g-"];
pub const DEFAULT_CLEVELS: usize = 20;
pub const DEFAULT_YSTEP: f64 = 1.0;
/// lon_min, lon_max, lat_min, lat_max of scatter maps.
pub const DEFAULT_EXTENT: [f64; 4] = [-40.0, 20.0, -30.0, 50.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum Instrument {
    Ctd,
    Xbt,
    Adcp,
    Tsg,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Instrument::Ctd  => "CTD",
            Instrument::Xbt  => "XBT",
            Instrument::Adcp => "ADCP",
            Instrument::Tsg  => "TSG",
        })
    }
}

/// Matplotlib-style line code: colour letter then `-` (line), `o` (markers) or both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color:   RGBColor,
    pub line:    bool,
    pub markers: bool,
}

impl LineStyle {
    pub fn parse(code: &str) -> Result<Self> {
        let mut chars = code.trim().chars();
        let color = match chars.next() {
            Some('k') => RGBColor(0, 0, 0),
            Some('b') => RGBColor(0, 0, 255),
            Some('r') => RGBColor(255, 0, 0),
            Some('g') => RGBColor(0, 128, 0),
            Some('m') => RGBColor(191, 0, 191),
            Some('c') => RGBColor(0, 191, 191),
            Some('y') => RGBColor(191, 191, 0),
            Some('w') => RGBColor(255, 255, 255),
            _ => return Err(PlotError::config(format!("invalid colour code \"{code}\""))),
        };
        let rest: String = chars.collect();
        let markers = rest.contains('o') || rest.contains('.');
        let line = rest.contains('-') || !markers;
        if rest.chars().any(|c| !matches!(c, '-' | 'o' | '.')) {
            return Err(PlotError::config(format!("invalid line style \"{code}\"")));
        }
        Ok(LineStyle { color, line, markers })
    }
}

/// Optional defaults file, every field may be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileDefaults {
    pub output:    Option<PathBuf>,
    pub colors:    Option<Vec<String>>,
    pub clevels:   Option<usize>,
    pub ystep:     Option<f64>,
    pub xinterp:   Option<usize>,
    /// `[[0, 250], [250, 2000]]`
    pub yscale:    Option<Vec<[f64; 2]>>,
    pub autoscale: Option<Vec<Autoscale>>,
    pub max_depth: Option<f64>,
    pub extent:    Option<[f64; 4]>,
    pub grid:      Option<bool>,
}

impl FileDefaults {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let defaults: FileDefaults = toml::from_str(&text)
            .map_err(|e| PlotError::config(format!("{}: {e}", path.display())))?;
        debug!("defaults from {}: {defaults:?}", path.display());
        Ok(defaults)
    }
}

#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub instrument: Instrument,
    /// First key is the vertical axis.
    pub keys:       Vec<String>,
    pub selection:  Selection,
    pub exclude:    Vec<i32>,
    pub xaxis:      XAxis,
    pub xpoints:    XPoints,
    pub ystep:      f64,
    pub clevels:    usize,
    /// One policy per plotted variable, the last one repeats.
    pub autoscale:  Vec<Autoscale>,
    pub yscale:     Option<YScale>,
    pub max_depth:  Option<f64>,
    pub colors:     Vec<LineStyle>,
    pub grid:       bool,
    pub extent:     [f64; 4],
    pub output_dir: PathBuf,
    pub suffix:     Option<String>,
    pub overwrite:  bool,
    pub display:    bool,
}

impl PlotConfig {
    pub fn new(instrument: Instrument, keys: Vec<String>) -> Self {
        Self {
            instrument,
            keys,
            selection:  Selection::All,
            exclude:    Vec::new(),
            xaxis:      XAxis::Latitude,
            xpoints:    XPoints::Native,
            ystep:      DEFAULT_YSTEP,
            clevels:    DEFAULT_CLEVELS,
            autoscale:  vec![Autoscale::Valid],
            yscale:     None,
            max_depth:  None,
            colors:     DEFAULT_COLORS.iter().filter_map(|c| LineStyle::parse(c).ok()).collect(),
            grid:       false,
            extent:     DEFAULT_EXTENT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT),
            suffix:     None,
            overwrite:  false,
            display:    false,
        }
    }

    /// Fill in whatever the defaults file sets.
    pub fn apply_defaults(&mut self, d: &FileDefaults) -> Result<()> {
        if let Some(out) = &d.output {
            self.output_dir = out.clone();
        }
        if let Some(colors) = &d.colors {
            self.colors = colors.iter().map(|c| LineStyle::parse(c)).collect::<Result<_>>()?;
        }
        if let Some(n) = d.clevels {
            self.clevels = n;
        }
        if let Some(step) = d.ystep {
            self.ystep = step;
        }
        if let Some(n) = d.xinterp {
            self.xpoints = XPoints::Count(n);
        }
        if let Some(ranges) = &d.yscale {
            self.yscale = Some(YScale::from_ranges(ranges.iter().map(|r| (r[0], r[1])).collect())?);
        }
        if let Some(a) = &d.autoscale {
            if !a.is_empty() {
                self.autoscale = a.clone();
            }
        }
        if d.max_depth.is_some() {
            self.max_depth = d.max_depth;
        }
        if let Some(extent) = d.extent {
            self.extent = extent;
        }
        if let Some(grid) = d.grid {
            self.grid = grid;
        }
        Ok(())
    }

    /// Checks that do not need the data.
    pub fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(PlotError::config("no variable key given"));
        }
        if self.clevels == 0 {
            return Err(PlotError::config("contour level count must be at least 1"));
        }
        if !(self.ystep > 0.0) {
            return Err(PlotError::config(format!("vertical step must be positive, got {}", self.ystep)));
        }
        if self.xpoints == XPoints::Count(0) {
            return Err(PlotError::config("horizontal point count must be at least 1"));
        }
        let [x0, x1, y0, y1] = self.extent;
        if !(x0 < x1 && y0 < y1) {
            return Err(PlotError::config(format!("invalid map extent {:?}", self.extent)));
        }
        Ok(())
    }

    pub fn autoscale_for(&self, i: usize) -> Autoscale {
        self.autoscale
            .get(i)
            .or_else(|| self.autoscale.last())
            .copied()
            .unwrap_or_default()
    }

    /// Colour of the i-th physical variable; `colors[0]` belongs to the vertical key.
    pub fn style_for(&self, i: usize) -> LineStyle {
        let fallback = LineStyle { color: RGBColor(0, 0, 0), line: true, markers: false };
        if self.colors.is_empty() {
            return fallback;
        }
        self.colors[(i + 1) % self.colors.len()]
    }

    fn suffix(&self) -> String {
        match self.suffix.as_deref() {
            Some(s) if !s.is_empty() => format!("_{s}"),
            _ => String::new(),
        }
    }

    /// `{cycle_mesure}-{profile:03}_{type}{suffix}.png`
    pub fn profile_path(&self, cycle_mesure: &str, profile: i32) -> PathBuf {
        self.output_dir.join(format!(
            "{cycle_mesure}-{profile:03}_{}{}.png",
            self.instrument,
            self.suffix()
        ))
    }

    /// `{cycle_mesure}-{start}-{end}_{type}_{var}{suffix}.png`
    pub fn section_path(&self, cycle_mesure: &str, start: i32, end: i32, var: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{cycle_mesure}-{start}-{end}_{}_{var}{}.png",
            self.instrument,
            self.suffix()
        ))
    }

    /// `{cycle_mesure}_{type}_{vars}_SCATTER{suffix}.png`
    pub fn scatter_path(&self, cycle_mesure: &str, vars: &[String]) -> PathBuf {
        self.output_dir.join(format!(
            "{cycle_mesure}_{}_{}_SCATTER{}.png",
            self.instrument,
            vars.join("-"),
            self.suffix()
        ))
    }

    pub fn ensure_output_dir(&self) -> Result<()> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir)?;
            debug!("created {}", self.output_dir.display());
        }
        Ok(())
    }

    /// `false` when the file is already there and must be kept.
    pub fn should_write(&self, path: &Path) -> bool {
        self.overwrite || !path.exists()
    }
}
