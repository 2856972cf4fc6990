//! Batch loops over stations, sections and scatter groups.
//!
//! A unit of work is one PNG. Configuration errors stop the whole run;
//! anything else is logged and the loop moves on to the next unit.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info, warn};

use crate::config::PlotConfig;
use crate::error::{PlotError, Result};
use crate::profile;
use crate::render;
use crate::scale::YScale;
use crate::scatter;
use crate::section::{self, SectionRequest};
use crate::store::Dataset;

/// Heartbeat every this many units.
const HEARTBEAT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed:  usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed  += other.failed;
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped + self.failed
    }

    /// Count one unit, or hand back the error when it must end the run.
    fn settle(&mut self, what: &str, outcome: Result<Outcome>) -> Result<()> {
        match outcome {
            Ok(Outcome::Written(path)) => {
                debug!("wrote {}", path.display());
                self.written += 1;
            }
            Ok(Outcome::Kept(path)) => {
                info!("{} exists, skipped (use --overwrite)", path.display());
                self.skipped += 1;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("{what}: {e}, skipped");
                self.failed += 1;
            }
        }
        let done = self.total();
        if done % HEARTBEAT == 0 {
            info!("[{}]  {done} unit(s) done", Local::now().format("%H:%M:%S"));
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Outcome {
    Written(PathBuf),
    Kept(PathBuf),
}

/// Render into `path` unless the file must be kept.
fn emit<F>(cfg: &PlotConfig, path: PathBuf, draw: F) -> Result<Outcome>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if !cfg.should_write(&path) {
        return Ok(Outcome::Kept(path));
    }
    info!("Printing: {}", path.display());
    draw(&path)?;
    if cfg.display {
        render::open_viewer(&path);
    }
    Ok(Outcome::Written(path))
}

// ─────────────────────────────────────────────────────────────────────
// Profiles
// ─────────────────────────────────────────────────────────────────────
pub fn run_profiles(ds: &Dataset, cfg: &PlotConfig) -> Result<RunSummary> {
    cfg.ensure_output_dir()?;
    let mut summary = RunSummary::default();

    for run in cfg.selection.profile_runs(&ds.profiles, &cfg.exclude) {
        let run = match run {
            Ok(run) => run,
            Err(e) => {
                summary.settle("profile selection", Err(e))?;
                continue;
            }
        };
        for &index in &run.indices {
            let Some(number) = ds.profiles[index] else { continue };
            let outcome = emit(cfg, cfg.profile_path(&ds.cycle_mesure, number), |path| {
                let p = profile::extract(ds, index, &cfg.keys, cfg.max_depth)?;
                render::profile::draw(path, cfg, &ds.cycle_mesure, &p)
            });
            summary.settle(&format!("profile {number}"), outcome)?;
        }
    }
    Ok(summary)
}

// ─────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────

/// `0` to the deepest defined sample of the selected stations.
pub fn default_yscale(ds: &Dataset, yaxis: &str, indices: &[usize]) -> Result<YScale> {
    let depth = ds.var(yaxis)?.as_profiles(yaxis)?;
    let deepest = indices
        .iter()
        .filter(|&&i| i < depth.nrows())
        .flat_map(|&i| depth.row(i).to_vec())
        .filter(|d| d.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !(deepest > 0.0) {
        return Err(PlotError::invalid_data(yaxis, "no positive depth to scale on"));
    }
    YScale::single(0.0, deepest)
}

pub fn run_sections(ds: &Dataset, cfg: &PlotConfig) -> Result<RunSummary> {
    cfg.ensure_output_dir()?;
    let Some((yaxis, variables)) = cfg.keys.split_first() else {
        return Err(PlotError::config("no variable key given"));
    };
    if variables.is_empty() {
        return Err(PlotError::config("sections need a vertical key and at least one variable"));
    }
    let mut summary = RunSummary::default();

    for run in cfg.selection.runs(&ds.profiles, &cfg.exclude) {
        let run = match run {
            Ok(run) => run,
            Err(e) => {
                summary.settle("section selection", Err(e))?;
                continue;
            }
        };
        let yscale = match &cfg.yscale {
            Some(y) => y.clone(),
            None => match default_yscale(ds, yaxis, &run.indices) {
                Ok(y) => y,
                Err(e) => {
                    summary.settle(&format!("section {}-{}", run.start, run.end), Err(e))?;
                    continue;
                }
            },
        };

        for (k, var) in variables.iter().enumerate() {
            let path = cfg.section_path(&ds.cycle_mesure, run.start, run.end, var);
            let outcome = emit(cfg, path, |path| {
                let req = SectionRequest {
                    yaxis,
                    variable:  var,
                    xaxis:     cfg.xaxis,
                    yscale:    &yscale,
                    xpoints:   cfg.xpoints,
                    ystep:     cfg.ystep,
                    autoscale: cfg.autoscale_for(k),
                    clevels:   cfg.clevels,
                };
                let grid = crate::timeit("section grid", || section::build(ds, &run.indices, &req))?;
                let labels = render::section::SectionLabels {
                    cycle_mesure: &ds.cycle_mesure,
                    variable:     var,
                    meta:         &ds.var(var)?.meta,
                    yaxis,
                    ymeta:        &ds.var(yaxis)?.meta,
                    xaxis:        cfg.xaxis,
                };
                crate::timeit("section render", || render::section::draw(path, &grid, &yscale, &labels))
            });
            summary.settle(&format!("section {}-{} {var}", run.start, run.end), outcome)?;
        }
    }
    Ok(summary)
}

// ─────────────────────────────────────────────────────────────────────
// Scatter
// ─────────────────────────────────────────────────────────────────────

/// All keys on one image; variables that cannot be drawn are left out.
pub fn run_scatter(ds: &Dataset, cfg: &PlotConfig) -> Result<RunSummary> {
    cfg.ensure_output_dir()?;
    let mut summary = RunSummary::default();

    let mut panels = Vec::with_capacity(cfg.keys.len());
    let mut drawn = Vec::with_capacity(cfg.keys.len());
    for (k, key) in cfg.keys.iter().enumerate() {
        match scatter::extract(ds, key, cfg.autoscale_for(k), cfg.extent) {
            Ok(panel) => {
                drawn.push(key.clone());
                panels.push(panel);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("scatter {key}: {e}, skipped");
                summary.failed += 1;
            }
        }
    }
    if panels.is_empty() {
        return Ok(summary);
    }

    let path = cfg.scatter_path(&ds.cycle_mesure, &drawn);
    let outcome = emit(cfg, path, |path| {
        render::scatter::draw(path, &ds.cycle_mesure, &panels, cfg.extent)
    });
    summary.settle(&format!("scatter {}", drawn.join("-")), outcome)?;
    Ok(summary)
}
