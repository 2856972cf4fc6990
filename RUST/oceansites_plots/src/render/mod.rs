//! PNG output through plotters. Each function renders one complete image and
//! writes it in a single `present()` once everything is drawn.

pub mod contour;
pub mod profile;
pub mod scatter;
pub mod section;

use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::Result;
use crate::scale::ColorScale;

pub const FONT: &str = "sans-serif";

/// Matplotlib's `jet`: dark blue → cyan → yellow → dark red over [0, 1].
pub fn jet(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let channel = |centre: f64| {
        let v = (1.5 - (4.0 * t - centre).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    RGBColor(channel(3.0), channel(2.0), channel(1.0))
}

/// Depth axis tick. Charts plot depth negated so it grows downwards; the
/// `+ 0.0` keeps the surface tick from printing as `-0`.
pub fn depth_tick(v: f64) -> String {
    format!("{:.0}", (-v).round() + 0.0)
}

/// Colour of the filled band holding `v`, `None` outside the scale.
pub fn band_color(scale: &ColorScale, nbands: usize, v: f64) -> Option<RGBColor> {
    if !v.is_finite() || v < scale.min || v > scale.max || nbands == 0 {
        return None;
    }
    let k = ((scale.normalize(v) * nbands as f64).floor() as usize).min(nbands - 1);
    Some(jet((k as f64 + 0.5) / nbands as f64))
}

/// Vertical colour bar: `nbands` blocks between the scale bounds, labelled at `ticks`.
pub fn draw_colorbar(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    scale: &ColorScale,
    nbands: usize,
    ticks: &[f64],
) -> Result<()> {
    let nbands = nbands.max(1);
    let mut bar = ChartBuilder::on(area)
        .margin_top(30)
        .margin_bottom(40)
        .margin_right(10)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, scale.min..scale.max)?;

    let step = (scale.max - scale.min) / nbands as f64;
    bar.draw_series((0..nbands).map(|k| {
        let lo = scale.min + step * k as f64;
        let color = jet((k as f64 + 0.5) / nbands as f64);
        Rectangle::new([(0.0, lo), (1.0, lo + step)], color.filled())
    }))?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .x_labels(0)
        .y_labels(ticks.len().max(2))
        .y_label_formatter(&|v| format!("{v:.1}"))
        .label_style((FONT, 12))
        .draw()?;
    Ok(())
}

/// Show the written PNG with the platform viewer.
pub fn open_viewer(path: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    match Command::new(opener).arg(path).spawn() {
        Ok(_)  => debug!("{opener} {}", path.display()),
        Err(e) => warn!("cannot display {}: {e}", path.display()),
    }
}

/// Split a trace into runs of defined points so gaps stay gaps.
pub(crate) fn defined_runs(points: impl Iterator<Item = (f64, f64)>) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
    for (x, y) in points {
        if x.is_finite() && y.is_finite() {
            if let Some(run) = runs.last_mut() {
                run.push((x, y));
            }
        } else if runs.last().map_or(false, |r| !r.is_empty()) {
            runs.push(Vec::new());
        }
    }
    runs.retain(|r| !r.is_empty());
    runs
}
