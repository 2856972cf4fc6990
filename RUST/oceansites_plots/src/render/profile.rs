//! One chart per station. The first variable owns the main x axis; every
//! further variable gets its own x axis stacked above the chart, drawn in the
//! variable's colour.

use std::path::Path;

use plotters::prelude::*;

use super::{defined_runs, depth_tick, FONT};
use crate::config::{LineStyle, PlotConfig};
use crate::error::{PlotError, Result};
use crate::profile::{StationProfile, Trace};
use crate::timefmt::{dec2dms, format_julian, Hemisphere};

const WIDTH:      u32 = 1000;
const HEIGHT:     u32 = 700;
const HEADER:     u32 = 40;
/// Height of each extra x axis band.
const BAND:       u32 = 48;
const Y_LABELS:   u32 = 70;
const MARGIN_L:   u32 = 10;
const MARGIN_R:   u32 = 30;

/// `"{cycle_mesure}, {type}, Profile: 007 Date: ... Lat: ... Long: ..."`
pub fn header(cycle_mesure: &str, cfg: &PlotConfig, p: &StationProfile) -> String {
    let lat = p.latitude.map_or_else(|| "n/a".to_string(), |v| dec2dms(v, Hemisphere::NorthSouth));
    let lon = p.longitude.map_or_else(|| "n/a".to_string(), |v| dec2dms(v, Hemisphere::EastWest));
    format!(
        "{cycle_mesure}, {}, Profile: {:03} Date: {} Lat: {lat} Long: {lon}",
        cfg.instrument,
        p.number,
        format_julian(p.time),
    )
}

/// Map `v` from `from` onto `to`, so every trace can share one coordinate system.
fn rescale(v: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    if from.1 == from.0 {
        return to.0;
    }
    to.0 + (v - from.0) * (to.1 - to.0) / (from.1 - from.0)
}

pub fn draw(path: &Path, cfg: &PlotConfig, cycle_mesure: &str, p: &StationProfile) -> Result<()> {
    let Some(first) = p.traces.first() else {
        return Err(PlotError::config("profile chart needs at least one variable"));
    };
    let extra = (p.traces.len() - 1) as u32;

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT + BAND * extra)).into_drawing_area();
    root.fill(&WHITE)?;

    let (head, body) = root.split_vertically(HEADER as i32);
    head.draw(&Text::new(header(cycle_mesure, cfg, p), (MARGIN_L as i32 + 10, 12), (FONT, 16)))?;

    let (bands, main) = body.split_vertically((BAND * extra) as i32);
    let main_range = first.x_range();
    let (ytop, ybottom) = p.y_range();

    // extra axes, the second variable closest to the chart
    if extra > 0 {
        for (area, (k, trace)) in bands
            .split_evenly((extra as usize, 1))
            .iter()
            .zip(p.traces.iter().enumerate().skip(1).rev())
        {
            draw_band(area, trace, cfg.style_for(k))?;
        }
    }

    let mut chart = ChartBuilder::on(&main)
        .margin_left(MARGIN_L)
        .margin_right(MARGIN_R)
        .margin_top(5)
        .margin_bottom(10)
        .x_label_area_size(45)
        .y_label_area_size(Y_LABELS)
        // depth grows downwards
        .build_cartesian_2d(main_range.0..main_range.1, -ybottom..-ytop)?;

    let first_style = cfg.style_for(0);
    let depth_fmt = |v: &f64| depth_tick(*v);
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(first.meta.label(&first.key))
            .y_desc(p.y.meta.label(&p.y.key))
            .y_label_formatter(&depth_fmt)
            .x_labels(8)
            .axis_desc_style((FONT, 14).into_font().color(&first_style.color))
            .label_style((FONT, 12));
        if !cfg.grid {
            mesh.disable_mesh();
        }
        mesh.draw()?;
    }

    for (k, trace) in p.traces.iter().enumerate() {
        let style = cfg.style_for(k);
        let from = trace.x_range();
        let points = trace
            .values
            .iter()
            .zip(&p.y.values)
            .map(|(&v, &y)| (rescale(v, from, main_range), -y));
        draw_trace(&mut chart, defined_runs(points), style)?;
    }

    root.present()?;
    Ok(())
}

type ProfileChart<'a, 'b> = ChartContext<
    'a,
    BitMapBackend<'b>,
    Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>,
>;

fn draw_trace(chart: &mut ProfileChart<'_, '_>, runs: Vec<Vec<(f64, f64)>>, style: LineStyle) -> Result<()> {
    let color = style.color;
    for run in runs {
        if style.line {
            chart.draw_series(LineSeries::new(run.iter().copied(), color.stroke_width(1)))?;
        }
        if style.markers {
            chart.draw_series(run.iter().map(|&pt| Circle::new(pt, 2, color.filled())))?;
        }
    }
    Ok(())
}

fn draw_band(
    area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    trace: &Trace,
    style: LineStyle,
) -> Result<()> {
    let (lo, hi) = trace.x_range();
    let mut band = ChartBuilder::on(area)
        .margin_left(MARGIN_L)
        .margin_right(MARGIN_R)
        .x_label_area_size(BAND - 8)
        .y_label_area_size(Y_LABELS)
        .build_cartesian_2d(lo..hi, 0.0..1.0)?;
    band.configure_mesh()
        .disable_mesh()
        .disable_y_axis()
        .y_labels(0)
        .x_labels(8)
        .x_desc(trace.meta.label(&trace.key))
        .axis_style(&style.color)
        .label_style((FONT, 11).into_font().color(&style.color))
        .axis_desc_style((FONT, 13).into_font().color(&style.color))
        .draw()?;
    Ok(())
}
