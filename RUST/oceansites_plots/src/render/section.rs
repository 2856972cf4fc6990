//! Contoured vertical sections: filled bands, thin isolines at every level,
//! heavier labelled isolines at the major levels. A split depth scale gives
//! one panel per range, stacked top to bottom and sharing the colour bar.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::contour::{cells, isolines, Cell, Segment};
use super::{band_color, depth_tick, draw_colorbar, FONT};
use crate::error::Result;
use crate::scale::YScale;
use crate::section::{SectionGrid, XAxis};
use crate::store::VarMeta;
use crate::timefmt::{latitude_tick, longitude_tick, time_tick};

const WIDTH:    u32 = 1000;
const HEIGHT:   u32 = 700;
const COLORBAR: u32 = 110;

/// What the chart says about its data besides the grid itself.
#[derive(Debug, Clone, Copy)]
pub struct SectionLabels<'a> {
    pub cycle_mesure: &'a str,
    pub variable:     &'a str,
    pub meta:         &'a VarMeta,
    pub yaxis:        &'a str,
    pub ymeta:        &'a VarMeta,
    pub xaxis:        XAxis,
}

/// `"{cycle_mesure}\n{var}, {long_name} [{units}]"`
pub fn title(labels: &SectionLabels<'_>) -> String {
    format!(
        "{}\n{}, {}",
        labels.cycle_mesure,
        labels.variable,
        labels.meta.label(labels.variable)
    )
}

pub fn x_tick(xaxis: XAxis, v: f64) -> String {
    match xaxis {
        XAxis::Latitude  => latitude_tick(v),
        XAxis::Longitude => longitude_tick(v),
        XAxis::Time      => time_tick(v),
    }
}

pub fn draw(path: &Path, grid: &SectionGrid, yscale: &YScale, labels: &SectionLabels<'_>) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    // plotters text is single line
    let title = title(labels);
    let mut lines = title.lines();
    let (head, body) = root.split_vertically(60);
    if let Some(first) = lines.next() {
        head.draw(&Text::new(first.to_string(), (WIDTH as i32 / 2 - 120, 8), (FONT, 18)))?;
    }
    if let Some(second) = lines.next() {
        head.draw(&Text::new(second.to_string(), (WIDTH as i32 / 2 - 120, 32), (FONT, 15)))?;
    }

    let (plots, bar) = body.split_horizontally((WIDTH - COLORBAR) as i32);
    let nbands = grid.levels.len().saturating_sub(1);

    let (xmin, xmax) = x_extent(&grid.xi);
    let ranges = yscale.ranges();
    let panels = plots.split_evenly((ranges.len(), 1));

    let thin = isolines_at(grid, &grid.levels);
    let thick = isolines_at(grid, &grid.major);
    let filled = cells(&grid.xi, &grid.yi, &grid.zi);

    for (k, (panel, &(top, bottom))) in panels.iter().zip(ranges).enumerate() {
        let last = k + 1 == ranges.len();
        draw_panel(
            panel,
            labels,
            grid,
            PanelView { xmin, xmax, top, bottom, first: k == 0, last },
            &filled,
            &thin,
            &thick,
            nbands,
        )?;
    }

    draw_colorbar(&bar, &grid.scale, nbands, &grid.major)?;
    root.present()?;
    Ok(())
}

fn x_extent(xi: &[f64]) -> (f64, f64) {
    let (lo, hi) = xi
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

fn isolines_at(grid: &SectionGrid, levels: &[f64]) -> Vec<(f64, Vec<Segment>)> {
    levels.iter().map(|&lvl| (lvl, isolines(&grid.xi, &grid.yi, &grid.zi, lvl))).collect()
}

#[derive(Debug, Clone, Copy)]
struct PanelView {
    xmin:   f64,
    xmax:   f64,
    top:    f64,
    bottom: f64,
    first:  bool,
    last:   bool,
}

impl PanelView {
    fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(self.top, self.bottom)
    }

    fn holds(&self, y0: f64, y1: f64) -> bool {
        y0.max(y1) >= self.top && y0.min(y1) <= self.bottom
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &SectionLabels<'_>,
    grid: &SectionGrid,
    view: PanelView,
    filled: &[Cell],
    thin: &[(f64, Vec<Segment>)],
    thick: &[(f64, Vec<Segment>)],
    nbands: usize,
) -> Result<()> {
    let mut chart = ChartBuilder::on(area)
        .margin_left(10)
        .margin_right(15)
        .margin_top(8)
        .x_label_area_size(if view.last { 45 } else { 20 })
        .y_label_area_size(65)
        // depth grows downwards
        .build_cartesian_2d(view.xmin..view.xmax, -view.bottom..-view.top)?;

    let xaxis = labels.xaxis;
    let x_fmt = move |v: &f64| x_tick(xaxis, *v);
    let y_fmt = |v: &f64| depth_tick(*v);
    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh()
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .y_desc(labels.ymeta.label(labels.yaxis))
            .label_style((FONT, 12))
            .axis_desc_style((FONT, 13));
        if view.last {
            mesh.x_desc(labels.xaxis.to_string());
        } else {
            mesh.x_labels(0);
        }
        mesh.draw()?;
    }

    chart.draw_series(
        filled
            .iter()
            .filter(|c| view.holds(c.y0, c.y1))
            .filter_map(|c| {
                let color = band_color(&grid.scale, nbands, c.value)?;
                let (y0, y1) = (view.clamp_y(c.y0), view.clamp_y(c.y1));
                Some(Rectangle::new([(c.x0, -y0), (c.x1, -y1)], color.filled()))
            }),
    )?;

    for (_, segments) in thin {
        chart.draw_series(visible(segments, view).map(|pts| PathElement::new(pts, BLACK.stroke_width(1))))?;
    }
    for (level, segments) in thick {
        chart.draw_series(visible(segments, view).map(|pts| PathElement::new(pts, BLACK.stroke_width(2))))?;
        // one label per level, on the middle segment in view
        let shown: Vec<&Segment> = segments
            .iter()
            .filter(|(p, q)| view.holds(p.1, q.1) && p.1 >= view.top && p.1 <= view.bottom)
            .collect();
        if let Some((p, _)) = shown.get(shown.len() / 2) {
            chart.draw_series(std::iter::once(Text::new(
                format!("{level:3.1}"),
                (p.0, -p.1),
                (FONT, 11).into_font(),
            )))?;
        }
    }

    if view.first {
        // station positions along the top edge
        chart.draw_series(
            grid.station_x
                .iter()
                .filter(|x| x.is_finite())
                .map(|&x| TriangleMarker::new((x, -view.top), 4, BLACK.filled())),
        )?;
    }
    Ok(())
}

fn visible(segments: &[Segment], view: PanelView) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
    segments
        .iter()
        .filter(move |(p, q)| view.holds(p.1, q.1))
        .map(move |&(p, q)| vec![(p.0, -view.clamp_y(p.1)), (q.0, -view.clamp_y(q.1))])
}
