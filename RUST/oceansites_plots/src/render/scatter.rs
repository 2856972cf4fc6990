use std::path::Path;

use plotters::prelude::*;

use super::{draw_colorbar, jet, FONT};
use crate::error::{PlotError, Result};
use crate::scale::linspace;
use crate::scatter::ScatterPanel;
use crate::timefmt::{latitude_tick, longitude_tick};

const PANEL_W:  u32 = 700;
const PANEL_H:  u32 = 600;
const COLORBAR: u32 = 100;
/// Bands of the continuous colour bar.
const SHADES:   usize = 64;

/// `"{cycle_mesure} - {long_name}"`
pub fn title(cycle_mesure: &str, panel: &ScatterPanel) -> String {
    let name = panel.meta.long_name.as_deref().unwrap_or(&panel.key);
    format!("{cycle_mesure} - {name}")
}

/// Panels stacked vertically, each with its own colour bar.
pub fn draw(path: &Path, cycle_mesure: &str, panels: &[ScatterPanel], extent: [f64; 4]) -> Result<()> {
    if panels.is_empty() {
        return Err(PlotError::Render("nothing to draw".to_string()));
    }
    let root = BitMapBackend::new(path, (PANEL_W, PANEL_H * panels.len() as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let [x0, x1, y0, y1] = extent;

    for (area, panel) in root.split_evenly((panels.len(), 1)).iter().zip(panels) {
        let (map, bar) = area.split_horizontally((PANEL_W - COLORBAR) as i32);

        let mut chart = ChartBuilder::on(&map)
            .caption(title(cycle_mesure, panel), (FONT, 16))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(55)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart.configure_mesh()
            .x_desc(panel.xlabel.as_str())
            .y_desc(panel.ylabel.as_str())
            .x_label_formatter(&|v| longitude_tick(*v))
            .y_label_formatter(&|v| latitude_tick(*v))
            .light_line_style(&WHITE.mix(0.0))
            .bold_line_style(&BLACK.mix(0.15))
            .label_style((FONT, 12))
            .draw()?;

        let scale = panel.scale;
        chart.draw_series(
            panel
                .points
                .iter()
                .map(|&(x, y, v)| Circle::new((x, y), 3, jet(scale.normalize(v)).filled())),
        )?;

        let ticks = linspace(scale.min, scale.max, 6);
        draw_colorbar(&bar, &scale, SHADES, &ticks)?;
    }

    root.present()?;
    Ok(())
}
