
// USAGE cargo run --release -- OS_PIRATA-FR31_CTD.nc -t CTD -p -k PRES TEMP PSAL DOX2 -g
//       cargo run --release -- OS_PIRATA-FR31_CTD.nc -t CTD -s -k PRES TEMP PSAL -a LATITUDE \
//             -r 5-28 --yscale "0,250;250,2000" --autoscale 0,30 34,37 --clevels 30
//       cargo run --release -- OS_PIRATA-FR31_XBT.nc -t XBT -p -k DEPTH TEMP DENS SVEL -c k- b- k- g-

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;

use oceansites_plots::{
    config::{FileDefaults, Instrument, LineStyle, PlotConfig},
    expand_inputs,
    run::{run_profiles, run_sections},
    scale::{Autoscale, YScale},
    section::{XAxis, XPoints},
    station::{parse_range, Selection},
    timeit, Dataset, RunSummary,
};

// ─────────────────────────────────────────────────────────────────────
// Command line
// ─────────────────────────────────────────────────────────────────────
#[derive(Parser, Debug)]
#[command(
    name = "oceansites_plots",
    version,
    about = "Plot profiles and sections from OceanSITES CTD/XBT/ADCP NetCDF files"
)]
struct Cli {
    /// NetCDF file(s), glob patterns accepted
    #[arg(required = true)]
    files: Vec<String>,

    /// Display debug information
    #[arg(short, long)]
    debug: bool,

    /// Instrument type
    #[arg(short = 't', long = "type", value_enum)]
    instrument: Instrument,

    /// Variable keys, the first one is the vertical axis (PRES or DEPTH)
    #[arg(short, long, num_args = 1.., required = true)]
    keys: Vec<String>,

    /// First and optional last profile, default is all; more pairs give more sections
    #[arg(short, long, num_args = 1.., group = "stations_by")]
    list: Vec<i32>,

    /// Station range START-END, repeat for several sections
    #[arg(short = 'r', long = "range", value_parser = parse_range_arg, group = "stations_by")]
    ranges: Vec<(i32, i32)>,

    /// Explicit station numbers
    #[arg(short = 'n', long = "stations", num_args = 1.., value_delimiter = ',', group = "stations_by")]
    stations: Vec<i32>,

    /// Stations to leave out
    #[arg(short = 'x', long, num_args = 1.., value_delimiter = ',')]
    exclude: Vec<i32>,

    /// Plot profiles
    #[arg(short, long)]
    profiles: bool,

    /// Plot sections
    #[arg(short, long)]
    sections: bool,

    /// Horizontal axis of sections
    #[arg(short, long, value_enum, default_value_t = XAxis::Latitude)]
    axis: XAxis,

    /// Regrid sections onto this many horizontal points instead of one per station
    #[arg(long)]
    xinterp: Option<usize>,

    /// Vertical step of the section grid
    #[arg(long)]
    ystep: Option<f64>,

    /// Number of contour levels
    #[arg(long)]
    clevels: Option<usize>,

    /// Colour scale per variable: valid, data or MIN,MAX
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_parser = parse_autoscale_arg)]
    autoscale: Vec<Autoscale>,

    /// Vertical range(s) of sections, ex: "0,2000" or "0,250;250,2000"
    #[arg(long, value_parser = parse_yscale_arg)]
    yscale: Option<YScale>,

    /// Stop profiles at this depth
    #[arg(long)]
    max_depth: Option<f64>,

    /// Line colours, ex: k- b- r- m- g-
    #[arg(short, long, num_args = 1..)]
    colors: Vec<String>,

    /// Add grid
    #[arg(short, long)]
    grid: bool,

    /// Output directory, default is plots/
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Appended to every output file name
    #[arg(long)]
    suffix: Option<String>,

    /// Replace existing images
    #[arg(short = 'f', long)]
    overwrite: bool,

    /// Open each image once written
    #[arg(long)]
    display: bool,

    /// TOML file with default options
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_range_arg(s: &str) -> std::result::Result<(i32, i32), String> {
    parse_range(s).map_err(|e| e.to_string())
}

fn parse_autoscale_arg(s: &str) -> std::result::Result<Autoscale, String> {
    s.parse::<Autoscale>().map_err(|e| e.to_string())
}

fn parse_yscale_arg(s: &str) -> std::result::Result<YScale, String> {
    s.parse::<YScale>().map_err(|e| e.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Defaults file first, then whatever the command line sets.
fn build_config(cli: &Cli) -> Result<PlotConfig> {
    let mut cfg = PlotConfig::new(cli.instrument, cli.keys.clone());
    if let Some(path) = &cli.config {
        let defaults = FileDefaults::load(path)
            .with_context(|| format!("loading defaults from {}", path.display()))?;
        cfg.apply_defaults(&defaults)?;
    }

    cfg.selection = if !cli.ranges.is_empty() {
        Selection::Ranges(cli.ranges.clone())
    } else if !cli.stations.is_empty() {
        Selection::Explicit(cli.stations.clone())
    } else {
        Selection::from_list(&cli.list)?
    };
    cfg.exclude = cli.exclude.clone();
    cfg.xaxis   = cli.axis;

    if let Some(n)    = cli.xinterp   { cfg.xpoints = XPoints::Count(n); }
    if let Some(step) = cli.ystep     { cfg.ystep = step; }
    if let Some(n)    = cli.clevels   { cfg.clevels = n; }
    if let Some(y)    = &cli.yscale   { cfg.yscale = Some(y.clone()); }
    if let Some(d)    = cli.max_depth { cfg.max_depth = Some(d); }
    if let Some(o)    = &cli.out      { cfg.output_dir = o.clone(); }
    if !cli.autoscale.is_empty() {
        cfg.autoscale = cli.autoscale.clone();
    }
    if !cli.colors.is_empty() {
        cfg.colors = cli
            .colors
            .iter()
            .map(|c| LineStyle::parse(c))
            .collect::<oceansites_plots::Result<_>>()?;
    }
    cfg.grid      |= cli.grid;
    cfg.suffix     = cli.suffix.clone();
    cfg.overwrite  = cli.overwrite;
    cfg.display    = cli.display;

    cfg.validate()?;
    Ok(cfg)
}

// ─────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────
fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins unless -d asks for more
    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if cli.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let cfg = build_config(&cli)?;
    log::debug!("{cfg:?}");

    if !cli.profiles && !cli.sections {
        warn!("nothing to do, select --profiles and/or --sections");
        return Ok(());
    }

    let files = expand_inputs(&cli.files)?;
    if files.is_empty() {
        bail!("no input file matches {:?}", cli.files);
    }

    let mut total = RunSummary::default();
    let mut opened = 0usize;
    for path in &files {
        let ds = match timeit("open", || Dataset::open(path)) {
            Ok(ds) => ds,
            Err(e) => {
                error!("{}: {e}", path.display());
                continue;
            }
        };
        opened += 1;
        let stations = ds.profiles.iter().flatten().count();
        info!("{}: {} ({stations} stations)", path.display(), ds.cycle_mesure);

        if cli.profiles {
            let s = timeit("profiles", || run_profiles(&ds, &cfg))
                .with_context(|| format!("profiles of {}", path.display()))?;
            total.merge(s);
        }
        if cli.sections {
            let s = timeit("sections", || run_sections(&ds, &cfg))
                .with_context(|| format!("sections of {}", path.display()))?;
            total.merge(s);
        }
    }

    if opened == 0 {
        bail!("none of the {} input file(s) could be read", files.len());
    }
    info!(
        "Done. {} written, {} kept, {} skipped on error",
        total.written, total.skipped, total.failed
    );
    Ok(())
}
