
// USAGE cargo run --release -p tsg_scatter -- OS_PIRATA-FR31_TSG.nc
//       cargo run --release -p tsg_scatter -- OS_PIRATA-FR31_TSG.nc -k SSPS SSTP --autoscale 32,37 21,32

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, LevelFilter};
use std::path::PathBuf;

use oceansites_plots::{
    config::{FileDefaults, Instrument, PlotConfig},
    expand_inputs,
    run::run_scatter,
    scale::Autoscale,
    timeit, Dataset, RunSummary,
};

#[derive(Parser, Debug)]
#[command(
    name = "tsg_scatter",
    version,
    about = "Scatter maps of underway surface data from OceanSITES TSG NetCDF files"
)]
struct Cli {
    /// NetCDF file(s), glob patterns accepted
    #[arg(required = true)]
    files: Vec<String>,

    /// Display debug information
    #[arg(short, long)]
    debug: bool,

    /// Variables to map, one panel each
    #[arg(short, long, num_args = 1.., default_values_t = ["SSPS".to_string(), "SSTP".to_string()])]
    keys: Vec<String>,

    /// Colour scale per variable: valid, data or MIN,MAX
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_parser = parse_autoscale_arg)]
    autoscale: Vec<Autoscale>,

    /// Map extent LON_MIN LON_MAX LAT_MIN LAT_MAX
    #[arg(long, num_args = 4, allow_hyphen_values = true)]
    extent: Vec<f64>,

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

fn parse_autoscale_arg(s: &str) -> std::result::Result<Autoscale, String> {
    s.parse::<Autoscale>().map_err(|e| e.to_string())
}

fn build_config(cli: &Cli) -> Result<PlotConfig> {
    let mut cfg = PlotConfig::new(Instrument::Tsg, cli.keys.clone());
    if let Some(path) = &cli.config {
        let defaults = FileDefaults::load(path)
            .with_context(|| format!("loading defaults from {}", path.display()))?;
        cfg.apply_defaults(&defaults)?;
    }
    if !cli.autoscale.is_empty() {
        cfg.autoscale = cli.autoscale.clone();
    }
    if let [x0, x1, y0, y1] = cli.extent[..] {
        cfg.extent = [x0, x1, y0, y1];
    }
    if let Some(o) = &cli.out {
        cfg.output_dir = o.clone();
    }
    cfg.suffix    = cli.suffix.clone();
    cfg.overwrite = cli.overwrite;
    cfg.display   = cli.display;

    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins unless -d asks for more
    let mut logger = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if cli.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let cfg = build_config(&cli)?;
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
        let s = timeit("scatter", || run_scatter(&ds, &cfg))
            .with_context(|| format!("scatter of {}", path.display()))?;
        total.merge(s);
    }

    if opened == 0 {
        bail!("none of the {} input file(s) could be read", files.len());
    }
    info!("Done. {} written, {} kept, {} skipped on error", total.written, total.skipped, total.failed);
    Ok(())
}
