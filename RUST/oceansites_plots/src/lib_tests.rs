use std::path::PathBuf;

use ndarray::Array2;

use crate::config::{FileDefaults, Instrument, LineStyle, PlotConfig};
use crate::error::PlotError;
use crate::profile;
use crate::render::contour::{cells, isolines};
use crate::render::{band_color, defined_runs, depth_tick, jet};
use crate::run::{default_yscale, run_profiles, run_scatter, run_sections};
use crate::scale::{linspace, Autoscale, ColorScale, YScale};
use crate::scatter;
use crate::section::{
    self, cutoff_column, depth_axis, interp_profile, regrid_horizontal, unwrap_longitudes,
    SectionRequest, XAxis, XPoints,
};
use crate::station::{lookup, parse_range, resolve, split_ranges, walk, Selection};
use crate::store::{mask_fill, station_numbers, valid_len, Dataset, VarMeta, Variable};
use crate::timefmt::{
    dec2dms, format_julian, julian_to_datetime, latitude_tick, longitude_tick, mjd_to_datetime,
    Hemisphere,
};

const PROFILES: [i32; 5] = [10, 11, 12, 13, 14];

fn meta(long_name: &str, units: &str, range: Option<(f64, f64)>) -> VarMeta {
    VarMeta {
        long_name:  Some(long_name.to_string()),
        units:      Some(units.to_string()),
        valid_min:  range.map(|r| r.0),
        valid_max:  range.map(|r| r.1),
        ..VarMeta::default()
    }
}

/// Five stations, PRES 0..300 dbar every 10, TEMP falling with depth.
fn demo_dataset() -> Dataset {
    let mut ds = Dataset::new("PIRATA-TEST", PROFILES.to_vec());
    let nlev = 31;
    let pres = Array2::from_shape_fn((5, nlev), |(_, j)| j as f64 * 10.0);
    let temp = Array2::from_shape_fn((5, nlev), |(i, j)| 28.0 - j as f64 * 0.5 + i as f64 * 0.1);
    let psal = Array2::from_shape_fn((5, nlev), |(_, j)| 35.0 + j as f64 * 0.01);

    ds.insert("PROFILE", Variable::series(PROFILES.iter().map(|&p| p as f64).collect(), VarMeta::default()));
    ds.insert("PRES", Variable::profiles(pres, meta("Sea pressure", "decibar", Some((0.0, 6500.0)))));
    ds.insert("TEMP", Variable::profiles(temp, meta("Sea temperature", "degree_Celsius", Some((0.0, 30.0)))));
    ds.insert("PSAL", Variable::profiles(psal, meta("Practical salinity", "PSU", None)));
    ds.insert("LATITUDE", Variable::series(vec![-2.0, -1.0, 0.0, 1.0, 2.0], VarMeta::default()));
    ds.insert("LONGITUDE", Variable::series(vec![-10.0; 5], VarMeta::default()));
    ds.insert("TIME", Variable::series((0..5).map(|i| 26_000.0 + i as f64).collect(), VarMeta::default()));
    ds
}

fn stations() -> Vec<Option<i32>> {
    PROFILES.iter().copied().map(Some).collect()
}

fn numbers(ds: &Dataset, indices: &[usize]) -> Vec<i32> {
    indices.iter().filter_map(|&i| ds.profiles[i]).collect()
}

// ─────────────────────────────────────────────────────────────────────
// Station index
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_lookup() {
    assert_eq!(lookup(&stations(), 12), Some(2));
    assert_eq!(lookup(&stations(), 9), None);
}

#[test]
fn test_resolve_excludes_inside_range() {
    let idx = resolve(&stations(), 10, 14, &[12]).unwrap();
    assert_eq!(idx, vec![0, 1, 3, 4]);
}

#[test]
fn test_resolve_exclusion_outside_range_is_ignored() {
    let with = resolve(&stations(), 11, 13, &[10, 14]).unwrap();
    let without = resolve(&stations(), 11, 13, &[]).unwrap();
    assert_eq!(with, without);
    assert_eq!(with, vec![1, 2, 3]);
}

#[test]
fn test_resolve_missing_end_falls_back_to_last() {
    let idx = resolve(&stations(), 12, 99, &[]).unwrap();
    assert_eq!(idx, vec![2, 3, 4]);
}

#[test]
fn test_resolve_errors() {
    assert!(matches!(resolve(&stations(), 99, 12, &[]), Err(PlotError::StationNotFound(99))));

    let reversed = resolve(&stations(), 13, 11, &[]).unwrap_err();
    assert!(reversed.is_fatal());

    let empty = resolve(&stations(), 12, 12, &[12]).unwrap_err();
    assert!(matches!(empty, PlotError::EmptySelection { start: 12, end: 12 }));
    assert!(!empty.is_fatal());
}

#[test]
fn test_parse_range() {
    assert_eq!(parse_range("16-39").unwrap(), (16, 39));
    assert_eq!(parse_range(" 7 ").unwrap(), (7, 7));
    assert!(parse_range("39-16").is_err());
    assert!(parse_range("a-b").is_err());
}

#[test]
fn test_split_ranges() {
    assert_eq!(split_ranges(&[7, 14, 16, 39]).unwrap(), vec![(7, 14), (16, 39)]);
    assert!(split_ranges(&[7, 14, 16]).unwrap_err().is_fatal());
    assert!(split_ranges(&[]).is_err());
}

#[test]
fn test_selection_from_list() {
    assert_eq!(Selection::from_list(&[]).unwrap(), Selection::All);
    assert_eq!(Selection::from_list(&[12]).unwrap(), Selection::From(12));
    assert_eq!(
        Selection::from_list(&[10, 11, 13, 14]).unwrap(),
        Selection::Ranges(vec![(10, 11), (13, 14)])
    );
}

#[test]
fn test_selection_runs() {
    let runs = Selection::From(12).runs(&stations(), &[]);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].as_ref().unwrap().indices, vec![2, 3, 4]);

    let runs = Selection::Ranges(vec![(10, 11), (99, 100), (13, 14)]).runs(&stations(), &[]);
    assert_eq!(runs.len(), 3);
    assert!(runs[1].is_err());
    let last = runs[2].as_ref().unwrap();
    assert_eq!((last.start, last.end), (13, 14));

    // unknown numbers are skipped, the rest stays in one group
    let runs = Selection::Explicit(vec![10, 42, 13]).runs(&stations(), &[]);
    let run = runs[0].as_ref().unwrap();
    assert_eq!(run.indices, vec![0, 3]);
    assert_eq!((run.start, run.end), (10, 13));

    let runs = Selection::Explicit(vec![42]).runs(&stations(), &[]);
    assert!(matches!(runs[0], Err(PlotError::EmptySelection { .. })));
}

#[test]
fn test_undefined_station_keeps_rows_aligned() {
    let mut ds = demo_dataset();
    ds.profiles = station_numbers(&[10.0, 11.0, f64::NAN, 13.0, 14.0]);
    assert_eq!(ds.profiles, vec![Some(10), Some(11), None, Some(13), Some(14)]);

    // station 13 is still row 3, latitude 1°N
    let idx = resolve(&ds.profiles, 13, 13, &[]).unwrap();
    assert_eq!(idx, vec![3]);
    assert_eq!(ds.station_value("LATITUDE", idx[0]), Some(1.0));

    // the unnumbered row is never selected
    assert_eq!(resolve(&ds.profiles, 10, 14, &[]).unwrap(), vec![0, 1, 3, 4]);
    let runs = Selection::All.profile_runs(&ds.profiles, &[]);
    assert_eq!(runs[0].as_ref().unwrap().indices, vec![0, 1, 3, 4]);
}

#[test]
fn test_profile_walk_skips_missing_numbers() {
    assert_eq!(walk(&stations(), 9, 14, &[]).unwrap(), vec![0, 1, 2, 3, 4]);
    assert_eq!(walk(&stations(), 11, 20, &[12]).unwrap(), vec![1, 3, 4]);
    assert!(matches!(walk(&stations(), 20, 30, &[]), Err(PlotError::EmptySelection { .. })));
    assert!(walk(&stations(), 14, 10, &[]).unwrap_err().is_fatal());

    // sections still need the start station
    let runs = Selection::Ranges(vec![(9, 14)]).runs(&stations(), &[]);
    assert!(matches!(runs[0], Err(PlotError::StationNotFound(9))));
    let runs = Selection::Ranges(vec![(9, 14)]).profile_runs(&stations(), &[]);
    let run = runs[0].as_ref().unwrap();
    assert_eq!((run.start, run.end), (10, 14));
}

// ─────────────────────────────────────────────────────────────────────
// Scales
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_autoscale_parse() {
    assert_eq!("valid".parse::<Autoscale>().unwrap(), Autoscale::Valid);
    assert_eq!("False".parse::<Autoscale>().unwrap(), Autoscale::Valid);
    assert_eq!("TRUE".parse::<Autoscale>().unwrap(), Autoscale::Data);
    assert_eq!("20, 30".parse::<Autoscale>().unwrap(), Autoscale::Explicit(20.0, 30.0));
    assert_eq!("-2,2".parse::<Autoscale>().unwrap(), Autoscale::Explicit(-2.0, 2.0));

    for bad in ["30,20", "maybe", "1,2,3"] {
        let err = bad.parse::<Autoscale>().unwrap_err();
        assert!(err.is_fatal(), "{bad} should be a configuration error");
    }
}

#[test]
fn test_yscale_shapes() {
    let y: YScale = "0,250;250,2000".parse().unwrap();
    assert_eq!(y.ranges(), &[(0.0, 250.0), (250.0, 2000.0)]);
    assert_eq!(y.max(), 2000.0);
    assert_eq!(y.min(), 0.0);

    let err = YScale::from_flat(&[0.0, 250.0, 250.0]).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("invalid scale list shape"));
    assert!(YScale::single(100.0, 0.0).is_err());
}

#[test]
fn test_explicit_levels() {
    let scale = ColorScale::resolve(Autoscale::Explicit(20.0, 30.0), "TEMP", &VarMeta::default(), Vec::<f64>::new()).unwrap();
    let levels = scale.levels(20);
    assert_eq!(levels.len(), 21);
    assert_eq!(levels[0], 20.0);
    assert_eq!(levels[20], 30.0);
    for w in levels.windows(2) {
        assert!((w[1] - w[0] - 0.5).abs() < 1e-9);
    }
    assert_eq!(scale.major_levels(20).len(), 5);
    assert_eq!(scale.major_levels(30).len(), 7);
}

#[test]
fn test_colorscale_policies() {
    let m = meta("Sea temperature", "degree_Celsius", Some((0.0, 30.0)));
    let data = vec![4.0, f64::NAN, 25.0];
    let valid = ColorScale::resolve(Autoscale::Valid, "TEMP", &m, data.clone()).unwrap();
    assert_eq!((valid.min, valid.max), (0.0, 30.0));
    let observed = ColorScale::resolve(Autoscale::Data, "TEMP", &m, data.clone()).unwrap();
    assert_eq!((observed.min, observed.max), (4.0, 25.0));

    // no declared range: fall back to the data
    let fallback = ColorScale::resolve(Autoscale::Valid, "TEMP", &VarMeta::default(), data).unwrap();
    assert_eq!((fallback.min, fallback.max), (4.0, 25.0));

    assert!(ColorScale::resolve(Autoscale::Data, "TEMP", &m, vec![f64::NAN]).is_err());
}

#[test]
fn test_linspace() {
    assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    assert!(linspace(0.0, 1.0, 0).is_empty());
    assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
}

// ─────────────────────────────────────────────────────────────────────
// Section grid
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_depth_axis() {
    let yi = depth_axis(0.4, 99.2, 1.0).unwrap();
    assert_eq!(yi.len(), 101);
    assert_eq!(yi[0], 0.0);
    assert_eq!(yi[100], 100.0);
    assert!(yi.windows(2).all(|w| w[1] > w[0]));

    assert_eq!(depth_axis(0.0, 100.0, 10.0).unwrap().len(), 11);
    assert!(depth_axis(0.0, 100.0, 0.0).unwrap_err().is_fatal());
}

#[test]
fn test_interp_identity() {
    let yi = depth_axis(0.0, 50.0, 10.0).unwrap();
    let values = vec![25.0, 24.0, 22.5, 20.0, 18.0, 15.0];
    assert_eq!(interp_profile(&yi, &yi, &values), values);
}

#[test]
fn test_interp_drops_undefined_and_clamps() {
    let depth = vec![10.0, 20.0, f64::NAN, 40.0];
    let values = vec![1.0, f64::NAN, 5.0, 4.0];
    let out = interp_profile(&[0.0, 25.0, 50.0], &depth, &values);
    assert_eq!(out[0], 1.0);
    assert!((out[1] - 2.5).abs() < 1e-12);
    assert_eq!(out[2], 4.0);

    let empty = interp_profile(&[0.0, 10.0], &[0.0, 10.0], &[f64::NAN, f64::NAN]);
    assert!(empty.iter().all(|v| v.is_nan()));
}

#[test]
fn test_cutoff_column() {
    let depth: Vec<f64> = (0..=60).map(|i| i as f64 * 5.0).collect();
    assert_eq!(depth[depth.len() - 1], 300.0);
    let c = cutoff_column("TEMP", [depth.as_slice()], 250.0).unwrap();
    assert_eq!(c, 50);
    assert_eq!(depth[c], 250.0);

    // deepest first crossing over all stations
    let shallow: Vec<f64> = (0..=60).map(|i| i as f64 * 10.0).collect();
    let c = cutoff_column("TEMP", [shallow.as_slice(), depth.as_slice()], 250.0).unwrap();
    assert_eq!(c, 50);

    let err = cutoff_column("TEMP", [depth.as_slice()], 1000.0).unwrap_err();
    assert!(matches!(err, PlotError::DepthOutOfRange { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn test_section_end_to_end() {
    let ds = demo_dataset();
    let idx = resolve(&ds.profiles, 10, 14, &[12]).unwrap();
    assert_eq!(numbers(&ds, &idx), vec![10, 11, 13, 14]);

    let yscale = YScale::single(0.0, 100.0).unwrap();
    let req = SectionRequest {
        yaxis:     "PRES",
        variable:  "TEMP",
        xaxis:     XAxis::Latitude,
        yscale:    &yscale,
        xpoints:   XPoints::Native,
        ystep:     10.0,
        autoscale: Autoscale::Explicit(20.0, 30.0),
        clevels:   20,
    };
    let grid = section::build(&ds, &idx, &req).unwrap();
    assert_eq!(grid.yi.len(), 11);
    assert_eq!(grid.zi.dim(), (4, 11));
    assert_eq!(grid.xi, vec![-2.0, -1.0, 1.0, 2.0]);
    assert_eq!(grid.levels.len(), 21);
    // samples already sit on yi
    assert!((grid.zi[[0, 0]] - 28.0).abs() < 1e-12);
    assert!((grid.zi[[3, 10]] - (28.0 - 5.0 + 0.4)).abs() < 1e-12);
}

#[test]
fn test_section_regridded_and_too_deep() {
    let ds = demo_dataset();
    let idx = resolve(&ds.profiles, 10, 14, &[]).unwrap();
    let yscale = YScale::single(0.0, 100.0).unwrap();
    let mut req = SectionRequest {
        yaxis:     "PRES",
        variable:  "PSAL",
        xaxis:     XAxis::Latitude,
        yscale:    &yscale,
        xpoints:   XPoints::Count(9),
        ystep:     5.0,
        autoscale: Autoscale::Data,
        clevels:   10,
    };
    let grid = section::build(&ds, &idx, &req).unwrap();
    assert_eq!(grid.zi.dim(), (9, 21));
    assert_eq!(grid.xi.len(), 9);
    assert!(grid.zi.iter().all(|v| v.is_finite()));

    let deep = YScale::single(0.0, 5000.0).unwrap();
    req.yscale = &deep;
    assert!(matches!(section::build(&ds, &idx, &req), Err(PlotError::DepthOutOfRange { .. })));

    req.variable = "DOX2";
    req.yscale = &yscale;
    assert!(matches!(section::build(&ds, &idx, &req), Err(PlotError::MissingVariable(_))));
}

#[test]
fn test_regrid_horizontal() {
    let rows = Array2::from_shape_vec((3, 1), vec![0.0, 10.0, 20.0]).unwrap();
    let (xi, zi) = regrid_horizontal(&[0.0, 1.0, 2.0], &rows, 5);
    assert_eq!(xi, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    assert_eq!(zi.column(0).to_vec(), vec![0.0, 5.0, 10.0, 15.0, 20.0]);

    // southward track: x decreasing
    let rows = Array2::from_shape_vec((3, 1), vec![20.0, 10.0, 0.0]).unwrap();
    let (xi, zi) = regrid_horizontal(&[2.0, 1.0, 0.0], &rows, 3);
    assert_eq!(xi, vec![2.0, 1.0, 0.0]);
    assert_eq!(zi.column(0).to_vec(), vec![20.0, 10.0, 0.0]);
}

#[test]
fn test_unwrap_longitudes() {
    let mut x = vec![170.0, 179.0, -179.0, -170.0];
    unwrap_longitudes(&mut x);
    assert_eq!(x, vec![170.0, 179.0, 181.0, 190.0]);

    let mut y = vec![-10.0, -5.0, 0.0];
    unwrap_longitudes(&mut y);
    assert_eq!(y, vec![-10.0, -5.0, 0.0]);
}

#[test]
fn test_default_yscale() {
    let ds = demo_dataset();
    let y = default_yscale(&ds, "PRES", &[0, 1]).unwrap();
    assert_eq!(y.ranges(), &[(0.0, 300.0)]);
}

// ─────────────────────────────────────────────────────────────────────
// Profiles and scatter
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_profile_extract() {
    let ds = demo_dataset();
    let keys: Vec<String> = ["PRES", "TEMP", "PSAL"].iter().map(|s| s.to_string()).collect();
    let p = profile::extract(&ds, 3, &keys, Some(100.0)).unwrap();
    assert_eq!(p.number, 13);
    assert_eq!(p.y.values.len(), 11);
    assert_eq!(p.traces.len(), 2);
    assert!(p.traces.iter().all(|t| t.values.len() == 11));
    assert_eq!(p.latitude, Some(1.0));
    assert_eq!(p.traces[0].x_range(), (0.0, 30.0));

    assert!(profile::extract(&ds, 0, &keys[..1], None).unwrap_err().is_fatal());
    assert!(matches!(
        profile::extract(&ds, 0, &["PRES".to_string(), "CNDC".to_string()], None),
        Err(PlotError::MissingVariable(_))
    ));
}

#[test]
fn test_profile_header() {
    let ds = demo_dataset();
    let keys: Vec<String> = ["PRES", "TEMP"].iter().map(|s| s.to_string()).collect();
    let p = profile::extract(&ds, 0, &keys, None).unwrap();
    let cfg = PlotConfig::new(Instrument::Ctd, keys);
    let header = crate::render::profile::header(&ds.cycle_mesure, &cfg, &p);
    assert!(header.starts_with("PIRATA-TEST, CTD, Profile: 010"));
    assert!(header.contains("Lat: 02°00.0000 S"));
    assert!(header.contains("Long: 010°00.0000 W"));
}

#[test]
fn test_scatter_extract() {
    let mut ds = Dataset::new("PIRATA-TEST", Vec::new());
    ds.insert("LONGITUDE", Variable::series(vec![-50.0, -10.0, 0.0, 5.0], VarMeta::default()));
    ds.insert("LATITUDE", Variable::series(vec![0.0, 0.0, 0.0, 60.0], VarMeta::default()));
    ds.insert("SSPS", Variable::series(vec![35.0, 36.0, f64::NAN, 34.0], meta("Sea surface salinity", "PSU", None)));

    let panel = scatter::extract(&ds, "SSPS", Autoscale::Explicit(32.0, 37.0), [-40.0, 20.0, -30.0, 50.0]).unwrap();
    assert_eq!(panel.points, vec![(-10.0, 0.0, 36.0)]);
    assert_eq!(panel.xlabel, "LONGITUDE");
    assert_eq!(crate::render::scatter::title("PIRATA-TEST", &panel), "PIRATA-TEST - Sea surface salinity");

    assert!(scatter::extract(&ds, "SSTP", Autoscale::Data, [-40.0, 20.0, -30.0, 50.0]).is_err());
}

// ─────────────────────────────────────────────────────────────────────
// Dates and positions
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_julian_dates() {
    let epoch = mjd_to_datetime(0.0).unwrap();
    assert_eq!(epoch.format("%Y-%m-%d").to_string(), "1858-11-17");
    let cnes = julian_to_datetime(0.0).unwrap();
    assert_eq!(cnes.format("%Y-%m-%d %H:%M:%S").to_string(), "1950-01-01 00:00:00");
    assert_eq!(format_julian(Some(0.5)), "1950-01-01 12:00:00");
    assert_eq!(format_julian(None), "n/a");
    assert!(mjd_to_datetime(f64::NAN).is_none());
}

#[test]
fn test_dec2dms() {
    assert_eq!(dec2dms(-5.5, Hemisphere::NorthSouth), "05°30.0000 S");
    assert_eq!(dec2dms(12.25, Hemisphere::NorthSouth), "12°15.0000 N");
    assert_eq!(dec2dms(-10.25, Hemisphere::EastWest), "010°15.0000 W");
    assert_eq!(dec2dms(0.999_999_9, Hemisphere::EastWest), "001°00.0000 E");
}

#[test]
fn test_axis_ticks() {
    assert_eq!(latitude_tick(5.0), "5°N");
    assert_eq!(latitude_tick(-2.5), "2.5°S");
    assert_eq!(latitude_tick(0.0), "0°");
    assert_eq!(longitude_tick(190.0), "170°W");
    assert_eq!(crate::render::section::x_tick(XAxis::Latitude, -3.0), "3°S");
}

// ─────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_mask_fill_and_valid_len() {
    let v = mask_fill(vec![1.0, 1.0e36, -9999.0, 2.0], Some(-9999.0));
    assert_eq!(v[0], 1.0);
    assert!(v[1].is_nan() && v[2].is_nan());
    assert_eq!(v[3], 2.0);

    let depth = vec![0.0, 10.0, 20.0, f64::NAN, f64::NAN];
    assert_eq!(valid_len(&depth, None), 3);
    assert_eq!(valid_len(&depth, Some(15.0)), 2);
    assert_eq!(valid_len(&[f64::NAN; 3], None), 0);
}

#[test]
fn test_open_netcdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("OS_TEST_CTD.nc");
    let fill = 1.0e36_f64;
    {
        let mut f = netcdf::create(&path).unwrap();
        f.add_dimension("N_PROF", 3).unwrap();
        f.add_dimension("N_LEVEL", 4).unwrap();
        f.add_attribute("cycle_mesure", "PIRATA-FR31").unwrap();

        {
            let mut v = f.add_variable::<i32>("PROFILE", &["N_PROF"]).unwrap();
            v.put_values(&[5, 6, 8], ..).unwrap();
        }
        {
            let mut v = f.add_variable::<f64>("LATITUDE", &["N_PROF"]).unwrap();
            v.put_values(&[-1.0, 0.0, 1.0], ..).unwrap();
        }
        {
            let mut v = f.add_variable::<f64>("PRES", &["N_PROF", "N_LEVEL"]).unwrap();
            v.set_fill_value(fill).unwrap();
            v.put_attribute("long_name", "Sea pressure").unwrap();
            v.put_attribute("units", "decibar").unwrap();
            v.put_values(&[0.0, 10.0, 20.0, 30.0, 0.0, 10.0, 20.0, fill, 0.0, 10.0, fill, fill], ..)
                .unwrap();
        }
        {
            let mut v = f.add_variable::<f32>("TEMP", &["N_PROF", "N_LEVEL"]).unwrap();
            v.put_attribute("valid_min", 0.0f32).unwrap();
            v.put_attribute("valid_max", 30.0f32).unwrap();
            v.put_values(&[25.0f32; 12], ..).unwrap();
        }
    }

    let ds = Dataset::open(&path).unwrap();
    assert_eq!(ds.cycle_mesure, "PIRATA-FR31");
    assert_eq!(ds.profiles, vec![Some(5), Some(6), Some(8)]);
    assert!(ds.contains("TEMP") && ds.contains("LATITUDE"));

    let pres = ds.var("PRES").unwrap();
    assert_eq!(pres.meta.label("PRES"), "Sea pressure [decibar]");
    let row = pres.row("PRES", 1).unwrap().to_vec();
    assert!(row[3].is_nan());
    assert_eq!(valid_len(&row, None), 3);
    assert_eq!(ds.var("TEMP").unwrap().meta.valid_range(), Some((0.0, 30.0)));
    assert_eq!(ds.station_value("LATITUDE", 2), Some(1.0));

    let missing = Dataset::open(&dir.path().join("nope.nc")).unwrap_err();
    assert!(matches!(missing, PlotError::Open { .. }));
}

// ─────────────────────────────────────────────────────────────────────
// Configuration and runs
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_output_naming() {
    let mut cfg = PlotConfig::new(Instrument::Ctd, vec!["PRES".into(), "TEMP".into()]);
    assert_eq!(cfg.profile_path("FR31", 7), PathBuf::from("plots/FR31-007_CTD.png"));
    cfg.suffix = Some("v2".into());
    assert_eq!(
        cfg.section_path("FR31", 5, 28, "TEMP"),
        PathBuf::from("plots/FR31-5-28_CTD_TEMP_v2.png")
    );

    let cfg = PlotConfig::new(Instrument::Tsg, vec!["SSPS".into(), "SSTP".into()]);
    assert_eq!(
        cfg.scatter_path("FR31", &cfg.keys),
        PathBuf::from("plots/FR31_TSG_SSPS-SSTP_SCATTER.png")
    );
}

#[test]
fn test_line_styles() {
    let s = LineStyle::parse("ro").unwrap();
    assert!(s.markers && !s.line);
    let s = LineStyle::parse("k-").unwrap();
    assert!(s.line && !s.markers);
    assert!(LineStyle::parse("z-").is_err());

    let cfg = PlotConfig::new(Instrument::Ctd, vec!["PRES".into(), "TEMP".into()]);
    // colors[0] belongs to the vertical key
    assert_eq!(cfg.style_for(0), LineStyle::parse("b-").unwrap());
    assert_eq!(cfg.style_for(4), LineStyle::parse("k-").unwrap());
}

#[test]
fn test_defaults_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plots.toml");
    std::fs::write(
        &path,
        r#"
output    = "out"
clevels   = 30
yscale    = [[0.0, 250.0], [250.0, 2000.0]]
autoscale = ["0,30", "data"]
colors    = ["k-", "r-"]
"#,
    )
    .unwrap();

    let defaults = FileDefaults::load(&path).unwrap();
    let mut cfg = PlotConfig::new(Instrument::Ctd, vec!["PRES".into(), "TEMP".into(), "PSAL".into()]);
    cfg.apply_defaults(&defaults).unwrap();
    assert_eq!(cfg.output_dir, PathBuf::from("out"));
    assert_eq!(cfg.clevels, 30);
    assert_eq!(cfg.yscale.as_ref().map(|y| y.ranges().len()), Some(2));
    assert_eq!(cfg.autoscale_for(0), Autoscale::Explicit(0.0, 30.0));
    assert_eq!(cfg.autoscale_for(5), Autoscale::Data);
    assert_eq!(cfg.colors.len(), 2);
    cfg.validate().unwrap();

    std::fs::write(&path, "clevel = 3\n").unwrap();
    assert!(FileDefaults::load(&path).unwrap_err().is_fatal());
}

#[test]
fn test_runs_keep_existing_and_skip_bad_units() {
    let dir = tempfile::tempdir().unwrap();
    let ds = demo_dataset();
    let mut cfg = PlotConfig::new(Instrument::Ctd, vec!["PRES".into(), "TEMP".into()]);
    cfg.output_dir = dir.path().to_path_buf();
    cfg.exclude = vec![12];

    for &n in &PROFILES {
        std::fs::write(cfg.profile_path(&ds.cycle_mesure, n), b"").unwrap();
    }
    let summary = run_profiles(&ds, &cfg).unwrap();
    assert_eq!((summary.written, summary.skipped, summary.failed), (0, 4, 0));

    // deeper than any cast: logged and skipped, not fatal
    cfg.yscale = Some(YScale::single(0.0, 5000.0).unwrap());
    let summary = run_sections(&ds, &cfg).unwrap();
    assert_eq!((summary.written, summary.failed), (0, 1));

    cfg.selection = Selection::Ranges(vec![(14, 10)]);
    assert!(run_profiles(&ds, &cfg).unwrap_err().is_fatal());
}

fn png_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map_or(false, |e| e == "png"))
        .inspect(|p| assert!(std::fs::metadata(p).unwrap().len() > 0, "{} is empty", p.display()))
        .count()
}

#[test]
fn test_runs_render_images() {
    let dir = tempfile::tempdir().unwrap();
    let ds = demo_dataset();
    let mut cfg = PlotConfig::new(Instrument::Ctd, vec!["PRES".into(), "TEMP".into(), "PSAL".into()]);
    cfg.output_dir = dir.path().to_path_buf();
    cfg.overwrite = true;
    cfg.grid = true;

    // station 9 does not exist, 10..14 are still drawn
    cfg.selection = Selection::Ranges(vec![(9, 14)]);
    let summary = run_profiles(&ds, &cfg).unwrap();
    assert_eq!((summary.written, summary.failed), (5, 0));
    assert_eq!(png_count(dir.path()), 5);

    cfg.selection = Selection::All;
    cfg.yscale = Some("0,100;100,300".parse().unwrap());
    let summary = run_sections(&ds, &cfg).unwrap();
    assert_eq!((summary.written, summary.failed), (2, 0));
    assert!(cfg.section_path(&ds.cycle_mesure, 10, 14, "PSAL").exists());

    cfg.xpoints = XPoints::Count(20);
    cfg.suffix = Some("regrid".into());
    let summary = run_sections(&ds, &cfg).unwrap();
    assert_eq!((summary.written, summary.failed), (2, 0));
    assert_eq!(png_count(dir.path()), 9);
}

#[test]
fn test_scatter_run_renders_image() {
    let dir = tempfile::tempdir().unwrap();
    let mut ds = Dataset::new("PIRATA-TEST", Vec::new());
    ds.insert("LONGITUDE", Variable::series(vec![-30.0, -20.0, -10.0, 0.0], VarMeta::default()));
    ds.insert("LATITUDE", Variable::series(vec![0.0, 5.0, 10.0, 15.0], VarMeta::default()));
    ds.insert("SSPS", Variable::series(vec![35.0, 35.5, 36.0, 36.2], meta("Sea surface salinity", "PSU", None)));
    ds.insert("SSTP", Variable::series(vec![25.0, 26.0, f64::NAN, 28.0], meta("Sea surface temperature", "degree_Celsius", Some((0.0, 30.0)))));

    let mut cfg = PlotConfig::new(Instrument::Tsg, vec!["SSPS".into(), "SSTP".into()]);
    cfg.output_dir = dir.path().to_path_buf();
    cfg.overwrite = true;

    let summary = run_scatter(&ds, &cfg).unwrap();
    assert_eq!((summary.written, summary.failed), (1, 0));
    assert!(cfg.scatter_path(&ds.cycle_mesure, &cfg.keys).exists());
    assert_eq!(png_count(dir.path()), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Rendering helpers
// ─────────────────────────────────────────────────────────────────────
#[test]
fn test_isolines() {
    let z = Array2::from_shape_vec((2, 2), vec![0.0, 0.0, 2.0, 2.0]).unwrap();
    let segs = isolines(&[0.0, 1.0], &[0.0, 1.0], &z, 1.0);
    assert_eq!(segs, vec![((0.5, 0.0), (0.5, 1.0))]);

    assert!(isolines(&[0.0, 1.0], &[0.0, 1.0], &z, 5.0).is_empty());

    let holed = Array2::from_shape_vec((2, 2), vec![0.0, f64::NAN, 2.0, 2.0]).unwrap();
    assert!(isolines(&[0.0, 1.0], &[0.0, 1.0], &holed, 1.0).is_empty());
    assert!(cells(&[0.0, 1.0], &[0.0, 1.0], &holed).is_empty());
    assert_eq!(cells(&[0.0, 1.0], &[0.0, 1.0], &z)[0].value, 1.0);
}

#[test]
fn test_jet_palette() {
    assert_eq!(jet(0.0), plotters::style::RGBColor(0, 0, 128));
    assert_eq!(jet(1.0), plotters::style::RGBColor(128, 0, 0));
    assert_eq!(jet(0.5), plotters::style::RGBColor(128, 255, 128));

    let scale = ColorScale { min: 0.0, max: 10.0 };
    assert_eq!(band_color(&scale, 10, 10.0), Some(jet(0.95)));
    assert_eq!(band_color(&scale, 10, 0.0), Some(jet(0.05)));
    assert_eq!(band_color(&scale, 10, 11.0), None);
    assert_eq!(band_color(&scale, 10, f64::NAN), None);
}

#[test]
fn test_defined_runs() {
    let pts = vec![(1.0, 1.0), (f64::NAN, 2.0), (3.0, 3.0), (4.0, 4.0)];
    let runs = defined_runs(pts.into_iter());
    assert_eq!(runs, vec![vec![(1.0, 1.0)], vec![(3.0, 3.0), (4.0, 4.0)]]);
}

#[test]
fn test_depth_tick() {
    assert_eq!(depth_tick(-0.0), "0");
    assert_eq!(depth_tick(0.0), "0");
    assert_eq!(depth_tick(0.4), "0");
    assert_eq!(depth_tick(-250.0), "250");
}
