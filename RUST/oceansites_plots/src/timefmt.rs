use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Days between the MJD epoch (1858-11-17) and the OceanSITES/CNES epoch (1950-01-01).
pub const JULIAN: i64 = 33282;
pub const DEGREE: char = '°';

/// Modified Julian Day → calendar date-time.
pub fn mjd_to_datetime(mjd: f64) -> Option<NaiveDateTime> {
    if !mjd.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1858, 11, 17)?.and_hms_opt(0, 0, 0)?;
    let msec = (mjd * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(msec))
}

/// TIME variable (days since 1950-01-01) → calendar date-time.
pub fn julian_to_datetime(days: f64) -> Option<NaiveDateTime> {
    mjd_to_datetime(days + JULIAN as f64)
}

/// Header form, `"2021-03-14 06:30:00"`, or `"n/a"`.
pub fn format_julian(days: Option<f64>) -> String {
    days.and_then(julian_to_datetime)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    NorthSouth,
    EastWest,
}

/// Decimal degrees → `"05°30.0000 S"` / `"010°15.0000 W"`.
pub fn dec2dms(position: f64, hemi: Hemisphere) -> String {
    let (neg, pos, width) = match hemi {
        Hemisphere::NorthSouth => ('S', 'N', 2),
        Hemisphere::EastWest   => ('W', 'E', 3),
    };
    let geo = if position < 0.0 { neg } else { pos };
    let abs = position.abs();
    let mut deg = abs.trunc();
    let mut min = (abs - deg) * 60.0;
    // 59.99999 must not print as 60.0000
    if (min * 10_000.0).round() >= 600_000.0 {
        deg += 1.0;
        min = 0.0;
    }
    format!("{:0width$}{DEGREE}{:07.4} {geo}", deg as i64, min, width = width)
}

/// Axis tick: `"5°N"`, `"0°"`.
pub fn latitude_tick(v: f64) -> String {
    hemisphere_tick(v, 'N', 'S')
}

/// Axis tick: `"10°W"`.
pub fn longitude_tick(v: f64) -> String {
    // unwrapped tracks may run past ±180
    let wrapped = (v + 180.0).rem_euclid(360.0) - 180.0;
    hemisphere_tick(wrapped, 'E', 'W')
}

/// Axis tick for TIME: `"14/03"`.
pub fn time_tick(days: f64) -> String {
    julian_to_datetime(days)
        .map(|dt| dt.format("%d/%m").to_string())
        .unwrap_or_default()
}

fn hemisphere_tick(v: f64, pos: char, neg: char) -> String {
    let r = (v * 10.0).round() / 10.0;
    let text = if r.fract() == 0.0 { format!("{:.0}", r.abs()) } else { format!("{:.1}", r.abs()) };
    if r > 0.0 {
        format!("{text}{DEGREE}{pos}")
    } else if r < 0.0 {
        format!("{text}{DEGREE}{neg}")
    } else {
        format!("{text}{DEGREE}")
    }
}
