//! Station number → row index resolution.
//!
//! PROFILE holds logical station numbers, neither contiguous nor zero based,
//! so every selection goes through here before touching the data arrays. The
//! list stays aligned with the data rows: a row whose number is undefined is
//! `None` and never selected.

use log::{info, warn};

use crate::error::{PlotError, Result};

/// Row index of station `number`, first occurrence.
pub fn lookup(profiles: &[Option<i32>], number: i32) -> Option<usize> {
    profiles.iter().position(|&p| p == Some(number))
}

/// Row of the last station carrying a number.
fn last_defined(profiles: &[Option<i32>]) -> Option<(usize, i32)> {
    profiles.iter().enumerate().rev().find_map(|(i, p)| p.map(|n| (i, n)))
}

/// Row indices of the stations in `[start, end]` minus `exclude`.
///
/// A missing `end` falls back to the last station. Exclusion works on
/// positions: an excluded number is located in the full array and dropped only
/// when that position lies inside the resolved range.
pub fn resolve(profiles: &[Option<i32>], start: i32, end: i32, exclude: &[i32]) -> Result<Vec<usize>> {
    let first = lookup(profiles, start).ok_or(PlotError::StationNotFound(start))?;
    let (last, last_number) = match lookup(profiles, end) {
        Some(i) => (i, end),
        None => {
            let (i, n) = last_defined(profiles).ok_or(PlotError::StationNotFound(end))?;
            warn!("station {end} not found, using last station {n}");
            (i, n)
        }
    };
    if first > last {
        return Err(PlotError::config(format!("station range {start}-{last_number} is reversed")));
    }

    let excluded: Vec<usize> = exclude
        .iter()
        .filter_map(|&n| lookup(profiles, n))
        .filter(|i| (first..=last).contains(i))
        .collect();

    let indices: Vec<usize> = (first..=last)
        .filter(|&i| profiles[i].is_some() && !excluded.contains(&i))
        .collect();
    if indices.is_empty() {
        return Err(PlotError::EmptySelection { start, end: last_number });
    }
    Ok(indices)
}

/// Rows of the numbers `start..=end` taken one by one, for profile mode.
/// Numbers absent from PROFILE are skipped with a notice, excluded numbers
/// silently.
pub fn walk(profiles: &[Option<i32>], start: i32, end: i32, exclude: &[i32]) -> Result<Vec<usize>> {
    if start > end {
        return Err(PlotError::config(format!("station range {start}-{end} is reversed")));
    }
    let indices: Vec<usize> = (start..=end)
        .filter(|n| !exclude.contains(n))
        .filter_map(|n| {
            let found = lookup(profiles, n);
            if found.is_none() {
                info!("profile {n} not found, skipped");
            }
            found
        })
        .collect();
    if indices.is_empty() {
        return Err(PlotError::EmptySelection { start, end });
    }
    Ok(indices)
}

/// `"16-39"` → `(16, 39)`. A single number selects one station.
pub fn parse_range(s: &str) -> Result<(i32, i32)> {
    let bad = || PlotError::config(format!("invalid station range \"{s}\", expected START-END"));
    let s = s.trim();
    // a leading '-' would be a sign, split after the first character
    let (a, b) = match s.get(1..).and_then(|rest| rest.find('-')).map(|i| i + 1) {
        Some(i) => (&s[..i], &s[i + 1..]),
        None    => (s, s),
    };
    let start: i32 = a.trim().parse().map_err(|_| bad())?;
    let end:   i32 = b.trim().parse().map_err(|_| bad())?;
    if start > end {
        return Err(bad());
    }
    Ok((start, end))
}

/// Pair up a flat list of section boundaries: `[7, 14, 16, 39]` → `[(7, 14), (16, 39)]`.
pub fn split_ranges(bounds: &[i32]) -> Result<Vec<(i32, i32)>> {
    if bounds.is_empty() || bounds.len() % 2 != 0 {
        return Err(PlotError::config(format!(
            "section boundaries come in START END pairs, got {} value(s)",
            bounds.len()
        )));
    }
    bounds
        .chunks(2)
        .map(|c| {
            if c[0] > c[1] {
                Err(PlotError::config(format!("station range {}-{} is reversed", c[0], c[1])))
            } else {
                Ok((c[0], c[1]))
            }
        })
        .collect()
}

/// How the user asked for stations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// First to last station of the file.
    All,
    /// One entry per section; profile mode walks them in order.
    Ranges(Vec<(i32, i32)>),
    /// From this station to the last one of the file.
    From(i32),
    /// Individual stations, looked up one by one.
    Explicit(Vec<i32>),
}

/// A resolved group of stations: one section, or the stations of one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRun {
    pub start:   i32,
    pub end:     i32,
    pub indices: Vec<usize>,
}

impl Selection {
    /// `-l START [END]` of the command line: no list is everything, one number
    /// runs to the last station, longer lists are START END pairs.
    pub fn from_list(list: &[i32]) -> Result<Self> {
        match list {
            [] => Ok(Selection::All),
            [start] => Ok(Selection::From(*start)),
            _ => Ok(Selection::Ranges(split_ranges(list)?)),
        }
    }

    /// Groups of stations, one per requested range. Errors are per group so a
    /// bad leg does not stop the others.
    pub fn runs(&self, profiles: &[Option<i32>], exclude: &[i32]) -> Vec<Result<StationRun>> {
        self.groups(profiles, exclude, resolve)
    }

    /// Same groups for profile mode: every number of a range is looked up on
    /// its own, so a missing station only costs its own chart.
    pub fn profile_runs(&self, profiles: &[Option<i32>], exclude: &[i32]) -> Vec<Result<StationRun>> {
        if *self == Selection::All {
            let indices: Vec<usize> = (0..profiles.len())
                .filter(|&i| profiles[i].is_some_and(|n| !exclude.contains(&n)))
                .collect();
            return vec![Self::bounded(profiles, indices)
                .ok_or_else(|| PlotError::MissingVariable("PROFILE".to_string()))];
        }
        self.groups(profiles, exclude, walk)
    }

    fn groups<F>(&self, profiles: &[Option<i32>], exclude: &[i32], select: F) -> Vec<Result<StationRun>>
    where
        F: Fn(&[Option<i32>], i32, i32, &[i32]) -> Result<Vec<usize>>,
    {
        let run = |start: i32, end: i32| -> Result<StationRun> {
            let indices = select(profiles, start, end, exclude)?;
            Self::bounded(profiles, indices).ok_or(PlotError::EmptySelection { start, end })
        };
        let first = profiles.iter().find_map(|&p| p);
        let last = last_defined(profiles).map(|(_, n)| n);
        let missing = || vec![Err(PlotError::MissingVariable("PROFILE".to_string()))];

        match self {
            Selection::All => match first.zip(last) {
                Some((start, end)) => vec![run(start, end)],
                None => missing(),
            },
            Selection::From(start) => match last {
                Some(end) => vec![run(*start, end)],
                None => missing(),
            },
            Selection::Ranges(ranges) => ranges.iter().map(|&(start, end)| run(start, end)).collect(),
            Selection::Explicit(numbers) => {
                let indices: Vec<usize> = numbers
                    .iter()
                    .filter(|&&n| !exclude.contains(&n))
                    .filter_map(|&n| {
                        let found = lookup(profiles, n);
                        if found.is_none() {
                            info!("profile {n} not found, skipped");
                        }
                        found
                    })
                    .collect();
                let start = numbers.first().copied().unwrap_or_default();
                let end = numbers.last().copied().unwrap_or_default();
                vec![Self::bounded(profiles, indices).ok_or(PlotError::EmptySelection { start, end })]
            }
        }
    }

    /// Name the group after the first and last stations it really holds.
    fn bounded(profiles: &[Option<i32>], indices: Vec<usize>) -> Option<StationRun> {
        let start = profiles[*indices.first()?]?;
        let end = profiles[*indices.last()?]?;
        Some(StationRun { start, end, indices })
    }
}
