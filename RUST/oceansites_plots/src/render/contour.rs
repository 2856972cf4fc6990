//! Marching squares over a rectilinear grid.

use ndarray::Array2;

pub type Point = (f64, f64);
pub type Segment = (Point, Point);

// ─────────────────────────────────────────────────────────────────────
// Isolines
// ─────────────────────────────────────────────────────────────────────

/// Isoline segments of `level` over `z` (`x.len()` × `y.len()`), in data
/// coordinates. Cells touching an undefined corner are left out.
pub fn isolines(x: &[f64], y: &[f64], z: &Array2<f64>, level: f64) -> Vec<Segment> {
    let (nx, ny) = z.dim();
    let mut out = Vec::new();
    if nx < 2 || ny < 2 || x.len() != nx || y.len() != ny || !level.is_finite() {
        return out;
    }

    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            // counter-clockwise from (x_i, y_j)
            let values = [z[[i, j]], z[[i + 1, j]], z[[i + 1, j + 1]], z[[i, j + 1]]];
            if values.iter().any(|v| !v.is_finite()) {
                continue;
            }
            let corners = [(x[i], y[j]), (x[i + 1], y[j]), (x[i + 1], y[j + 1]), (x[i], y[j + 1])];

            let case = values
                .iter()
                .enumerate()
                .fold(0u8, |acc, (k, &v)| acc | (((v >= level) as u8) << k));

            let edges: &[(u8, u8)] = match case {
                0 | 15  => &[],
                1 | 14  => &[(3, 0)],
                2 | 13  => &[(0, 1)],
                3 | 12  => &[(3, 1)],
                4 | 11  => &[(1, 2)],
                6 | 9   => &[(0, 2)],
                7 | 8   => &[(3, 2)],
                5 | 10 => {
                    // saddle: the cell centre decides which corners connect
                    let centre = values.iter().sum::<f64>() / 4.0;
                    if (centre >= level) == (case == 5) {
                        &[(0, 1), (2, 3)]
                    } else {
                        &[(3, 0), (1, 2)]
                    }
                }
                _ => &[],
            };

            for &(a, b) in edges {
                out.push((
                    edge_point(a, &corners, &values, level),
                    edge_point(b, &corners, &values, level),
                ));
            }
        }
    }
    out
}

fn edge_point(edge: u8, corners: &[Point; 4], values: &[f64; 4], level: f64) -> Point {
    let (a, b) = match edge {
        0 => (0, 1),
        1 => (1, 2),
        2 => (2, 3),
        _ => (3, 0),
    };
    let (va, vb) = (values[a], values[b]);
    let t = if vb == va { 0.5 } else { ((level - va) / (vb - va)).clamp(0.0, 1.0) };
    let (pa, pb) = (corners[a], corners[b]);
    (pa.0 + (pb.0 - pa.0) * t, pa.1 + (pb.1 - pa.1) * t)
}

// ─────────────────────────────────────────────────────────────────────
// Filled cells
// ─────────────────────────────────────────────────────────────────────

/// One grid cell and the mean of its four corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub x0:    f64,
    pub x1:    f64,
    pub y0:    f64,
    pub y1:    f64,
    pub value: f64,
}

/// Cells whose corners are all defined.
pub fn cells(x: &[f64], y: &[f64], z: &Array2<f64>) -> Vec<Cell> {
    let (nx, ny) = z.dim();
    if nx < 2 || ny < 2 || x.len() != nx || y.len() != ny {
        return Vec::new();
    }
    let mut out = Vec::with_capacity((nx - 1) * (ny - 1));
    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            let corners = [z[[i, j]], z[[i + 1, j]], z[[i + 1, j + 1]], z[[i, j + 1]]];
            if corners.iter().any(|v| !v.is_finite()) {
                continue;
            }
            out.push(Cell {
                x0:    x[i],
                x1:    x[i + 1],
                y0:    y[j],
                y1:    y[j + 1],
                value: corners.iter().sum::<f64>() / 4.0,
            });
        }
    }
    out
}
