//! Node-threshold splitter (C3): bound per-face vertex count by splitting
//! into a regular, area-preserving grid using the ESMF-corner extrapolation
//! rule (center-to-corner averaging, with edges and outer corners
//! extrapolated by the mean neighbor spacing).

use geo::{BooleanOps, BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use ndarray::Array2;

use crate::geom::Geom;

/// Number of stored vertices in the exterior ring (closing duplicate not
/// counted, matching how the coordinate table stores rings).
fn vertex_count(p: &Polygon<f64>) -> usize {
    p.exterior().0.len().saturating_sub(1)
}

/// Split every component of `geom` whose vertex count exceeds `threshold`
/// into a grid of sub-polygons, recursively re-splitting any piece the grid
/// pass still leaves over threshold (a non-convex input can intersect a
/// single grid cell along more edges than it started with).
pub fn split_by_node_threshold(geom: &Geom, threshold: usize) -> MultiPolygon<f64> {
    let mut output = Vec::new();
    for p in geom.polygons() {
        split_polygon(p, threshold, 0, &mut output);
    }
    MultiPolygon(output)
}

/// Recursion cap for `split_polygon`. A grid pass is not guaranteed to
/// shrink every piece on concave input; this bounds the retry so such a
/// piece is eventually emitted as-is rather than recursing forever.
const MAX_SPLIT_DEPTH: usize = 6;

fn split_polygon(p: &Polygon<f64>, threshold: usize, depth: usize, out: &mut Vec<Polygon<f64>>) {
    let n = vertex_count(p);
    if n <= threshold || depth >= MAX_SPLIT_DEPTH {
        out.push(p.clone());
        return;
    }

    let n_splits = (n as f64 / threshold as f64).ceil() as usize;
    let side = ((n_splits as f64).sqrt().ceil() as usize).max(2);

    let bounds = p
        .bounding_rect()
        .expect("a polygon with a well-formed exterior ring always has a bounding rect");
    let cols = linspace(bounds.min().x, bounds.max().x, side);
    let rows = linspace(bounds.min().y, bounds.max().y, side);

    for splitter in split_polygons_from_grid(&cols, &rows) {
        let piece = p.intersection(&splitter);
        // Non-polygonal remnants never arise from BooleanOps::intersection.
        for sub in piece.0 {
            split_polygon(&sub, threshold, depth + 1, out);
        }
    }
}

fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![a];
    }
    let step = (b - a) / (n as f64 - 1.0);
    (0..n).map(|i| a + step * i as f64).collect()
}

/// Build the `cols.len() x rows.len()` grid of splitter polygons via the
/// ESMF corner-extrapolation rule: centers along each axis are converted to
/// a `(n+1) x (n+1)` corner grid by averaging 2x2 windows, with edges and
/// extreme corners extrapolated outward by the mean neighbor spacing.
fn split_polygons_from_grid(cols: &[f64], rows: &[f64]) -> Vec<Polygon<f64>> {
    let (nr, nc) = (rows.len(), cols.len());

    let mut cols_grid = Array2::<f64>::zeros((nr, nc));
    let mut rows_grid = Array2::<f64>::zeros((nr, nc));
    for i in 0..nr {
        for j in 0..nc {
            cols_grid[[i, j]] = cols[j];
            rows_grid[[i, j]] = rows[i];
        }
    }

    let col_corners = extrapolated_corners(&cols_grid); // (nr+1, nc+1)
    let row_corners = extrapolated_corners(&rows_grid);

    let mut polys = Vec::with_capacity(nr * nc);
    const CORNER_OFFSETS: [(usize, usize); 4] = [(0, 0), (0, 1), (1, 1), (1, 0)]; // UL, UR, LR, LL
    for i in 0..nr {
        for j in 0..nc {
            let mut coords: Vec<Coord<f64>> = CORNER_OFFSETS
                .iter()
                .map(|(di, dj)| Coord {
                    x: col_corners[[i + di, j + dj]],
                    y: row_corners[[i + di, j + dj]],
                })
                .collect();
            coords.push(coords[0]);
            polys.push(Polygon::new(LineString(coords), vec![]));
        }
    }
    polys
}

/// Given a `rows x cols` array of centers (>= 2 in each dimension), compute
/// the `(rows+1) x (cols+1)` array of extrapolated corners.
fn extrapolated_corners(arr: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = arr.dim();
    assert!(rows >= 2 && cols >= 2, "at least two elements required per axis to extrapolate corners");

    let mut corners = Array2::<f64>::zeros((rows + 1, cols + 1));

    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            corners[[i + 1, j + 1]] =
                (arr[[i, j]] + arr[[i + 1, j]] + arr[[i, j + 1]] + arr[[i + 1, j + 1]]) / 4.0;
        }
    }

    let row_increasing = arr[[0, 0]] < arr[[rows - 1, 0]];
    let col_increasing = arr[[0, 0]] < arr[[0, cols - 1]];

    let row_diff = mean_abs_diff((0..rows - 1).map(|i| arr[[i + 1, 0]] - arr[[i, 0]]));
    let col_diff = mean_abs_diff((0..cols - 1).map(|j| arr[[0, j + 1]] - arr[[0, j]]));

    for i in 1..rows {
        if col_increasing {
            corners[[i, 0]] = corners[[i, 1]] - col_diff;
            corners[[i, cols]] = corners[[i, cols - 1]] + col_diff;
        } else {
            corners[[i, 0]] = corners[[i, 1]] + col_diff;
            corners[[i, cols]] = corners[[i, cols - 1]] - col_diff;
        }
    }

    for j in 1..cols {
        if row_increasing {
            corners[[0, j]] = corners[[1, j]] - row_diff;
            corners[[rows, j]] = corners[[rows - 1, j]] + row_diff;
        } else {
            corners[[0, j]] = corners[[1, j]] + row_diff;
            corners[[rows, j]] = corners[[rows - 1, j]] - row_diff;
        }
    }

    for &row_idx in &[0, rows] {
        if col_increasing {
            corners[[row_idx, 0]] = corners[[row_idx, 1]] - col_diff;
            corners[[row_idx, cols]] = corners[[row_idx, cols - 1]] + col_diff;
        } else {
            corners[[row_idx, 0]] = corners[[row_idx, 1]] + col_diff;
            corners[[row_idx, cols]] = corners[[row_idx, cols - 1]] - col_diff;
        }
    }

    corners
}

fn mean_abs_diff(diffs: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = diffs.clone().count();
    diffs.map(f64::abs).sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;

    fn irregular_polygon(n: usize) -> Polygon<f64> {
        // A star-like irregular ring with `n` vertices, guaranteed simple.
        let mut coords = Vec::with_capacity(n + 1);
        for i in 0..n {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            let r = if i % 2 == 0 { 10.0 } else { 6.0 };
            coords.push(Coord { x: r * theta.cos(), y: r * theta.sin() });
        }
        coords.push(coords[0]);
        Polygon::new(LineString(coords), vec![])
    }

    /// Scenario S3: a 60-vertex irregular polygon, T=10.
    #[test]
    fn s3_node_threshold_split() {
        let poly = irregular_polygon(60);
        let original_area = poly.unsigned_area();
        let geom = Geom::Polygon(poly);

        let split = split_by_node_threshold(&geom, 10);
        assert!(split.0.len() >= 6 && split.0.len() <= 9);

        for p in &split.0 {
            assert!(vertex_count(p) <= 10, "piece exceeds threshold");
        }

        let total: f64 = split.0.iter().map(|p| p.unsigned_area()).sum();
        assert_relative_eq!(total, original_area, max_relative = 1e-6);
    }

    #[test]
    fn below_threshold_is_passthrough() {
        let poly = irregular_polygon(8);
        let geom = Geom::Polygon(poly);
        let split = split_by_node_threshold(&geom, 10);
        assert_eq!(split.0.len(), 1);
    }
}
