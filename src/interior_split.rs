//! Interior splitter (C2): eliminate holes by recursive quadrant splitting.
//!
//! ESMF Mesh cells must be simple polygons, so every interior ring has to
//! go. Modeled as an explicit work-list rather than deep recursion, so a
//! polygon with many interiors cannot blow the stack.

use std::collections::VecDeque;

use geo::{BooleanOps, BoundingRect, Centroid, Coord, Polygon, Rect};

use crate::geom::Geom;

const BUFFER_SPLIT: f64 = 1e-6;

/// Eliminate every interior ring in `geom` by repeated quadrant splitting.
/// Hole-free input is returned unchanged (the `NoInteriors` case is
/// recovered here, never surfaced to the caller).
pub fn split_interiors(geom: &Geom) -> geo::MultiPolygon<f64> {
    let mut worklist: VecDeque<Polygon<f64>> = geom.polygons().cloned().collect();
    let mut output = Vec::new();

    while let Some(p) = worklist.pop_front() {
        match split_one_interior(&p) {
            None => output.push(p),
            Some(pieces) => worklist.extend(pieces),
        }
    }

    geo::MultiPolygon(output)
}

/// Split `p` around a single interior ring (its first), returning the
/// non-empty pieces of the four quadrant boxes intersected with `p`.
/// Returns `None` if `p` has no interior rings (the `NoInteriors` case).
fn split_one_interior(p: &Polygon<f64>) -> Option<Vec<Polygon<f64>>> {
    let interior = p.interiors().first()?;

    let bounds = p
        .bounding_rect()
        .expect("a polygon with a well-formed exterior ring always has a bounding rect");
    let minx = bounds.min().x - BUFFER_SPLIT;
    let miny = bounds.min().y - BUFFER_SPLIT;
    let maxx = bounds.max().x + BUFFER_SPLIT;
    let maxy = bounds.max().y + BUFFER_SPLIT;

    // Tie-break: a degenerate ring's centroid may fall outside the
    // exterior. The four boxes are still built around it; the resulting
    // empty intersections are simply dropped below.
    let center = interior
        .centroid()
        .unwrap_or_else(|| Coord { x: (minx + maxx) / 2.0, y: (miny + maxy) / 2.0 }.into());
    let (cx, cy) = (center.x(), center.y());

    let quadrants = [
        Rect::new((minx, cy), (cx, maxy)), // UL
        Rect::new((cx, cy), (maxx, maxy)), // UR
        Rect::new((cx, miny), (maxx, cy)), // LR
        Rect::new((minx, miny), (cx, cy)), // LL
    ];

    let mut pieces = Vec::with_capacity(4);
    for q in quadrants {
        let box_poly = crate::geom::algebra::rect_to_polygon(q);
        let piece = p.intersection(&box_poly);
        // Drop non-polygonal remnants (points/lines) by construction:
        // BooleanOps::intersection only ever yields polygonal rings.
        pieces.extend(piece.0.into_iter());
    }
    Some(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, LineString};

    fn box_poly(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Polygon<f64> {
        Polygon::new(
            LineString(vec![
                (minx, miny).into(),
                (maxx, miny).into(),
                (maxx, maxy).into(),
                (minx, maxy).into(),
                (minx, miny).into(),
            ]),
            vec![],
        )
    }

    /// Scenario S1: exterior box(2,10,4,20) with one interior centered at
    /// (3, 13).
    #[test]
    fn s1_hole_split() {
        let exterior = LineString(vec![
            (2.0, 10.0).into(),
            (4.0, 10.0).into(),
            (4.0, 20.0).into(),
            (2.0, 20.0).into(),
            (2.0, 10.0).into(),
        ]);
        let hole = LineString(vec![
            (2.8, 12.8).into(),
            (3.2, 12.8).into(),
            (3.2, 13.2).into(),
            (2.8, 13.2).into(),
            (2.8, 12.8).into(),
        ]);
        let poly = Polygon::new(exterior, vec![hole]);
        let original_area = poly.unsigned_area();

        let geom = Geom::Polygon(poly);
        let split = split_interiors(&geom);
        assert_eq!(split.0.len(), 4);

        let total: f64 = split.0.iter().map(|p| p.unsigned_area()).sum();
        assert_relative_eq!(total, original_area, max_relative = 1e-9);
    }

    /// Scenario S2: a MultiPolygon of a holed square and a disjoint solid
    /// square yields 4 + 1 = 5 pieces with preserved total area.
    #[test]
    fn s2_multipart_passthrough() {
        let holed_exterior = LineString(vec![
            (0.0, 0.0).into(),
            (10.0, 0.0).into(),
            (10.0, 10.0).into(),
            (0.0, 10.0).into(),
            (0.0, 0.0).into(),
        ]);
        let hole = LineString(vec![
            (4.0, 4.0).into(),
            (6.0, 4.0).into(),
            (6.0, 6.0).into(),
            (4.0, 6.0).into(),
            (4.0, 4.0).into(),
        ]);
        let holed = Polygon::new(holed_exterior, vec![hole]);
        let solid = box_poly(20.0, 0.0, 25.0, 5.0);
        let original_area = holed.unsigned_area() + solid.unsigned_area();

        let geom = Geom::MultiPolygon(geo::MultiPolygon(vec![holed, solid]));
        let split = split_interiors(&geom);
        assert_eq!(split.0.len(), 5);

        let total: f64 = split.0.iter().map(|p| p.unsigned_area()).sum();
        assert_relative_eq!(total, original_area, max_relative = 1e-9);
    }

    #[test]
    fn hole_free_polygon_is_passthrough() {
        let p = box_poly(0.0, 0.0, 1.0, 1.0);
        let geom = Geom::Polygon(p.clone());
        let split = split_interiors(&geom);
        assert_eq!(split.0.len(), 1);
    }
}
