//! Minimal 2D Euclidean polygon algebra (C1), delegated to `geo`.

use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Coord, InteriorPoint, LineString, MultiPolygon,
    Orient, Point, Polygon, Rect, Relate,
};

use super::Geom;

/// Re-polygonize a (possibly self-touching/bowtie) polygon through a
/// self-union, the same trick a zero-width `buffer(0)` plays: unioning a
/// polygon with itself forces the boolean-ops sweep to resolve any
/// self-intersections. A no-op (up to floating point) on already-valid
/// input.
pub fn validity_repair(p: &Polygon<f64>) -> Result<Polygon<f64>, String> {
    let repaired = p.union(p);
    let mut polys = repaired.0.into_iter();
    let first = polys
        .next()
        .ok_or_else(|| "self-union produced an empty geometry".to_string())?;
    if polys.next().is_some() {
        return Err("self-union produced more than one ring; geometry cannot be repaired into a single polygon".to_string());
    }
    if first.exterior().0.len() < 4 {
        return Err("repaired exterior ring has fewer than 4 coordinates".to_string());
    }
    Ok(first)
}

/// Ensure the exterior ring is CCW and interior rings are CW. Stable: a
/// polygon that is already correctly oriented is returned unchanged (up to
/// `geo`'s internal float handling).
pub fn orient_ccw(p: Polygon<f64>) -> Polygon<f64> {
    p.orient(geo::orient::Direction::Default)
}

pub fn bounds(g: &Geom) -> Option<Rect<f64>> {
    match g {
        Geom::Polygon(p) => p.bounding_rect(),
        Geom::MultiPolygon(mp) => mp.bounding_rect(),
    }
}

pub fn area(g: &Geom) -> f64 {
    match g {
        Geom::Polygon(p) => p.unsigned_area(),
        Geom::MultiPolygon(mp) => mp.unsigned_area(),
    }
}

pub fn centroid(g: &Geom) -> Option<Point<f64>> {
    match g {
        Geom::Polygon(p) => p.centroid(),
        Geom::MultiPolygon(mp) => mp.centroid(),
    }
}

/// A point guaranteed to lie strictly inside the geometry -- centroid is
/// not sufficient for concave/holed polygons (it can fall in a hole or
/// outside a concave exterior).
pub fn representative_point(g: &Geom) -> Option<Point<f64>> {
    match g {
        Geom::Polygon(p) => p.interior_point(),
        Geom::MultiPolygon(mp) => mp.interior_point(),
    }
}

pub fn rect_to_polygon(r: Rect<f64>) -> Polygon<f64> {
    let (minx, miny) = (r.min().x, r.min().y);
    let (maxx, maxy) = (r.max().x, r.max().y);
    let coords: Vec<Coord<f64>> = vec![
        (minx, miny).into(),
        (maxx, miny).into(),
        (maxx, maxy).into(),
        (minx, maxy).into(),
        (minx, miny).into(),
    ];
    Polygon::new(LineString(coords), vec![])
}

/// Intersect a geometry with an axis-aligned box. May return an empty
/// MultiPolygon.
pub fn intersect(g: &Geom, rect: Rect<f64>) -> MultiPolygon<f64> {
    let box_poly = rect_to_polygon(rect);
    match g {
        Geom::Polygon(p) => p.intersection(&box_poly),
        Geom::MultiPolygon(mp) => mp.intersection(&box_poly),
    }
}

/// Shared boundary, disjoint interiors.
pub fn touches(a: &Geom, b: &Geom) -> bool {
    let ga = a.clone().into_multi();
    let gb = b.clone().into_multi();
    ga.relate(&gb).is_touches()
}
