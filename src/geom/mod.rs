//! Geometry primitives (component C1): the tagged Polygon/MultiPolygon sum
//! and the minimal 2D Euclidean polygon algebra the rest of the crate relies
//! on.

pub(crate) mod algebra;

pub use algebra::{
    area, bounds, centroid, intersect, orient_ccw, representative_point, touches, validity_repair,
};

use geo::{MultiPolygon, Polygon, Rect};

/// Tagged sum over the two shapes a face can take, standing in for runtime
/// type dispatch between single and multi-part polygons.
#[derive(Debug, Clone)]
pub enum Geom {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Geom {
    /// Uniform "iterate component polygons" operation.
    pub fn polygons(&self) -> Box<dyn Iterator<Item = &Polygon<f64>> + '_> {
        match self {
            Geom::Polygon(p) => Box::new(std::iter::once(p)),
            Geom::MultiPolygon(mp) => Box::new(mp.0.iter()),
        }
    }

    pub fn is_multipart(&self) -> bool {
        match self {
            Geom::Polygon(_) => false,
            Geom::MultiPolygon(mp) => mp.0.len() > 1,
        }
    }

    pub fn into_multi(self) -> MultiPolygon<f64> {
        match self {
            Geom::Polygon(p) => MultiPolygon(vec![p]),
            Geom::MultiPolygon(mp) => mp,
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        bounds(self)
    }
}

impl From<Polygon<f64>> for Geom {
    fn from(p: Polygon<f64>) -> Self {
        Geom::Polygon(p)
    }
}

impl From<MultiPolygon<f64>> for Geom {
    fn from(mp: MultiPolygon<f64>) -> Self {
        if mp.0.len() == 1 {
            Geom::Polygon(mp.0.into_iter().next().unwrap())
        } else {
            Geom::MultiPolygon(mp)
        }
    }
}
