//! Optional neighbor connectivity. Single-worker only; an independent pass
//! run after the main assembly so
//! its R-tree dependency stays out of the hot path. Two geometries are
//! neighbors when they share boundary contact (`touches()`), pruned by an
//! R-tree over bounding boxes so the check stays near-linear rather than
//! quadratic in face count.

use rstar::{RTree, RTreeObject, AABB};

use crate::error::{Error, Result};
use crate::geom::{self, Geom};

struct BoundingBox {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over a rank's current geometries, built once and reused by
/// [`face_links`].
pub struct SpatialIndex {
    tree: RTree<BoundingBox>,
}

impl SpatialIndex {
    pub fn build(geoms: &[Geom]) -> Result<Self> {
        let mut items = Vec::with_capacity(geoms.len());
        for (index, g) in geoms.iter().enumerate() {
            let rect = g.bounding_rect().ok_or_else(|| {
                Error::GeometryInvalid { uid: index as i64, detail: "empty bounding rect".to_string() }
            })?;
            let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
            items.push(BoundingBox { index, envelope });
        }
        Ok(SpatialIndex { tree: RTree::bulk_load(items) })
    }
}

/// Per-face lists of neighbor *positions* (index into `geoms`, not UID) that
/// share boundary contact with that face. A face with no neighbors gets a
/// single `-1` sentinel entry, matching `get_mapped_face_links`.
pub fn face_links(geoms: &[Geom], index: &SpatialIndex) -> Vec<Vec<i32>> {
    let mut links: Vec<Vec<i32>> = vec![Vec::new(); geoms.len()];

    for i in 0..geoms.len() {
        let Some(rect) = geoms[i].bounding_rect() else { continue };
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        for cand in index.tree.locate_in_envelope_intersecting(&envelope) {
            let j = cand.index;
            if j <= i {
                continue; // unordered pair visited once
            }
            if geom::touches(&geoms[i], &geoms[j]) {
                links[i].push(j as i32);
                links[j].push(i as i32);
            }
        }
    }

    for l in &mut links {
        if l.is_empty() {
            l.push(-1);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, Polygon};

    fn square(ox: f64, oy: f64, side: f64) -> Geom {
        let coords = vec![
            Coord { x: ox, y: oy },
            Coord { x: ox + side, y: oy },
            Coord { x: ox + side, y: oy + side },
            Coord { x: ox, y: oy + side },
            Coord { x: ox, y: oy },
        ];
        Geom::Polygon(Polygon::new(LineString(coords), vec![]))
    }

    #[test]
    fn adjacent_squares_link_each_other() {
        let geoms = vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0), square(10.0, 10.0, 1.0)];
        let index = SpatialIndex::build(&geoms).unwrap();
        let links = face_links(&geoms, &index);

        assert_eq!(links[0], vec![1]);
        assert_eq!(links[1], vec![0]);
        assert_eq!(links[2], vec![-1]);
    }
}
