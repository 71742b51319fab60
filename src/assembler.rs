//! Face/coordinate assembler (C5): consumes a worker's slice of records and
//! produces the flat ESMF-format arrays once the partition coordinator (C6)
//! supplies this rank's starting node index.

use geo::Area;
use indexmap::IndexMap;
use ndarray::Array2;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::geom::{self, Geom};
use crate::source::Record;

/// Per-record coordinate pieces, insertion-ordered by first appearance.
/// `SmallVec<[Array2<f64>; 1]>` avoids a heap allocation for the
/// overwhelmingly common single-part case.
pub type CoordinateDict = IndexMap<i64, SmallVec<[Array2<f64>; 1]>>;

/// Outputs of [`Assembler::finalize`]: the flat arrays the writer emits
/// verbatim.
pub struct Finalized {
    /// Per-face variable-length node-index sequence (global indices, with
    /// `polygon_break_value` separators between multipart pieces).
    pub face_nodes: Vec<Vec<i32>>,
    pub coordinates: Array2<f64>,
    pub edge_nodes: Array2<i32>,
    pub face_uid: Vec<i32>,
    pub face_center: Array2<f64>,
    pub face_area: Vec<f64>,
    pub max_face_nodes: usize,
}

/// Accumulates one worker's slice. `process_record` may be called
/// repeatedly as records are pulled from the manager; `finalize` is called
/// exactly once, after `idx_start` is known.
#[derive(Default)]
pub struct Assembler {
    cdict: CoordinateDict,
    face_center: Vec<(f64, f64)>,
    face_area: Vec<f64>,
    n_coords: usize,
    max_face_nodes: usize,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    /// Total coordinate rows accumulated so far -- this rank's
    /// `local_n_coords`, the value C6 needs for the exclusive prefix sum.
    pub fn n_coords(&self) -> usize {
        self.n_coords
    }

    pub fn n_faces(&self) -> usize {
        self.cdict.len()
    }

    pub fn max_face_nodes(&self) -> usize {
        self.max_face_nodes
    }

    /// Total length of every face's flattened node-index sequence,
    /// including break-value separators -- the `connectionCount` dimension.
    pub fn connection_count(&self) -> usize {
        self.cdict
            .values()
            .map(|pieces| {
                pieces.iter().map(|p| p.nrows()).sum::<usize>() + pieces.len().saturating_sub(1)
            })
            .sum()
    }

    /// Per-record procedure: compute area and representative point, flatten
    /// ring coordinates into a coordinate dict entry, and track the running
    /// max face-node count.
    pub fn process_record(&mut self, record: &Record) -> Result<()> {
        let Record { uid, geom } = record;

        if self.cdict.contains_key(uid) {
            return Err(Error::Input(format!("duplicate uid {uid}")));
        }

        let area = geom::area(geom);
        let point = geom::representative_point(geom).ok_or_else(|| Error::GeometryInvalid {
            uid: *uid,
            detail: "no interior point could be found".to_string(),
        })?;
        self.face_center.push((point.x(), point.y()));
        self.face_area.push(area);

        let mut pieces: SmallVec<[Array2<f64>; 1]> = SmallVec::new();
        for polygon in geom.polygons() {
            let oriented = geom::orient_ccw(polygon.clone());
            let coords = ring_without_closing_vertex(&oriented);
            self.n_coords += coords.nrows();
            pieces.push(coords);
        }

        let n_pieces = pieces.len();
        self.max_face_nodes = self.max_face_nodes.max(
            pieces.iter().map(|c| c.nrows()).sum::<usize>() + n_pieces.saturating_sub(1),
        );

        self.cdict.insert(*uid, pieces);
        Ok(())
    }

    /// Build the flat output arrays now that `idx_start` (this rank's
    /// starting global node index) is known.
    pub fn finalize(&self, idx_start: usize, polygon_break_value: i32) -> Finalized {
        let n_faces = self.cdict.len();
        let local_n_coords = self.n_coords;

        let mut face_nodes = Vec::with_capacity(n_faces);
        let mut face_uid = Vec::with_capacity(n_faces);
        let mut coordinates = Array2::<f64>::zeros((local_n_coords, 2));
        let mut edge_nodes = Array2::<i32>::zeros((local_n_coords, 2));

        let mut cursor = idx_start;
        for (row, (&uid, pieces)) in self.cdict.iter().enumerate() {
            face_uid.push(uid as i32);
            let mut nodes = Vec::new();

            for (piece_idx, piece) in pieces.iter().enumerate() {
                let len_k = piece.nrows();
                let piece_start = cursor;

                if piece_idx > 0 {
                    nodes.push(polygon_break_value);
                }
                for j in 0..len_k {
                    let global = (piece_start + j) as i32;
                    nodes.push(global);

                    let local_row = piece_start - idx_start + j;
                    coordinates.row_mut(local_row).assign(&piece.row(j));

                    let next = piece_start + (j + 1) % len_k;
                    edge_nodes[[local_row, 0]] = global;
                    edge_nodes[[local_row, 1]] = next as i32;
                }

                cursor += len_k;
            }

            face_nodes.push(nodes);
            debug_assert_eq!(face_uid[row], uid as i32);
        }

        debug_assert_eq!(cursor - idx_start, local_n_coords);

        let mut face_center = Array2::<f64>::zeros((n_faces, 2));
        for (i, (x, y)) in self.face_center.iter().enumerate() {
            face_center[[i, 0]] = *x;
            face_center[[i, 1]] = *y;
        }

        Finalized {
            face_nodes,
            coordinates,
            edge_nodes,
            face_uid,
            face_center,
            face_area: self.face_area.clone(),
            max_face_nodes: self.max_face_nodes,
        }
    }

    /// Face UIDs in cdict insertion order -- the single source of truth for
    /// face identity and ordering; there is never a second, independently
    /// computed face-id list that could drift out of sync with this one.
    pub fn face_uids(&self) -> Vec<i64> {
        self.cdict.keys().copied().collect()
    }
}

fn ring_without_closing_vertex(p: &geo::Polygon<f64>) -> Array2<f64> {
    let coords = &p.exterior().0;
    let n = coords.len().saturating_sub(1); // drop duplicated closing vertex
    let mut arr = Array2::<f64>::zeros((n, 2));
    for (i, c) in coords.iter().take(n).enumerate() {
        arr[[i, 0]] = c.x;
        arr[[i, 1]] = c.y;
    }
    arr
}

/// Total vertex area a record's component polygons cover after flattening;
/// exposed for assembler tests that want to cross-check against
/// `geom::area`.
pub fn flat_area(geom: &Geom) -> f64 {
    geom.polygons().map(|p| p.unsigned_area()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, Polygon};

    fn triangle(ox: f64, oy: f64) -> Geom {
        let coords = vec![
            Coord { x: ox, y: oy },
            Coord { x: ox + 1.0, y: oy },
            Coord { x: ox, y: oy + 1.0 },
            Coord { x: ox, y: oy },
        ];
        Geom::Polygon(Polygon::new(LineString(coords), vec![]))
    }

    /// Scenario S4: two triangles sharing no vertices, W=1.
    #[test]
    fn s4_assembler_small_case() {
        let mut asm = Assembler::new();
        asm.process_record(&Record { uid: 100, geom: triangle(0.0, 0.0) }).unwrap();
        asm.process_record(&Record { uid: 200, geom: triangle(10.0, 10.0) }).unwrap();

        assert_eq!(asm.n_coords(), 6);

        let fin = asm.finalize(0, -8);
        assert_eq!(fin.face_uid, vec![100, 200]);
        assert_eq!(fin.face_nodes[0], vec![0, 1, 2]);
        assert_eq!(fin.face_nodes[1], vec![3, 4, 5]);
        assert_eq!(fin.edge_nodes.row(2).to_vec(), vec![2, 0]);
        assert_eq!(fin.edge_nodes.row(5).to_vec(), vec![5, 3]);
    }

    #[test]
    fn duplicate_uid_is_rejected() {
        let mut asm = Assembler::new();
        asm.process_record(&Record { uid: 1, geom: triangle(0.0, 0.0) }).unwrap();
        let err = asm.process_record(&Record { uid: 1, geom: triangle(10.0, 10.0) }).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert_eq!(asm.n_coords(), 3);
    }

    /// Scenario S6: a single MultiPolygon face made of two triangles.
    #[test]
    fn s6_sentinel_encoding() {
        let mp = match (triangle(0.0, 0.0), triangle(10.0, 10.0)) {
            (Geom::Polygon(a), Geom::Polygon(b)) => geo::MultiPolygon(vec![a, b]),
            _ => unreachable!(),
        };
        let geom: Geom = mp.into();

        let mut asm = Assembler::new();
        asm.process_record(&Record { uid: 1, geom }).unwrap();

        let fin = asm.finalize(0, -8);
        assert_eq!(fin.face_nodes[0], vec![0, 1, 2, -8, 3, 4, 5]);
        assert_eq!(fin.face_nodes[0].len(), 7);
    }
}
