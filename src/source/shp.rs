use std::path::{Path, PathBuf};

use shapefile::dbase::FieldValue;
use shapefile::Shape;

use crate::error::{Error, Result};
use crate::geom::Geom;

use super::{Record, VectorSource};

/// Shapefile-backed [`VectorSource`]. Wraps the `.shp`/`.dbf` pair the
/// `shapefile` crate reads together.
pub struct ShapefileSource {
    path: PathBuf,
    uid_field: String,
    len: usize,
}

impl ShapefileSource {
    pub fn open(path: impl AsRef<Path>, uid_field: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = shapefile::Reader::from_path(&path)
            .map_err(|e| Error::Input(format!("opening {}: {e}", path.display())))?;
        let len = reader
            .iter_shapes_and_records()
            .count();
        Ok(ShapefileSource { path, uid_field: uid_field.into(), len })
    }
}

impl VectorSource for ShapefileSource {
    fn len(&self) -> usize {
        self.len
    }

    fn records(&self) -> Result<Vec<Record>> {
        let mut reader = shapefile::Reader::from_path(&self.path)
            .map_err(|e| Error::Input(format!("opening {}: {e}", self.path.display())))?;

        let mut out = Vec::with_capacity(self.len);
        for result in reader.iter_shapes_and_records() {
            let (shape, attrs) = result
                .map_err(|e| Error::Input(format!("reading shape+record: {e}")))?;

            let uid = extract_uid(&attrs, &self.uid_field)?;
            let geom = shape_to_geom(shape)
                .map_err(|detail| Error::GeometryInvalid { uid, detail })?;
            out.push(Record { uid, geom });
        }
        Ok(out)
    }
}

fn extract_uid(record: &shapefile::dbase::Record, uid_field: &str) -> Result<i64> {
    match record.get(uid_field) {
        Some(FieldValue::Integer(v)) => Ok(*v as i64),
        Some(FieldValue::Numeric(Some(v))) => Ok(*v as i64),
        Some(other) => Err(Error::Input(format!(
            "uid field '{uid_field}' has non-numeric value {other:?}"
        ))),
        None => Err(Error::Input(format!("uid field '{uid_field}' missing from record"))),
    }
}

/// Convert a shapefile polygon shape into a [`Geom`]. Grounded on the
/// teacher's `shp_to_geo`: ring orientation from shoelace sign (CW exterior
/// in the Shapefile convention), consecutive holes grouped under the
/// preceding exterior.
fn shape_to_geom(shape: Shape) -> std::result::Result<Geom, String> {
    let polygon = match shape {
        Shape::Polygon(p) => p,
        other => return Err(format!("unsupported shape type: {other:?}")),
    };

    fn signed_area(pts: &[geo::Coord<f64>]) -> f64 {
        let mut a = 0.0;
        for w in pts.windows(2) {
            a += w[0].x * w[1].y - w[1].x * w[0].y;
        }
        a / 2.0
    }

    let mut rings: Vec<(geo::LineString<f64>, bool)> = Vec::with_capacity(polygon.rings().len());
    for ring in polygon.rings() {
        let mut coords: Vec<geo::Coord<f64>> =
            ring.points().iter().map(|pt| geo::Coord { x: pt.x, y: pt.y }).collect();
        if coords.first() != coords.last() {
            if let Some(&first) = coords.first() {
                coords.push(first);
            }
        }
        let is_exterior = signed_area(&coords) < 0.0;
        rings.push((geo::LineString(coords), is_exterior));
    }

    let mut polys = Vec::new();
    let mut exterior = None;
    let mut holes = Vec::new();
    for (ring, is_exterior) in rings {
        if is_exterior {
            if let Some(ext) = exterior.take() {
                polys.push(geo::Polygon::new(ext, std::mem::take(&mut holes)));
            }
            exterior = Some(ring);
        } else {
            holes.push(ring);
        }
    }
    if let Some(ext) = exterior {
        polys.push(geo::Polygon::new(ext, holes));
    }

    if polys.is_empty() {
        return Err("shapefile polygon record had no exterior ring".to_string());
    }
    Ok(geo::MultiPolygon(polys).into())
}
