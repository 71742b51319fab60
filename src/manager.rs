//! Geometry manager (C4): a stateful cursor over a [`VectorSource`] applying
//! reprojection, multipart policy, and the two splitters, exposing a
//! deterministic, sliceable stream of `(uid, geom)` pairs.

use geo::{MultiPolygon, Polygon};

use crate::config::Config;
use crate::connectivity::SpatialIndex;
use crate::error::{Error, Result};
use crate::geom::Geom;
use crate::interior_split;
use crate::node_split;
use crate::partition::Section;
use crate::reproject::{Identity, ProjReprojector, Reprojector};
use crate::source::{Record, VectorSource};

pub struct GeometryManager<S> {
    source: S,
    config: Config,
    reprojector: Box<dyn Reprojector>,
}

impl<S: VectorSource> GeometryManager<S> {
    pub fn new(source: S, config: Config) -> Result<Self> {
        let reprojector: Box<dyn Reprojector> = match &config.dest_crs {
            Some(dest) => Box::new(ProjReprojector::new(&config.source_crs, dest)?),
            None => Box::new(Identity),
        };
        Ok(GeometryManager { source, config, reprojector })
    }

    /// Total record count, before any `slc` clipping -- clipping is applied
    /// by the caller via `iter_records`'s `slc`.
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produces records in source order over `slc` (or the whole dataset),
    /// applying validity repair -> reproject -> multipart policy -> interior
    /// split -> node-threshold split to each, in that fixed order. One
    /// [`Record`] out per [`Record`] in: splitting only changes how
    /// multipart a face's geometry is, never its identity.
    pub fn iter_records(&self, slc: Option<Section>) -> Result<Vec<Result<Record>>> {
        let all = self.source.records()?;
        let (start, stop) = match slc {
            Some(s) => (s.start, s.stop),
            None => (0, all.len()),
        };

        Ok(all[start..stop]
            .iter()
            .map(|record| self.transform(record))
            .collect())
    }

    fn transform(&self, record: &Record) -> Result<Record> {
        let repaired: Vec<Polygon<f64>> = record
            .geom
            .clone()
            .into_multi()
            .0
            .into_iter()
            .map(|p| {
                crate::geom::validity_repair(&p).map_err(|detail| Error::GeometryInvalid {
                    uid: record.uid,
                    detail,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut mp = MultiPolygon(repaired);
        self.reprojector.reproject(&mut mp)?;
        let mut geom: Geom = mp.into();

        if !self.config.allow_multipart && geom.is_multipart() {
            return Err(Error::MultipartNotAllowed { uid: record.uid });
        }

        if self.config.split_interiors {
            geom = apply_interior_split(&geom).into();
        }

        if let Some(threshold) = self.config.node_threshold {
            geom = node_split::split_by_node_threshold(&geom, threshold).into();
        }

        Ok(Record { uid: record.uid, geom })
    }

    /// R-tree over every *current* geometry (after the same transform
    /// pipeline as `iter_records`), used only by single-worker connectivity
    /// mode.
    pub fn get_spatial_index(&self) -> Result<(Vec<Record>, SpatialIndex)> {
        let records: Vec<Record> = self
            .iter_records(None)?
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        let geoms: Vec<Geom> = records.iter().map(|r| r.geom.clone()).collect();
        let index = SpatialIndex::build(&geoms)?;
        Ok((records, index))
    }
}

/// Apply the interior splitter (C2) to every component polygon that has
/// holes, leaving hole-free components untouched, and flatten the result
/// into a single `MultiPolygon`.
fn apply_interior_split(geom: &Geom) -> MultiPolygon<f64> {
    let mut pieces = Vec::new();
    for p in geom.polygons() {
        if p.interiors().is_empty() {
            pieces.push(p.clone());
        } else {
            let split = interior_split::split_interiors(&Geom::Polygon(p.clone()));
            pieces.extend(split.0);
        }
    }
    MultiPolygon(pieces)
}
