//! Coordinate reprojection (the `dest_crs` option), backed by `proj4rs`,
//! wrapped in a small injectable trait so `GeometryManager` doesn't
//! hard-code a single CRS pair.

use geo::{Coord, MapCoordsInPlace, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::error::{Error, Result};

/// Reprojects coordinates from a source CRS into a fixed destination CRS.
pub trait Reprojector {
    fn reproject(&self, geom: &mut MultiPolygon<f64>) -> Result<()>;
}

/// No-op reprojector used when `dest_crs` is unset.
pub struct Identity;

impl Reprojector for Identity {
    fn reproject(&self, _geom: &mut MultiPolygon<f64>) -> Result<()> {
        Ok(())
    }
}

/// `proj4rs`-backed reprojector between two fixed PROJ.4 definitions.
pub struct ProjReprojector {
    from: Proj4,
    to: Proj4,
    /// `proj4rs` always transforms in radians for geographic CRSes; this
    /// records whether source/dest are geographic so degrees<->radians
    /// conversion happens at the boundary.
    from_is_geographic: bool,
    to_is_geographic: bool,
}

impl ProjReprojector {
    pub fn new(source_crs: &str, dest_crs: &str) -> Result<Self> {
        let from = Proj4::from_proj_string(source_crs)
            .map_err(|e| Error::Input(format!("invalid source CRS '{source_crs}': {e}")))?;
        let to = Proj4::from_proj_string(dest_crs)
            .map_err(|e| Error::Input(format!("invalid dest CRS '{dest_crs}': {e}")))?;
        let from_is_geographic = from.is_latlong();
        let to_is_geographic = to.is_latlong();
        Ok(ProjReprojector { from, to, from_is_geographic, to_is_geographic })
    }
}

impl Reprojector for ProjReprojector {
    fn reproject(&self, geom: &mut MultiPolygon<f64>) -> Result<()> {
        let mut transform_err = None;

        geom.map_coords_in_place(|Coord { x, y }| {
            if transform_err.is_some() {
                return Coord { x, y };
            }

            let mut point = if self.from_is_geographic {
                (x.to_radians(), y.to_radians(), 0.0)
            } else {
                (x, y, 0.0)
            };

            if let Err(e) = transform(&self.from, &self.to, &mut point) {
                transform_err = Some(e.to_string());
                return Coord { x, y };
            }

            if self.to_is_geographic {
                Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
            } else {
                Coord { x: point.0, y: point.1 }
            }
        });

        match transform_err {
            Some(detail) => Err(Error::Input(format!("reprojection failed: {detail}"))),
            None => Ok(()),
        }
    }
}
