//! Vector reader: narrow trait over whatever GIS file or in-memory
//! collection supplies the records.

mod memory;
mod shp;

pub use memory::InMemorySource;
pub use shp::ShapefileSource;

use crate::error::Result;
use crate::geom::Geom;

/// `(uid, geom)` pair pulled from a source, properties are intentionally
/// opaque -- only the configured UID field is ever read.
#[derive(Debug, Clone)]
pub struct Record {
    pub uid: i64,
    pub geom: Geom,
}

/// Narrow interface the core relies on: shape and the UID property only.
pub trait VectorSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records in source order.
    fn records(&self) -> Result<Vec<Record>>;
}
