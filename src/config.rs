//! Geometry manager configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options controlling how [`crate::manager::GeometryManager`] pulls,
/// repairs, and splits geometries before they reach the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the integer property used as the face UID.
    pub uid_field: String,
    /// If false, multipart inputs fail with `MultipartNotAllowed`.
    pub allow_multipart: bool,
    /// Apply the interior splitter (C2) to every geometry that has holes.
    pub split_interiors: bool,
    /// Apply the node-threshold splitter (C3) above this vertex count.
    pub node_threshold: Option<usize>,
    /// Reproject every geometry to this CRS (PROJ string or WKT) before
    /// emission.
    pub dest_crs: Option<String>,
    /// Source CRS assumed for every geometry pulled from the reader, used
    /// only when `dest_crs` is set. Defaults to geographic WGS84.
    pub source_crs: String,
    /// Compute neighbor connectivity (single-worker only).
    pub with_connectivity: bool,
    /// Negative sentinel separating multipart pieces in `elementConn`.
    pub polygon_break_value: i32,
    /// Origin described by `elementConn.start_index`.
    pub start_index: i32,
    /// Opaque map forwarded to the vector reader (e.g. sub-layer/feature
    /// class selection for drivers that support it). Unused by the
    /// built-in `ShapefileSource`; retained for parity with the source
    /// interface's `driver_kwargs`.
    #[serde(default)]
    pub driver_kwargs: serde_json::Map<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            uid_field: "uid".to_string(),
            allow_multipart: true,
            split_interiors: true,
            node_threshold: None,
            dest_crs: None,
            source_crs: "+proj=longlat +datum=WGS84 +no_defs +type=crs".to_string(),
            with_connectivity: false,
            polygon_break_value: -8,
            start_index: 0,
            driver_kwargs: serde_json::Map::new(),
        }
    }
}

/// Process-level arguments that select the input/output paths, layered on
/// top of [`Config`].
#[derive(Debug, Clone)]
pub struct JobArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Config,
}
