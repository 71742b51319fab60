//! Process interface: a single command accepting an input path, output
//! path, UID field name, and flags for the C2/C3 splitters, the multipart
//! policy, reprojection, and connectivity mode.

use std::path::PathBuf;

use clap::{Parser, ValueHint};

#[derive(Parser, Debug)]
#[command(name = "catchmesh", version, about, propagate_version = true)]
pub struct Cli {
    /// Input vector dataset (shapefile .shp)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output ESMF Unstructured Mesh file
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Name of the integer property used as the element UID
    #[arg(long, default_value = "uid")]
    pub uid_field: String,

    /// Reject multipart input geometries instead of encoding them with
    /// polygon_break_value separators
    #[arg(long)]
    pub no_multipart: bool,

    /// Skip the interior-hole splitter (C2)
    #[arg(long)]
    pub no_split_interiors: bool,

    /// Split polygons whose vertex count exceeds this threshold (C3)
    #[arg(long)]
    pub node_threshold: Option<usize>,

    /// Reproject every geometry to this PROJ string or WKT before emission
    #[arg(long)]
    pub dest_crs: Option<String>,

    /// Source CRS of the input dataset (only used together with --dest-crs)
    #[arg(long, default_value = "+proj=longlat +datum=WGS84 +no_defs +type=crs")]
    pub source_crs: String,

    /// Compute neighbor connectivity and emit a non-standard faceLinks
    /// variable (single-worker only)
    #[arg(long)]
    pub with_connectivity: bool,

    /// Negative sentinel separating multipart pieces in elementConn
    #[arg(long, default_value_t = -8)]
    pub polygon_break_value: i32,

    /// Origin described by elementConn.start_index
    #[arg(long, default_value_t = 0)]
    pub start_index: i32,

    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn to_config(&self) -> crate::Config {
        crate::Config {
            uid_field: self.uid_field.clone(),
            allow_multipart: !self.no_multipart,
            split_interiors: !self.no_split_interiors,
            node_threshold: self.node_threshold,
            dest_crs: self.dest_crs.clone(),
            source_crs: self.source_crs.clone(),
            with_connectivity: self.with_connectivity,
            polygon_break_value: self.polygon_break_value,
            start_index: self.start_index,
            driver_kwargs: serde_json::Map::new(),
        }
    }
}
