//! Converts a collection of 2D polygonal catchment geometries into an ESMF
//! Unstructured Mesh v0.9 file: geometric normalization (C1-C3), topology
//! assembly (C4-C5), and partitioned, deterministic serialization (C6-C7).

pub mod assembler;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod geom;
pub mod interior_split;
pub mod io;
pub mod manager;
pub mod node_split;
pub mod partition;
pub mod reproject;
pub mod runtime;
pub mod sink;
pub mod source;
pub mod writer;

pub use config::Config;
pub use error::{Error, Result};

use assembler::Assembler;
use connectivity::face_links;
use manager::GeometryManager;
use partition::{create_sections, negotiate};
use runtime::Runtime;
use sink::{Dimensions, MeshSink};
use source::VectorSource;
use writer::{write_rank, RankContribution};

/// Runs the full C4-C7 pipeline for this rank: pull this rank's section from
/// `source`, assemble it, negotiate global offsets with the other ranks via
/// `runtime`, and write the rank's contribution into `sink`. Calling this
/// once per rank (in a real MPI job, once per process; in the `W=1` default,
/// once total) produces the complete ESMF file.
pub fn process<S: VectorSource, M: MeshSink>(
    source: &S,
    config: &Config,
    runtime: &dyn Runtime,
    sink: &mut M,
) -> Result<()> {
    if config.with_connectivity && runtime.size() > 1 {
        return Err(Error::ConnectivityParallelUnsupported { workers: runtime.size() });
    }

    let manager = GeometryManager::new(SourceRef(source), config.clone())?;
    let sections = create_sections(manager.len(), runtime.size())?;
    let section = sections[runtime.rank()];

    let records = manager
        .iter_records(Some(section))?
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let mut assembler = Assembler::new();
    for record in &records {
        assembler.process_record(record)?;
    }

    let nodes = negotiate(runtime, assembler.n_coords())?;
    let elements = negotiate(runtime, assembler.n_faces())?;
    let connections = negotiate(runtime, assembler.connection_count())?;

    let (links, link_negotiated) = if config.with_connectivity {
        let (all_records, index) = manager.get_spatial_index()?;
        let geoms: Vec<geom::Geom> = all_records.iter().map(|r| r.geom.clone()).collect();
        let links = face_links(&geoms, &index);
        let local_link_len: usize = links.iter().map(|l| l.len()).sum();
        let negotiated = negotiate(runtime, local_link_len)?;
        (Some(links), Some(negotiated))
    } else {
        (None, None)
    };

    let finalized = assembler.finalize(nodes.start, config.polygon_break_value);

    let dims = Dimensions {
        node_count: nodes.total,
        element_count: elements.total,
        coord_dim: 2,
        connection_count: connections.total,
        link_count: link_negotiated.as_ref().map(|n| n.total),
    };

    let contribution = RankContribution {
        local: &finalized,
        idx_start: nodes.start,
        element_start: elements.start,
        conn_start: connections.start,
        link_start: link_negotiated.as_ref().map(|n| n.start),
    };

    write_rank(sink, runtime, &dims, config, &contribution, links.as_deref())
}

/// Thin `&S` wrapper so `process` can build a [`GeometryManager`] without
/// taking ownership of the caller's source.
struct SourceRef<'a, S>(&'a S);

impl<S: VectorSource> VectorSource for SourceRef<'_, S> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn records(&self) -> Result<Vec<source::Record>> {
        self.0.records()
    }
}
