//! ESMF writer (C7): the two-phase write protocol over a
//! [`MeshSink`]. Phase A (rank 0 only) creates dimensions, variables, and
//! global attributes; Phase B has ranks append their partition to the
//! container in rank order, separated by barriers.

use ndarray::Array2;

use crate::assembler::Finalized;
use crate::config::Config;
use crate::error::Result;
use crate::runtime::Runtime;
use crate::sink::{AttrValue, Dimensions, MeshSink, VarType, VariableSpec};

/// One rank's contribution: its finalized local arrays plus the three
/// negotiated starting offsets (node, element, connection).
pub struct RankContribution<'a> {
    pub local: &'a Finalized,
    pub idx_start: usize,
    pub element_start: usize,
    pub conn_start: usize,
    /// Starting offset into `linkCount`, only meaningful when connectivity
    /// mode is on.
    pub link_start: Option<usize>,
}

/// Drives the full two-phase protocol for one rank's [`MeshSink`] handle.
/// Call this once per rank; ranks sharing a single process (the common
/// `W=1` case) can call it in a loop against the same sink.
pub fn write_rank<M: MeshSink>(
    sink: &mut M,
    runtime: &dyn Runtime,
    global: &Dimensions,
    config: &Config,
    contribution: &RankContribution,
    face_links: Option<&[Vec<i32>]>,
) -> Result<()> {
    if runtime.rank() == 0 {
        sink.create(global)?;
        create_variables(sink, config, face_links.is_some())?;
        sink.set_global_attr("gridType", AttrValue::Str("unstructured".to_string()))?;
        sink.set_global_attr("version", AttrValue::Str("0.9".to_string()))?;
        sink.set_global_attr("coordDim", AttrValue::Str("longitude latitude".to_string()))?;
    }

    for r in 0..runtime.size() {
        if runtime.rank() == r {
            if r > 0 {
                sink.reopen_append()?;
            }
            write_local_slab(sink, config, contribution, face_links)?;
        }
        runtime.barrier();
    }

    if runtime.rank() == runtime.size() - 1 {
        sink.close()?;
    }
    Ok(())
}

fn create_variables<M: MeshSink>(sink: &mut M, config: &Config, with_connectivity: bool) -> Result<()> {
    sink.create_variable(&VariableSpec {
        name: "nodeCoords".to_string(),
        dtype: VarType::F64,
        dims: vec!["nodeCount", "coordDim"],
        attrs: vec![("units".to_string(), AttrValue::Str("degrees".to_string()))],
    })?;

    let mut conn_attrs = vec![
        ("long_name".to_string(), AttrValue::Str("Node indices that define each element.".to_string())),
        ("start_index".to_string(), AttrValue::I32(config.start_index)),
    ];
    conn_attrs.push((
        "polygon_break_value".to_string(),
        AttrValue::I32(config.polygon_break_value),
    ));
    sink.create_variable(&VariableSpec {
        name: "elementConn".to_string(),
        dtype: VarType::I32,
        dims: vec!["connectionCount"],
        attrs: conn_attrs,
    })?;

    sink.create_variable(&VariableSpec {
        name: "numElementConn".to_string(),
        dtype: VarType::I32,
        dims: vec!["elementCount"],
        attrs: vec![(
            "long_name".to_string(),
            AttrValue::Str("Number of nodes per element.".to_string()),
        )],
    })?;

    sink.create_variable(&VariableSpec {
        name: "centerCoords".to_string(),
        dtype: VarType::F64,
        dims: vec!["elementCount", "coordDim"],
        attrs: vec![("units".to_string(), AttrValue::Str("degrees".to_string()))],
    })?;

    sink.create_variable(&VariableSpec {
        name: "elementArea".to_string(),
        dtype: VarType::F64,
        dims: vec!["elementCount"],
        attrs: vec![
            ("units".to_string(), AttrValue::Str("degrees".to_string())),
            ("long_name".to_string(), AttrValue::Str("Element area.".to_string())),
        ],
    })?;

    sink.create_variable(&VariableSpec {
        name: config.uid_field.clone(),
        dtype: VarType::I32,
        dims: vec!["elementCount"],
        attrs: vec![(
            "long_name".to_string(),
            AttrValue::Str("Element unique identifier.".to_string()),
        )],
    })?;

    if with_connectivity {
        sink.create_variable(&VariableSpec {
            name: "faceLinks".to_string(),
            dtype: VarType::I32,
            dims: vec!["linkCount"],
            attrs: vec![(
                "long_name".to_string(),
                AttrValue::Str("Neighbor face positions, -1 sentinel when none.".to_string()),
            )],
        })?;
    }

    Ok(())
}

fn write_local_slab<M: MeshSink>(
    sink: &mut M,
    config: &Config,
    contribution: &RankContribution,
    face_links: Option<&[Vec<i32>]>,
) -> Result<()> {
    let local = contribution.local;

    sink.write_slab_f64("nodeCoords", contribution.idx_start, &local.coordinates)?;

    let flat_conn: Vec<i32> = local.face_nodes.iter().flat_map(|f| f.iter().copied()).collect();
    sink.write_slab_i32("elementConn", contribution.conn_start, &flat_conn)?;

    let num_conn: Vec<i32> = local.face_nodes.iter().map(|f| f.len() as i32).collect();
    sink.write_slab_i32("numElementConn", contribution.element_start, &num_conn)?;

    sink.write_slab_f64("centerCoords", contribution.element_start, &local.face_center)?;

    let area_col = Array2::from_shape_vec((local.face_area.len(), 1), local.face_area.clone())
        .expect("face_area length matches n_faces");
    sink.write_slab_f64("elementArea", contribution.element_start, &area_col)?;

    sink.write_slab_i32(&config.uid_field, contribution.element_start, &local.face_uid)?;

    if let (Some(links), Some(link_start)) = (face_links, contribution.link_start) {
        let flat_links: Vec<i32> = links.iter().flat_map(|l| l.iter().copied()).collect();
        sink.write_slab_i32("faceLinks", link_start, &flat_links)?;
    }

    Ok(())
}
