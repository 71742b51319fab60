//! Container writer: the narrow NetCDF-3/4-shaped trait C7 writes through.
//! Two implementations exist:
//! [`NetcdfSink`](netcdf_sink::NetcdfSink) (feature-gated, real output) and
//! [`MemSink`](mem_sink::MemSink) (in-memory mock for tests).

mod mem_sink;
#[cfg(feature = "netcdf")]
mod netcdf_sink;

pub use mem_sink::MemSink;
#[cfg(feature = "netcdf")]
pub use netcdf_sink::NetcdfSink;

use ndarray::Array2;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub node_count: usize,
    pub element_count: usize,
    pub coord_dim: usize,
    pub connection_count: usize,
    /// Total `faceLinks` ragged length, only present when neighbor
    /// connectivity mode is on.
    pub link_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    F64,
    I32,
}

#[derive(Debug, Clone)]
pub enum AttrValue {
    Str(String),
    I32(i32),
    F64(f64),
}

/// One named dimension a variable is defined over, in order.
pub type DimName = &'static str;

#[derive(Debug, Clone)]
pub struct VariableSpec {
    pub name: String,
    pub dtype: VarType,
    pub dims: Vec<DimName>,
    pub attrs: Vec<(String, AttrValue)>,
}

/// NetCDF-3/4 style container writer: create dimensions and variables up
/// front (Phase A), then slab-assign data along the leading dimension across
/// one or more append-opened passes (Phase B).
pub trait MeshSink {
    fn create(&mut self, dims: &Dimensions) -> Result<()>;
    fn create_variable(&mut self, spec: &VariableSpec) -> Result<()>;
    fn set_global_attr(&mut self, name: &str, value: AttrValue) -> Result<()>;

    /// Write `data` (rows = leading-dimension slab) into `var` starting at
    /// row `start`.
    fn write_slab_f64(&mut self, var: &str, start: usize, data: &Array2<f64>) -> Result<()>;

    /// Write `data` into a 1D variable `var` starting at element `start`.
    fn write_slab_i32(&mut self, var: &str, start: usize, data: &[i32]) -> Result<()>;

    /// Reopen the container in append mode for a later Phase B round
    /// (a later rank, or the same rank resuming after a barrier).
    fn reopen_append(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}
