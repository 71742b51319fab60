use std::path::PathBuf;

use ndarray::Array2;
use netcdf::{Extents, FileMut};

use crate::error::{Error, Result};

use super::{AttrValue, Dimensions, MeshSink, VarType, VariableSpec};

fn dim_name(d: &str) -> &'static str {
    match d {
        "nodeCount" => "nodeCount",
        "elementCount" => "elementCount",
        "coordDim" => "coordDim",
        "connectionCount" => "connectionCount",
        "linkCount" => "linkCount",
        _ => unreachable!("unknown dimension '{d}'"),
    }
}

/// `netcdf`-crate-backed [`MeshSink`] -- the standard Rust binding for the
/// NetCDF-3/4 C library. Writes to a caller-chosen path verbatim;
/// the temp-file-then-rename wrapping lives one layer up, in
/// [`crate::io::PendingPath`], since it's the *job's* output that needs
/// atomicity, not any one append round.
pub struct NetcdfSink {
    path: PathBuf,
    file: Option<FileMut>,
}

impl NetcdfSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        NetcdfSink { path: path.into(), file: None }
    }

    fn file_mut(&mut self) -> Result<&mut FileMut> {
        self.file.as_mut().ok_or_else(|| Error::Writer("NetcdfSink not open".to_string()))
    }
}

impl MeshSink for NetcdfSink {
    fn create(&mut self, dims: &Dimensions) -> Result<()> {
        let mut file = netcdf::create(&self.path)
            .map_err(|e| Error::Writer(format!("create {}: {e}", self.path.display())))?;

        file.add_dimension("nodeCount", dims.node_count)
            .map_err(|e| Error::Writer(e.to_string()))?;
        file.add_dimension("elementCount", dims.element_count)
            .map_err(|e| Error::Writer(e.to_string()))?;
        file.add_dimension("coordDim", dims.coord_dim)
            .map_err(|e| Error::Writer(e.to_string()))?;
        file.add_dimension("connectionCount", dims.connection_count)
            .map_err(|e| Error::Writer(e.to_string()))?;
        if let Some(link_count) = dims.link_count {
            file.add_dimension("linkCount", link_count).map_err(|e| Error::Writer(e.to_string()))?;
        }

        self.file = Some(file);
        Ok(())
    }

    fn create_variable(&mut self, spec: &VariableSpec) -> Result<()> {
        let dims: Vec<&str> = spec.dims.iter().map(|d| dim_name(d)).collect();
        let file = self.file_mut()?;

        match spec.dtype {
            VarType::F64 => {
                let mut var = file
                    .add_variable::<f64>(&spec.name, &dims)
                    .map_err(|e| Error::Writer(e.to_string()))?;
                for (name, value) in &spec.attrs {
                    set_var_attr(&mut var, name, value)?;
                }
            }
            VarType::I32 => {
                let mut var = file
                    .add_variable::<i32>(&spec.name, &dims)
                    .map_err(|e| Error::Writer(e.to_string()))?;
                for (name, value) in &spec.attrs {
                    set_var_attr(&mut var, name, value)?;
                }
            }
        }
        Ok(())
    }

    fn set_global_attr(&mut self, name: &str, value: AttrValue) -> Result<()> {
        let file = self.file_mut()?;
        match value {
            AttrValue::Str(s) => file.add_attribute(name, s.as_str()),
            AttrValue::I32(v) => file.add_attribute(name, v),
            AttrValue::F64(v) => file.add_attribute(name, v),
        }
        .map_err(|e| Error::Writer(e.to_string()))
    }

    fn write_slab_f64(&mut self, var: &str, start: usize, data: &Array2<f64>) -> Result<()> {
        let (rows, cols) = data.dim();
        let file = self.file_mut()?;
        let mut variable = file
            .variable_mut(var)
            .ok_or_else(|| Error::Writer(format!("unknown variable '{var}'")))?;
        let extents: Extents = (start..start + rows, 0..cols).try_into().map_err(|e| {
            Error::Writer(format!("building extents for '{var}': {e}"))
        })?;
        variable
            .put_values(data.as_slice().expect("contiguous slab"), extents)
            .map_err(|e| Error::Writer(format!("writing '{var}': {e}")))
    }

    fn write_slab_i32(&mut self, var: &str, start: usize, data: &[i32]) -> Result<()> {
        let file = self.file_mut()?;
        let mut variable = file
            .variable_mut(var)
            .ok_or_else(|| Error::Writer(format!("unknown variable '{var}'")))?;
        let extents: Extents = (start..start + data.len()).try_into().map_err(|e| {
            Error::Writer(format!("building extents for '{var}': {e}"))
        })?;
        variable
            .put_values(data, extents)
            .map_err(|e| Error::Writer(format!("writing '{var}': {e}")))
    }

    fn reopen_append(&mut self) -> Result<()> {
        self.file = Some(
            netcdf::append(&self.path)
                .map_err(|e| Error::Writer(format!("reopen {}: {e}", self.path.display())))?,
        );
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.file = None; // netcdf syncs and closes on drop
        Ok(())
    }
}

fn set_var_attr(
    var: &mut netcdf::VariableMut,
    name: &str,
    value: &AttrValue,
) -> Result<()> {
    match value {
        AttrValue::Str(s) => var.add_attribute(name, s.as_str()),
        AttrValue::I32(v) => var.add_attribute(name, *v),
        AttrValue::F64(v) => var.add_attribute(name, *v),
    }
    .map_err(|e| Error::Writer(e.to_string()))
}

