use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{Error, Result};

use super::{AttrValue, Dimensions, MeshSink, VarType, VariableSpec};

enum Storage {
    F64(Array2<f64>),
    I32(Vec<i32>),
}

struct VarState {
    storage: Storage,
}

/// In-memory `HashMap`-backed [`MeshSink`] mock so unit/integration tests
/// never need libnetcdf installed. Variables are pre-sized from their
/// declared dimensions at `create_variable` time; slab writes overwrite
/// rows/elements in place.
#[derive(Default)]
pub struct MemSink {
    dims: Option<Dimensions>,
    vars: HashMap<String, VarState>,
    global_attrs: HashMap<String, AttrValue>,
}

impl MemSink {
    pub fn new() -> Self {
        MemSink::default()
    }

    pub fn dims(&self) -> &Dimensions {
        self.dims.as_ref().expect("create() not called")
    }

    pub fn f64_var(&self, name: &str) -> &Array2<f64> {
        match &self.vars.get(name).expect("unknown variable").storage {
            Storage::F64(a) => a,
            Storage::I32(_) => panic!("variable '{name}' is not f64"),
        }
    }

    pub fn i32_var(&self, name: &str) -> &[i32] {
        match &self.vars.get(name).expect("unknown variable").storage {
            Storage::I32(v) => v,
            Storage::F64(_) => panic!("variable '{name}' is not i32"),
        }
    }

    pub fn global_attr(&self, name: &str) -> Option<&AttrValue> {
        self.global_attrs.get(name)
    }

    fn dim_len(&self, dim: &str) -> Result<usize> {
        let dims = self.dims.as_ref().ok_or_else(|| Error::Writer("create() not called".to_string()))?;
        Ok(match dim {
            "nodeCount" => dims.node_count,
            "elementCount" => dims.element_count,
            "coordDim" => dims.coord_dim,
            "connectionCount" => dims.connection_count,
            "linkCount" => dims.link_count.unwrap_or(0),
            other => return Err(Error::Writer(format!("unknown dimension '{other}'"))),
        })
    }
}

impl MeshSink for MemSink {
    fn create(&mut self, dims: &Dimensions) -> Result<()> {
        self.dims = Some(*dims);
        Ok(())
    }

    fn create_variable(&mut self, spec: &VariableSpec) -> Result<()> {
        let lead = self.dim_len(spec.dims[0])?;
        let storage = match spec.dtype {
            VarType::F64 => {
                let trailing = if spec.dims.len() > 1 { self.dim_len(spec.dims[1])? } else { 1 };
                Storage::F64(Array2::zeros((lead, trailing)))
            }
            VarType::I32 => Storage::I32(vec![0; lead]),
        };
        self.vars.insert(spec.name.clone(), VarState { storage });
        Ok(())
    }

    fn set_global_attr(&mut self, name: &str, value: AttrValue) -> Result<()> {
        self.global_attrs.insert(name.to_string(), value);
        Ok(())
    }

    fn write_slab_f64(&mut self, var: &str, start: usize, data: &Array2<f64>) -> Result<()> {
        let state = self
            .vars
            .get_mut(var)
            .ok_or_else(|| Error::Writer(format!("unknown variable '{var}'")))?;
        let Storage::F64(arr) = &mut state.storage else {
            return Err(Error::Writer(format!("variable '{var}' is not f64")));
        };
        for (i, row) in data.rows().into_iter().enumerate() {
            arr.row_mut(start + i).assign(&row);
        }
        Ok(())
    }

    fn write_slab_i32(&mut self, var: &str, start: usize, data: &[i32]) -> Result<()> {
        let state = self
            .vars
            .get_mut(var)
            .ok_or_else(|| Error::Writer(format!("unknown variable '{var}'")))?;
        let Storage::I32(vec) = &mut state.storage else {
            return Err(Error::Writer(format!("variable '{var}' is not i32")));
        };
        vec[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn reopen_append(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
