use crate::error::Result;

use super::{Record, VectorSource};

/// Wraps a pre-built `Vec<Record>` directly; mainly used by tests and by
/// callers assembling records from a non-file source.
pub struct InMemorySource {
    records: Vec<Record>,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        InMemorySource { records }
    }
}

impl VectorSource for InMemorySource {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }
}
