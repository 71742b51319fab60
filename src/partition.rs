//! Partition coordinator (C6): allocates input-record slices to workers and
//! negotiates per-rank starting node indices via an exclusive-prefix-sum
//! protocol.

use crate::error::{Error, Result};
use crate::runtime::Runtime;

/// Half-open `[start, stop)` range of input-record indices assigned to one
/// worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub stop: usize,
}

impl Section {
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }
}

/// Contiguous, nearly-equal partition of `[0, n)` into `w` sections: rank `r`
/// receives `[floor(r*n/w), floor((r+1)*n/w))`.
pub fn create_sections(n: usize, w: usize) -> Result<Vec<Section>> {
    if n < w {
        return Err(Error::TooFewGeometries { records: n, workers: w });
    }
    Ok((0..w)
        .map(|r| Section { start: n * r / w, stop: n * (r + 1) / w })
        .collect())
}

/// Result of negotiating one rank-local count across the communicator:
/// this rank's exclusive-prefix-sum offset, and the grand total across all
/// ranks (needed by rank 0 to size dimensions in Phase A).
#[derive(Debug, Clone, Copy)]
pub struct Negotiated {
    pub start: usize,
    pub total: usize,
}

/// Exclusive prefix sum across ranks over one rank-local count (used for
/// node indices, element indices, and connection-array offsets alike). Rank
/// 0 computes the full vector of starts via `gather`, `scatter`s them back
/// out, and `bcast`s the grand total. No other communication is needed to
/// assemble global coordinates from per-rank local ones.
pub fn negotiate(runtime: &dyn Runtime, local_count: usize) -> Result<Negotiated> {
    let gathered = runtime.gather_usize(local_count)?;

    let (starts, total) = if runtime.rank() == 0 {
        let mut starts = Vec::with_capacity(gathered.len());
        let mut running = 0usize;
        for n in gathered {
            starts.push(running);
            running += n;
        }
        (Some(starts), Some(running))
    } else {
        (None, None)
    };

    let start = runtime.scatter_usize(starts)?;
    let total = runtime.bcast_usize(total)?;
    Ok(Negotiated { start, total })
}
