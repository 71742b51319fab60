//! SPMD execution context. Rank, size, and the collective
//! operations are threaded explicitly through a `Runtime` value instead of
//! ambient MPI globals, so single-process and multi-process code share the
//! exact same C4-C7 call sites.

use crate::error::Result;

/// Collective operations the coordinator (C6) and writer (C7) need. Values
/// are always owned (`Vec<T>` / `T`), never borrowed across ranks, matching
/// a message-passing execution model.
pub trait Runtime {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Rank 0 supplies `n` items (one per rank); every rank returns its own.
    fn scatter_usize(&self, items: Option<Vec<usize>>) -> Result<usize>;

    /// Every rank contributes one value; rank 0 receives all of them in rank
    /// order, other ranks receive an empty `Vec`.
    fn gather_usize(&self, value: usize) -> Result<Vec<usize>>;

    /// Rank 0 supplies a value; every rank (including 0) receives it.
    fn bcast_usize(&self, value: Option<usize>) -> Result<usize>;

    fn barrier(&self);
}

/// Trivial single-process stub: the default runtime, supporting the common
/// `W=1` case with no real IPC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleProcessRuntime;

impl Runtime for SingleProcessRuntime {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn scatter_usize(&self, items: Option<Vec<usize>>) -> Result<usize> {
        Ok(items.and_then(|v| v.into_iter().next()).unwrap_or(0))
    }

    fn gather_usize(&self, value: usize) -> Result<Vec<usize>> {
        Ok(vec![value])
    }

    fn bcast_usize(&self, value: Option<usize>) -> Result<usize> {
        Ok(value.unwrap_or(0))
    }

    fn barrier(&self) {}
}

#[cfg(feature = "mpi")]
pub mod mpi_runtime {
    //! Real multi-process `Runtime`, behind the `mpi` Cargo feature. The
    //! `mpi` crate is the standard Rust binding for a system MPI
    //! installation and matches the `Runtime` trait's collective-ops
    //! vocabulary directly.

    use super::Runtime;
    use crate::error::{Error, Result};
    use mpi::topology::{Communicator, SimpleCommunicator};
    use mpi::traits::*;

    pub struct MpiRuntime {
        world: SimpleCommunicator,
    }

    impl MpiRuntime {
        pub fn initialize() -> Self {
            let universe = mpi::initialize().expect("MPI_Init failed");
            // Leak the universe: its drop calls MPI_Finalize, which must run
            // exactly once at process exit, after every Runtime use.
            let world = universe.world();
            std::mem::forget(universe);
            MpiRuntime { world }
        }
    }

    impl Runtime for MpiRuntime {
        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn scatter_usize(&self, items: Option<Vec<usize>>) -> Result<usize> {
            let root = self.world.process_at_rank(0);
            let mut recv: u64 = 0;
            if self.rank() == 0 {
                let items = items.ok_or_else(|| {
                    Error::Writer("root rank must supply scatter items".to_string())
                })?;
                let buf: Vec<u64> = items.into_iter().map(|v| v as u64).collect();
                root.scatter_into_root(&buf, &mut recv);
            } else {
                root.scatter_into(&mut recv);
            }
            Ok(recv as usize)
        }

        fn gather_usize(&self, value: usize) -> Result<Vec<usize>> {
            let root = self.world.process_at_rank(0);
            let v = value as u64;
            if self.rank() == 0 {
                let mut buf = vec![0u64; self.size()];
                root.gather_into_root(&v, &mut buf);
                Ok(buf.into_iter().map(|x| x as usize).collect())
            } else {
                root.gather_into(&v);
                Ok(Vec::new())
            }
        }

        fn bcast_usize(&self, value: Option<usize>) -> Result<usize> {
            let root = self.world.process_at_rank(0);
            let mut v = value.unwrap_or(0) as u64;
            root.broadcast_into(&mut v);
            Ok(v as usize)
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi")]
pub use mpi_runtime::MpiRuntime;
