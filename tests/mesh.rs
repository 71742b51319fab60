//! Crate-level integration tests driving the full `process()` pipeline --
//! geometry manager, assembler, partition coordinator, and writer together
//! -- against [`MemSink`], rather than the narrower per-component unit
//! tests in `src/`. Covers parallel equivalence (same mesh from W=1 and
//! W=4) and sentinel encoding of multipart faces through the real writer.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use catchmesh::error::Result;
use catchmesh::runtime::Runtime;
use catchmesh::sink::{MemSink, MeshSink};
use catchmesh::source::{InMemorySource, Record};
use catchmesh::Config;
use geo::{Coord, LineString, MultiPolygon, Polygon};

fn triangle(ox: f64, oy: f64) -> catchmesh::error::Result<geo::Polygon<f64>> {
    Ok(Polygon::new(
        LineString(vec![
            Coord { x: ox, y: oy },
            Coord { x: ox + 1.0, y: oy },
            Coord { x: ox, y: oy + 1.0 },
            Coord { x: ox, y: oy },
        ]),
        vec![],
    ))
}

fn twelve_triangles() -> Vec<Record> {
    (0..12)
        .map(|i| {
            let ox = (i as f64) * 10.0;
            Record { uid: i as i64, geom: triangle(ox, 0.0).unwrap().into() }
        })
        .collect()
}

/// A `MeshSink` shared across threads, each standing in for one rank's
/// process.
#[derive(Clone)]
struct SharedMemSink(Arc<Mutex<MemSink>>);

impl SharedMemSink {
    fn new() -> Self {
        SharedMemSink(Arc::new(Mutex::new(MemSink::new())))
    }
}

impl MeshSink for SharedMemSink {
    fn create(&mut self, dims: &catchmesh::sink::Dimensions) -> Result<()> {
        self.0.lock().unwrap().create(dims)
    }
    fn create_variable(&mut self, spec: &catchmesh::sink::VariableSpec) -> Result<()> {
        self.0.lock().unwrap().create_variable(spec)
    }
    fn set_global_attr(&mut self, name: &str, value: catchmesh::sink::AttrValue) -> Result<()> {
        self.0.lock().unwrap().set_global_attr(name, value)
    }
    fn write_slab_f64(&mut self, var: &str, start: usize, data: &ndarray::Array2<f64>) -> Result<()> {
        self.0.lock().unwrap().write_slab_f64(var, start, data)
    }
    fn write_slab_i32(&mut self, var: &str, start: usize, data: &[i32]) -> Result<()> {
        self.0.lock().unwrap().write_slab_i32(var, start, data)
    }
    fn reopen_append(&mut self) -> Result<()> {
        self.0.lock().unwrap().reopen_append()
    }
    fn close(&mut self) -> Result<()> {
        self.0.lock().unwrap().close()
    }
}

/// Thread-backed `Runtime` for `W>1` tests: a star topology with rank 0 as
/// the hub, exactly matching the single-process and `MpiRuntime`
/// implementations' collective-ops contract, so `process()` runs unmodified
/// over real concurrent ranks without an actual MPI install.
struct ThreadRuntime {
    rank: usize,
    size: usize,
    barrier: Arc<Barrier>,
    gather_rx: Vec<Receiver<usize>>,
    gather_tx: Option<SyncSender<usize>>,
    scatter_tx: Vec<SyncSender<usize>>,
    scatter_rx: Option<Receiver<usize>>,
    bcast_tx: Vec<SyncSender<usize>>,
    bcast_rx: Option<Receiver<usize>>,
}

fn build_thread_runtimes(size: usize) -> Vec<ThreadRuntime> {
    let barrier = Arc::new(Barrier::new(size));

    // One rendezvous channel per non-zero rank and per collective op, with
    // rank 0 holding the hub end and rank `r` holding the spoke end.
    let mut gather_tx_by_rank = Vec::new(); // held by rank r (sends to rank 0)
    let mut gather_rx_by_rank0 = Vec::new(); // held by rank 0 (receives from rank r)
    let mut scatter_tx_by_rank0 = Vec::new(); // held by rank 0 (sends to rank r)
    let mut scatter_rx_by_rank = Vec::new(); // held by rank r
    let mut bcast_tx_by_rank0 = Vec::new();
    let mut bcast_rx_by_rank = Vec::new();

    for _ in 1..size {
        let (tx, rx) = sync_channel(0);
        gather_tx_by_rank.push(tx);
        gather_rx_by_rank0.push(rx);

        let (tx, rx) = sync_channel(0);
        scatter_tx_by_rank0.push(tx);
        scatter_rx_by_rank.push(rx);

        let (tx, rx) = sync_channel(0);
        bcast_tx_by_rank0.push(tx);
        bcast_rx_by_rank.push(rx);
    }

    let mut runtimes = Vec::with_capacity(size);
    runtimes.push(ThreadRuntime {
        rank: 0,
        size,
        barrier: barrier.clone(),
        gather_rx: gather_rx_by_rank0,
        gather_tx: None,
        scatter_tx: scatter_tx_by_rank0,
        scatter_rx: None,
        bcast_tx: bcast_tx_by_rank0,
        bcast_rx: None,
    });

    for (rank, (gather_tx, (scatter_rx, bcast_rx))) in (1..size).zip(
        gather_tx_by_rank.into_iter().zip(scatter_rx_by_rank.into_iter().zip(bcast_rx_by_rank)),
    ) {
        runtimes.push(ThreadRuntime {
            rank,
            size,
            barrier: barrier.clone(),
            gather_rx: Vec::new(),
            gather_tx: Some(gather_tx),
            scatter_tx: Vec::new(),
            scatter_rx: Some(scatter_rx),
            bcast_tx: Vec::new(),
            bcast_rx: Some(bcast_rx),
        });
    }
    runtimes
}

impl Runtime for ThreadRuntime {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn scatter_usize(&self, items: Option<Vec<usize>>) -> Result<usize> {
        if self.rank == 0 {
            let items = items.expect("rank 0 must supply scatter items");
            for (tx, &v) in self.scatter_tx.iter().zip(items[1..].iter()) {
                tx.send(v).unwrap();
            }
            Ok(items[0])
        } else {
            Ok(self.scatter_rx.as_ref().unwrap().recv().unwrap())
        }
    }

    fn gather_usize(&self, value: usize) -> Result<Vec<usize>> {
        if self.rank == 0 {
            let mut out = vec![0usize; self.size];
            out[0] = value;
            for (i, rx) in self.gather_rx.iter().enumerate() {
                out[i + 1] = rx.recv().unwrap();
            }
            Ok(out)
        } else {
            self.gather_tx.as_ref().unwrap().send(value).unwrap();
            Ok(Vec::new())
        }
    }

    fn bcast_usize(&self, value: Option<usize>) -> Result<usize> {
        if self.rank == 0 {
            let v = value.expect("rank 0 must supply bcast value");
            for tx in &self.bcast_tx {
                tx.send(v).unwrap();
            }
            Ok(v)
        } else {
            Ok(self.bcast_rx.as_ref().unwrap().recv().unwrap())
        }
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}

fn run_single_process(records: Vec<Record>, config: &Config) -> MemSink {
    let source = InMemorySource::new(records);
    let runtime = catchmesh::runtime::SingleProcessRuntime;
    let mut sink = MemSink::new();
    catchmesh::process(&source, config, &runtime, &mut sink).unwrap();
    sink
}

fn run_four_ranks(records: Vec<Record>, config: &Config) -> MemSink {
    let shared = SharedMemSink::new();
    let runtimes = build_thread_runtimes(4);

    let handles: Vec<_> = runtimes
        .into_iter()
        .map(|runtime| {
            let records = records.clone();
            let config = config.clone();
            let mut sink = shared.clone();
            thread::spawn(move || {
                let source = InMemorySource::new(records);
                catchmesh::process(&source, &config, &runtime, &mut sink).unwrap();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    Arc::try_unwrap(shared.0).unwrap().into_inner().unwrap()
}

/// Per-face node coordinate lists, rounded to damp float noise, keyed by
/// face position (not UID -- the two runs are expected to emit faces in the
/// same order, since partitioning never reorders records).
fn per_face_coords(sink: &MemSink, uid_field: &str) -> Vec<(i64, i32, Vec<(i64, i64)>)> {
    let conn = sink.i32_var("elementConn");
    let num_conn = sink.i32_var("numElementConn");
    let coords = sink.f64_var("nodeCoords");
    let uids = sink.i32_var(uid_field);

    let mut out = Vec::new();
    let mut cursor = 0usize;
    for (face, &n) in num_conn.iter().enumerate() {
        let mut pts: Vec<(i64, i64)> = conn[cursor..cursor + n as usize]
            .iter()
            .filter(|&&idx| idx >= 0)
            .map(|&idx| {
                let row = idx as usize;
                ((coords[[row, 0]] * 1e6).round() as i64, (coords[[row, 1]] * 1e6).round() as i64)
            })
            .collect();
        pts.sort_unstable();
        out.push((uids[face] as i64, n, pts));
        cursor += n as usize;
    }
    out
}

/// Scenario S5: 12 polygons run at `W=1` and `W=4` must agree on
/// `numElementConn`, per-face UID, and the (unordered) set of node
/// coordinates making up each face.
#[test]
fn s5_parallel_equivalence() {
    let config = Config::default();
    let records = twelve_triangles();

    let w1 = run_single_process(records.clone(), &config);
    let w4 = run_four_ranks(records, &config);

    assert_eq!(*w1.dims(), *w4.dims());

    let a = per_face_coords(&w1, &config.uid_field);
    let b = per_face_coords(&w4, &config.uid_field);
    assert_eq!(a, b);
}

/// Scenario S6 (through the full writer, not just the assembler): a single
/// MultiPolygon face made of two triangles must encode as
/// `[n0,n1,n2,-8,n3,n4,n5]` in the final `elementConn`.
#[test]
fn s6_sentinel_encoding_through_writer() {
    let config = Config::default();
    let mp = MultiPolygon(vec![triangle(0.0, 0.0).unwrap(), triangle(10.0, 10.0).unwrap()]);
    let records = vec![Record { uid: 1, geom: mp.into() }];

    let sink = run_single_process(records, &config);
    assert_eq!(sink.i32_var("numElementConn"), &[7]);
    assert_eq!(sink.i32_var("elementConn"), &[0, 1, 2, -8, 3, 4, 5]);
    assert_eq!(sink.i32_var(&config.uid_field), &[1]);
}
