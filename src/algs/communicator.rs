//! Thin façade over the parallel decomposition a mesh or grid lives in.
//!
//! Meshes and grids only ever ask two questions: which partition am I, and how
//! many partitions are there. Data exchange between partitions is the caller's
//! business, so the trait stays that small.

use std::ops::Range;

/// Partition identity of the current process (minimal by design).
pub trait Communicator: Send + Sync + 'static {
    /// Rank of the current partition, in `0..size()`.
    fn rank(&self) -> usize;
    /// Number of cooperating partitions.
    fn size(&self) -> usize;

    /// True when this is the only partition.
    fn is_serial(&self) -> bool {
        self.size() == 1
    }
}

/// Serial comm: rank 0 of 1.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
}

/// Fixed rank/size pair, for driving one partition of a multi-partition run
/// from a single process (tests, offline decomposition).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalComm {
    rank: usize,
    size: usize,
}

impl LocalComm {
    /// Returns `None` unless `rank < size`.
    pub fn new(rank: usize, size: usize) -> Option<Self> {
        (rank < size).then_some(Self { rank, size })
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
}

/// Contiguous block of `0..extent` owned by `rank` out of `size` parts.
///
/// Blocks differ in length by at most one; the leading ranks take the
/// remainder.
pub fn block_range(extent: usize, rank: usize, size: usize) -> Range<usize> {
    if size == 0 {
        return 0..0;
    }
    let base = extent / size;
    let rem = extent % size;
    let start = rank * base + rank.min(rem);
    let len = base + usize::from(rank < rem);
    start..(start + len).min(extent)
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Communicator;
    use mpi::traits::Communicator as MpiCommunicator;

    /// Rank/size snapshot of an MPI communicator.
    #[derive(Clone, Copy, Debug)]
    pub struct MpiComm {
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        pub fn new<C: MpiCommunicator>(comm: &C) -> Self {
            Self {
                rank: comm.rank() as usize,
                size: comm.size() as usize,
            }
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
