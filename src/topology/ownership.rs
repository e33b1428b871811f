//! Ownership metadata for mesh nodes.
//!
//! [`NodeOwnership`] records the owning partition of each local node. A node is
//! a ghost on the current rank iff its owner differs from that rank.

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NodeOwnership {
    owners: Vec<usize>,
}

impl NodeOwnership {
    /// Wrap per-node owner tags, in local node order.
    pub fn from_owners(owners: Vec<usize>) -> Self {
        Self { owners }
    }

    /// Returns the number of tracked nodes.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if no nodes are tracked.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owner tags in local node order.
    pub fn owners(&self) -> &[usize] {
        &self.owners
    }

    /// Retrieve the owning rank for local node `idx`.
    pub fn owner(&self, idx: usize) -> Option<usize> {
        self.owners.get(idx).copied()
    }

    /// Returns true if local node `idx` is owned by `rank`.
    pub fn is_owned_by(&self, idx: usize, rank: usize) -> bool {
        self.owner(idx).is_some_and(|owner| owner == rank)
    }

    /// Iterate over local indices of nodes owned by `rank`.
    pub fn owned_indices(&self, rank: usize) -> impl Iterator<Item = usize> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter_map(move |(idx, &owner)| (owner == rank).then_some(idx))
    }

    /// Iterate over local indices of ghost nodes on `rank`.
    pub fn ghost_indices(&self, rank: usize) -> impl Iterator<Item = usize> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter_map(move |(idx, &owner)| (owner != rank).then_some(idx))
    }

    /// Number of nodes owned by `rank`.
    pub fn owned_count(&self, rank: usize) -> usize {
        self.owned_indices(rank).count()
    }
}
