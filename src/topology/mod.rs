//! Element topology tags, node ownership and table validation.
//!
//! - [`element_type`]: element kinds, their dimension and node count
//! - [`ownership`]: per-node owning partition
//! - [`validation`]: id uniqueness and connectivity resolution shared by the
//!   in-memory and from-file build paths

pub mod element_type;
pub mod ownership;
pub mod validation;

pub use element_type::{ElementType, MeshLocation};
