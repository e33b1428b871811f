//! Data module: node/element tables and coordinate views.

pub mod coordinates;
pub mod element_table;
pub mod node_table;

pub use coordinates::{CoordView, CoordViewMut, CoordinateStore};
pub use element_table::{ElementFields, ElementTable};
pub use node_table::NodeTable;
