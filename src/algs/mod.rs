//! Partition information services.

pub mod communicator;

pub use communicator::{Communicator, LocalComm, NoComm, block_range};
