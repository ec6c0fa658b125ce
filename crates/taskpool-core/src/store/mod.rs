//! Store module: per-partition task lists and their locking discipline.

mod partition;

pub use partition::{PartitionGuard, PartitionStore};
