//! Domain model (ids, tasks, partitions).
//!
//! Nothing in here touches I/O or locks; the store and app layers build on
//! these types.

pub mod ids;
pub mod partition;
pub mod task;

pub use ids::{ClientId, TaskId};
pub use partition::Partition;
pub use task::{Task, TaskStatus};
