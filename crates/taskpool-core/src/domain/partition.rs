//! Partitions: the four fixed task pools and the id -> partition table.
//!
//! Routing is derived from the task id alone. Every component that needs to
//! know "which pool owns task N" goes through [`Partition::for_task`], so the
//! loader, the completion path and the assignment path can never disagree.

use std::fmt;
use std::ops::RangeInclusive;

use super::TaskId;

/// One of the four task pools.
///
/// `Ord` follows declaration order, which is also the order in which
/// assignment visits the pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    A,
    B,
    C,
    D,
}

impl Partition {
    /// All partitions in assignment order.
    pub const ALL: [Partition; 4] = [Partition::A, Partition::B, Partition::C, Partition::D];

    /// Task ids owned by this partition.
    pub const fn range(self) -> RangeInclusive<u32> {
        match self {
            Partition::A => 1..=5,
            Partition::B => 6..=10,
            Partition::C => 11..=15,
            Partition::D => 16..=20,
        }
    }

    /// Route a task id to its owning partition.
    ///
    /// Returns `None` for ids outside every known range.
    pub fn for_task(task_id: TaskId) -> Option<Partition> {
        Self::ALL
            .into_iter()
            .find(|partition| partition.range().contains(&task_id.get()))
    }

    pub fn owns(self, task_id: TaskId) -> bool {
        self.range().contains(&task_id.get())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Partition::A => "A",
            Partition::B => "B",
            Partition::C => "C",
            Partition::D => "D",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
