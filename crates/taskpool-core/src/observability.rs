/// Per-partition snapshot, logged at startup and shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionCounts {
    pub unassigned: usize,
    pub in_progress: usize,
    pub completed: usize,

    /// The last save failed; memory is ahead of the backing store.
    pub unsynced: bool,
}

impl PartitionCounts {
    pub fn total(&self) -> usize {
        self.unassigned + self.in_progress + self.completed
    }
}
