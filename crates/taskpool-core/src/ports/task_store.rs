//! TaskStore port - durable backing store of one partition.
//!
//! The store only knows how to read and write a whole task sequence. It takes
//! no locks of its own: callers go through `PartitionStore`, which serialises
//! every load/save behind the partition lock.
//!
//! # Implementations
//! - `CsvTaskStore`: delimited text file with a header row (production)
//! - `InMemoryTaskStore`: seeded rows + failure injection (tests, local runs)

use async_trait::async_trait;

use crate::domain::Task;
use crate::error::StoreError;

/// Full-sequence persistence for one partition.
///
/// # Contract
/// - `load` returns every valid row in file order. Malformed rows are skipped
///   and logged; only an I/O failure to open/read fails the call.
/// - `save` replaces the stored sequence with `tasks`. A reader must never
///   observe a partially written sequence.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Task>, StoreError>;

    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}
