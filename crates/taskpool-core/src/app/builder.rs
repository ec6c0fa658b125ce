//! RegistryBuilder - wiring partition stores into a TaskRegistry
//!
//! Fail-fast: the partition set is static, so a registry missing any of
//! A..D is rejected at startup instead of answering "no tasks" at runtime.

use std::collections::BTreeMap;

use crate::app::registry::TaskRegistry;
use crate::domain::Partition;
use crate::store::PartitionStore;

/// Collects one [`PartitionStore`] per partition.
///
/// # Example
/// ```ignore
/// let registry = RegistryBuilder::new()
///     .register(store_a)?
///     .register(store_b)?
///     .register(store_c)?
///     .register(store_d)?
///     .build()?;
/// ```
pub struct RegistryBuilder {
    partitions: BTreeMap<Partition, PartitionStore>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing partitions: {0:?}. Every partition needs a backing store.")]
    MissingPartitions(Vec<Partition>),

    #[error("Partition {0} is already registered")]
    DuplicatePartition(Partition),
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            partitions: BTreeMap::new(),
        }
    }

    pub fn register(mut self, store: PartitionStore) -> Result<Self, BuildError> {
        let partition = store.partition();
        if self.partitions.contains_key(&partition) {
            return Err(BuildError::DuplicatePartition(partition));
        }
        self.partitions.insert(partition, store);
        Ok(self)
    }

    /// Check that every partition is present and hand the stores to the registry.
    pub fn build(self) -> Result<TaskRegistry, BuildError> {
        let missing: Vec<Partition> = Partition::ALL
            .into_iter()
            .filter(|partition| !self.partitions.contains_key(partition))
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::MissingPartitions(missing));
        }
        Ok(TaskRegistry::from_partitions(self.partitions))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
