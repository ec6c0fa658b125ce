//! Shared fixtures for unit tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::{RegistryBuilder, TaskRegistry};
use crate::domain::{Partition, Task, TaskId};
use crate::impls::InMemoryTaskStore;
use crate::store::PartitionStore;

pub(crate) type Backends = BTreeMap<Partition, Arc<InMemoryTaskStore>>;

/// Every id of the partition, unassigned, described as "task <id>".
pub(crate) fn full_partition(partition: Partition) -> Vec<Task> {
    partition
        .range()
        .map(|id| Task::new(TaskId::new(id), format!("task {id}")))
        .collect()
}

/// Registry over in-memory stores seeded by `rows`. The backends are returned
/// so tests can inspect saves or inject failures.
pub(crate) async fn registry_with(rows: impl Fn(Partition) -> Vec<Task>) -> (TaskRegistry, Backends) {
    let mut builder = RegistryBuilder::new();
    let mut backends = Backends::new();
    for partition in Partition::ALL {
        let backend = Arc::new(InMemoryTaskStore::new(partition.as_str(), rows(partition)));
        let store = PartitionStore::open(partition, backend.clone())
            .await
            .expect("in-memory store loads");
        builder = builder.register(store).expect("each partition registered once");
        backends.insert(partition, backend);
    }
    let registry = builder.build().expect("all partitions present");
    (registry, backends)
}

pub(crate) fn total_saves(backends: &Backends) -> usize {
    backends.values().map(|backend| backend.save_count()).sum()
}
