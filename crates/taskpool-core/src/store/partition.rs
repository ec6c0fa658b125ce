//! PartitionStore - one pool's task list plus the lock guarding it.
//!
//! The in-memory list and the backing file are two encodings of the same
//! state. Both are only reachable through a [`PartitionGuard`], which holds
//! the partition lock for its whole lifetime, so a read-modify-save cycle is
//! never observed half done by another connection.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{Partition, Task, TaskId, TaskStatus};
use crate::error::StoreError;
use crate::observability::PartitionCounts;
use crate::ports::TaskStore;

#[derive(Default)]
struct PartitionState {
    /// File order; the first Unassigned entry wins on assignment.
    tasks: Vec<Task>,

    /// Set when the last save failed.
    unsynced: bool,
}

pub struct PartitionStore {
    partition: Partition,
    backend: Arc<dyn TaskStore>,
    state: Mutex<PartitionState>,
}

impl PartitionStore {
    /// Create the store and perform the initial load.
    ///
    /// A read failure is returned as-is: a partition that cannot be loaded must
    /// not be served empty.
    pub async fn open(partition: Partition, backend: Arc<dyn TaskStore>) -> Result<Self, StoreError> {
        let store = Self {
            partition,
            backend,
            state: Mutex::new(PartitionState::default()),
        };
        store.lock().await.load().await?;
        Ok(store)
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Acquire the partition lock. Released when the guard is dropped.
    pub async fn lock(&self) -> PartitionGuard<'_> {
        PartitionGuard {
            partition: self.partition,
            backend: self.backend.as_ref(),
            state: self.state.lock().await,
        }
    }
}

/// Exclusive access to one partition's tasks and backing store.
pub struct PartitionGuard<'a> {
    partition: Partition,
    backend: &'a dyn TaskStore,
    state: MutexGuard<'a, PartitionState>,
}

impl PartitionGuard<'_> {
    /// Replace the in-memory sequence with the backing store's content.
    ///
    /// Besides the rows the backend already rejected, rows whose id belongs to
    /// another partition and repeated ids are dropped with a warning.
    pub async fn load(&mut self) -> Result<usize, StoreError> {
        let rows = self.backend.load().await?;

        let mut seen = HashSet::with_capacity(rows.len());
        let mut tasks = Vec::with_capacity(rows.len());
        for task in rows {
            if !self.partition.owns(task.id()) {
                tracing::warn!(
                    partition = %self.partition,
                    task_id = %task.id(),
                    "skipping row that belongs to another partition"
                );
                continue;
            }
            if !seen.insert(task.id()) {
                tracing::warn!(
                    partition = %self.partition,
                    task_id = %task.id(),
                    "skipping row with duplicate task id"
                );
                continue;
            }
            tasks.push(task);
        }

        let loaded = tasks.len();
        self.state.tasks = tasks;
        self.state.unsynced = false;
        tracing::info!(
            partition = %self.partition,
            store = %self.backend.describe(),
            tasks = loaded,
            "partition loaded"
        );
        Ok(loaded)
    }

    /// Write the full in-memory sequence to the backing store.
    ///
    /// On failure memory stays authoritative and the partition is flagged
    /// unsynced until a later save succeeds. No retry.
    pub async fn save(&mut self) -> Result<(), StoreError> {
        match self.backend.save(&self.state.tasks).await {
            Ok(()) => {
                self.state.unsynced = false;
                Ok(())
            }
            Err(err) => {
                self.state.unsynced = true;
                Err(err)
            }
        }
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn find_by_id(&self, task_id: TaskId) -> Option<&Task> {
        self.state.tasks.iter().find(|task| task.id() == task_id)
    }

    pub fn find_by_id_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.state.tasks.iter_mut().find(|task| task.id() == task_id)
    }

    pub fn find_first_unassigned(&self) -> Option<&Task> {
        self.state
            .tasks
            .iter()
            .find(|task| task.status().is_assignable())
    }

    pub fn find_first_unassigned_mut(&mut self) -> Option<&mut Task> {
        self.state
            .tasks
            .iter_mut()
            .find(|task| task.status().is_assignable())
    }

    pub fn is_unsynced(&self) -> bool {
        self.state.unsynced
    }

    pub fn counts(&self) -> PartitionCounts {
        let mut counts = PartitionCounts {
            unsynced: self.state.unsynced,
            ..PartitionCounts::default()
        };
        for task in &self.state.tasks {
            match task.status() {
                TaskStatus::Unassigned => counts.unassigned += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}
