//! TaskRegistry - routing and the assign/complete policies.
//!
//! Every operation locks exactly the partition(s) it touches, one at a time,
//! and holds the lock across find + mutate + save. No two partition locks
//! are ever held together, so there is no lock ordering to get wrong.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::builder::RegistryBuilder;
use crate::config::ServerConfig;
use crate::domain::{ClientId, Partition, TaskId, TaskStatus};
use crate::error::ServerError;
use crate::impls::CsvTaskStore;
use crate::observability::PartitionCounts;
use crate::store::{PartitionGuard, PartitionStore};

/// Result of asking for the next task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned { task_id: TaskId, description: String },
    AlreadyHasTask,
    NoneAvailable,
}

/// Result of reporting a task as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed(TaskId),

    /// The id routes to a partition, but that partition has no such task.
    NotFound(TaskId),

    /// The id is outside every partition range. No lock was taken.
    InvalidId(TaskId),

    /// The task exists but is Unassigned or already Completed; left untouched.
    NotInProgress { task_id: TaskId, status: TaskStatus },
}

pub struct TaskRegistry {
    /// Iteration order is A, B, C, D: the assignment order.
    partitions: BTreeMap<Partition, PartitionStore>,
}

impl TaskRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn from_partitions(partitions: BTreeMap<Partition, PartitionStore>) -> Self {
        Self { partitions }
    }

    /// Load every partition from its CSV table. Any unreadable table aborts startup.
    pub async fn open(config: &ServerConfig) -> Result<Self, ServerError> {
        let mut builder = Self::builder();
        for (&partition, path) in &config.partitions {
            let backend = Arc::new(CsvTaskStore::new(path));
            let store = PartitionStore::open(partition, backend).await?;
            builder = builder.register(store)?;
        }
        Ok(builder.build()?)
    }

    pub fn partition(&self, partition: Partition) -> Option<&PartitionStore> {
        self.partitions.get(&partition)
    }

    /// Mark an in-progress task as completed.
    ///
    /// Routing uses the static id table only; the owning partition is the
    /// only one locked.
    pub async fn mark_completed(&self, task_id: TaskId) -> CompletionOutcome {
        let Some(store) = Partition::for_task(task_id).and_then(|p| self.partitions.get(&p)) else {
            tracing::warn!(task_id = %task_id, "completion for id outside every partition");
            return CompletionOutcome::InvalidId(task_id);
        };

        let mut guard = store.lock().await;
        let Some(task) = guard.find_by_id_mut(task_id) else {
            tracing::warn!(partition = %store.partition(), task_id = %task_id, "task not found");
            return CompletionOutcome::NotFound(task_id);
        };

        let status = task.status();
        if !task.complete() {
            tracing::warn!(task_id = %task_id, status = %status, "completion for task not in progress");
            return CompletionOutcome::NotInProgress { task_id, status };
        }

        persist(&mut guard).await;
        tracing::info!(partition = %guard.partition(), task_id = %task_id, "task completed");
        CompletionOutcome::Completed(task_id)
    }

    /// Hand the first unassigned task (partition order A..D, file order within
    /// a partition) to `client`.
    ///
    /// The one-task-per-client check is advisory: it locks each partition
    /// briefly and separately, so it is not atomic with the assignment below.
    /// A connection issues one command at a time and owns its client id, which
    /// keeps the gap unreachable through the protocol.
    pub async fn assign_next(&self, client: ClientId) -> AssignOutcome {
        if let Some(current) = self.current_task(client).await {
            tracing::debug!(client_id = %client, task_id = %current, "client already has a task");
            return AssignOutcome::AlreadyHasTask;
        }

        for store in self.partitions.values() {
            let mut guard = store.lock().await;
            let Some(task) = guard.find_first_unassigned_mut() else {
                continue;
            };
            task.assign(client);
            let task_id = task.id();
            let description = task.description().to_string();

            persist(&mut guard).await;
            tracing::info!(
                client_id = %client,
                partition = %guard.partition(),
                task_id = %task_id,
                "task assigned"
            );
            return AssignOutcome::Assigned {
                task_id,
                description,
            };
        }

        tracing::debug!(client_id = %client, "no unassigned tasks left");
        AssignOutcome::NoneAvailable
    }

    /// The in-progress task owned by `client`, if any, across all partitions.
    pub async fn current_task(&self, client: ClientId) -> Option<TaskId> {
        for store in self.partitions.values() {
            let guard = store.lock().await;
            if let Some(task) = guard.tasks().iter().find(|task| task.is_owned_by(client)) {
                return Some(task.id());
            }
        }
        None
    }

    pub async fn counts(&self) -> BTreeMap<Partition, PartitionCounts> {
        let mut counts = BTreeMap::new();
        for (&partition, store) in &self.partitions {
            counts.insert(partition, store.lock().await.counts());
        }
        counts
    }
}

/// Save under the caller's lock. A failure is reported, not retried; the
/// mutation stays in memory and the partition is flagged unsynced.
async fn persist(guard: &mut PartitionGuard<'_>) {
    if let Err(err) = guard.save().await {
        tracing::error!(
            partition = %guard.partition(),
            error = %err,
            "failed to persist partition; in-memory state is ahead of the backing store"
        );
    }
}
