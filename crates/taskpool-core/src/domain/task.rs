//! Task record and its state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ClientId, TaskId};
use crate::error::RowError;

/// Task status.
///
/// State transitions:
/// - Unassigned -> InProgress (assignment)
/// - InProgress -> Completed (completion)
///
/// Completed is terminal and there is no way back to Unassigned.
/// The serde names are the labels stored in the partition files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Nao alocado")]
    Unassigned,

    #[serde(rename = "Em curso")]
    InProgress,

    #[serde(rename = "Concluido")]
    Completed,
}

impl TaskStatus {
    /// Label used in the persisted table.
    pub const fn label(self) -> &'static str {
        match self {
            TaskStatus::Unassigned => "Nao alocado",
            TaskStatus::InProgress => "Em curso",
            TaskStatus::Completed => "Concluido",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Is this task eligible for assignment?
    pub fn is_assignable(self) -> bool {
        matches!(self, TaskStatus::Unassigned)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unit of work.
///
/// `id` and `description` never change. `status` and `owner` only move
/// through [`Task::assign`] and [`Task::complete`], which keep the invariant
/// "owner is set iff status is InProgress".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    description: String,
    status: TaskStatus,
    owner: Option<ClientId>,
}

impl Task {
    /// A fresh, unassigned task.
    pub fn new(id: TaskId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            status: TaskStatus::Unassigned,
            owner: None,
        }
    }

    /// Rebuild a task from persisted fields, rejecting owner/status combinations
    /// that break the ownership invariant.
    pub fn restore(
        id: TaskId,
        description: impl Into<String>,
        status: TaskStatus,
        owner: Option<ClientId>,
    ) -> Result<Self, RowError> {
        let consistent = match status {
            TaskStatus::InProgress => owner.is_some(),
            TaskStatus::Unassigned | TaskStatus::Completed => owner.is_none(),
        };
        if !consistent {
            return Err(RowError::OwnerMismatch { status, owner });
        }
        Ok(Self {
            id,
            description: description.into(),
            status,
            owner,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn owner(&self) -> Option<ClientId> {
        self.owner
    }

    pub fn is_owned_by(&self, client: ClientId) -> bool {
        self.status == TaskStatus::InProgress && self.owner == Some(client)
    }

    /// Unassigned -> InProgress. Returns false (and changes nothing) from any other state.
    pub fn assign(&mut self, client: ClientId) -> bool {
        if !self.status.is_assignable() {
            return false;
        }
        self.status = TaskStatus::InProgress;
        self.owner = Some(client);
        true
    }

    /// InProgress -> Completed. Returns false (and changes nothing) from any other state.
    pub fn complete(&mut self) -> bool {
        if self.status != TaskStatus::InProgress {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.owner = None;
        true
    }
}
