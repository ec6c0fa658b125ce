//! Wire protocol: command parsing and reply text.
//!
//! Plain ASCII text over the stream. On connect the server sends
//! `100 OK` immediately followed by `ID:<n>\n`. Clients then send
//! `NOVA_TAREFA`, `CONCLUIDA <taskId>` or `QUIT`. Every reply is one line.

use crate::app::registry::{AssignOutcome, CompletionOutcome};
use crate::domain::{ClientId, TaskId};

pub const GREETING: &str = "100 OK";
pub const FAREWELL: &str = "400 BYE";

/// Upper bound of one stream read. Each read is handled as a batch of commands.
pub const READ_BUFFER_SIZE: usize = 1024;

pub const ALREADY_HAS_TASK: &str = "you already have an assigned task";
pub const NONE_AVAILABLE: &str = "no tasks available for assignment";
pub const TASK_COMPLETED: &str = "task completed successfully";

const QUIT: &str = "QUIT";
const COMPLETE: &str = "CONCLUIDA";
const NEW_TASK: &str = "NOVA_TAREFA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    NewTask,
    Complete(TaskId),
    /// `CONCLUIDA` with a missing or non-numeric argument (kept verbatim for the reply).
    CompleteMalformed(String),
}

impl Command {
    /// Parse one command line. Keywords are case-insensitive and surrounding
    /// whitespace is ignored. Returns `None` for anything unrecognised.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let (keyword, argument) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        if keyword.eq_ignore_ascii_case(COMPLETE) {
            return Some(match argument.parse() {
                Ok(task_id) => Command::Complete(task_id),
                Err(_) => Command::CompleteMalformed(argument.to_string()),
            });
        }
        if !argument.is_empty() {
            return None;
        }
        if keyword.eq_ignore_ascii_case(QUIT) {
            Some(Command::Quit)
        } else if keyword.eq_ignore_ascii_case(NEW_TASK) {
            Some(Command::NewTask)
        } else {
            None
        }
    }
}

pub fn handshake(client: ClientId) -> String {
    format!("{GREETING}ID:{client}\n")
}

pub fn assign_reply(outcome: &AssignOutcome) -> String {
    match outcome {
        AssignOutcome::Assigned { description, .. } => {
            format!("new task assigned successfully: {description}")
        }
        AssignOutcome::AlreadyHasTask => ALREADY_HAS_TASK.to_string(),
        AssignOutcome::NoneAvailable => NONE_AVAILABLE.to_string(),
    }
}

pub fn completion_reply(outcome: &CompletionOutcome) -> String {
    match outcome {
        CompletionOutcome::Completed(_) => TASK_COMPLETED.to_string(),
        CompletionOutcome::NotFound(task_id) => format!("task {task_id} not found"),
        CompletionOutcome::InvalidId(task_id) => invalid_task_reply(&task_id.to_string()),
        CompletionOutcome::NotInProgress { task_id, .. } => {
            format!("task {task_id} is not in progress")
        }
    }
}

pub fn invalid_task_reply(raw: &str) -> String {
    format!("invalid task id: {raw}")
}
