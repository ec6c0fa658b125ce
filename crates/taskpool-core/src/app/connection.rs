//! ConnectionHandler - per-client protocol loop.
//!
//! # Flow
//! 1. Send the handshake (`100 OK` + `ID:<n>`)
//! 2. Read a chunk (up to `READ_BUFFER_SIZE` bytes)
//! 3. Split it into lines; each non-empty line is one command
//! 4. Dispatch to the registry, write the reply
//! 5. Repeat until QUIT, end of stream, or an I/O error
//!
//! Errors end this connection only. They are returned to the caller (the
//! server loop), which logs them.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::app::protocol::{self, Command, FAREWELL, READ_BUFFER_SIZE};
use crate::app::registry::TaskRegistry;
use crate::domain::ClientId;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

pub struct ConnectionHandler<S> {
    stream: S,
    client_id: ClientId,
    registry: Arc<TaskRegistry>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, client_id: ClientId, registry: Arc<TaskRegistry>) -> Self {
        Self {
            stream,
            client_id,
            registry,
        }
    }

    pub async fn run(mut self) -> io::Result<()> {
        let handshake = protocol::handshake(self.client_id);
        self.stream.write_all(handshake.as_bytes()).await?;
        self.stream.flush().await?;

        let mut buffer = [0u8; READ_BUFFER_SIZE];
        loop {
            let read = self.stream.read(&mut buffer).await?;
            if read == 0 {
                tracing::debug!(client_id = %self.client_id, "peer closed the stream");
                return Ok(());
            }

            let chunk = String::from_utf8_lossy(&buffer[..read]).into_owned();
            for line in chunk.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                tracing::debug!(client_id = %self.client_id, command = line, "received");

                let Some(command) = Command::parse(line) else {
                    // unknown input gets no reply
                    continue;
                };
                if self.dispatch(command).await? == Flow::Close {
                    if let Err(err) = self.stream.shutdown().await {
                        tracing::debug!(client_id = %self.client_id, error = %err, "shutdown after QUIT failed");
                    }
                    return Ok(());
                }
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> io::Result<Flow> {
        let reply = match command {
            Command::Quit => {
                self.send(FAREWELL).await?;
                return Ok(Flow::Close);
            }
            Command::NewTask => {
                let outcome = self.registry.assign_next(self.client_id).await;
                protocol::assign_reply(&outcome)
            }
            Command::Complete(task_id) => {
                let outcome = self.registry.mark_completed(task_id).await;
                protocol::completion_reply(&outcome)
            }
            Command::CompleteMalformed(raw) => protocol::invalid_task_reply(&raw),
        };
        self.send(&reply).await?;
        Ok(Flow::Continue)
    }

    async fn send(&mut self, reply: &str) -> io::Result<()> {
        self.stream.write_all(reply.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;
        tracing::debug!(client_id = %self.client_id, reply, "sent");
        Ok(())
    }
}
