//! Worker processes
//!
//! A worker is a child process whose stdout carries the JSON line channel.
//! A reader task decodes the lines into an unbounded channel in the order
//! they were written.

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::supervisor::{Worker, WorkerExit};
use crate::models::WorkerMessage;

/// A worker running as a child process
pub struct ChildWorker {
    child: Child,
}

impl ChildWorker {
    /// Spawn `command` as a worker and start reading its channel
    pub fn spawn(mut command: Command) -> Result<(Self, UnboundedReceiver<WorkerMessage>)> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().context("Failed to spawn worker process")?;
        let stdout = child
            .stdout
            .take()
            .context("Worker stdout was not captured")?;

        debug!("Spawned worker pid {:?}", child.id());

        let (tx, rx) = unbounded_channel();
        tokio::spawn(forward_lines(stdout, tx));

        Ok((Self { child }, rx))
    }
}

impl Worker for ChildWorker {
    fn has_exited(&mut self) -> Result<Option<WorkerExit>> {
        let status = self
            .child
            .try_wait()
            .context("Failed to poll worker process")?;

        Ok(status.map(|status| {
            if status.success() {
                WorkerExit::Success
            } else {
                WorkerExit::Failure(status.to_string())
            }
        }))
    }

    async fn terminate(&mut self) -> Result<()> {
        debug!("Killing worker pid {:?}", self.child.id());
        self.child
            .kill()
            .await
            .context("Failed to kill worker process")
    }
}

async fn forward_lines(stdout: ChildStdout, tx: UnboundedSender<WorkerMessage>) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match WorkerMessage::decode(&line) {
                    Ok(message) => {
                        if tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring worker output {:?}: {}", line, e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read worker channel: {}", e);
                break;
            }
        }
    }
}
