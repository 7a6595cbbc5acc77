//! Serialized command execution.
//!
//! Every outgoing frame, read or write, goes through one FIFO lane drained by
//! a single worker task that owns the transport. A read's request/response
//! pair therefore never interleaves with any other command.

pub mod transaction;

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::protocol::{CommandId, Frame};
use crate::transport::Transport;

/// What the worker should do with the device's answer to a command.
enum Reply {
    /// Fire and forget.
    None,
    /// First matching frame.
    Single(oneshot::Sender<Result<Frame>>),
    /// Every matching frame until the device goes quiet.
    Multiple(oneshot::Sender<Result<Vec<Frame>>>),
}

/// An encoded frame waiting for its turn on the link.
pub struct PendingCommand {
    description: String,
    command_id: CommandId,
    bytes: Vec<u8>,
    reply: Reply,
}

impl PendingCommand {
    fn encode(description: &str, frame: &Frame, reply: Reply) -> Result<Self> {
        Ok(Self {
            description: description.to_string(),
            command_id: frame.command_id,
            bytes: frame.to_bytes()?,
            reply,
        })
    }

    /// A write: the frame is sent and nothing is awaited.
    pub fn write(description: &str, frame: &Frame) -> Result<Self> {
        Self::encode(description, frame, Reply::None)
    }

    /// A read expecting one response with the request's command id.
    pub fn read(
        description: &str,
        frame: &Frame,
    ) -> Result<(Self, oneshot::Receiver<Result<Frame>>)> {
        let (tx, rx) = oneshot::channel();
        Ok((Self::encode(description, frame, Reply::Single(tx))?, rx))
    }

    /// A read whose answer spans several frames with the same command id.
    pub fn collect(
        description: &str,
        frame: &Frame,
    ) -> Result<(Self, oneshot::Receiver<Result<Vec<Frame>>>)> {
        let (tx, rx) = oneshot::channel();
        Ok((Self::encode(description, frame, Reply::Multiple(tx))?, rx))
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// State owned by the worker task.
struct Worker {
    transport: Box<dyn Transport>,
    config: SessionConfig,
    notifications: broadcast::Sender<Frame>,
    link_up: Arc<AtomicBool>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PendingCommand>) -> Box<dyn Transport> {
        loop {
            let next = match self.config.notification_poll() {
                Some(idle) => match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        if AssertUnwindSafe(self.poll_notifications())
                            .catch_unwind()
                            .await
                            .is_err()
                        {
                            error!("Notification poll panicked");
                        }
                        continue;
                    }
                },
                None => rx.recv().await,
            };
            let Some(command) = next else {
                break;
            };
            // A panicking command must not take the transport down with the task
            let description = command.description.clone();
            if AssertUnwindSafe(self.execute(command))
                .catch_unwind()
                .await
                .is_err()
            {
                error!("Command '{}' panicked, continuing with the next one", description);
            }
            self.link_up
                .store(self.transport.is_connected(), Ordering::Relaxed);
        }

        debug!("Command queue closed, worker exiting");
        self.transport
    }

    async fn execute(&mut self, command: PendingCommand) {
        let PendingCommand {
            description,
            command_id,
            bytes,
            reply,
        } = command;
        debug!("Executing '{}' ({:04X})", description, command_id);

        let transport = self.transport.as_mut();
        match reply {
            Reply::None => {
                if let Err(e) = transport.send(&bytes).await {
                    warn!("Write '{}' failed: {}", description, e);
                }
            }
            Reply::Single(tx) => {
                let result = transaction::request(
                    transport,
                    &bytes,
                    command_id,
                    &self.config,
                    &self.notifications,
                )
                .await;
                if tx.send(result).is_err() {
                    debug!("Caller of '{}' went away before the reply", description);
                }
            }
            Reply::Multiple(tx) => {
                let result = transaction::collect(
                    transport,
                    &bytes,
                    command_id,
                    &self.config,
                    &self.notifications,
                )
                .await;
                if tx.send(result).is_err() {
                    debug!("Caller of '{}' went away before the reply", description);
                }
            }
        }
    }

    async fn poll_notifications(&mut self) {
        if !self.transport.is_connected() {
            self.link_up.store(false, Ordering::Relaxed);
            return;
        }
        for raw in self.transport.receive_all().await {
            if let Some(frame) = transaction::decode(&raw) {
                transaction::publish(&self.notifications, frame);
            }
        }
        self.link_up
            .store(self.transport.is_connected(), Ordering::Relaxed);
    }
}

/// Handle to the worker that serializes all device I/O.
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<PendingCommand>,
    worker: JoinHandle<Box<dyn Transport>>,
    link_up: Arc<AtomicBool>,
}

impl CommandQueue {
    /// Spawn the worker. The transport should already be connected.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        transport: Box<dyn Transport>,
        config: SessionConfig,
        notifications: broadcast::Sender<Frame>,
    ) -> Self {
        let link_up = Arc::new(AtomicBool::new(transport.is_connected()));
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            transport,
            config,
            notifications,
            link_up: link_up.clone(),
        };
        let worker = tokio::spawn(worker.run(rx));
        Self {
            tx,
            worker,
            link_up,
        }
    }

    /// Append a command to the lane. Never blocks.
    pub fn enqueue(&self, command: PendingCommand) -> Result<()> {
        debug!("Queued '{}'", command.description);
        self.tx.send(command).map_err(|_| Error::QueueClosed)
    }

    /// Whether the transport was connected after the last completed command.
    pub fn link_up(&self) -> bool {
        self.link_up.load(Ordering::Relaxed)
    }

    /// Stop accepting commands, let the worker drain what is queued and hand
    /// back the transport.
    pub async fn shutdown(self) -> Result<Box<dyn Transport>> {
        let Self { tx, worker, .. } = self;
        drop(tx);
        let transport = worker
            .await
            .map_err(|e| Error::Transport(format!("command worker failed: {}", e)))?;
        info!("Command queue drained");
        Ok(transport)
    }
}
