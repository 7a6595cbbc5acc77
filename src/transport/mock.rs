//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::Transport;
use crate::error::{Error, Result};
use crate::protocol::Frame;

type Responder = Box<dyn FnMut(&Frame) -> Vec<Vec<Frame>> + Send>;

#[derive(Default)]
struct State {
    connected: bool,
    refuse_connect: bool,
    fail_send: bool,
    pending_panics: usize,
    sent: Vec<Vec<u8>>,
    inbound: VecDeque<Vec<Vec<u8>>>,
    responder: Option<Responder>,
    receive_calls: usize,
}

/// Transport whose inbound traffic is scripted by a [`MockHandle`].
///
/// Each `receive_all` call pops one queued batch (or returns nothing).
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

/// Test-side view of a [`MockTransport`] that stays usable after the
/// transport has moved into a session.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(State::default()));
        (
            Self {
                state: state.clone(),
            },
            MockHandle { state },
        )
    }
}

impl MockHandle {
    /// Queue one `receive_all` batch of raw frames.
    pub fn push_batch(&self, batch: Vec<Vec<u8>>) {
        self.state.lock().unwrap().inbound.push_back(batch);
    }

    /// Queue one batch built from frames.
    pub fn push_frames(&self, frames: &[Frame]) {
        self.push_batch(frames.iter().map(|f| f.to_bytes().unwrap()).collect());
    }

    /// Reply to every sent frame with the batches the closure returns.
    pub fn respond_with<F>(&self, f: F)
    where
        F: FnMut(&Frame) -> Vec<Vec<Frame>> + Send + 'static,
    {
        self.state.lock().unwrap().responder = Some(Box::new(f));
    }

    pub fn refuse_connect(&self) {
        self.state.lock().unwrap().refuse_connect = true;
    }

    pub fn fail_sends(&self) {
        self.state.lock().unwrap().fail_send = true;
    }

    /// Make one more upcoming `send` panic instead of returning.
    pub fn panic_next_send(&self) {
        self.state.lock().unwrap().pending_panics += 1;
    }

    /// Every frame written so far, decoded.
    pub fn sent(&self) -> Vec<Frame> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|b| Frame::from_bytes(b).unwrap())
            .collect()
    }

    pub fn sent_raw(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn receive_calls(&self) -> usize {
        self.state.lock().unwrap().receive_calls
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self, _address: &str, _port: u8) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connect {
            return Err(Error::Transport("connection refused".into()));
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.state.lock().unwrap().connected = false;
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        // Guard released before panicking so the mutex is not poisoned
        let panic_now = {
            let mut state = self.state.lock().unwrap();
            let pending = state.pending_panics > 0;
            if pending {
                state.pending_panics -= 1;
            }
            pending
        };
        if panic_now {
            panic!("transport send crashed");
        }

        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.fail_send {
            return Err(Error::Transport("write failed".into()));
        }
        state.sent.push(data.to_vec());

        let request = Frame::from_bytes(data).ok();
        let replies = match (request, state.responder.as_mut()) {
            (Some(request), Some(responder)) => responder(&request),
            _ => Vec::new(),
        };
        for batch in replies {
            let raw = batch.iter().map(|f| f.to_bytes().unwrap()).collect();
            state.inbound.push_back(raw);
        }
        Ok(())
    }

    async fn receive_all(&mut self) -> Vec<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.receive_calls += 1;
        state.inbound.pop_front().unwrap_or_default()
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}
