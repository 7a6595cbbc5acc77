//! Request/response correlation over a notification-interleaved link.
//!
//! The protocol has no sequence numbers: a response is the first frame that
//! carries the request's command id. Everything else arriving meanwhile is
//! an unsolicited notification and is handed to `unrelated`.

use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::protocol::{CommandId, Frame};
use crate::transport::Transport;

/// Decode one raw frame, logging and dropping anything invalid.
pub(crate) fn decode(raw: &[u8]) -> Option<Frame> {
    match Frame::from_bytes(raw) {
        Ok(frame) => {
            debug!("RX: {}", frame);
            Some(frame)
        }
        Err(e) => {
            debug!("Dropping undecodable frame ({} bytes): {}", raw.len(), e);
            None
        }
    }
}

pub(crate) fn publish(unrelated: &broadcast::Sender<Frame>, frame: Frame) {
    // No subscribers is fine
    let _ = unrelated.send(frame);
}

/// Split one `receive_all` batch into frames for `expected` and the rest.
fn sort_batch(
    batch: Vec<Vec<u8>>,
    expected: CommandId,
    matches: &mut Vec<Frame>,
    unrelated: &broadcast::Sender<Frame>,
) {
    for frame in batch.iter().filter_map(|raw| decode(raw)) {
        if frame.command_id == expected {
            matches.push(frame);
        } else {
            debug!(
                "Ignoring unrelated frame {:04X} while waiting for {:04X}",
                frame.command_id, expected
            );
            publish(unrelated, frame);
        }
    }
}

/// Send `request` and wait for the first frame carrying `expected`.
pub async fn request(
    transport: &mut dyn Transport,
    request: &[u8],
    expected: CommandId,
    config: &SessionConfig,
    unrelated: &broadcast::Sender<Frame>,
) -> Result<Frame> {
    transport.send(request).await?;

    let timeout = config.response_timeout();
    let start = Instant::now();
    let mut matches = Vec::new();

    while start.elapsed() < timeout {
        sort_batch(transport.receive_all().await, expected, &mut matches, unrelated);
        if !matches.is_empty() {
            if matches.len() > 1 {
                debug!(
                    "Discarding {} duplicate responses for {:04X}",
                    matches.len() - 1,
                    expected
                );
            }
            return Ok(matches.swap_remove(0));
        }
        sleep(config.poll_interval()).await;
    }

    warn!(
        "Timed out after {:?} waiting for response to {:04X}",
        timeout, expected
    );
    Err(Error::ResponseTimeout(expected))
}

/// Send `request` once and gather every frame carrying `expected`.
///
/// Waits like [`request`] for the first match, then keeps draining until a
/// `receive_all` call comes back empty.
pub async fn collect(
    transport: &mut dyn Transport,
    request: &[u8],
    expected: CommandId,
    config: &SessionConfig,
    unrelated: &broadcast::Sender<Frame>,
) -> Result<Vec<Frame>> {
    transport.send(request).await?;

    let timeout = config.response_timeout();
    let start = Instant::now();
    let mut matches = Vec::new();

    loop {
        let batch = transport.receive_all().await;
        let quiet = batch.is_empty();
        sort_batch(batch, expected, &mut matches, unrelated);
        if !matches.is_empty() {
            break;
        }
        if start.elapsed() >= timeout {
            warn!(
                "Timed out after {:?} waiting for any {:04X} frame",
                timeout, expected
            );
            return Err(Error::ResponseTimeout(expected));
        }
        if quiet {
            sleep(config.poll_interval()).await;
        }
    }

    let drain_start = Instant::now();
    while drain_start.elapsed() < timeout {
        let batch = transport.receive_all().await;
        if batch.is_empty() {
            break;
        }
        sort_batch(batch, expected, &mut matches, unrelated);
    }

    debug!("Collected {} frames for {:04X}", matches.len(), expected);
    Ok(matches)
}
