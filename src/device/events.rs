use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::anc::AncMode;
use super::battery::BatteryInfo;
use crate::protocol::commands::*;
use crate::protocol::Frame;

/// Unsolicited device event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    Battery(BatteryInfo),
    /// ANC switched from the earbuds themselves.
    AncModeChanged { mode: AncMode },
    /// The dual-connect peer list or a peer's state changed.
    DualConnectChanged,
}

impl Notification {
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame.command_id {
            CMD_BATTERY_NOTIFY => Some(Self::Battery(BatteryInfo::from_frame(frame))),
            CMD_ANC_NOTIFY => match frame.find_param(1) {
                &[code] => AncMode::from_code(code).map(|mode| Self::AncModeChanged { mode }),
                _ => None,
            },
            CMD_DUAL_CONNECT_CHANGE_EVENT => Some(Self::DualConnectChanged),
            _ => None,
        }
    }
}

/// Typed view over the session's unsolicited frames.
pub struct NotificationStream {
    rx: broadcast::Receiver<Frame>,
}

impl NotificationStream {
    pub(crate) fn new(rx: broadcast::Receiver<Frame>) -> Self {
        Self { rx }
    }

    /// Next recognised notification, or `None` once the session is gone.
    pub async fn next(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(frame) => match Notification::from_frame(&frame) {
                    Some(notification) => return Some(notification),
                    None => debug!("Unhandled notification: {}", frame),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Notification stream lagged, {} frames dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
