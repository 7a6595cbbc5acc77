pub mod anc;
pub mod battery;
pub mod config;
pub mod dual_connect;
pub mod equalizer;
pub mod events;
pub mod gestures;
pub mod info;

use std::fmt;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dispatch::{CommandQueue, PendingCommand};
use crate::error::{Error, Result};
use crate::protocol::Frame;
use crate::transport::Transport;

pub use anc::{AncLevel, AncMode, AncStatus};
pub use battery::BatteryInfo;
pub use config::SoundQualityPreference;
pub use dual_connect::{DualConnectAction, DualConnectDevice};
pub use equalizer::{CustomEqPreset, EqTemplate, EqualizerInfo};
pub use events::{Notification, NotificationStream};
pub use gestures::{AncCycle, EarSide, GestureAction, GestureSettings};
pub use info::DeviceInfo;

/// Match `s` against the display names of `all`. Accepts `-` for `_`.
pub(crate) fn parse_name<T: Copy + fmt::Display>(all: &[T], s: &str, what: &str) -> Result<T> {
    let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
    all.iter()
        .copied()
        .find(|v| v.to_string() == wanted)
        .ok_or_else(|| {
            let names: Vec<String> = all.iter().map(|v| v.to_string()).collect();
            Error::invalid(format!(
                "unknown {} '{}' (expected one of: {})",
                what,
                s,
                names.join(", ")
            ))
        })
}

/// Connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

enum Link {
    /// Transport held by the session, not connected.
    Idle(Box<dyn Transport>),
    /// Transport owned by the dispatch worker.
    Running(CommandQueue),
}

/// A connection to one pair of earbuds.
///
/// Writes are queued and return immediately. Reads are queued on the same
/// lane and resolve once the device answers or the response timeout passes;
/// a read that fails for any reason yields `None`.
pub struct Session {
    link: Option<Link>,
    config: SessionConfig,
    notify_tx: broadcast::Sender<Frame>,
}

impl Session {
    pub fn new(transport: Box<dyn Transport>, config: SessionConfig) -> Self {
        let (notify_tx, _) = broadcast::channel(64);
        Self {
            link: Some(Link::Idle(transport)),
            config,
            notify_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self.link {
            Some(Link::Running(_)) => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    /// Connected, and the link was alive after the last command.
    pub fn is_connected(&self) -> bool {
        matches!(&self.link, Some(Link::Running(queue)) if queue.link_up())
    }

    /// Open the transport and start the dispatch worker.
    pub async fn connect(&mut self, address: &str, port: u8) -> Result<()> {
        if self.state() == ConnectionState::Connected {
            debug!("Already connected, reconnecting");
            self.disconnect().await;
        }

        let mut transport = match self.link.take() {
            Some(Link::Idle(transport)) => transport,
            other => {
                self.link = other;
                return Err(Error::Transport(
                    "transport lost with the command worker, a new session is required".into(),
                ));
            }
        };

        if let Err(e) = transport.connect(address, port).await {
            warn!("Connect to {} failed: {}", address, e);
            self.link = Some(Link::Idle(transport));
            return Err(e);
        }

        let queue = CommandQueue::start(transport, self.config.clone(), self.notify_tx.clone());
        self.link = Some(Link::Running(queue));
        info!("Connection state: {:?}", ConnectionState::Connected);
        Ok(())
    }

    /// Drain queued commands, then close the transport.
    ///
    /// Commands that panic are skipped by the worker, so the transport comes
    /// back for a later `connect`. It is only lost if the worker task itself
    /// is cancelled, e.g. by runtime shutdown.
    pub async fn disconnect(&mut self) {
        match self.link.take() {
            Some(Link::Running(queue)) => match queue.shutdown().await {
                Ok(mut transport) => {
                    transport.disconnect().await;
                    self.link = Some(Link::Idle(transport));
                }
                Err(e) => warn!("Lost transport while disconnecting: {}", e),
            },
            other => self.link = other,
        }
        info!("Connection state: {:?}", ConnectionState::Disconnected);
    }

    /// Subscribe to unsolicited device events.
    pub fn notifications(&self) -> NotificationStream {
        NotificationStream::new(self.notify_tx.subscribe())
    }

    fn queue(&self) -> Result<&CommandQueue> {
        match &self.link {
            Some(Link::Running(queue)) => Ok(queue),
            _ => Err(Error::NotConnected),
        }
    }

    fn submit(&self, description: &str, frame: Result<Frame>) -> Result<()> {
        let frame = frame?;
        let queue = self.queue()?;
        queue.enqueue(PendingCommand::write(description, &frame)?)
    }

    async fn request(&self, description: &str, frame: Frame) -> Result<Frame> {
        let (command, reply) = PendingCommand::read(description, &frame)?;
        self.queue()?.enqueue(command)?;
        reply.await.map_err(|_| Error::QueueClosed)?
    }

    async fn request_all(&self, description: &str, frame: Frame) -> Result<Vec<Frame>> {
        let (command, reply) = PendingCommand::collect(description, &frame)?;
        self.queue()?.enqueue(command)?;
        reply.await.map_err(|_| Error::QueueClosed)?
    }

    async fn read_with<T>(
        &self,
        description: &str,
        frame: Frame,
        parse: impl FnOnce(&Frame) -> Option<T>,
    ) -> Option<T> {
        match self.request(description, frame).await {
            Ok(response) => parse(&response),
            Err(e) => {
                debug!("Read '{}' failed: {}", description, e);
                None
            }
        }
    }

    // ---- Reads ----

    pub async fn device_info(&self) -> Option<DeviceInfo> {
        self.read_with("Get Device Info", info::read_request(), |f| {
            Some(DeviceInfo::from_frame(f))
        })
        .await
    }

    pub async fn battery(&self) -> Option<BatteryInfo> {
        self.read_with("Get Battery", battery::read_request(), |f| {
            Some(BatteryInfo::from_frame(f))
        })
        .await
    }

    /// `None` only when none of the five gesture reads answered.
    pub async fn gesture_settings(&self) -> Option<GestureSettings> {
        let mut settings = GestureSettings::default();
        let mut answered = 0;
        for request in gestures::read_requests() {
            let command = request.command_id;
            match self.request("Get Gestures", request).await {
                Ok(response) => {
                    settings.apply(&response);
                    answered += 1;
                }
                Err(e) => debug!("Gesture read {:04X} failed: {}", command, e),
            }
        }
        (answered > 0).then_some(settings)
    }

    pub async fn equalizer_info(&self) -> Option<EqualizerInfo> {
        self.read_with("Get Equalizer", equalizer::read_request(), |f| {
            Some(EqualizerInfo::from_frame(f))
        })
        .await
    }

    pub async fn anc_status(&self) -> Option<AncStatus> {
        self.read_with("Get ANC", anc::read_request(), |f| {
            Some(AncStatus::from_frame(f))
        })
        .await
    }

    pub async fn wear_detection(&self) -> Option<bool> {
        self.read_with(
            "Get Wear Detection",
            config::wear_detection_read_request(),
            config::parse_wear_detection,
        )
        .await
    }

    pub async fn low_latency(&self) -> Option<bool> {
        self.read_with(
            "Get Low Latency",
            config::low_latency_read_request(),
            config::parse_low_latency,
        )
        .await
    }

    pub async fn sound_quality_preference(&self) -> Option<SoundQualityPreference> {
        self.read_with(
            "Get Sound Quality",
            config::sound_quality_read_request(),
            config::parse_sound_quality,
        )
        .await
    }

    pub async fn dual_connect_enabled(&self) -> Option<bool> {
        self.read_with(
            "Get Dual Connect Enabled",
            dual_connect::enabled_read_request(),
            config::parse_dual_connect_enabled,
        )
        .await
    }

    /// Every remembered peer; the device answers with one frame per peer.
    pub async fn dual_connect_devices(&self) -> Vec<DualConnectDevice> {
        let result = self
            .request_all("Enumerate Dual Connect", dual_connect::enumerate_request())
            .await;

        match result {
            Ok(frames) => frames.iter().map(DualConnectDevice::from_frame).collect(),
            Err(e) => {
                debug!("Dual connect enumeration failed: {}", e);
                Vec::new()
            }
        }
    }

    // ---- Writes ----

    pub fn set_anc_mode(&self, mode: AncMode) -> Result<()> {
        self.submit("Set ANC Mode", Ok(anc::mode_request(mode)))
    }

    pub fn set_anc_level(&self, level: AncLevel) -> Result<()> {
        self.submit("Set ANC Level", Ok(anc::level_request(level)))
    }

    pub fn set_wear_detection(&self, enabled: bool) -> Result<()> {
        self.submit(
            "Set Wear Detection",
            Ok(config::wear_detection_request(enabled)),
        )
    }

    pub fn set_low_latency(&self, enabled: bool) -> Result<()> {
        self.submit("Set Low Latency", Ok(config::low_latency_request(enabled)))
    }

    pub fn set_sound_quality_preference(&self, preference: SoundQualityPreference) -> Result<()> {
        self.submit(
            "Set Sound Quality",
            Ok(config::sound_quality_request(preference)),
        )
    }

    pub fn set_double_tap_action(&self, side: EarSide, action: GestureAction) -> Result<()> {
        self.submit(
            "Set Double Tap",
            gestures::double_tap_request(side, action),
        )
    }

    pub fn set_triple_tap_action(&self, side: EarSide, action: GestureAction) -> Result<()> {
        self.submit(
            "Set Triple Tap",
            gestures::triple_tap_request(side, action),
        )
    }

    pub fn set_in_call_double_tap_action(&self, action: GestureAction) -> Result<()> {
        self.submit(
            "Set In-Call Double Tap",
            gestures::in_call_double_tap_request(action),
        )
    }

    pub fn set_long_tap_action(&self, side: EarSide, action: GestureAction) -> Result<()> {
        self.submit("Set Long Tap", gestures::long_tap_request(side, action))
    }

    pub fn set_long_tap_anc_cycle(&self, side: EarSide, cycle: AncCycle) -> Result<()> {
        self.submit(
            "Set Long Tap ANC Cycle",
            gestures::long_tap_anc_cycle_request(side, cycle),
        )
    }

    pub fn set_swipe_action(&self, action: GestureAction) -> Result<()> {
        self.submit("Set Swipe", gestures::swipe_request(action))
    }

    pub fn set_equalizer_preset(&self, id: u8) -> Result<()> {
        self.submit("Set EQ Preset", Ok(equalizer::preset_request(id)))
    }

    pub fn create_or_update_custom_equalizer(&self, preset: &CustomEqPreset) -> Result<()> {
        self.submit(
            "Save Custom EQ",
            equalizer::custom_request(preset, equalizer::EqAction::CreateOrUpdate),
        )
    }

    pub fn delete_custom_equalizer(&self, preset: &CustomEqPreset) -> Result<()> {
        self.submit(
            "Delete Custom EQ",
            equalizer::custom_request(preset, equalizer::EqAction::Delete),
        )
    }

    pub fn create_equalizer_from_template(&self, template: EqTemplate, id: u8) -> Result<()> {
        self.create_or_update_custom_equalizer(&template.preset(id))
    }

    pub fn set_dual_connect_enabled(&self, enabled: bool) -> Result<()> {
        self.submit(
            "Set Dual Connect",
            Ok(dual_connect::enabled_request(enabled)),
        )
    }

    pub fn set_dual_connect_preferred(&self, mac: &str) -> Result<()> {
        self.submit(
            "Set Preferred Device",
            dual_connect::preferred_request(mac),
        )
    }

    pub fn dual_connect_action(&self, mac: &str, action: DualConnectAction) -> Result<()> {
        self.submit(
            "Dual Connect Action",
            dual_connect::action_request(mac, action),
        )
    }
}
