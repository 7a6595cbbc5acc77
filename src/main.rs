use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use freebuds::config::AppConfig;
use freebuds::device::{
    AncCycle, AncLevel, AncMode, CustomEqPreset, DualConnectAction, EarSide, EqTemplate,
    GestureAction, SoundQualityPreference,
};
use freebuds::transport::rfcomm::RfcommTransport;
use freebuds::Session;

#[derive(Parser)]
#[command(name = "freebuds", about = "Command-line controller for Huawei FreeBuds headphones")]
struct Cli {
    /// Bluetooth address of the earbuds (overrides the config file)
    #[arg(long)]
    address: Option<String>,

    /// RFCOMM channel (overrides the config file)
    #[arg(long)]
    port: Option<u8>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remember --address and --port in the config file
    #[arg(long)]
    save: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Model, firmware and serial numbers
    Info,
    /// Battery levels and charging state
    Battery,
    /// Noise control mode and level
    Anc,
    /// Gesture assignments
    Gestures,
    /// Current preset and stored custom presets
    Equalizer,
    /// Wear detection, low latency, sound quality and dual connect toggles
    Settings,
    /// Dual-connect peers
    Peers,
    /// Print notifications as they arrive
    Watch {
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    SetAncMode {
        mode: AncMode,
    },
    SetAncLevel {
        level: AncLevel,
    },
    SetWearDetection {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    SetLowLatency {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    SetSoundQuality {
        preference: SoundQualityPreference,
    },
    SetDoubleTap {
        side: EarSide,
        action: GestureAction,
    },
    SetTripleTap {
        side: EarSide,
        action: GestureAction,
    },
    SetLongTap {
        side: EarSide,
        action: GestureAction,
    },
    SetAncCycle {
        side: EarSide,
        cycle: AncCycle,
    },
    SetInCallTap {
        action: GestureAction,
    },
    SetSwipe {
        action: GestureAction,
    },
    SetEqPreset {
        id: u8,
    },
    /// Store a custom preset: 10 band values in [-60, 60]
    SetCustomEq {
        id: u8,
        name: String,
        #[arg(num_args = 10, allow_negative_numbers = true)]
        values: Vec<i8>,
    },
    /// Remove a stored custom preset
    DeleteCustomEq {
        id: u8,
    },
    /// Install a factory curve as a custom preset
    AddEqTemplate {
        template: EqTemplate,
        id: u8,
    },
    SetDualConnect {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
    SetPreferred {
        mac: String,
    },
    /// Connect, disconnect or unpair a dual-connect peer
    Peer {
        mac: String,
        action: DualConnectAction,
    },
}

#[derive(Serialize)]
struct Settings {
    wear_detection: Option<bool>,
    low_latency: Option<bool>,
    sound_quality: Option<SoundQualityPreference>,
    dual_connect_enabled: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("freebuds=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::path);
    let mut config = AppConfig::load_from(&config_path);
    if let Some(address) = &cli.address {
        config.device_address = Some(address.clone());
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.save {
        config.save_to(&config_path)?;
    }

    let Some(address) = config.device_address.clone() else {
        bail!(
            "No device address. Pass --address or set device_address in {}",
            config_path.display()
        );
    };

    let transport = RfcommTransport::new(config.read_timeout());
    let mut session = Session::new(Box::new(transport), config.session.clone());
    connect(&mut session, &address, config.port).await?;

    let result = run(&session, cli.command).await;
    session.disconnect().await;
    result
}

/// Try the configured channel first, then the other common one.
async fn connect(session: &mut Session, address: &str, port: u8) -> Result<()> {
    let alt = if port == 16 { 1 } else { 16 };
    for channel in [port, alt] {
        match session.connect(address, channel).await {
            Ok(()) => {
                info!("Using {} on RFCOMM channel {}", address, channel);
                return Ok(());
            }
            Err(e) => warn!("RFCOMM channel {} failed: {}", channel, e),
        }
    }
    bail!("No RFCOMM channel worked (tried {:?})", [port, alt])
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn answered<T>(value: Option<T>, what: &str) -> Result<T> {
    value.with_context(|| format!("Device did not report {}", what))
}

async fn run(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Info => print_json(&answered(session.device_info().await, "device info")?),
        Command::Battery => print_json(&answered(session.battery().await, "battery")?),
        Command::Anc => print_json(&answered(session.anc_status().await, "ANC status")?),
        Command::Gestures => print_json(&answered(
            session.gesture_settings().await,
            "gesture settings",
        )?),
        Command::Equalizer => print_json(&answered(
            session.equalizer_info().await,
            "equalizer settings",
        )?),
        Command::Settings => print_json(&Settings {
            wear_detection: session.wear_detection().await,
            low_latency: session.low_latency().await,
            sound_quality: session.sound_quality_preference().await,
            dual_connect_enabled: session.dual_connect_enabled().await,
        }),
        Command::Peers => print_json(&session.dual_connect_devices().await),
        Command::Watch { seconds } => watch(session, seconds.map(Duration::from_secs)).await,
        Command::SetAncMode { mode } => Ok(session.set_anc_mode(mode)?),
        Command::SetAncLevel { level } => Ok(session.set_anc_level(level)?),
        Command::SetWearDetection { enabled } => Ok(session.set_wear_detection(enabled)?),
        Command::SetLowLatency { enabled } => Ok(session.set_low_latency(enabled)?),
        Command::SetSoundQuality { preference } => {
            Ok(session.set_sound_quality_preference(preference)?)
        }
        Command::SetDoubleTap { side, action } => Ok(session.set_double_tap_action(side, action)?),
        Command::SetTripleTap { side, action } => Ok(session.set_triple_tap_action(side, action)?),
        Command::SetLongTap { side, action } => Ok(session.set_long_tap_action(side, action)?),
        Command::SetAncCycle { side, cycle } => Ok(session.set_long_tap_anc_cycle(side, cycle)?),
        Command::SetInCallTap { action } => Ok(session.set_in_call_double_tap_action(action)?),
        Command::SetSwipe { action } => Ok(session.set_swipe_action(action)?),
        Command::SetEqPreset { id } => Ok(session.set_equalizer_preset(id)?),
        Command::SetCustomEq { id, name, values } => {
            Ok(session.create_or_update_custom_equalizer(&CustomEqPreset { id, name, values })?)
        }
        Command::DeleteCustomEq { id } => {
            let info = answered(session.equalizer_info().await, "equalizer settings")?;
            let Some(preset) = info.custom_presets.into_iter().find(|p| p.id == id) else {
                bail!("No custom preset with id {}", id);
            };
            Ok(session.delete_custom_equalizer(&preset)?)
        }
        Command::AddEqTemplate { template, id } => {
            Ok(session.create_equalizer_from_template(template, id)?)
        }
        Command::SetDualConnect { enabled } => Ok(session.set_dual_connect_enabled(enabled)?),
        Command::SetPreferred { mac } => Ok(session.set_dual_connect_preferred(&mac)?),
        Command::Peer { mac, action } => Ok(session.dual_connect_action(&mac, action)?),
    }
}

async fn watch(session: &Session, limit: Option<Duration>) -> Result<()> {
    let mut events = session.notifications();
    let deadline = tokio::time::sleep(limit.unwrap_or(Duration::MAX));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
