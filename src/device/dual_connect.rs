use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::parse_name;
use crate::error::{Error, Result};
use crate::protocol::commands::*;
use crate::protocol::Frame;

/// Operations on a remembered dual-connect peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DualConnectAction {
    Connect,
    Disconnect,
    Unpair,
    EnableAutoConnect,
    DisableAutoConnect,
}

impl DualConnectAction {
    pub const ALL: [DualConnectAction; 5] = [
        Self::Connect,
        Self::Disconnect,
        Self::Unpair,
        Self::EnableAutoConnect,
        Self::DisableAutoConnect,
    ];

    /// Parameter key of the execute command.
    pub fn code(self) -> u8 {
        match self {
            Self::Connect => 1,
            Self::Disconnect => 2,
            Self::Unpair => 3,
            Self::EnableAutoConnect => 4,
            Self::DisableAutoConnect => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Unpair => "unpair",
            Self::EnableAutoConnect => "enable_auto_connect",
            Self::DisableAutoConnect => "disable_auto_connect",
        }
    }
}

impl fmt::Display for DualConnectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DualConnectAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "dual-connect action")
    }
}

/// One peer the earbuds remember for dual connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DualConnectDevice {
    pub mac_address: String,
    pub name: String,
    pub connected: bool,
    pub playing: bool,
    pub preferred: bool,
    pub auto_connect: bool,
}

impl DualConnectDevice {
    pub fn from_frame(frame: &Frame) -> Self {
        let name: Vec<u8> = frame
            .find_param(9)
            .iter()
            .copied()
            .take_while(|&b| b != 0)
            .collect();
        // Param 5: connection state, 9 while streaming
        let state = frame.find_param(5).first().copied();

        Self {
            mac_address: format_mac(frame.find_param(4)),
            name: String::from_utf8_lossy(&name).into_owned(),
            connected: state.is_some_and(|s| s > 0),
            playing: state == Some(9),
            preferred: frame.find_param(7).first() == Some(&1),
            auto_connect: frame.find_param(8).first() == Some(&1),
        }
    }
}

/// Lowercase colon-separated hex.
pub fn format_mac(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Parse 12 hex digits, optionally separated by `:` or `-`.
pub fn parse_mac(s: &str) -> Result<[u8; 6]> {
    let digits: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::invalid(format!("bad MAC address '{}'", s)));
    }
    let mut mac = [0u8; 6];
    for (i, byte) in mac.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| Error::invalid(format!("bad MAC address '{}'", s)))?;
    }
    Ok(mac)
}

pub fn enumerate_request() -> Frame {
    Frame::read_request(CMD_DUAL_CONNECT_ENUMERATE, &[1])
}

pub fn enabled_read_request() -> Frame {
    Frame::read_request(CMD_DUAL_CONNECT_ENABLED_READ, &[1])
}

pub fn enabled_request(enabled: bool) -> Frame {
    Frame::write_request(CMD_DUAL_CONNECT_ENABLED_WRITE, &[(1, vec![enabled as u8])])
}

pub fn preferred_request(mac: &str) -> Result<Frame> {
    let mac = parse_mac(mac)?;
    Ok(Frame::write_request(
        CMD_DUAL_CONNECT_PREFERRED_WRITE,
        &[(1, mac.to_vec())],
    ))
}

pub fn action_request(mac: &str, action: DualConnectAction) -> Result<Frame> {
    let mac = parse_mac(mac)?;
    Ok(Frame::write_request(
        CMD_DUAL_CONNECT_EXECUTE,
        &[(action.code(), mac.to_vec())],
    ))
}
