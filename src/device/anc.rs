use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::parse_name;
use crate::error::{Error, Result};
use crate::protocol::commands::*;
use crate::protocol::Frame;

/// ANC mode values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AncMode {
    Normal,
    Cancellation,
    Awareness,
}

impl AncMode {
    pub const ALL: [AncMode; 3] = [Self::Normal, Self::Cancellation, Self::Awareness];

    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Cancellation => 1,
            Self::Awareness => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Cancellation => "cancellation",
            Self::Awareness => "awareness",
        }
    }
}

impl fmt::Display for AncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AncMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "ANC mode")
    }
}

/// Cancellation and awareness strengths. Each belongs to exactly one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AncLevel {
    Comfortable,
    NormalCancellation,
    Ultra,
    Dynamic,
    VoiceBoost,
    NormalAwareness,
}

impl AncLevel {
    pub const ALL: [AncLevel; 6] = [
        Self::Comfortable,
        Self::NormalCancellation,
        Self::Ultra,
        Self::Dynamic,
        Self::VoiceBoost,
        Self::NormalAwareness,
    ];

    /// (owning mode, level code)
    fn entry(self) -> (AncMode, u8) {
        match self {
            Self::Comfortable => (AncMode::Cancellation, 1),
            Self::NormalCancellation => (AncMode::Cancellation, 0),
            Self::Ultra => (AncMode::Cancellation, 2),
            Self::Dynamic => (AncMode::Cancellation, 3),
            Self::VoiceBoost => (AncMode::Awareness, 1),
            Self::NormalAwareness => (AncMode::Awareness, 2),
        }
    }

    /// Mode this level is a setting of.
    pub fn mode(self) -> AncMode {
        self.entry().0
    }

    pub fn code(self) -> u8 {
        self.entry().1
    }

    /// Inverse of (`mode`, `code`). `None` for normal mode or unknown codes.
    pub fn from_codes(mode: AncMode, code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.entry() == (mode, code))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comfortable => "comfortable",
            Self::NormalCancellation => "normal_cancellation",
            Self::Ultra => "ultra",
            Self::Dynamic => "dynamic",
            Self::VoiceBoost => "voice_boost",
            Self::NormalAwareness => "normal_awareness",
        }
    }
}

impl fmt::Display for AncLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AncLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "ANC level")
    }
}

/// Current noise-control state. `None` fields hold codes this crate does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AncStatus {
    pub mode: Option<AncMode>,
    pub level: Option<AncLevel>,
}

impl AncStatus {
    /// Key 1 is `[level_code, mode_code]`; anything else leaves both unknown.
    pub fn from_frame(frame: &Frame) -> Self {
        let &[level_code, mode_code] = frame.find_param(1) else {
            return Self::default();
        };
        let mode = AncMode::from_code(mode_code);
        Self {
            mode,
            level: mode.and_then(|m| AncLevel::from_codes(m, level_code)),
        }
    }
}

pub fn read_request() -> Frame {
    Frame::read_request(CMD_ANC_READ, &[1])
}

pub fn mode_request(mode: AncMode) -> Frame {
    Frame::write_request(CMD_ANC_WRITE, &[(1, vec![mode.code(), 0xFF])])
}

pub fn level_request(level: AncLevel) -> Frame {
    Frame::write_request(CMD_ANC_WRITE, &[(1, vec![level.mode().code(), level.code()])])
}
