//! Single-toggle device settings: wear detection, low latency and the
//! sound quality / connection trade-off.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::parse_name;
use crate::error::{Error, Result};
use crate::protocol::commands::*;
use crate::protocol::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundQualityPreference {
    PrioritizeConnection,
    PrioritizeQuality,
}

impl SoundQualityPreference {
    pub const ALL: [SoundQualityPreference; 2] =
        [Self::PrioritizeConnection, Self::PrioritizeQuality];

    pub fn code(self) -> u8 {
        match self {
            Self::PrioritizeConnection => 0,
            Self::PrioritizeQuality => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrioritizeConnection => "connection",
            Self::PrioritizeQuality => "quality",
        }
    }
}

impl fmt::Display for SoundQualityPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundQualityPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "sound quality preference")
    }
}

fn flag(frame: &Frame, key: u8) -> Option<bool> {
    frame.find_param(key).first().map(|&b| b == 1)
}

fn toggle(command: CommandId, enabled: bool) -> Frame {
    Frame::write_request(command, &[(1, vec![enabled as u8])])
}

pub fn wear_detection_read_request() -> Frame {
    Frame::read_request(CMD_AUTO_PAUSE_READ, &[1])
}

pub fn parse_wear_detection(frame: &Frame) -> Option<bool> {
    flag(frame, 1)
}

pub fn wear_detection_request(enabled: bool) -> Frame {
    toggle(CMD_AUTO_PAUSE_WRITE, enabled)
}

pub fn low_latency_read_request() -> Frame {
    Frame::read_request(CMD_LOW_LATENCY, &[2])
}

pub fn parse_low_latency(frame: &Frame) -> Option<bool> {
    flag(frame, 2)
}

pub fn low_latency_request(enabled: bool) -> Frame {
    toggle(CMD_LOW_LATENCY, enabled)
}

/// Asks for key 1; the device answers on key 2.
pub fn sound_quality_read_request() -> Frame {
    Frame::read_request(CMD_SOUND_QUALITY_READ, &[1])
}

pub fn parse_sound_quality(frame: &Frame) -> Option<SoundQualityPreference> {
    flag(frame, 2).map(|quality| {
        if quality {
            SoundQualityPreference::PrioritizeQuality
        } else {
            SoundQualityPreference::PrioritizeConnection
        }
    })
}

pub fn sound_quality_request(preference: SoundQualityPreference) -> Frame {
    Frame::write_request(CMD_SOUND_QUALITY_WRITE, &[(1, vec![preference.code()])])
}

pub fn parse_dual_connect_enabled(frame: &Frame) -> Option<bool> {
    flag(frame, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles() {
        let frame = wear_detection_request(true);
        assert_eq!(frame.command_id, CMD_AUTO_PAUSE_WRITE);
        assert_eq!(frame.find_param(1), &[1]);

        let frame = low_latency_request(false);
        assert_eq!(frame.command_id, CMD_LOW_LATENCY);
        assert_eq!(frame.find_param(1), &[0]);
    }

    #[test]
    fn test_parse_flags() {
        let frame = Frame::write_request(CMD_AUTO_PAUSE_READ, &[(1, vec![1])]);
        assert_eq!(parse_wear_detection(&frame), Some(true));

        // Low latency answers on key 2 and ignores key 1
        let frame = Frame::write_request(CMD_LOW_LATENCY, &[(1, vec![1]), (2, vec![0])]);
        assert_eq!(parse_low_latency(&frame), Some(false));
        assert_eq!(parse_low_latency(&Frame::new(CMD_LOW_LATENCY)), None);
    }

    #[test]
    fn test_sound_quality() {
        let frame = Frame::write_request(CMD_SOUND_QUALITY_READ, &[(2, vec![1])]);
        assert_eq!(
            parse_sound_quality(&frame),
            Some(SoundQualityPreference::PrioritizeQuality)
        );
        let frame = Frame::write_request(CMD_SOUND_QUALITY_READ, &[(2, vec![3])]);
        assert_eq!(
            parse_sound_quality(&frame),
            Some(SoundQualityPreference::PrioritizeConnection)
        );
        let frame = Frame::write_request(CMD_SOUND_QUALITY_READ, &[(1, vec![1])]);
        assert_eq!(parse_sound_quality(&frame), None);

        let frame = sound_quality_request(SoundQualityPreference::PrioritizeQuality);
        assert_eq!(frame.command_id, CMD_SOUND_QUALITY_WRITE);
        assert_eq!(frame.find_param(1), &[1]);
        assert_eq!(
            "connection".parse::<SoundQualityPreference>().unwrap(),
            SoundQualityPreference::PrioritizeConnection
        );
    }
}
