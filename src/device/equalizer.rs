use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::parse_name;
use crate::error::{Error, Result};
use crate::protocol::commands::*;
use crate::protocol::Frame;

/// Bands in a custom preset.
pub const EQ_BANDS: usize = 10;
/// Largest absolute band value the device accepts.
pub const EQ_VALUE_LIMIT: i8 = 60;

/// Known built-in EQ presets.
pub fn builtin_preset_name(id: u8) -> Option<&'static str> {
    match id {
        1 => Some("default"),
        2 => Some("hardbass"),
        3 => Some("treble"),
        9 => Some("voices"),
        _ => None,
    }
}

/// A user-defined equalizer curve stored on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomEqPreset {
    pub id: u8,
    pub name: String,
    pub values: Vec<i8>,
}

impl CustomEqPreset {
    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(Error::invalid("custom EQ id must be non-zero"));
        }
        if self.name.is_empty() || self.name.len() > u8::MAX as usize {
            return Err(Error::invalid(format!(
                "custom EQ name must be 1-255 bytes, got {}",
                self.name.len()
            )));
        }
        if self.values.len() != EQ_BANDS {
            return Err(Error::invalid(format!(
                "custom EQ needs {} values, got {}",
                EQ_BANDS,
                self.values.len()
            )));
        }
        if let Some(v) = self
            .values
            .iter()
            .find(|v| !(-EQ_VALUE_LIMIT..=EQ_VALUE_LIMIT).contains(*v))
        {
            return Err(Error::invalid(format!(
                "EQ value {} outside [-{limit}, {limit}]",
                v,
                limit = EQ_VALUE_LIMIT
            )));
        }
        Ok(())
    }
}

/// Whether a custom preset write stores or removes the preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqAction {
    CreateOrUpdate,
    Delete,
}

impl EqAction {
    pub fn code(self) -> u8 {
        match self {
            Self::CreateOrUpdate => 1,
            Self::Delete => 2,
        }
    }
}

/// Factory curves that can be installed as a custom preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EqTemplate {
    Symphony,
    HiFiLive,
}

impl EqTemplate {
    pub const ALL: [EqTemplate; 2] = [Self::Symphony, Self::HiFiLive];

    pub fn values(self) -> [i8; EQ_BANDS] {
        match self {
            Self::Symphony => [15, 15, 10, -5, 15, 25, 15, -5, 50, 45],
            Self::HiFiLive => [-5, 20, 30, 10, 0, 0, -25, -10, 10, 0],
        }
    }

    /// Name the preset is stored under.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Symphony => "Symphony",
            Self::HiFiLive => "Hi-Fi Live",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Symphony => "symphony",
            Self::HiFiLive => "hi_fi_live",
        }
    }

    pub fn preset(self, id: u8) -> CustomEqPreset {
        CustomEqPreset {
            id,
            name: self.display_name().to_string(),
            values: self.values().to_vec(),
        }
    }
}

impl fmt::Display for EqTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EqTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "EQ template")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EqualizerInfo {
    pub current_preset_id: Option<u8>,
    /// Built-in or custom name of the current preset, when known.
    pub current_preset_name: Option<String>,
    pub built_in_preset_ids: Vec<u8>,
    pub custom_presets: Vec<CustomEqPreset>,
}

impl EqualizerInfo {
    pub fn from_frame(frame: &Frame) -> Self {
        let current_preset_id = frame.find_param(2).first().copied();
        let custom_presets = parse_custom_presets(frame.find_param(8));
        let current_preset_name = current_preset_id.and_then(|id| {
            custom_presets
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .or_else(|| builtin_preset_name(id).map(str::to_string))
        });
        Self {
            current_preset_id,
            current_preset_name,
            built_in_preset_ids: frame.find_param(3).to_vec(),
            custom_presets,
        }
    }
}

/// Decode the custom preset blob: repeated `id | count | values | name NUL`.
///
/// Stops at the first record whose header or values run past the blob.
/// Records with id 0 or an empty name are placeholders and are skipped.
pub fn parse_custom_presets(blob: &[u8]) -> Vec<CustomEqPreset> {
    let mut presets = Vec::new();
    let mut pos = 0;

    while pos + 2 <= blob.len() {
        let id = blob[pos];
        let count = blob[pos + 1] as usize;
        let name_start = pos + 2 + count;
        if name_start > blob.len() {
            break;
        }

        let values = blob[pos + 2..name_start].iter().map(|&b| b as i8).collect();
        let name_len = blob[name_start..]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(blob.len() - name_start);
        let name = String::from_utf8_lossy(&blob[name_start..name_start + name_len]).into_owned();

        if id != 0 && !name.is_empty() {
            presets.push(CustomEqPreset { id, name, values });
        }
        pos = name_start + name_len + 1;
    }

    presets
}

pub fn read_request() -> Frame {
    Frame::read_request(CMD_EQUALIZER_READ, &[2, 3, 8])
}

pub fn preset_request(id: u8) -> Frame {
    Frame::write_request(CMD_EQUALIZER_WRITE, &[(1, vec![id])])
}

/// Full custom preset payload. Deletes carry the same fields as creates.
pub fn custom_request(preset: &CustomEqPreset, action: EqAction) -> Result<Frame> {
    preset.validate()?;
    Ok(Frame::write_request(
        CMD_EQUALIZER_WRITE,
        &[
            (1, vec![preset.id]),
            (2, vec![EQ_BANDS as u8]),
            (3, preset.values.iter().map(|&v| v as u8).collect()),
            (4, preset.name.as_bytes().to_vec()),
            (5, vec![action.code()]),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u8, values: &[i8], name: &str) -> Vec<u8> {
        let mut out = vec![id, values.len() as u8];
        out.extend(values.iter().map(|&v| v as u8));
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out
    }

    fn preset(values: Vec<i8>) -> CustomEqPreset {
        CustomEqPreset {
            id: 5,
            name: "Mine".into(),
            values,
        }
    }

    #[test]
    fn test_parse_blob_skips_placeholders() {
        let mut blob = record(5, &[1, -2, 3, 0, 0, 0, 0, 0, 0, 60], "Rock");
        blob.extend(record(0, &[0; 10], "Empty"));
        blob.extend(record(6, &[-60; 10], "Quiet"));
        blob.extend(record(7, &[0; 10], ""));

        let presets = parse_custom_presets(&blob);
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].id, 5);
        assert_eq!(presets[0].name, "Rock");
        assert_eq!(presets[0].values[1], -2);
        assert_eq!(presets[1].id, 6);
        assert_eq!(presets[1].values, vec![-60; 10]);
    }

    #[test]
    fn test_parse_blob_stops_on_overflow() {
        let mut blob = record(5, &[0; 10], "Rock");
        // Claims 10 values but only 3 follow
        blob.extend_from_slice(&[6, 10, 1, 2, 3]);
        let presets = parse_custom_presets(&blob);
        assert_eq!(presets.len(), 1);

        assert!(parse_custom_presets(&[5]).is_empty());
        assert!(parse_custom_presets(&[]).is_empty());
    }

    #[test]
    fn test_parse_unterminated_name() {
        let blob = [5, 1, 10, b'A', b'b'];
        let presets = parse_custom_presets(&blob);
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].name, "Ab");
    }

    #[test]
    fn test_info_from_frame() {
        let frame = Frame::write_request(
            CMD_EQUALIZER_READ,
            &[
                (2, vec![3]),
                (3, vec![1, 2, 3, 9]),
                (8, record(5, &[0; 10], "Flat")),
            ],
        );
        let info = EqualizerInfo::from_frame(&frame);
        assert_eq!(info.current_preset_id, Some(3));
        assert_eq!(info.current_preset_name.as_deref(), Some("treble"));
        assert_eq!(info.built_in_preset_ids, vec![1, 2, 3, 9]);
        assert_eq!(info.custom_presets.len(), 1);
    }

    #[test]
    fn test_current_preset_name() {
        let custom = |current: u8| {
            Frame::write_request(
                CMD_EQUALIZER_READ,
                &[(2, vec![current]), (8, record(5, &[0; 10], "Flat"))],
            )
        };
        assert_eq!(
            EqualizerInfo::from_frame(&custom(5)).current_preset_name.as_deref(),
            Some("Flat")
        );
        assert_eq!(
            EqualizerInfo::from_frame(&custom(9)).current_preset_name.as_deref(),
            Some("voices")
        );
        assert_eq!(EqualizerInfo::from_frame(&custom(4)).current_preset_name, None);
        assert_eq!(
            EqualizerInfo::from_frame(&Frame::new(CMD_EQUALIZER_READ)).current_preset_name,
            None
        );
    }

    #[test]
    fn test_validation() {
        assert!(preset(vec![0; 10]).validate().is_ok());
        assert!(preset(vec![60, -60, 0, 0, 0, 0, 0, 0, 0, 0]).validate().is_ok());
        assert!(preset(vec![0; 9]).validate().is_err());
        assert!(preset(vec![0; 11]).validate().is_err());
        assert!(preset(vec![61, 0, 0, 0, 0, 0, 0, 0, 0, 0]).validate().is_err());
        assert!(preset(vec![-61, 0, 0, 0, 0, 0, 0, 0, 0, 0]).validate().is_err());
        assert!(preset(vec![i8::MIN, 0, 0, 0, 0, 0, 0, 0, 0, 0]).validate().is_err());

        let mut bad = preset(vec![0; 10]);
        bad.id = 0;
        assert!(bad.validate().is_err());
        let mut bad = preset(vec![0; 10]);
        bad.name.clear();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_custom_write_payload() {
        let preset = preset(vec![-5, 0, 5, 0, 0, 0, 0, 0, 0, 10]);
        let frame = custom_request(&preset, EqAction::CreateOrUpdate).unwrap();
        assert_eq!(frame.command_id, CMD_EQUALIZER_WRITE);
        assert_eq!(frame.find_param(1), &[5]);
        assert_eq!(frame.find_param(2), &[10]);
        assert_eq!(frame.find_param(3)[0], 0xFB);
        assert_eq!(frame.find_param(4), b"Mine");
        assert_eq!(frame.find_param(5), &[1]);

        let frame = custom_request(&preset, EqAction::Delete).unwrap();
        assert_eq!(frame.find_param(5), &[2]);
        assert_eq!(frame.find_param(3).len(), 10);
    }

    #[test]
    fn test_templates() {
        let symphony = EqTemplate::Symphony.preset(4);
        assert_eq!(symphony.values, vec![15, 15, 10, -5, 15, 25, 15, -5, 50, 45]);
        assert_eq!(symphony.name, "Symphony");
        assert!(symphony.validate().is_ok());

        let live = EqTemplate::HiFiLive.preset(5);
        assert_eq!(live.values, vec![-5, 20, 30, 10, 0, 0, -25, -10, 10, 0]);
        assert_eq!(live.name, "Hi-Fi Live");
        assert_eq!("hi_fi_live".parse::<EqTemplate>().unwrap(), EqTemplate::HiFiLive);
    }
}
