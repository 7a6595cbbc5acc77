use serde::Serialize;

use crate::protocol::commands::*;
use crate::protocol::Frame;

/// Model, firmware and serial numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub model: Option<String>,
    pub sub_model: Option<String>,
    pub firmware_version: Option<String>,
    pub serial_number: Option<String>,
    pub left_serial_number: Option<String>,
    pub right_serial_number: Option<String>,
}

fn text(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

impl DeviceInfo {
    pub fn from_frame(frame: &Frame) -> Self {
        let mut info = Self {
            model: frame.param(15).map(text),
            sub_model: frame.param(10).map(text),
            firmware_version: frame.param(7).map(text),
            serial_number: frame.param(9).map(text),
            ..Default::default()
        };

        // Per-earphone serial numbers: "L-xxxx,R-yyyy"
        if let Some(value) = frame.param(24) {
            let value = text(value);
            if let Some((left, right)) = value.split_once(',') {
                info.left_serial_number = left.strip_prefix("L-").map(str::to_string);
                info.right_serial_number = right.strip_prefix("R-").map(str::to_string);
            }
        }

        info
    }
}

pub fn read_request() -> Frame {
    Frame::read_request(CMD_DEVICE_INFO, &[7, 9, 10, 15, 24])
}
