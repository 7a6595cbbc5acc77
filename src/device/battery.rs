use serde::Serialize;

use crate::protocol::commands::*;
use crate::protocol::Frame;

/// Battery levels and charging state.
///
/// The same layout arrives in read responses and in unsolicited
/// battery notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatteryInfo {
    /// Overall percentage (param 1).
    pub global: Option<u8>,
    pub left: Option<u8>,
    pub right: Option<u8>,
    pub case: Option<u8>,
    pub left_charging: bool,
    pub right_charging: bool,
    pub case_charging: bool,
}

impl BatteryInfo {
    pub fn from_frame(frame: &Frame) -> Self {
        let mut info = Self::default();

        if let Some(&global) = frame.find_param(1).first() {
            info.global = Some(global);
        }

        // Param 2: [left, right, case]
        if let &[left, right, case, ..] = frame.find_param(2) {
            info.left = Some(left);
            info.right = Some(right);
            info.case = Some(case);
        }

        // Param 3: charging flags [case, left, right]
        if let &[case, left, right, ..] = frame.find_param(3) {
            info.case_charging = case == 1;
            info.left_charging = left == 1;
            info.right_charging = right == 1;
        }

        info
    }
}

pub fn read_request() -> Frame {
    Frame::read_request(CMD_BATTERY_READ, &[1, 2, 3])
}
