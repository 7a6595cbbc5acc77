use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::parse_name;
use crate::error::{Error, Result};
use crate::protocol::commands::*;
use crate::protocol::Frame;

/// What an earbud gesture does.
///
/// The wire code depends on the gesture: `0` means voice assistant for taps,
/// change volume for swipes and answer call during a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureAction {
    PlayPause,
    NextTrack,
    PreviousTrack,
    VoiceAssistant,
    ChangeVolume,
    SwitchAnc,
    AnswerCall,
    Off,
}

/// Which gesture an action is being assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureContext {
    /// Double and triple tap outside calls.
    Tap,
    LongTap,
    Swipe,
    /// Double tap during a call.
    InCall,
}

impl GestureContext {
    /// Actions the device accepts for this gesture.
    pub fn actions(self) -> &'static [GestureAction] {
        use GestureAction::*;
        match self {
            Self::Tap => &[PlayPause, NextTrack, PreviousTrack, VoiceAssistant, Off],
            Self::LongTap => &[SwitchAnc, Off],
            Self::Swipe => &[ChangeVolume, Off],
            Self::InCall => &[AnswerCall, Off],
        }
    }
}

impl GestureAction {
    pub const ALL: [GestureAction; 8] = [
        Self::PlayPause,
        Self::NextTrack,
        Self::PreviousTrack,
        Self::VoiceAssistant,
        Self::ChangeVolume,
        Self::SwitchAnc,
        Self::AnswerCall,
        Self::Off,
    ];

    fn code(self) -> i8 {
        match self {
            Self::PlayPause => 1,
            Self::NextTrack => 2,
            Self::PreviousTrack => 7,
            Self::VoiceAssistant => 0,
            Self::ChangeVolume => 0,
            Self::SwitchAnc => 10,
            Self::AnswerCall => 0,
            Self::Off => -1,
        }
    }

    /// Wire code for this action, if `context` allows it.
    pub fn code_in(self, context: GestureContext) -> Option<i8> {
        context.actions().contains(&self).then(|| self.code())
    }

    /// Inverse of [`GestureAction::code_in`].
    pub fn from_code(context: GestureContext, code: i8) -> Option<Self> {
        context
            .actions()
            .iter()
            .copied()
            .find(|a| a.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlayPause => "play_pause",
            Self::NextTrack => "next_track",
            Self::PreviousTrack => "previous_track",
            Self::VoiceAssistant => "voice_assistant",
            Self::ChangeVolume => "change_volume",
            Self::SwitchAnc => "switch_anc",
            Self::AnswerCall => "answer_call",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for GestureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "gesture action")
    }
}

/// Which earbud a gesture setting targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EarSide {
    Left,
    Right,
    Both,
}

impl EarSide {
    pub const ALL: [EarSide; 3] = [Self::Left, Self::Right, Self::Both];

    /// Parameter key carrying this ear's setting. Per-ear gestures cannot target both.
    pub fn key(self) -> Result<u8> {
        match self {
            Self::Left => Ok(1),
            Self::Right => Ok(2),
            Self::Both => Err(Error::invalid("gesture must target a single ear")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for EarSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EarSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "ear side")
    }
}

/// Modes a long tap cycles through when set to switch ANC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AncCycle {
    OffOn,
    OffOnAwareness,
    OnAwareness,
    OffAwareness,
}

impl AncCycle {
    pub const ALL: [AncCycle; 4] = [
        Self::OffOn,
        Self::OffOnAwareness,
        Self::OnAwareness,
        Self::OffAwareness,
    ];

    pub fn code(self) -> u8 {
        match self {
            Self::OffOn => 1,
            Self::OffOnAwareness => 2,
            Self::OnAwareness => 3,
            Self::OffAwareness => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OffOn => "off_on",
            Self::OffOnAwareness => "off_on_awareness",
            Self::OnAwareness => "on_awareness",
            Self::OffAwareness => "off_awareness",
        }
    }
}

impl fmt::Display for AncCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AncCycle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_name(&Self::ALL, s, "ANC cycle")
    }
}

/// Every gesture assignment. `None` means not reported or an unknown code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GestureSettings {
    pub double_tap_left: Option<GestureAction>,
    pub double_tap_right: Option<GestureAction>,
    pub double_tap_in_call: Option<GestureAction>,
    pub triple_tap_left: Option<GestureAction>,
    pub triple_tap_right: Option<GestureAction>,
    pub long_tap_left: Option<GestureAction>,
    pub long_tap_right: Option<GestureAction>,
    pub long_tap_anc_cycle_left: Option<AncCycle>,
    pub long_tap_anc_cycle_right: Option<AncCycle>,
    pub swipe: Option<GestureAction>,
}

fn action_at(frame: &Frame, key: u8, context: GestureContext) -> Option<GestureAction> {
    let &code = frame.find_param(key).first()?;
    GestureAction::from_code(context, code as i8)
}

fn cycle_at(frame: &Frame, key: u8) -> Option<AncCycle> {
    AncCycle::from_code(*frame.find_param(key).first()?)
}

impl GestureSettings {
    /// Merge one gesture read response, chosen by its command id.
    pub fn apply(&mut self, frame: &Frame) {
        use GestureContext::*;
        match frame.command_id {
            CMD_DUAL_TAP_READ => {
                self.double_tap_left = action_at(frame, 1, Tap);
                self.double_tap_right = action_at(frame, 2, Tap);
                self.double_tap_in_call = action_at(frame, 4, InCall);
            }
            CMD_TRIPLE_TAP_READ => {
                self.triple_tap_left = action_at(frame, 1, Tap);
                self.triple_tap_right = action_at(frame, 2, Tap);
            }
            CMD_LONG_TAP_SPLIT_READ_BASE => {
                self.long_tap_left = action_at(frame, 1, LongTap);
                self.long_tap_right = action_at(frame, 2, LongTap);
            }
            CMD_LONG_TAP_SPLIT_READ_ANC => {
                self.long_tap_anc_cycle_left = cycle_at(frame, 1);
                self.long_tap_anc_cycle_right = cycle_at(frame, 2);
            }
            CMD_SWIPE_READ => {
                // Any non-zero code reads as off
                self.swipe = frame.find_param(1).first().map(|&code| match code {
                    0 => GestureAction::ChangeVolume,
                    _ => GestureAction::Off,
                });
            }
            other => tracing::debug!("Not a gesture response: {:04X}", other),
        }
    }
}

/// The five reads that together fill [`GestureSettings`].
pub fn read_requests() -> [Frame; 5] {
    [
        Frame::read_request(CMD_DUAL_TAP_READ, &[1, 2, 4]),
        Frame::read_request(CMD_TRIPLE_TAP_READ, &[1, 2]),
        Frame::read_request(CMD_LONG_TAP_SPLIT_READ_BASE, &[1, 2]),
        Frame::read_request(CMD_LONG_TAP_SPLIT_READ_ANC, &[1, 2]),
        Frame::read_request(CMD_SWIPE_READ, &[1]),
    ]
}

fn action_code(action: GestureAction, context: GestureContext) -> Result<u8> {
    action
        .code_in(context)
        .map(|code| code as u8)
        .ok_or_else(|| Error::invalid(format!("{} is not valid for this gesture", action)))
}

fn per_ear(
    command: CommandId,
    side: EarSide,
    action: GestureAction,
    context: GestureContext,
) -> Result<Frame> {
    let key = side.key()?;
    let code = action_code(action, context)?;
    Ok(Frame::write_request(command, &[(key, vec![code])]))
}

pub fn double_tap_request(side: EarSide, action: GestureAction) -> Result<Frame> {
    per_ear(CMD_DUAL_TAP_WRITE, side, action, GestureContext::Tap)
}

pub fn triple_tap_request(side: EarSide, action: GestureAction) -> Result<Frame> {
    per_ear(CMD_TRIPLE_TAP_WRITE, side, action, GestureContext::Tap)
}

pub fn long_tap_request(side: EarSide, action: GestureAction) -> Result<Frame> {
    per_ear(CMD_LONG_TAP_SPLIT_WRITE_BASE, side, action, GestureContext::LongTap)
}

pub fn in_call_double_tap_request(action: GestureAction) -> Result<Frame> {
    let code = action_code(action, GestureContext::InCall)?;
    Ok(Frame::write_request(CMD_DUAL_TAP_WRITE, &[(4, vec![code])]))
}

pub fn long_tap_anc_cycle_request(side: EarSide, cycle: AncCycle) -> Result<Frame> {
    let key = side.key()?;
    Ok(Frame::write_request(
        CMD_LONG_TAP_SPLIT_WRITE_ANC,
        &[(key, vec![cycle.code()])],
    ))
}

/// Swipe is not per-ear: both keys carry the same code.
pub fn swipe_request(action: GestureAction) -> Result<Frame> {
    let code = action_code(action, GestureContext::Swipe)?;
    Ok(Frame::write_request(
        CMD_SWIPE_WRITE,
        &[(1, vec![code]), (2, vec![code])],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use GestureAction::*;

    const CONTEXTS: [GestureContext; 4] = [
        GestureContext::Tap,
        GestureContext::LongTap,
        GestureContext::Swipe,
        GestureContext::InCall,
    ];

    #[test]
    fn test_codes_invert_per_context() {
        for context in CONTEXTS {
            for &action in context.actions() {
                let code = action.code_in(context).unwrap();
                assert_eq!(GestureAction::from_code(context, code), Some(action));
            }
        }
    }

    #[test]
    fn test_action_codes() {
        use GestureContext::*;
        assert_eq!(PlayPause.code_in(Tap), Some(1));
        assert_eq!(NextTrack.code_in(Tap), Some(2));
        assert_eq!(PreviousTrack.code_in(Tap), Some(7));
        assert_eq!(VoiceAssistant.code_in(Tap), Some(0));
        assert_eq!(Off.code_in(Tap), Some(-1));
        assert_eq!(SwitchAnc.code_in(LongTap), Some(10));
        assert_eq!(ChangeVolume.code_in(Swipe), Some(0));
        assert_eq!(AnswerCall.code_in(InCall), Some(0));
        assert_eq!(SwitchAnc.code_in(Tap), None);
        assert_eq!(PlayPause.code_in(Swipe), None);
    }

    #[test]
    fn test_cycle_codes_invert() {
        for cycle in AncCycle::ALL {
            assert_eq!(AncCycle::from_code(cycle.code()), Some(cycle));
        }
        assert_eq!(AncCycle::from_code(0), None);
        assert_eq!(AncCycle::from_code(5), None);
    }

    #[test]
    fn test_double_tap_write() {
        let frame = double_tap_request(EarSide::Left, PlayPause).unwrap();
        assert_eq!(frame.command_id, CMD_DUAL_TAP_WRITE);
        assert_eq!(frame.find_param(1), &[1]);
        assert_eq!(frame.parameters.len(), 1);

        let frame = double_tap_request(EarSide::Right, Off).unwrap();
        assert_eq!(frame.find_param(2), &[0xFF]);
    }

    #[test]
    fn test_both_ears_rejected() {
        assert!(matches!(
            double_tap_request(EarSide::Both, PlayPause),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            long_tap_anc_cycle_request(EarSide::Both, AncCycle::OffOn),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_context_mismatch_rejected() {
        assert!(long_tap_request(EarSide::Left, NextTrack).is_err());
        assert!(triple_tap_request(EarSide::Left, SwitchAnc).is_err());
        assert!(swipe_request(PlayPause).is_err());
        assert!(in_call_double_tap_request(VoiceAssistant).is_err());
    }

    #[test]
    fn test_other_writes() {
        let frame = long_tap_request(EarSide::Right, SwitchAnc).unwrap();
        assert_eq!(frame.command_id, CMD_LONG_TAP_SPLIT_WRITE_BASE);
        assert_eq!(frame.find_param(2), &[10]);

        let frame = long_tap_anc_cycle_request(EarSide::Left, AncCycle::OffAwareness).unwrap();
        assert_eq!(frame.command_id, CMD_LONG_TAP_SPLIT_WRITE_ANC);
        assert_eq!(frame.find_param(1), &[4]);

        let frame = in_call_double_tap_request(AnswerCall).unwrap();
        assert_eq!(frame.command_id, CMD_DUAL_TAP_WRITE);
        assert_eq!(frame.find_param(4), &[0]);

        let frame = swipe_request(ChangeVolume).unwrap();
        assert_eq!(frame.command_id, CMD_SWIPE_WRITE);
        assert_eq!(frame.find_param(1), &[0]);
        assert_eq!(frame.find_param(2), &[0]);
    }

    #[test]
    fn test_apply_responses() {
        let mut settings = GestureSettings::default();
        settings.apply(&Frame::write_request(
            CMD_DUAL_TAP_READ,
            &[(1, vec![1]), (2, vec![7]), (4, vec![0])],
        ));
        settings.apply(&Frame::write_request(
            CMD_TRIPLE_TAP_READ,
            &[(1, vec![2]), (2, vec![0xFF])],
        ));
        settings.apply(&Frame::write_request(
            CMD_LONG_TAP_SPLIT_READ_BASE,
            &[(1, vec![10]), (2, vec![0xFF])],
        ));
        settings.apply(&Frame::write_request(
            CMD_LONG_TAP_SPLIT_READ_ANC,
            &[(1, vec![2]), (2, vec![9])],
        ));
        settings.apply(&Frame::write_request(CMD_SWIPE_READ, &[(1, vec![0])]));

        assert_eq!(settings.double_tap_left, Some(PlayPause));
        assert_eq!(settings.double_tap_right, Some(PreviousTrack));
        assert_eq!(settings.double_tap_in_call, Some(AnswerCall));
        assert_eq!(settings.triple_tap_left, Some(NextTrack));
        assert_eq!(settings.triple_tap_right, Some(Off));
        assert_eq!(settings.long_tap_left, Some(SwitchAnc));
        assert_eq!(settings.long_tap_right, Some(Off));
        assert_eq!(settings.long_tap_anc_cycle_left, Some(AncCycle::OffOnAwareness));
        assert_eq!(settings.long_tap_anc_cycle_right, None);
        assert_eq!(settings.swipe, Some(ChangeVolume));
    }

    #[test]
    fn test_swipe_nonzero_is_off() {
        let mut settings = GestureSettings::default();
        settings.apply(&Frame::write_request(CMD_SWIPE_READ, &[(1, vec![8])]));
        assert_eq!(settings.swipe, Some(Off));
    }

    #[test]
    fn test_read_requests() {
        let ids: Vec<CommandId> = read_requests().iter().map(|f| f.command_id).collect();
        assert_eq!(
            ids,
            vec![
                CMD_DUAL_TAP_READ,
                CMD_TRIPLE_TAP_READ,
                CMD_LONG_TAP_SPLIT_READ_BASE,
                CMD_LONG_TAP_SPLIT_READ_ANC,
                CMD_SWIPE_READ
            ]
        );
        assert_eq!(read_requests()[0].parameters.len(), 3);
    }
}
